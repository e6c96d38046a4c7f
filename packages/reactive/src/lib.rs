pub mod bound;
pub mod cell;
pub mod value;

pub use bound::{Bound, Resolved};
pub use cell::{Cell, Subscription};
pub use value::Value;
