mod names;
mod time;

pub use names::*;
pub use time::*;
