mod commands;
mod extract;
mod probe;
mod progress;
mod wrapper;

pub use commands::*;
pub use extract::*;
pub use probe::*;
pub use progress::*;
pub use wrapper::*;
