mod clip;

pub use clip::*;
