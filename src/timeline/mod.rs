mod item;
mod ruler;
mod scene;

pub use item::*;
pub use ruler::*;
pub use scene::*;
