pub mod frame;
pub mod tween;

pub use frame::*;
pub use tween::*;
