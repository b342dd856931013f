pub mod baseline;
pub mod dispatch;

pub use baseline::*;
pub use dispatch::*;
