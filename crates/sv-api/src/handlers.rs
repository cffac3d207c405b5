//! Request handlers.

pub mod export;
pub mod health;
pub mod media;
pub mod story;
pub mod upload;

pub use export::*;
pub use health::*;
pub use media::*;
pub use story::*;
pub use upload::*;
