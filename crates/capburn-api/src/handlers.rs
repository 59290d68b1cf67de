//! Request handlers.

pub mod health;
pub mod render;

pub use health::*;
pub use render::*;
