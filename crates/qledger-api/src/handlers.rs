//! Request handlers.

pub mod health;
pub mod plan;
pub mod quota;

pub use health::*;
pub use plan::*;
pub use quota::*;
