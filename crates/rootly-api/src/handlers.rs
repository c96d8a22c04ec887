//! Request handlers.

pub mod diseases;
pub mod health;
pub mod predict;

pub use diseases::*;
pub use health::*;
pub use predict::*;
