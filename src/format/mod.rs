//! Formatting helpers for rendering expressions and moment systems.

pub mod expr;
pub mod system;

pub use expr::pretty;
pub use system::pretty_system;
