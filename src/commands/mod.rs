//! Command implementations for the olympics-api binary

pub mod import;
pub mod serve;

pub use import::handle_import;
pub use serve::{build_state, handle_serve};
