//! Command-line interface.

pub mod args;

pub use args::{Commands, DataArgs, OlympicsCli, ServeArgs};
