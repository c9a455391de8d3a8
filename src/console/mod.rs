pub mod commands;
pub mod render;

pub use commands::{is_confirmation, is_submit, parse_command, Command};
