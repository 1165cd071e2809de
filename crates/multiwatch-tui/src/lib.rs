//! Terminal frontend for multiwatch: argument parsing, the interactive
//! dashboard, and the one-shot reporting mode.

pub mod app;
pub mod args;
pub mod help;
pub mod keymap;
pub mod oneshot;
pub mod render;
pub mod runtime;

pub use app::{App, Effect, Event};
pub use args::{parse_args, CliOptions, USAGE};
