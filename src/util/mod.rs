//! Shared utilities

pub mod config;
pub mod fs;
pub mod hash;
pub mod process;
pub mod shell;

pub use config::{Config, Layout, LayoutOverrides};
pub use shell::Shell;
