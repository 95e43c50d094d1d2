pub mod cli;
pub mod clock;
pub mod config;
pub mod install;
pub mod logging;
pub mod platform;
pub mod resolution;
pub mod shell;
pub mod shim;
pub mod version;
