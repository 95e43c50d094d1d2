//! Resolution of the active version and source for an invocation

pub mod env;
pub mod error;
pub mod resolver;

pub use env::{Environment, ProcessEnvironment};
pub use error::{NotInstalledError, ResolutionError, SelectionError};
pub use resolver::{InstalledVersion, Origin, Resolution, Resolver};
