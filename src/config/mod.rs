// This module re-exports important pieces for convenience,
// so we can "use crate::config::*" easily.
pub mod proc_loader;
pub mod proc_validator;
pub mod settings;
pub mod snapshot;

pub use proc_loader::{ConfigLocator, ConfigOrigin};
pub use settings::*;
pub use snapshot::*;
