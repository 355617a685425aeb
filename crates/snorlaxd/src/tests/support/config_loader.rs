//! Configuration loaders for launch scenarios covering success and failure.

use std::ffi::OsString;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use snorlax_config::Config;

use crate::bootstrap::ConfigLoader;

/// Loader that intentionally fails by passing an unparsable CLI value.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("snorlaxd"),
            OsString::from("--poll-interval-ms"),
            OsString::from("soon"),
        ];
        Config::load_from_iter(args)
    }
}
