//! Code shared between the `taskenv` tools: the task descriptor model,
//! environment bindings sourced from Kubernetes secrets, and manifest
//! rendering.

#![warn(missing_docs)]

pub use anyhow;
pub use serde_json;

pub mod aws;
pub mod env;
pub mod errors;
pub mod manifest;
pub mod secret;
pub mod task;
pub mod tracing_support;

/// Common imports used by many modules.
pub mod prelude {
    pub use anyhow::{format_err, Context as _};
    pub use serde::{Deserialize, Serialize};
    pub use std::{
        fmt,
        fs::File,
        path::{Path, PathBuf},
    };
    pub use tracing::{debug, error, info, trace, warn};

    pub use super::aws::{use_aws_secret, UseAwsSecret};
    pub use super::env::{EnvHost, EnvVar, EnvVarSource, TaskOp};
    pub use super::secret::SecretKeySelector;
    pub use super::task::TaskSpec;
    pub use super::{Error, Result};
}

/// Error type for this crate's functions.
pub type Error = anyhow::Error;

/// Result type for this crate's functions.
pub type Result<T, E = Error> = std::result::Result<T, E>;
