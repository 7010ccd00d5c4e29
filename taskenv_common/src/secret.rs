//! References to Kubernetes secrets.

use crate::prelude::*;

/// Selects a single key inside a Kubernetes secret. Kubernetes secrets contain
/// key-value pairs, and a container can pull one of those values into its
/// environment at start-up.
///
/// Note that this is used directly as part of the task file format, so it
/// can't be changed without breaking a user-facing file format.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SecretKeySelector {
    /// The name of the Kubernetes secret to use.
    pub name: String,
    /// The key within the secret to use.
    pub key: String,
}

impl SecretKeySelector {
    /// Refer to `key` within the secret `name`. Neither value is checked here;
    /// a missing secret or key only shows up when Kubernetes tries to start
    /// the container.
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        SecretKeySelector {
            name: name.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for SecretKeySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "secret/{}[{}]", self.name, self.key)
    }
}

#[test]
fn display_names_secret_and_key() {
    let selector = SecretKeySelector::new("aws-secret", "AWS_REGION");
    assert_eq!(selector.to_string(), "secret/aws-secret[AWS_REGION]");
}

#[test]
fn accepts_empty_names() {
    let selector = SecretKeySelector::new("", "");
    assert_eq!(selector.name, "");
    assert_eq!(selector.key, "");
}
