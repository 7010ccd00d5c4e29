//! Environment variable bindings, and the capability of accepting them.
//!
//! These types mirror the matching Kubernetes `core/v1` objects closely
//! enough to (de)serialize them, but only carry the fields we use.

use crate::prelude::*;

/// A single environment variable for a container.
///
/// A binding holds either a literal `value`, or a `value_from` source which
/// Kubernetes resolves when the container starts.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EnvVar {
    /// The name of the environment variable.
    pub name: String,
    /// A literal value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Where to look up the value at container start-up.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_from: Option<EnvVarSource>,
}

impl EnvVar {
    /// Bind `name` to a literal value.
    pub fn literal(name: impl Into<String>, value: impl Into<String>) -> Self {
        EnvVar {
            name: name.into(),
            value: Some(value.into()),
            value_from: None,
        }
    }

    /// Bind `name` to `key` inside the Kubernetes secret `secret`.
    pub fn from_secret(
        name: impl Into<String>,
        secret: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        EnvVar {
            name: name.into(),
            value: None,
            value_from: Some(EnvVarSource {
                secret_key_ref: Some(SecretKeySelector::new(secret, key)),
            }),
        }
    }

    /// The secret key this variable is read from, if it is an indirect
    /// binding.
    pub fn secret_key_ref(&self) -> Option<&SecretKeySelector> {
        self.value_from
            .as_ref()
            .and_then(|source| source.secret_key_ref.as_ref())
    }

    /// Make sure this binding has a shape Kubernetes will accept: a literal
    /// `value`, or a `valueFrom` naming a secret key, but never both.
    pub fn check(&self) -> Result<()> {
        match (&self.value, &self.value_from) {
            (Some(_), Some(_)) => Err(format_err!(
                "env var {:?} has both a value and a valueFrom",
                self.name,
            )),
            (_, Some(source)) if source.secret_key_ref.is_none() => Err(format_err!(
                "env var {:?} has a valueFrom without a secretKeyRef",
                self.name,
            )),
            _ => Ok(()),
        }
    }
}

/// Where to get the value of an environment variable.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EnvVarSource {
    /// Read the value from a key inside a secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key_ref: Option<SecretKeySelector>,
}

/// Anything which can accept environment variable bindings, typically the
/// container definition of a pipeline task.
///
/// Bindings are only ever appended. What happens when two bindings share a
/// name is up to the implementation.
pub trait EnvHost {
    /// Append `env_var`, returning `self` so calls can be chained.
    fn add_env_variable(&mut self, env_var: EnvVar) -> &mut Self;

    /// Append a binding of `name` to `key` inside the secret `secret`.
    fn add_secret_env_variable(
        &mut self,
        name: &str,
        secret: &str,
        key: &str,
    ) -> &mut Self {
        self.add_env_variable(EnvVar::from_secret(name, secret, key))
    }

    /// Run `op` against this host and return it again.
    fn apply<O: TaskOp>(&mut self, op: &O) -> &mut Self
    where
        Self: Sized,
    {
        op.apply_to(self)
    }
}

impl EnvHost for Vec<EnvVar> {
    fn add_env_variable(&mut self, env_var: EnvVar) -> &mut Self {
        self.push(env_var);
        self
    }
}

/// A reusable modification of a task, such as "give this task AWS
/// credentials". The same operation can be applied to any number of tasks.
pub trait TaskOp {
    /// Modify `host` in place and hand back the same reference.
    fn apply_to<'a, H: EnvHost>(&self, host: &'a mut H) -> &'a mut H;
}

#[test]
fn serializes_with_kubernetes_field_names() {
    let env_var = EnvVar::from_secret("AWS_REGION", "aws-secret", "REGION");
    let json = serde_json::to_value(&env_var).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "name": "AWS_REGION",
            "valueFrom": {
                "secretKeyRef": { "name": "aws-secret", "key": "REGION" },
            },
        }),
    );

    let literal = EnvVar::literal("DEBUG", "1");
    let json = serde_json::to_value(&literal).unwrap();
    assert_eq!(json, serde_json::json!({ "name": "DEBUG", "value": "1" }));
}

#[test]
fn parses_kubernetes_env_entries() {
    let json = r#"{
        "name": "TOKEN",
        "valueFrom": { "secretKeyRef": { "name": "creds", "key": "token" } }
    }"#;
    let env_var: EnvVar = serde_json::from_str(json).expect("parse error");
    assert_eq!(env_var, EnvVar::from_secret("TOKEN", "creds", "token"));
    assert_eq!(
        env_var.secret_key_ref(),
        Some(&SecretKeySelector::new("creds", "token")),
    );
    assert_eq!(EnvVar::literal("A", "b").secret_key_ref(), None);
}

#[test]
fn check_accepts_well_formed_bindings() {
    assert!(EnvVar::literal("A", "1").check().is_ok());
    assert!(EnvVar::from_secret("A", "s", "k").check().is_ok());
    let empty = EnvVar {
        name: "EMPTY".to_owned(),
        value: None,
        value_from: None,
    };
    assert!(empty.check().is_ok());
}

#[test]
fn check_rejects_value_from_without_secret_key_ref() {
    let json = r#"{ "name": "TOKEN", "valueFrom": {} }"#;
    let env_var: EnvVar = serde_json::from_str(json).expect("parse error");
    let err = env_var.check().expect_err("should be rejected");
    assert!(err.to_string().contains("without a secretKeyRef"));
}

#[test]
fn check_rejects_value_and_value_from() {
    let json = r#"{
        "name": "BOTH",
        "value": "x",
        "valueFrom": { "secretKeyRef": { "name": "s", "key": "k" } }
    }"#;
    let env_var: EnvVar = serde_json::from_str(json).expect("parse error");
    let err = env_var.check().expect_err("should be rejected");
    assert!(err.to_string().contains("both a value and a valueFrom"));
}

#[test]
fn vec_host_appends_and_chains() {
    let mut env = vec![EnvVar::literal("A", "1")];
    env.add_secret_env_variable("B", "s", "k")
        .add_env_variable(EnvVar::literal("A", "2"));
    let names = env.iter().map(|e| e.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, &["A", "B", "A"]);
}
