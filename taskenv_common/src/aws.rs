//! Giving tasks AWS and S3 credentials from a Kubernetes secret.
//!
//! ```
//! use taskenv_common::prelude::*;
//!
//! let mut task = TaskSpec::new("train", "example/trainer");
//! task.apply(&UseAwsSecret {
//!     region_key: "REGION_KEY".to_owned(),
//!     ..UseAwsSecret::for_secret("my-secret")
//! });
//! assert_eq!(task.env.len(), 7);
//! ```

use crate::manifest::render_manifest;
use crate::prelude::*;

/// The secret we read from unless told otherwise.
pub const DEFAULT_SECRET_NAME: &str = "aws-secret";

/// The environment variables set by [`UseAwsSecret`], in the order they are
/// added. These names are fixed; only the secret keys they are read from can
/// be configured.
pub const AWS_ENV_VARS: [&str; 7] = [
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_REGION",
    "S3_ENDPOINT",
    "AWS_ENDPOINT_URL",
    "S3_USE_HTTPS",
    "S3_VERIFY_SSL",
];

/// Configure a task to use AWS credentials stored in a Kubernetes secret.
///
/// AWS credentials aren't created along with the cluster, so users need to
/// create the secret by hand (see [`UseAwsSecret::secret_manifest`]). Each
/// `*_key` field names the key inside the secret holding the corresponding
/// variable in [`AWS_ENV_VARS`]. Nothing here is validated: a missing secret
/// or key is reported by Kubernetes when the container starts.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UseAwsSecret {
    /// The name of the Kubernetes secret.
    pub secret_name: String,
    /// Key holding `AWS_ACCESS_KEY_ID`.
    pub access_key_id_key: String,
    /// Key holding `AWS_SECRET_ACCESS_KEY`.
    pub secret_access_key_key: String,
    /// Key holding `AWS_REGION`.
    pub region_key: String,
    /// Key holding `S3_ENDPOINT`.
    pub s3_endpoint_key: String,
    /// Key holding `AWS_ENDPOINT_URL`.
    pub aws_endpoint_url_key: String,
    /// Key holding `S3_USE_HTTPS`.
    pub s3_use_https_key: String,
    /// Key holding `S3_VERIFY_SSL`.
    pub s3_verify_ssl_key: String,
}

impl Default for UseAwsSecret {
    fn default() -> Self {
        UseAwsSecret::for_secret(DEFAULT_SECRET_NAME)
    }
}

/// Read AWS credentials from the `aws-secret` secret, using the conventional
/// key names.
pub fn use_aws_secret() -> UseAwsSecret {
    UseAwsSecret::default()
}

impl UseAwsSecret {
    /// Read AWS credentials from `secret_name`, using the conventional key
    /// names (each key is named after its environment variable).
    pub fn for_secret(secret_name: impl Into<String>) -> Self {
        UseAwsSecret {
            secret_name: secret_name.into(),
            access_key_id_key: AWS_ENV_VARS[0].to_owned(),
            secret_access_key_key: AWS_ENV_VARS[1].to_owned(),
            region_key: AWS_ENV_VARS[2].to_owned(),
            s3_endpoint_key: AWS_ENV_VARS[3].to_owned(),
            aws_endpoint_url_key: AWS_ENV_VARS[4].to_owned(),
            s3_use_https_key: AWS_ENV_VARS[5].to_owned(),
            s3_verify_ssl_key: AWS_ENV_VARS[6].to_owned(),
        }
    }

    /// `(environment variable, secret key)` pairs, in the order they are
    /// added to a task.
    pub fn bindings(&self) -> [(&'static str, &str); 7] {
        [
            (AWS_ENV_VARS[0], self.access_key_id_key.as_str()),
            (AWS_ENV_VARS[1], self.secret_access_key_key.as_str()),
            (AWS_ENV_VARS[2], self.region_key.as_str()),
            (AWS_ENV_VARS[3], self.s3_endpoint_key.as_str()),
            (AWS_ENV_VARS[4], self.aws_endpoint_url_key.as_str()),
            (AWS_ENV_VARS[5], self.s3_use_https_key.as_str()),
            (AWS_ENV_VARS[6], self.s3_verify_ssl_key.as_str()),
        ]
    }

    /// The bindings we add, as `EnvVar` values.
    pub fn env_vars(&self) -> Vec<EnvVar> {
        self.bindings()
            .iter()
            .map(|&(name, key)| EnvVar::from_secret(name, &self.secret_name, key))
            .collect()
    }

    /// Render a skeleton `Secret` manifest with one placeholder entry per
    /// key, for users to fill in. A key used by several variables is listed
    /// once.
    pub fn secret_manifest(&self) -> Result<String> {
        let mut entries: Vec<SecretEntryParams<'_>> = vec![];
        for &(name, key) in self.bindings().iter() {
            if entries.iter().any(|entry| entry.key == key) {
                continue;
            }
            entries.push(SecretEntryParams {
                key,
                placeholder: format!("BASE64_YOUR_{}", name),
            });
        }
        let params = SecretManifestParams {
            secret_name: &self.secret_name,
            entries,
        };
        render_manifest(AWS_SECRET_MANIFEST_TEMPLATE, &params)
            .context("error rendering AWS secret manifest")
    }
}

impl TaskOp for UseAwsSecret {
    fn apply_to<'a, H: EnvHost>(&self, host: &'a mut H) -> &'a mut H {
        debug!("binding AWS credentials from secret {:?}", self.secret_name);
        for &(name, key) in self.bindings().iter() {
            host.add_secret_env_variable(name, &self.secret_name, key);
        }
        host
    }
}

/// The manifest for the secret read by `UseAwsSecret`.
const AWS_SECRET_MANIFEST_TEMPLATE: &str = include_str!("aws_secret_manifest.yml.hbs");

/// Parameters used to render `AWS_SECRET_MANIFEST_TEMPLATE`.
#[derive(Serialize)]
struct SecretManifestParams<'a> {
    secret_name: &'a str,
    entries: Vec<SecretEntryParams<'a>>,
}

/// One `data` entry in the secret.
#[derive(Serialize)]
struct SecretEntryParams<'a> {
    key: &'a str,
    placeholder: String,
}

#[test]
fn default_bindings_use_conventional_names() {
    let mut env: Vec<EnvVar> = vec![];
    env.apply(&use_aws_secret());

    assert_eq!(env.len(), 7);
    for (env_var, &expected) in env.iter().zip(AWS_ENV_VARS.iter()) {
        assert_eq!(env_var.name, expected);
        assert_eq!(
            env_var.secret_key_ref(),
            Some(&SecretKeySelector::new("aws-secret", expected)),
        );
        assert_eq!(env_var.value, None);
    }
    assert_eq!(
        env[2],
        EnvVar::from_secret("AWS_REGION", "aws-secret", "AWS_REGION"),
    );
}

#[test]
fn custom_secret_and_key() {
    let op = UseAwsSecret {
        region_key: "REGION_KEY".to_owned(),
        ..UseAwsSecret::for_secret("my-secret")
    };
    let mut task = TaskSpec::new("train", "example/trainer");
    task.apply(&op);

    let names = task.env.iter().map(|e| e.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, AWS_ENV_VARS);
    for env_var in &task.env {
        let selector = env_var.secret_key_ref().expect("should use a secret");
        assert_eq!(selector.name, "my-secret");
        if env_var.name == "AWS_REGION" {
            assert_eq!(selector.key, "REGION_KEY");
        } else {
            assert_eq!(selector.key, env_var.name);
        }
    }
}

#[test]
fn every_key_is_configurable() {
    let op = UseAwsSecret {
        secret_name: "creds".to_owned(),
        access_key_id_key: "k1".to_owned(),
        secret_access_key_key: "k2".to_owned(),
        region_key: "k3".to_owned(),
        s3_endpoint_key: "k4".to_owned(),
        aws_endpoint_url_key: "k5".to_owned(),
        s3_use_https_key: "k6".to_owned(),
        s3_verify_ssl_key: "k7".to_owned(),
    };
    let keys = op
        .env_vars()
        .iter()
        .map(|e| e.secret_key_ref().expect("should use a secret").key.clone())
        .collect::<Vec<_>>();
    assert_eq!(keys, &["k1", "k2", "k3", "k4", "k5", "k6", "k7"]);
}

#[test]
fn empty_names_are_accepted() {
    let op = UseAwsSecret {
        s3_endpoint_key: String::new(),
        ..UseAwsSecret::for_secret("")
    };
    let env = op.env_vars();
    assert_eq!(env.len(), 7);
    assert_eq!(env[3], EnvVar::from_secret("S3_ENDPOINT", "", ""));
}

#[test]
fn repeated_construction_is_deterministic() {
    let mut first = TaskSpec::new("a", "busybox");
    let mut second = TaskSpec::new("b", "busybox");
    first.apply(&UseAwsSecret::for_secret("s"));
    second.apply(&UseAwsSecret::for_secret("s"));
    assert_eq!(first.env, second.env);
    assert_eq!(first.env, UseAwsSecret::for_secret("s").env_vars());
}

#[test]
fn appends_without_touching_existing_bindings() {
    let mut task = TaskSpec::new("train", "example/trainer");
    task.add_env_variable(EnvVar::literal("AWS_REGION", "us-west-2"));
    let task_ptr: *const TaskSpec = &task;

    let returned = task
        .apply(&use_aws_secret())
        .add_env_variable(EnvVar::literal("EPOCHS", "3"));
    assert!(std::ptr::eq(returned, task_ptr));

    assert_eq!(task.env.len(), 9);
    assert_eq!(task.env[0], EnvVar::literal("AWS_REGION", "us-west-2"));
    assert_eq!(task.env[8], EnvVar::literal("EPOCHS", "3"));
    assert_eq!(
        task.env_var("AWS_REGION").and_then(|e| e.secret_key_ref()),
        Some(&SecretKeySelector::new("aws-secret", "AWS_REGION")),
    );
}

#[test]
fn applying_twice_appends_twice() {
    let op = use_aws_secret();
    let mut env: Vec<EnvVar> = vec![];
    env.apply(&op).apply(&op);
    assert_eq!(env.len(), 14);
    assert_eq!(env[..7], env[7..]);
}

#[test]
fn render_secret_template() {
    let manifest = use_aws_secret()
        .secret_manifest()
        .expect("error rendering secret template");
    print!("{}", manifest);
    let parsed: serde_json::Value =
        serde_yaml::from_str(&manifest).expect("rendered invalid YAML");

    assert_eq!(parsed["kind"], "Secret");
    assert_eq!(parsed["type"], "Opaque");
    assert_eq!(parsed["metadata"]["name"], "aws-secret");
    let data = parsed["data"].as_object().expect("data should be a map");
    assert_eq!(data.len(), 7);
    assert_eq!(data["AWS_REGION"], "BASE64_YOUR_AWS_REGION");
    assert_eq!(data["S3_VERIFY_SSL"], "BASE64_YOUR_S3_VERIFY_SSL");
}

#[test]
fn secret_template_lists_shared_keys_once() {
    let op = UseAwsSecret {
        s3_endpoint_key: "ENDPOINT".to_owned(),
        aws_endpoint_url_key: "ENDPOINT".to_owned(),
        ..UseAwsSecret::for_secret("minio")
    };
    let manifest = op.secret_manifest().expect("error rendering secret template");
    let parsed: serde_json::Value =
        serde_yaml::from_str(&manifest).expect("rendered invalid YAML");
    let data = parsed["data"].as_object().expect("data should be a map");
    assert_eq!(data.len(), 6);
    assert_eq!(data["ENDPOINT"], "BASE64_YOUR_S3_ENDPOINT");
    assert_eq!(parsed["metadata"]["name"], "minio");
}
