//! Subcommands, and the options they share.

use structopt::StructOpt;
use taskenv_common::prelude::*;

pub mod apply;
pub mod env;
pub mod render;
pub mod secret_template;

/// Options for binding AWS credentials from a Kubernetes secret.
#[derive(Debug, StructOpt)]
pub struct AwsSecretOpt {
    /// The Kubernetes secret holding AWS credentials.
    #[structopt(long = "secret-name", default_value = "aws-secret")]
    secret_name: String,

    /// The secret key holding `AWS_ACCESS_KEY_ID`.
    #[structopt(long = "access-key-id-key", default_value = "AWS_ACCESS_KEY_ID")]
    access_key_id_key: String,

    /// The secret key holding `AWS_SECRET_ACCESS_KEY`.
    #[structopt(long = "secret-access-key-key", default_value = "AWS_SECRET_ACCESS_KEY")]
    secret_access_key_key: String,

    /// The secret key holding `AWS_REGION`.
    #[structopt(long = "region-key", default_value = "AWS_REGION")]
    region_key: String,

    /// The secret key holding `S3_ENDPOINT`.
    #[structopt(long = "s3-endpoint-key", default_value = "S3_ENDPOINT")]
    s3_endpoint_key: String,

    /// The secret key holding `AWS_ENDPOINT_URL`.
    #[structopt(long = "aws-endpoint-url-key", default_value = "AWS_ENDPOINT_URL")]
    aws_endpoint_url_key: String,

    /// The secret key holding `S3_USE_HTTPS`.
    #[structopt(long = "s3-use-https-key", default_value = "S3_USE_HTTPS")]
    s3_use_https_key: String,

    /// The secret key holding `S3_VERIFY_SSL`.
    #[structopt(long = "s3-verify-ssl-key", default_value = "S3_VERIFY_SSL")]
    s3_verify_ssl_key: String,
}

impl AwsSecretOpt {
    /// The binding described by these options.
    pub fn to_use_aws_secret(&self) -> UseAwsSecret {
        UseAwsSecret {
            secret_name: self.secret_name.clone(),
            access_key_id_key: self.access_key_id_key.clone(),
            secret_access_key_key: self.secret_access_key_key.clone(),
            region_key: self.region_key.clone(),
            s3_endpoint_key: self.s3_endpoint_key.clone(),
            aws_endpoint_url_key: self.aws_endpoint_url_key.clone(),
            s3_use_https_key: self.s3_use_https_key.clone(),
            s3_verify_ssl_key: self.s3_verify_ssl_key.clone(),
        }
    }
}

/// Options shared by subcommands which operate on a task file.
#[derive(Debug, StructOpt)]
pub struct TaskOpt {
    /// Path to a JSON or YAML task file.
    #[structopt(parse(from_os_str))]
    task_file: PathBuf,

    /// Don't bind AWS credentials to the task.
    #[structopt(long = "no-aws-secret")]
    no_aws_secret: bool,

    #[structopt(flatten)]
    aws: AwsSecretOpt,
}

impl TaskOpt {
    /// Load the task file and apply the requested bindings.
    pub fn load_task(&self) -> Result<TaskSpec> {
        let mut task = TaskSpec::from_path(&self.task_file)?;
        if !self.no_aws_secret {
            task.apply(&self.aws.to_use_aws_secret());
        }
        Ok(task)
    }
}

#[test]
fn aws_defaults_match_use_aws_secret() {
    let opt = AwsSecretOpt::from_iter(&["secret-template"]);
    assert_eq!(opt.to_use_aws_secret(), use_aws_secret());
}

#[test]
fn aws_flags_override_keys() {
    let opt = AwsSecretOpt::from_iter(&[
        "secret-template",
        "--secret-name",
        "my-secret",
        "--region-key",
        "REGION_KEY",
    ]);
    assert_eq!(
        opt.to_use_aws_secret(),
        UseAwsSecret {
            region_key: "REGION_KEY".to_owned(),
            ..UseAwsSecret::for_secret("my-secret")
        },
    );
}

#[cfg(test)]
fn write_task_json(dir: &Path) -> String {
    let path = dir.join("task.json");
    std::fs::write(
        &path,
        r#"{ "name": "train", "image": "example/trainer", "env": [{ "name": "EPOCHS", "value": "3" }] }"#,
    )
    .expect("can't write task file");
    path.to_str().expect("temp path should be UTF-8").to_owned()
}

#[test]
fn load_task_binds_aws_secret_by_default() {
    let dir = tempfile::tempdir().expect("can't create temp dir");
    let path = write_task_json(dir.path());
    let opt = TaskOpt::from_iter(&["apply", path.as_str(), "--secret-name", "creds"]);
    let task = opt.load_task().expect("can't load task");
    assert_eq!(task.env.len(), 8);
    assert_eq!(task.env[0], EnvVar::literal("EPOCHS", "3"));
    assert_eq!(
        task.env_var("AWS_REGION"),
        Some(&EnvVar::from_secret("AWS_REGION", "creds", "AWS_REGION")),
    );
}

#[test]
fn load_task_with_no_aws_secret_leaves_env_alone() {
    let dir = tempfile::tempdir().expect("can't create temp dir");
    let path = write_task_json(dir.path());
    let opt = TaskOpt::from_iter(&["apply", path.as_str(), "--no-aws-secret"]);
    let task = opt.load_task().expect("can't load task");
    assert_eq!(task.env, vec![EnvVar::literal("EPOCHS", "3")]);
}
