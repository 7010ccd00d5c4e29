//! A single task in a pipeline, described as one container.

use crate::manifest::render_manifest;
use crate::prelude::*;

/// Represents a task `*.json` or `*.yml` file, and the in-memory task that
/// operations like [`UseAwsSecret`] modify.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TaskSpec {
    /// The name of this task. Used as the pod and container name.
    pub name: String,
    /// The Docker image to run.
    pub image: String,
    /// The command to run, if the image default isn't wanted.
    #[serde(default)]
    pub cmd: Vec<String>,
    /// Environment bindings, in the order they were added.
    #[serde(default)]
    pub env: Vec<EnvVar>,
}

impl TaskSpec {
    /// Create a task running `image` with no command or environment.
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        TaskSpec {
            name: name.into(),
            image: image.into(),
            cmd: vec![],
            env: vec![],
        }
    }

    /// Load a task file. Files ending in `.yml` or `.yaml` (in any case) are
    /// read as YAML, everything else as JSON.
    pub fn from_path(path: &Path) -> Result<TaskSpec> {
        debug!("loading task from {}", path.display());
        let f = File::open(path)
            .with_context(|| format!("can't open task file {}", path.display()))?;
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| {
                ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml")
            });
        let task: TaskSpec = if is_yaml {
            serde_yaml::from_reader(f)
                .with_context(|| format!("can't parse task YAML {}", path.display()))?
        } else {
            serde_json::from_reader(f)
                .with_context(|| format!("can't parse task JSON {}", path.display()))?
        };
        task.check_env()
            .with_context(|| format!("invalid task file {}", path.display()))?;
        Ok(task)
    }

    /// Fail if any environment binding has a shape Kubernetes would reject.
    pub fn check_env(&self) -> Result<()> {
        for env_var in &self.env {
            env_var.check()?;
        }
        Ok(())
    }

    /// The binding Kubernetes will actually use for `name`. When a container
    /// lists the same variable more than once, the last entry wins.
    pub fn env_var(&self, name: &str) -> Option<&EnvVar> {
        self.env.iter().rev().find(|env_var| env_var.name == name)
    }

    /// Render this task as a Kubernetes `Pod` manifest.
    pub fn to_manifest(&self) -> Result<String> {
        self.check_env()
            .with_context(|| format!("can't render task {}", self.name))?;
        let params = ManifestParams {
            name: &self.name,
            image: &self.image,
            cmd: &self.cmd,
            env: self.env.iter().map(EnvParams::from).collect(),
        };
        render_manifest(TASK_MANIFEST_TEMPLATE, &params)
            .with_context(|| format!("error rendering manifest for task {}", self.name))
    }
}

impl EnvHost for TaskSpec {
    fn add_env_variable(&mut self, env_var: EnvVar) -> &mut Self {
        trace!("task {}: adding env var {}", self.name, env_var.name);
        self.env.push(env_var);
        self
    }
}

/// The manifest used to run a task.
const TASK_MANIFEST_TEMPLATE: &str = include_str!("task_manifest.yml.hbs");

/// Parameters used to render `TASK_MANIFEST_TEMPLATE`. Every field is always
/// present, because the template runs in strict mode.
#[derive(Serialize)]
struct ManifestParams<'a> {
    name: &'a str,
    image: &'a str,
    cmd: &'a [String],
    env: Vec<EnvParams<'a>>,
}

/// A flattened `EnvVar` for the template. Only built from bindings which
/// passed `EnvVar::check`, so at most one of `value` and `secret` is set.
#[derive(Serialize)]
struct EnvParams<'a> {
    name: &'a str,
    value: &'a str,
    secret: Option<&'a SecretKeySelector>,
}

impl<'a> From<&'a EnvVar> for EnvParams<'a> {
    fn from(env_var: &'a EnvVar) -> Self {
        EnvParams {
            name: &env_var.name,
            value: env_var.value.as_deref().unwrap_or(""),
            secret: env_var.secret_key_ref(),
        }
    }
}

#[cfg(test)]
fn example_task() -> TaskSpec {
    let yaml = include_str!("example_task.yml");
    serde_yaml::from_str(yaml).expect("parse error")
}

#[test]
fn parse_task_spec() {
    let task = example_task();
    assert_eq!(task.name, "train-model");
    assert_eq!(task.image, "example/trainer:1.2");
    assert_eq!(task.cmd, &["python3", "/train.py"]);
    assert_eq!(task.env.len(), 2);
    assert_eq!(task.env[0], EnvVar::literal("EPOCHS", "10"));
    assert_eq!(
        task.env[1],
        EnvVar::from_secret("WANDB_API_KEY", "wandb", "api-key"),
    );
}

#[test]
fn parse_minimal_task_spec() {
    let json = r#"{ "name": "noop", "image": "busybox" }"#;
    let task: TaskSpec = serde_json::from_str(json).expect("parse error");
    assert_eq!(task, TaskSpec::new("noop", "busybox"));
}

#[test]
fn reject_unknown_fields() {
    let json = r#"{ "name": "noop", "image": "busybox", "imag": "typo" }"#;
    assert!(serde_json::from_str::<TaskSpec>(json).is_err());
}

#[test]
fn add_env_variable_returns_same_task() {
    let mut task = TaskSpec::new("noop", "busybox");
    let task_ptr: *const TaskSpec = &task;
    let returned = task.add_secret_env_variable("A", "s", "k");
    assert!(std::ptr::eq(returned, task_ptr));
}

#[test]
fn last_duplicate_binding_wins() {
    let mut task = TaskSpec::new("noop", "busybox");
    task.add_env_variable(EnvVar::literal("AWS_REGION", "us-east-1"))
        .add_secret_env_variable("AWS_REGION", "aws-secret", "AWS_REGION");
    assert_eq!(task.env.len(), 2);
    assert_eq!(
        task.env_var("AWS_REGION"),
        Some(&EnvVar::from_secret("AWS_REGION", "aws-secret", "AWS_REGION")),
    );
    assert_eq!(task.env_var("MISSING"), None);
}

#[test]
fn render_template() {
    let task = example_task();
    let manifest = task.to_manifest().expect("error rendering task template");
    print!("{}", manifest);
    let parsed: serde_json::Value =
        serde_yaml::from_str(&manifest).expect("rendered invalid YAML");

    assert_eq!(parsed["kind"], "Pod");
    assert_eq!(parsed["metadata"]["name"], "train-model");
    let container = &parsed["spec"]["containers"][0];
    assert_eq!(container["image"], "example/trainer:1.2");
    assert_eq!(container["command"][1], "/train.py");
    assert_eq!(container["env"][0]["name"], "EPOCHS");
    assert_eq!(container["env"][0]["value"], "10");
    assert_eq!(
        container["env"][1]["valueFrom"]["secretKeyRef"],
        serde_json::json!({ "name": "wandb", "key": "api-key" }),
    );
}

#[test]
fn render_template_without_cmd_or_env() {
    let task = TaskSpec::new("noop", "busybox");
    let manifest = task.to_manifest().expect("error rendering task template");
    let parsed: serde_json::Value =
        serde_yaml::from_str(&manifest).expect("rendered invalid YAML");
    let container = &parsed["spec"]["containers"][0];
    assert_eq!(container["image"], "busybox");
    assert!(container.get("command").is_none());
    assert!(container.get("env").is_none());
}

#[test]
fn render_rejects_value_from_without_secret_key_ref() {
    let json = r#"{
        "name": "noop",
        "image": "busybox",
        "env": [{ "name": "TOKEN", "valueFrom": {} }]
    }"#;
    let task: TaskSpec = serde_json::from_str(json).expect("parse error");
    assert!(task.to_manifest().is_err());
}

#[test]
fn render_rejects_value_and_value_from() {
    let mut task = TaskSpec::new("noop", "busybox");
    let mut both = EnvVar::from_secret("BOTH", "s", "k");
    both.value = Some("x".to_owned());
    task.add_env_variable(both);
    let err = task.to_manifest().expect_err("should be rejected");
    assert!(format!("{:#}", err).contains("both a value and a valueFrom"));
}

#[cfg(test)]
fn write_task_file(dir: &Path, file_name: &str, contents: &str) -> PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, contents).expect("can't write task file");
    path
}

#[test]
fn load_yaml_and_json_task_files() {
    let dir = tempfile::tempdir().expect("can't create temp dir");

    for file_name in &["task.yml", "task.yaml", "TASK.YAML"] {
        let path = write_task_file(dir.path(), file_name, include_str!("example_task.yml"));
        let task = TaskSpec::from_path(&path).expect("can't load YAML task");
        assert_eq!(task, example_task());
    }

    let json = serde_json::to_string(&example_task()).expect("can't serialize");
    let path = write_task_file(dir.path(), "task.json", &json);
    assert_eq!(TaskSpec::from_path(&path).expect("can't load JSON task"), example_task());

    // Anything that isn't `.yml` or `.yaml` is JSON, so YAML there fails.
    let path = write_task_file(dir.path(), "task.txt", include_str!("example_task.yml"));
    let err = TaskSpec::from_path(&path).expect_err("YAML is not JSON");
    assert!(err.to_string().starts_with("can't parse task JSON"));
}

#[test]
fn load_missing_task_file() {
    let dir = tempfile::tempdir().expect("can't create temp dir");
    let path = dir.path().join("missing.json");
    let err = TaskSpec::from_path(&path).expect_err("file should not exist");
    assert_eq!(err.to_string(), format!("can't open task file {}", path.display()));
}

#[test]
fn load_rejects_malformed_env() {
    let dir = tempfile::tempdir().expect("can't create temp dir");
    let yaml = "name: noop\nimage: busybox\nenv:\n  - name: TOKEN\n    valueFrom: {}\n";
    let path = write_task_file(dir.path(), "task.yml", yaml);
    let err = TaskSpec::from_path(&path).expect_err("should be rejected");
    assert!(err.to_string().starts_with("invalid task file"));
}
