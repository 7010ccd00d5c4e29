//! The `env` subcommand.

use prettytable::{format::consts::FORMAT_CLEAN, Table};
use taskenv_common::prelude::*;

use super::TaskOpt;

/// The `env` subcommand.
pub fn run(opt: &TaskOpt) -> Result<()> {
    let task = opt.load_task()?;
    env_table(&task).printstd();
    Ok(())
}

/// Build a table listing each binding and where its value comes from.
fn env_table(task: &TaskSpec) -> Table {
    let mut table = Table::new();
    table.set_format(*FORMAT_CLEAN);
    table.add_row(row!["NAME", "SOURCE"]);
    for env_var in &task.env {
        table.add_row(row![&env_var.name, describe_source(env_var)]);
    }
    table
}

/// Where a binding's value comes from, in human-readable form.
fn describe_source(env_var: &EnvVar) -> String {
    match (&env_var.value, env_var.secret_key_ref()) {
        (_, Some(selector)) => selector.to_string(),
        (Some(value), None) => format!("{:?}", value),
        (None, None) => "\"\"".to_owned(),
    }
}

#[test]
fn lists_bindings_in_order() {
    let mut task = TaskSpec::new("train", "example/trainer");
    task.add_env_variable(EnvVar::literal("EPOCHS", "10"))
        .apply(&use_aws_secret());

    let table = env_table(&task);
    assert_eq!(table.len(), 9);
    let rendered = table.to_string();
    let lines = rendered.lines().map(str::trim).collect::<Vec<_>>();
    assert!(lines[1].starts_with("EPOCHS"));
    assert!(lines[1].ends_with("\"10\""));
    assert!(lines[4].starts_with("AWS_REGION"));
    assert!(lines[4].ends_with("secret/aws-secret[AWS_REGION]"));
}
