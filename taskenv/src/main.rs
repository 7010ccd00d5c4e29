//! `taskenv`: apply environment bindings to pipeline tasks and print the
//! resulting Kubernetes manifests.

#[macro_use]
extern crate prettytable;

use structopt::StructOpt;
use taskenv_common::{prelude::*, quick_main, tracing_support::initialize_tracing};

mod cmd;

/// Command-line options, parsed using `structopt`.
#[derive(Debug, StructOpt)]
#[structopt(about = "Bind Kubernetes secrets into pipeline task environments.")]
enum Opt {
    /// Apply bindings to a task and print the task as JSON.
    #[structopt(name = "apply")]
    Apply {
        #[structopt(flatten)]
        task: cmd::TaskOpt,
    },

    /// Apply bindings to a task and print its environment as a table.
    #[structopt(name = "env")]
    Env {
        #[structopt(flatten)]
        task: cmd::TaskOpt,
    },

    /// Apply bindings to a task and print it as a Kubernetes pod manifest.
    #[structopt(name = "render")]
    Render {
        #[structopt(flatten)]
        task: cmd::TaskOpt,
    },

    /// Print a skeleton manifest for the AWS secret that tasks will read.
    #[structopt(name = "secret-template")]
    SecretTemplate {
        #[structopt(flatten)]
        aws: cmd::AwsSecretOpt,
    },
}

fn run() -> Result<()> {
    initialize_tracing();
    let opt = Opt::from_args();
    debug!("Args: {:?}", opt);

    match opt {
        Opt::Apply { ref task } => cmd::apply::run(task),
        Opt::Env { ref task } => cmd::env::run(task),
        Opt::Render { ref task } => cmd::render::run(task),
        Opt::SecretTemplate { ref aws } => cmd::secret_template::run(aws),
    }
}

quick_main!(run);
