//! The `apply` subcommand.

use std::io::{stdout, Write};

use taskenv_common::{prelude::*, serde_json};

use super::TaskOpt;

/// The `apply` subcommand.
pub fn run(opt: &TaskOpt) -> Result<()> {
    let task = opt.load_task()?;
    let out = stdout();
    let mut out = out.lock();
    serde_json::to_writer_pretty(&mut out, &task)
        .context("error writing task JSON")?;
    writeln!(out)?;
    Ok(())
}
