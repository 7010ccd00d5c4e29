//! The `render` subcommand.

use taskenv_common::prelude::*;

use super::TaskOpt;

/// The `render` subcommand.
pub fn run(opt: &TaskOpt) -> Result<()> {
    let task = opt.load_task()?;
    print!("{}", task.to_manifest()?);
    Ok(())
}
