//! The `secret-template` subcommand.

use taskenv_common::prelude::*;

use super::AwsSecretOpt;

/// The `secret-template` subcommand.
pub fn run(opt: &AwsSecretOpt) -> Result<()> {
    print!("{}", opt.to_use_aws_secret().secret_manifest()?);
    Ok(())
}
