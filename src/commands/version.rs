use clap::{Args, Subcommand};
use serde::Serialize;

use toolchain::version::{self, BumpType, VersionChange, VersionInfo};

use super::{CmdResult, GlobalArgs};

#[derive(Serialize)]
#[serde(untagged)]
pub enum VersionOutput {
    Show(VersionInfo),
    Change(VersionChange),
}

#[derive(Args)]
pub struct VersionArgs {
    #[command(subcommand)]
    command: VersionCommand,
}

#[derive(Subcommand)]
enum VersionCommand {
    /// Show the version in package.json
    Show,
    /// Bump the package version with semantic versioning
    Bump {
        /// Version bump type
        #[arg(value_parser = ["patch", "minor", "major"])]
        bump_type: String,
    },
    /// Set the package version directly
    Set {
        /// New version (e.g., 1.2.3)
        new_version: String,
    },
}

pub fn run(args: VersionArgs, global: &GlobalArgs) -> CmdResult<VersionOutput> {
    let root = global.root()?;

    match args.command {
        VersionCommand::Show => Ok((VersionOutput::Show(version::read_version(&root)?), 0)),
        VersionCommand::Bump { bump_type } => {
            let bump: BumpType = bump_type.parse()?;
            Ok((VersionOutput::Change(version::bump(&root, bump)?), 0))
        }
        VersionCommand::Set { new_version } => {
            Ok((VersionOutput::Change(version::set(&root, &new_version)?), 0))
        }
    }
}
