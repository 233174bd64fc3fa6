use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use toolchain::barrel::{self, BarrelOutcome};

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct IndexArgs {
    #[command(subcommand)]
    command: IndexCommand,
}

#[derive(Subcommand)]
enum IndexCommand {
    /// Write an index.ts re-exporting every module in each directory
    Build {
        /// Directories to index
        #[arg(required = true)]
        dirs: Vec<PathBuf>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexBuildOutput {
    pub written: usize,
    pub results: Vec<BarrelOutcome>,
}

pub fn run(args: IndexArgs, global: &GlobalArgs) -> CmdResult<IndexBuildOutput> {
    let root = global.root()?;

    match args.command {
        IndexCommand::Build { dirs } => {
            let dirs: Vec<PathBuf> = dirs
                .into_iter()
                .map(|dir| if dir.is_absolute() { dir } else { root.join(dir) })
                .collect();
            let results = barrel::build_all(&dirs)?;
            let written = results
                .iter()
                .filter(|outcome| matches!(outcome, BarrelOutcome::Written { .. }))
                .count();

            Ok((IndexBuildOutput { written, results }, 0))
        }
    }
}
