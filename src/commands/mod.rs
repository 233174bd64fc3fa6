use std::path::{Path, PathBuf};

use toolchain::paths;

pub type CmdResult<T> = toolchain::Result<(T, i32)>;

/// Flags shared by every command group.
pub(crate) struct GlobalArgs {
    pub env_file: Option<PathBuf>,
}

impl GlobalArgs {
    /// Working directory every `.next-toolchain-temp/` path is relative to.
    pub fn root(&self) -> toolchain::Result<PathBuf> {
        paths::project_root()
    }

    /// Database environment file: `--env-file` when given, otherwise `db.conf`.
    pub fn env_path(&self, root: &Path) -> PathBuf {
        match &self.env_file {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => root.join(path),
            None => paths::db_conf(root),
        }
    }
}

pub mod db;
pub mod env;
pub mod index;
pub mod publish;
pub mod screenshot;
pub mod version;

macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (toolchain::Result<serde_json::Value>, i32) {
    match command {
        crate::Commands::Db(args) => dispatch!(args, global, db),
        crate::Commands::Env(args) => dispatch!(args, global, env),
        crate::Commands::Version(args) => dispatch!(args, global, version),
        crate::Commands::Publish(args) => dispatch!(args, global, publish),
        crate::Commands::Screenshot(args) => dispatch!(args, global, screenshot),
        crate::Commands::Index(args) => dispatch!(args, global, index),
    }
}
