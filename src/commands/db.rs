use clap::{Args, Subcommand};
use serde::Serialize;
use std::collections::BTreeMap;

use toolchain::config;
use toolchain::db::registry::{self, ConfigureOutcome};
use toolchain::db::{self, DbEnv, DbPair, DbRunResult, DbSettings};
use toolchain::runner::SystemRunner;
use toolchain::{paths, Error};

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct DbArgs {
    #[command(subcommand)]
    command: DbCommand,
}

#[derive(Subcommand)]
enum DbCommand {
    /// Select a database pair and write the database environment file
    Config {
        /// Pair key (prompts when omitted)
        pair: Option<String>,
    },
    /// Show the currently configured pair
    Status,
    /// List selectable database pairs
    Pairs,
    /// Manage pairs stored in db.config.json
    Pair {
        #[command(subcommand)]
        command: PairCommand,
    },
    /// Check the connection to the cloud database
    Test,
    /// List databases on the cloud server with their sizes
    List,
    /// Create the cloud database
    Create,
    /// Drop and recreate the cloud database
    Reset,
    /// Hand the cloud database over to the application user
    Register,
    /// Ensure the public schema exists and is granted to the application user
    Schema,
    /// Recreate the cloud database from scratch with extensions, roles and timeouts
    SetupFresh,
    /// Copy the local database to the cloud
    #[command(name = "clone")]
    CloneLocal,
    /// Fresh setup followed by clone
    Migrate,
    /// Copy the cloud database to the local server
    MigrateReverse,
    /// Apply statement, idle and keepalive timeouts
    SetTimeouts,
    /// Terminate every connection to the cloud database
    CloseConnections,
}

#[derive(Subcommand)]
enum PairCommand {
    /// Add or replace a pair from JSON
    Set {
        /// Pair key
        key: String,
        /// JSON spec (inline, @file, or - for stdin)
        spec: String,
    },
    /// Remove a pair
    Remove {
        /// Pair key
        key: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbStatusOutput {
    pub configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pair: Option<DbPair>,
    pub settings: DbSettings,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbPairsOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<String>,
    pub pairs: BTreeMap<String, DbPair>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbPairChangeOutput {
    pub action: String,
    pub key: String,
    pub pair: DbPair,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum DbOutput {
    Config(ConfigureOutcome),
    Status(DbStatusOutput),
    Pairs(DbPairsOutput),
    PairChange(DbPairChangeOutput),
    Run(DbRunResult),
}

pub fn run(args: DbArgs, global: &GlobalArgs) -> CmdResult<DbOutput> {
    let root = global.root()?;

    let env = || DbEnv::load(&global.env_path(&root));
    let runner = SystemRunner;

    let output = match args.command {
        DbCommand::Config { pair } => {
            let file = registry::load(&root)?;
            let key = match pair {
                Some(key) => key,
                None => select_pair_interactively(&file)?,
            };
            DbOutput::Config(registry::configure(&root, &key, &global.env_path(&root))?)
        }
        DbCommand::Status => {
            let file = registry::load(&root)?;
            let current = file
                .current_pair()
                .map(|(key, pair)| (key.clone(), pair.clone()));
            if current.is_none() {
                toolchain::log_warning!("db", "No database pair configured");
            }
            DbOutput::Status(DbStatusOutput {
                configured: current.is_some(),
                key: current.as_ref().map(|(key, _)| key.clone()),
                pair: current.map(|(_, pair)| pair),
                settings: file.settings,
            })
        }
        DbCommand::Pairs => {
            let file = registry::load(&root)?;
            DbOutput::Pairs(DbPairsOutput {
                current: file.current_pair().map(|(key, _)| key.clone()),
                pairs: registry::selectable_pairs(&file),
            })
        }
        DbCommand::Pair { command } => match command {
            PairCommand::Set { key, spec } => {
                let pair: DbPair = config::parse_json_spec(&spec, "db pair")?;
                let pair = registry::set_pair(&root, &key, pair)?;
                toolchain::log_success!("db", "Saved pair '{}'", key);
                DbOutput::PairChange(DbPairChangeOutput {
                    action: "set".to_string(),
                    key,
                    pair,
                })
            }
            PairCommand::Remove { key } => {
                let pair = registry::remove_pair(&root, &key)?;
                toolchain::log_success!("db", "Removed pair '{}'", key);
                DbOutput::PairChange(DbPairChangeOutput {
                    action: "remove".to_string(),
                    key,
                    pair,
                })
            }
        },
        DbCommand::Test => DbOutput::Run(db::test_connection(&env()?, &runner)?),
        DbCommand::List => DbOutput::Run(db::list(&env()?, &runner)?),
        DbCommand::Create => DbOutput::Run(db::create(&env()?, &runner)?),
        DbCommand::Reset => DbOutput::Run(db::reset(&env()?, &runner)?),
        DbCommand::Register => DbOutput::Run(db::register(&env()?, &runner)?),
        DbCommand::Schema => DbOutput::Run(db::schema(&env()?, &runner)?),
        DbCommand::SetupFresh => DbOutput::Run(db::setup_fresh(&env()?, &runner)?),
        DbCommand::CloneLocal => {
            DbOutput::Run(db::clone(&env()?, &runner, &paths::dump_dir(&root))?)
        }
        DbCommand::Migrate => {
            DbOutput::Run(db::migrate(&env()?, &runner, &paths::dump_dir(&root))?)
        }
        DbCommand::MigrateReverse => DbOutput::Run(db::migrate_reverse(
            &env()?,
            &runner,
            &paths::dump_dir(&root),
        )?),
        DbCommand::SetTimeouts => DbOutput::Run(db::set_timeouts(&env()?, &runner)?),
        DbCommand::CloseConnections => {
            DbOutput::Run(db::close_connections(&env()?, &runner, db::SETTLE_DELAY)?)
        }
    };

    Ok((output, 0))
}

fn select_pair_interactively(file: &db::DbConfigFile) -> toolchain::Result<String> {
    let choices: Vec<(String, String)> = registry::selectable_pairs(file)
        .into_iter()
        .map(|(key, pair)| (key, pair.name))
        .collect();

    if choices.is_empty() {
        return Err(Error::validation_missing_argument(vec!["pair".to_string()]));
    }

    crate::tty::select("Select a database pair:", &choices, "pair")
}
