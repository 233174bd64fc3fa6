//! Postgres database pair lifecycle.
//!
//! Every operation reads connection parameters from a [`DbEnv`], resolves all
//! required keys up front, then drives `psql`/`pg_dump`/`pg_restore` through a
//! [`StepRunner`](crate::steps::StepRunner). The first failing step aborts the
//! operation.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::Result;
use crate::steps::{StepOutcome, StepRunner};

mod clone;
mod connections;
mod env;
mod lifecycle;
pub mod queries;
pub mod registry;
mod setup;
mod timeouts;

pub use clone::{clone, migrate_reverse};
pub use connections::{close_connections, SETTLE_DELAY};
pub use env::{AppCredentials, DbEnv, DbTarget, TimeoutSettings};
pub use lifecycle::{create, list, register, reset, schema, test_connection};
pub use registry::{DbConfig, DbConfigFile, DbPair, DbSettings};
pub use setup::{migrate, setup_fresh};
pub use timeouts::set_timeouts;

/// Maintenance database used for cluster-level statements.
pub const MAINTENANCE_DB: &str = "postgres";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbRunResult {
    pub operation: String,
    pub database: String,
    pub steps: Vec<StepOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub settings: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connections_found: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,
}

impl DbRunResult {
    pub fn new(operation: &str, database: &str, steps: StepRunner<'_>) -> Self {
        Self {
            operation: operation.to_string(),
            database: database.to_string(),
            steps: steps.into_outcomes(),
            output: None,
            settings: BTreeMap::new(),
            connections_found: None,
            connection_string: None,
        }
    }

    pub fn with_output(mut self, output: String) -> Self {
        self.output = Some(output);
        self
    }

    pub fn with_settings(mut self, settings: BTreeMap<String, String>) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_connection_string(mut self, connection_string: String) -> Self {
        self.connection_string = Some(connection_string);
        self
    }
}

/// `SELECT 1 FROM pg_database` as a logged step.
pub(crate) fn database_exists(steps: &mut StepRunner<'_>, target: &DbTarget) -> Result<bool> {
    let sql = queries::database_exists(&target.name);
    steps.step(format!("Check if database {} exists", target.name), |r| {
        let out = r.run(&target.psql_scalar(MAINTENANCE_DB, &sql))?;
        Ok(out.lines().any(|line| line.trim() == "1"))
    })
}

/// Run one statement against `database` as a logged step, discarding output.
pub(crate) fn sql_step(
    steps: &mut StepRunner<'_>,
    name: impl Into<String>,
    target: &DbTarget,
    database: &str,
    sql: &str,
) -> Result<()> {
    steps.step(name, |r| r.run(&target.psql(database, sql)).map(|_| ()))
}

pub(crate) fn announce_connection_string(connection_string: &str) {
    crate::log_info!("db", "Connection string:");
    crate::log_info!("db", "{}", connection_string);
}
