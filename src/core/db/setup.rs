//! Fresh cloud database setup, and the full local → cloud migration.

use std::collections::BTreeMap;
use std::path::Path;

use super::{
    announce_connection_string, clone, database_exists, queries, sql_step, timeouts, DbEnv,
    DbRunResult, MAINTENANCE_DB,
};
use crate::error::Result;
use crate::runner::CommandRunner;
use crate::steps::StepRunner;

/// Drop (if present) and recreate the cloud database with extensions, the
/// application user, grants and timeouts.
pub fn setup_fresh(env: &DbEnv, runner: &dyn CommandRunner) -> Result<DbRunResult> {
    let mut steps = StepRunner::new("db", runner);
    let fresh = fresh_sequence(&mut steps, env)?;

    crate::log_success!("db", "Database setup completed successfully");
    Ok(DbRunResult::new("setup-fresh", &fresh.database, steps)
        .with_settings(fresh.settings)
        .with_connection_string(fresh.connection_string))
}

/// `setup-fresh` followed by `clone`.
pub fn migrate(env: &DbEnv, runner: &dyn CommandRunner, dump_dir: &Path) -> Result<DbRunResult> {
    // Resolve the local side before touching the cloud database.
    env.local()?;

    let mut steps = StepRunner::new("db", runner);
    let fresh = fresh_sequence(&mut steps, env)?;
    let connection_string = clone::clone_sequence(&mut steps, env, dump_dir)?;

    crate::log_success!("db", "Migration completed successfully");
    Ok(DbRunResult::new("migrate", &fresh.database, steps)
        .with_settings(fresh.settings)
        .with_connection_string(connection_string))
}

pub(crate) struct FreshSetup {
    pub database: String,
    pub settings: BTreeMap<String, String>,
    pub connection_string: String,
}

pub(crate) fn fresh_sequence(steps: &mut StepRunner<'_>, env: &DbEnv) -> Result<FreshSetup> {
    let target = env.cloud()?;
    let app = env.app_credentials()?;
    let max_connections = env.max_connections()?;
    let timeouts = env.timeouts()?;
    let db = target.name.as_str();

    if database_exists(steps, &target)? {
        crate::log_warning!("db", "Database '{}' already exists. Removing...", db);
        sql_step(
            steps,
            "Revoke new connections",
            &target,
            MAINTENANCE_DB,
            &queries::connection_limit(db, 0),
        )?;
        sql_step(
            steps,
            "Terminate existing connections",
            &target,
            MAINTENANCE_DB,
            &queries::terminate_backends(db),
        )?;
        sql_step(
            steps,
            "Drop existing database",
            &target,
            MAINTENANCE_DB,
            &queries::drop_database_force(db),
        )?;
    } else {
        crate::log_info!("db", "Database does not exist, proceeding with creation");
    }

    sql_step(
        steps,
        "Create fresh database",
        &target,
        MAINTENANCE_DB,
        &queries::create_database(db),
    )?;
    sql_step(
        steps,
        format!("Set connection limit to {}", max_connections),
        &target,
        MAINTENANCE_DB,
        &queries::connection_limit(db, max_connections),
    )?;
    sql_step(
        steps,
        "Set up extensions",
        &target,
        db,
        queries::CREATE_EXTENSIONS,
    )?;
    sql_step(
        steps,
        format!("Create {} user", app.user),
        &target,
        MAINTENANCE_DB,
        &queries::ensure_role(&app.user, &app.password),
    )?;
    sql_step(
        steps,
        format!("Grant permissions to {}", app.user),
        &target,
        db,
        &queries::grant_all(db, &app.user),
    )?;

    let settings = timeouts::apply(steps, &target, &app.user, &timeouts)?;

    let connection_string = target.connection_string(&app.user, Some(&app.password))?;
    announce_connection_string(&connection_string);

    Ok(FreshSetup {
        database: target.name.clone(),
        settings,
        connection_string,
    })
}
