//! Single-purpose operations on the cloud database.

use super::{database_exists, queries, sql_step, DbEnv, DbRunResult, MAINTENANCE_DB};
use crate::error::Result;
use crate::runner::CommandRunner;
use crate::steps::StepRunner;

/// `SELECT version();` against the maintenance database.
pub fn test_connection(env: &DbEnv, runner: &dyn CommandRunner) -> Result<DbRunResult> {
    let target = env.cloud()?;
    let mut steps = StepRunner::new("db", runner);

    let version = steps.step("Test database connection", |r| {
        r.run(&target.psql_scalar(MAINTENANCE_DB, queries::SELECT_VERSION))
    })?;
    crate::log_info!("db", "{}", version);

    Ok(DbRunResult::new("test", &target.name, steps).with_output(version))
}

pub fn list(env: &DbEnv, runner: &dyn CommandRunner) -> Result<DbRunResult> {
    let target = env.cloud()?;
    let mut steps = StepRunner::new("db", runner);

    let listing = steps.step("List databases", |r| {
        r.run(&target.psql(MAINTENANCE_DB, queries::LIST_DATABASES))
    })?;

    Ok(DbRunResult::new("list", &target.name, steps).with_output(listing))
}

pub fn create(env: &DbEnv, runner: &dyn CommandRunner) -> Result<DbRunResult> {
    let target = env.cloud()?;
    let max_connections = env.max_connections()?;
    let mut steps = StepRunner::new("db", runner);

    if database_exists(&mut steps, &target)? {
        crate::log_warning!("db", "Database '{}' already exists", target.name);
        steps.skip("Create database", "database already exists");
        return Ok(DbRunResult::new("create", &target.name, steps));
    }

    sql_step(
        &mut steps,
        "Create database",
        &target,
        MAINTENANCE_DB,
        &queries::create_database(&target.name),
    )?;
    sql_step(
        &mut steps,
        format!("Set connection limit to {}", max_connections),
        &target,
        MAINTENANCE_DB,
        &queries::connection_limit(&target.name, max_connections),
    )?;

    Ok(DbRunResult::new("create", &target.name, steps))
}

pub fn reset(env: &DbEnv, runner: &dyn CommandRunner) -> Result<DbRunResult> {
    let target = env.cloud()?;
    let mut steps = StepRunner::new("db", runner);

    if !database_exists(&mut steps, &target)? {
        crate::log_warning!("db", "Database '{}' does not exist", target.name);
        steps.skip("Reset database", "database does not exist");
        return Ok(DbRunResult::new("reset", &target.name, steps));
    }

    sql_step(
        &mut steps,
        "Drop database",
        &target,
        MAINTENANCE_DB,
        &queries::drop_database(&target.name),
    )?;
    sql_step(
        &mut steps,
        "Create database",
        &target,
        MAINTENANCE_DB,
        &queries::create_database(&target.name),
    )?;

    Ok(DbRunResult::new("reset", &target.name, steps))
}

/// Transfer ownership of the cloud database to the application user.
pub fn register(env: &DbEnv, runner: &dyn CommandRunner) -> Result<DbRunResult> {
    let target = env.cloud()?;
    let app = env.app_credentials()?;
    let mut steps = StepRunner::new("db", runner);

    if !database_exists(&mut steps, &target)? {
        crate::log_warning!("db", "Database '{}' does not exist", target.name);
        steps.skip("Register database", "database does not exist");
        return Ok(DbRunResult::new("register", &target.name, steps));
    }

    sql_step(
        &mut steps,
        format!("Register database {}", target.name),
        &target,
        MAINTENANCE_DB,
        &queries::owner_to(&target.name, &app.user),
    )?;

    Ok(DbRunResult::new("register", &target.name, steps))
}

/// Ensure the `public` schema exists and belongs to the application user.
pub fn schema(env: &DbEnv, runner: &dyn CommandRunner) -> Result<DbRunResult> {
    let target = env.cloud()?;
    let app = env.app_credentials()?;
    let mut steps = StepRunner::new("db", runner);

    if !database_exists(&mut steps, &target)? {
        crate::log_warning!("db", "Database '{}' does not exist", target.name);
        steps.skip("Create schema", "database does not exist");
        return Ok(DbRunResult::new("schema", &target.name, steps));
    }

    sql_step(
        &mut steps,
        "Create schema",
        &target,
        &target.name,
        &queries::public_schema(&app.user),
    )?;

    Ok(DbRunResult::new("schema", &target.name, steps))
}
