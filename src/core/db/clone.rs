//! Copy a database between the local and cloud instances with
//! `pg_dump -Fd` / `pg_restore`.

use std::path::Path;

use super::{
    announce_connection_string, queries, sql_step, DbEnv, DbRunResult, DbTarget, MAINTENANCE_DB,
};
use crate::error::Result;
use crate::runner::CommandRunner;
use crate::steps::StepRunner;
use crate::utils::io;

const POSTGRES_ROLE: &str = "postgres";

/// Replace the cloud database with a copy of the local one.
pub fn clone(env: &DbEnv, runner: &dyn CommandRunner, dump_dir: &Path) -> Result<DbRunResult> {
    let database = env.cloud()?.name;
    let mut steps = StepRunner::new("db", runner);
    let connection_string = clone_sequence(&mut steps, env, dump_dir)?;

    crate::log_success!("db", "Database clone completed successfully");
    Ok(DbRunResult::new("clone", &database, steps).with_connection_string(connection_string))
}

/// Replace the local database with a copy of the cloud one. The cloud
/// database is only read.
pub fn migrate_reverse(
    env: &DbEnv,
    runner: &dyn CommandRunner,
    dump_dir: &Path,
) -> Result<DbRunResult> {
    let cloud = env.cloud()?;
    let local = env.local()?;
    let mut steps = StepRunner::new("db", runner);

    let connection_string = with_dump_dir(dump_dir, || {
        transfer(&mut steps, &cloud, &local, dump_dir)?;
        sql_step(
            &mut steps,
            "Set up local permissions",
            &local,
            &local.name,
            &queries::own_public_schema(&local.user),
        )?;
        local.connection_string(&local.user, local.password.as_deref())
    })?;
    announce_connection_string(&connection_string);

    crate::log_success!("db", "Reverse migration completed successfully");
    Ok(DbRunResult::new("migrate-reverse", &local.name, steps)
        .with_connection_string(connection_string))
}

pub(crate) fn clone_sequence(
    steps: &mut StepRunner<'_>,
    env: &DbEnv,
    dump_dir: &Path,
) -> Result<String> {
    let local = env.local()?;
    let cloud = env.cloud()?;
    let app = env.app_credentials()?;

    let connection_string = with_dump_dir(dump_dir, || {
        transfer(steps, &local, &cloud, dump_dir)?;

        let db = cloud.name.as_str();
        sql_step(
            steps,
            format!("Grant privileges to {}", POSTGRES_ROLE),
            &cloud,
            db,
            &queries::own_public_schema(POSTGRES_ROLE),
        )?;
        sql_step(
            steps,
            format!("Create {} user", app.user),
            &cloud,
            MAINTENANCE_DB,
            &queries::ensure_role(&app.user, &app.password),
        )?;
        sql_step(
            steps,
            format!("Grant privileges to {}", app.user),
            &cloud,
            db,
            &queries::grant_all(db, &app.user),
        )?;

        cloud.connection_string(&app.user, Some(&app.password))
    })?;
    announce_connection_string(&connection_string);

    Ok(connection_string)
}

/// Dump `source`, recreate `dest` and restore into it.
fn transfer(
    steps: &mut StepRunner<'_>,
    source: &DbTarget,
    dest: &DbTarget,
    dump_dir: &Path,
) -> Result<()> {
    steps.step(format!("Dump {} database", source.label), |r| {
        r.run(&source.pg_dump(dump_dir)).map(|_| ())
    })?;
    sql_step(
        steps,
        format!("Terminate connections to {} database", dest.label),
        dest,
        MAINTENANCE_DB,
        &queries::terminate_backends(&dest.name),
    )?;
    sql_step(
        steps,
        format!("Drop {} database", dest.label),
        dest,
        MAINTENANCE_DB,
        &queries::drop_database_if_exists(&dest.name),
    )?;
    sql_step(
        steps,
        format!("Create {} database", dest.label),
        dest,
        MAINTENANCE_DB,
        &queries::create_database(&dest.name),
    )?;
    steps.step(format!("Restore dump to {} database", dest.label), |r| {
        r.run(&dest.pg_restore(dump_dir)).map(|_| ())
    })?;
    steps.step("Remove dump directory", |_| {
        io::remove_dir_if_exists(dump_dir, "remove dump directory")
    })
}

/// Run `f` with an empty dump directory location. The directory is removed
/// again if `f` fails.
fn with_dump_dir<T, F>(dump_dir: &Path, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    io::remove_dir_if_exists(dump_dir, "clear dump directory")?;
    if let Some(parent) = dump_dir.parent() {
        io::ensure_dir(parent, "create dump parent directory")?;
    }

    let result = f();

    if result.is_err() {
        if let Err(cleanup) = io::remove_dir_if_exists(dump_dir, "remove dump directory") {
            crate::log_warning!("db", "Could not remove {}: {}", dump_dir.display(), cleanup);
        }
    }

    result
}
