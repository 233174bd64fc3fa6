//! Close all client connections to the cloud database.

use std::time::Duration;

use super::{queries, sql_step, DbEnv, DbRunResult, DbTarget, MAINTENANCE_DB};
use crate::error::{Error, Result};
use crate::runner::CommandRunner;
use crate::steps::StepRunner;

/// Wait between terminating backends and recounting them.
pub const SETTLE_DELAY: Duration = Duration::from_secs(2);

pub fn close_connections(
    env: &DbEnv,
    runner: &dyn CommandRunner,
    settle: Duration,
) -> Result<DbRunResult> {
    let target = env.cloud()?;
    let max_connections = env.max_connections()?;
    let mut steps = StepRunner::new("db", runner);

    let listing = steps.step("List current connections", |r| {
        r.run(&target.psql(MAINTENANCE_DB, &queries::list_connections(&target.name)))
    })?;
    crate::log::rule();
    crate::log_info!("db", "{}", listing);
    crate::log::rule();

    let found = count(&mut steps, &target, "Count active connections")?;
    crate::log_info!("db", "Found {} active connections", found);

    if found > 0 {
        crate::log_warning!("db", "Proceeding to close all connections");
        sql_step(
            &mut steps,
            "Set connection limit to 0",
            &target,
            MAINTENANCE_DB,
            &queries::connection_limit(&target.name, 0),
        )?;
        sql_step(
            &mut steps,
            "Terminate existing connections",
            &target,
            MAINTENANCE_DB,
            &queries::terminate_backends(&target.name),
        )?;

        if !settle.is_zero() {
            std::thread::sleep(settle);
        }

        let remaining = count(&mut steps, &target, "Verify connections are closed")?;
        if remaining > 0 {
            crate::log_error!(
                "db",
                "Some connections could not be closed ({} remaining)",
                remaining
            );
            let mut err = Error::connections_remaining(&target.name, remaining);
            // A failed listing is logged by the step; the remaining count still wins.
            if let Ok(still_open) = steps.step("List remaining connections", |r| {
                r.run(&target.psql(MAINTENANCE_DB, &queries::remaining_connections(&target.name)))
            }) {
                crate::log_info!("db", "{}", still_open);
                err.details["connections"] = serde_json::Value::String(still_open);
            }
            return Err(err);
        }

        sql_step(
            &mut steps,
            format!("Restore connection limit to {}", max_connections),
            &target,
            MAINTENANCE_DB,
            &queries::connection_limit(&target.name, max_connections),
        )?;
    } else {
        crate::log_success!("db", "No active connections found");
    }

    let status = steps.step("Read final connection status", |r| {
        r.run(&target.psql(MAINTENANCE_DB, &queries::connection_status(&target.name)))
    })?;

    let mut result = DbRunResult::new("close-connections", &target.name, steps).with_output(status);
    result.connections_found = Some(found);
    Ok(result)
}

fn count(steps: &mut StepRunner<'_>, target: &DbTarget, name: &str) -> Result<u32> {
    let sql = queries::count_connections(&target.name);
    steps.step(name, |r| {
        let out = r.run(&target.psql_scalar(MAINTENANCE_DB, &sql))?;
        out.trim().parse::<u32>().map_err(|_| {
            Error::internal_unexpected(format!(
                "Failed to parse connection count from '{}'",
                out.trim()
            ))
        })
    })
}
