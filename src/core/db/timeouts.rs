//! Statement, idle and TCP keepalive settings on the cloud database.

use std::collections::BTreeMap;

use super::{queries, sql_step, DbEnv, DbRunResult, DbTarget, TimeoutSettings};
use crate::error::Result;
use crate::runner::CommandRunner;
use crate::steps::StepRunner;

/// Settings reported back after they have been applied.
pub const REPORTED_SETTINGS: [&str; 6] = [
    "statement_timeout",
    "idle_in_transaction_session_timeout",
    "idle_session_timeout",
    "tcp_keepalives_idle",
    "tcp_keepalives_interval",
    "tcp_keepalives_count",
];

pub fn set_timeouts(env: &DbEnv, runner: &dyn CommandRunner) -> Result<DbRunResult> {
    let target = env.cloud()?;
    let app = env.app_credentials()?;
    let timeouts = env.timeouts()?;
    let mut steps = StepRunner::new("db", runner);

    let settings = apply(&mut steps, &target, &app.user, &timeouts)?;

    Ok(DbRunResult::new("set-timeouts", &target.name, steps).with_settings(settings))
}

/// Each statement runs as its own `psql -c` call; `ALTER SYSTEM` cannot run
/// inside a multi-statement transaction.
pub(crate) fn apply(
    steps: &mut StepRunner<'_>,
    target: &DbTarget,
    app_user: &str,
    timeouts: &TimeoutSettings,
) -> Result<BTreeMap<String, String>> {
    let db = target.name.as_str();
    let statements = [
        (
            format!("Set statement_timeout = {}", timeouts.statement),
            queries::set_database_param(db, "statement_timeout", &timeouts.statement),
        ),
        (
            format!(
                "Set idle_in_transaction_session_timeout = {}",
                timeouts.idle_transaction
            ),
            queries::set_database_param(
                db,
                "idle_in_transaction_session_timeout",
                &timeouts.idle_transaction,
            ),
        ),
        (
            format!("Set idle_session_timeout for {}", target.user),
            queries::set_role_param(&target.user, "idle_session_timeout", &timeouts.idle_session),
        ),
        (
            format!("Set idle_session_timeout for {}", app_user),
            queries::set_role_param(app_user, "idle_session_timeout", &timeouts.idle_session),
        ),
        (
            format!("Set system idle_session_timeout = {}", timeouts.master_idle),
            queries::set_system_param("idle_session_timeout", &timeouts.master_idle),
        ),
        (
            format!("Set tcp_keepalives_idle = {}", timeouts.tcp_keepalives_idle),
            queries::set_system_number("tcp_keepalives_idle", timeouts.tcp_keepalives_idle),
        ),
        (
            format!(
                "Set tcp_keepalives_interval = {}",
                timeouts.tcp_keepalives_interval
            ),
            queries::set_system_number(
                "tcp_keepalives_interval",
                timeouts.tcp_keepalives_interval,
            ),
        ),
        (
            format!("Set tcp_keepalives_count = {}", timeouts.tcp_keepalives_count),
            queries::set_system_number("tcp_keepalives_count", timeouts.tcp_keepalives_count),
        ),
    ];

    for (name, sql) in &statements {
        sql_step(steps, name.as_str(), target, db, sql)?;
    }

    let settings = steps.step("Read current timeout settings", |r| {
        let mut settings = BTreeMap::new();
        for param in REPORTED_SETTINGS {
            let value = r.run(&target.psql_scalar(db, &queries::show(param)))?;
            settings.insert(param.to_string(), value);
        }
        Ok(settings)
    })?;

    for (param, value) in &settings {
        crate::log_info!("db", "{} = {}", param, value);
    }

    Ok(settings)
}
