//! SQL statements issued by the database operations.
//!
//! Names are always emitted through [`quote_ident`] and values through
//! [`quote_literal`].

use crate::utils::sql::{quote_ident, quote_literal};

pub const SELECT_VERSION: &str = "SELECT version();";

pub const LIST_DATABASES: &str = "SELECT datname, pg_size_pretty(pg_database_size(datname)) AS size \
     FROM pg_database ORDER BY datname;";

pub fn database_exists(db: &str) -> String {
    format!(
        "SELECT 1 FROM pg_database WHERE datname = {};",
        quote_literal(db)
    )
}

pub fn create_database(db: &str) -> String {
    format!("CREATE DATABASE {};", quote_ident(db))
}

pub fn drop_database(db: &str) -> String {
    format!("DROP DATABASE {};", quote_ident(db))
}

pub fn drop_database_if_exists(db: &str) -> String {
    format!("DROP DATABASE IF EXISTS {};", quote_ident(db))
}

pub fn drop_database_force(db: &str) -> String {
    format!("DROP DATABASE IF EXISTS {} WITH (FORCE);", quote_ident(db))
}

pub fn connection_limit(db: &str, limit: u32) -> String {
    format!(
        "ALTER DATABASE {} CONNECTION LIMIT {};",
        quote_ident(db),
        limit
    )
}

pub fn terminate_backends(db: &str) -> String {
    format!(
        "SELECT pg_terminate_backend(pid) FROM pg_stat_activity \
         WHERE datname = {} AND pid <> pg_backend_pid();",
        quote_literal(db)
    )
}

pub fn owner_to(db: &str, role: &str) -> String {
    format!(
        "ALTER DATABASE {} OWNER TO {};",
        quote_ident(db),
        quote_ident(role)
    )
}

pub fn public_schema(role: &str) -> String {
    format!(
        "CREATE SCHEMA IF NOT EXISTS public; GRANT ALL ON SCHEMA public TO {};",
        quote_ident(role)
    )
}

pub const CREATE_EXTENSIONS: &str =
    "CREATE EXTENSION IF NOT EXISTS \"uuid-ossp\"; CREATE EXTENSION IF NOT EXISTS \"hstore\";";

/// Create a login role unless it already exists.
pub fn ensure_role(role: &str, password: &str) -> String {
    format!(
        "DO $do$ BEGIN \
         IF NOT EXISTS (SELECT FROM pg_catalog.pg_roles WHERE rolname = {}) THEN \
         CREATE USER {} WITH PASSWORD {}; \
         END IF; \
         END $do$;",
        quote_literal(role),
        quote_ident(role),
        quote_literal(password)
    )
}

/// Database, table and sequence privileges for `role`, including defaults
/// for objects created later.
pub fn grant_all(db: &str, role: &str) -> String {
    let role = quote_ident(role);
    format!(
        "GRANT ALL PRIVILEGES ON DATABASE {db} TO {role}; \
         GRANT ALL PRIVILEGES ON ALL TABLES IN SCHEMA public TO {role}; \
         GRANT ALL PRIVILEGES ON ALL SEQUENCES IN SCHEMA public TO {role}; \
         ALTER DEFAULT PRIVILEGES IN SCHEMA public GRANT ALL PRIVILEGES ON TABLES TO {role}; \
         ALTER DEFAULT PRIVILEGES IN SCHEMA public GRANT ALL PRIVILEGES ON SEQUENCES TO {role};",
        db = quote_ident(db),
        role = role
    )
}

/// Hand the restored `public` schema and its objects to `role`.
pub fn own_public_schema(role: &str) -> String {
    let role = quote_ident(role);
    format!(
        "ALTER SCHEMA public OWNER TO {role}; \
         GRANT ALL PRIVILEGES ON ALL TABLES IN SCHEMA public TO {role}; \
         GRANT ALL PRIVILEGES ON ALL SEQUENCES IN SCHEMA public TO {role}; \
         ALTER DEFAULT PRIVILEGES IN SCHEMA public GRANT ALL PRIVILEGES ON TABLES TO {role}; \
         ALTER DEFAULT PRIVILEGES IN SCHEMA public GRANT ALL PRIVILEGES ON SEQUENCES TO {role};",
        role = role
    )
}

pub fn set_database_param(db: &str, param: &str, value: &str) -> String {
    format!(
        "ALTER DATABASE {} SET {} = {};",
        quote_ident(db),
        param,
        quote_literal(value)
    )
}

pub fn set_role_param(role: &str, param: &str, value: &str) -> String {
    format!(
        "ALTER ROLE {} SET {} = {};",
        quote_ident(role),
        param,
        quote_literal(value)
    )
}

pub fn set_system_param(param: &str, value: &str) -> String {
    format!("ALTER SYSTEM SET {} = {};", param, quote_literal(value))
}

pub fn set_system_number(param: &str, value: u32) -> String {
    format!("ALTER SYSTEM SET {} = {};", param, value)
}

pub fn show(param: &str) -> String {
    format!("SHOW {};", param)
}

pub fn list_connections(db: &str) -> String {
    format!(
        "SELECT pid, usename, application_name, client_addr, backend_start, state, query \
         FROM pg_stat_activity WHERE datname = {};",
        quote_literal(db)
    )
}

pub fn remaining_connections(db: &str) -> String {
    format!(
        "SELECT pid, usename, application_name, client_addr \
         FROM pg_stat_activity WHERE datname = {};",
        quote_literal(db)
    )
}

pub fn count_connections(db: &str) -> String {
    format!(
        "SELECT COUNT(*) FROM pg_stat_activity WHERE datname = {};",
        quote_literal(db)
    )
}

pub fn connection_status(db: &str) -> String {
    format!(
        "SELECT current_setting('max_connections') AS max_connections, \
         (SELECT count(*) FROM pg_stat_activity WHERE datname = {}) AS current_connections;",
        quote_literal(db)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_quoted_as_identifiers() {
        assert_eq!(create_database("my-app"), "CREATE DATABASE \"my-app\";");
        assert_eq!(
            connection_limit("app", 0),
            "ALTER DATABASE \"app\" CONNECTION LIMIT 0;"
        );
    }

    #[test]
    fn lookups_use_literals() {
        assert_eq!(
            database_exists("o'neil"),
            "SELECT 1 FROM pg_database WHERE datname = 'o''neil';"
        );
    }

    #[test]
    fn ensure_role_quotes_name_and_password() {
        let sql = ensure_role("payload", "pa'ss");
        assert!(sql.contains("rolname = 'payload'"));
        assert!(sql.contains("CREATE USER \"payload\" WITH PASSWORD 'pa''ss';"));
    }

    #[test]
    fn timeout_values_are_literals_and_keepalives_numbers() {
        assert_eq!(
            set_database_param("app", "statement_timeout", "15s"),
            "ALTER DATABASE \"app\" SET statement_timeout = '15s';"
        );
        assert_eq!(
            set_system_number("tcp_keepalives_idle", 60),
            "ALTER SYSTEM SET tcp_keepalives_idle = 60;"
        );
    }
}
