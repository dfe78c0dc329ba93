//! Database Config

use clap::Args;
use gatehouse_app::settings::DatabaseSettings;

/// Database settings.
///
/// The administrative identity is only used during startup to rotate the
/// server role's password.
#[derive(Debug, Args)]
pub struct DatabaseConfig {
    /// Database server host
    #[arg(
        id = "db_host",
        long = "db-host",
        env = "DB_HOST",
        default_value = "localhost"
    )]
    pub host: String,

    /// Database server port
    #[arg(
        id = "db_port",
        long = "db-port",
        env = "DB_PORT",
        default_value_t = 5432
    )]
    pub port: u16,

    /// Database name
    #[arg(
        id = "db_name",
        long = "db-name",
        env = "DB_NAME",
        default_value = "gatehouse"
    )]
    pub name: String,

    /// Connect without TLS
    #[arg(
        id = "db_disable_tls",
        long = "db-disable-tls",
        env = "DB_DISABLE_TLS",
        default_value_t = false
    )]
    pub disable_tls: bool,

    /// Administrative role
    #[arg(
        id = "db_admin_user",
        long = "db-admin-user",
        env = "DB_ADMIN_USER",
        default_value = "postgres"
    )]
    pub admin_user: String,

    /// Administrative role password
    #[arg(
        id = "db_admin_password",
        long = "db-admin-password",
        env = "DB_ADMIN_PASSWORD",
        default_value = "",
        hide_env_values = true
    )]
    pub admin_password: String,

    /// Constrained role used to serve requests
    #[arg(
        id = "db_server_role",
        long = "db-server-role",
        env = "DB_SERVER_ROLE",
        default_value = "gatehouse_server"
    )]
    pub server_role: String,
}

impl DatabaseConfig {
    pub fn settings(&self) -> DatabaseSettings {
        DatabaseSettings {
            host: self.host.clone(),
            port: self.port,
            name: self.name.clone(),
            disable_tls: self.disable_tls,
            admin_user: self.admin_user.clone(),
            admin_password: self.admin_password.clone(),
            server_role: self.server_role.clone(),
        }
    }
}
