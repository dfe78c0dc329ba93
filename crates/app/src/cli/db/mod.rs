use clap::{Args, Subcommand};

mod ensure_server_role;
mod migrate;

#[derive(Debug, Args)]
pub(crate) struct DbCommand {
    #[command(subcommand)]
    command: DbSubcommand,
}

#[derive(Debug, Subcommand)]
enum DbSubcommand {
    Migrate(migrate::MigrateArgs),
    EnsureServerRole(ensure_server_role::EnsureServerRoleArgs),
}

pub(crate) async fn run(command: DbCommand) -> Result<(), String> {
    match command.command {
        DbSubcommand::Migrate(args) => migrate::run(args).await,
        DbSubcommand::EnsureServerRole(args) => ensure_server_role::run(args).await,
    }
}
