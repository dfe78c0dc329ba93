use clap::Args;
use gatehouse_app::{auth::RoleName, database};
use sqlx::{query, query_scalar};

#[derive(Debug, Args)]
pub(crate) struct EnsureServerRoleArgs {
    /// Administrative PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Constrained role used by the API server
    #[arg(long, env = "DB_SERVER_ROLE", default_value = "gatehouse_server")]
    role_name: RoleName,

    /// Role given to requests without a session token
    #[arg(long, env = "PUBLIC_ROLE", default_value = "anonymous")]
    public_role: RoleName,
}

pub(crate) async fn run(args: EnsureServerRoleArgs) -> Result<(), String> {
    let pool = database::connect(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|error| format!("failed to start transaction: {error}"))?;

    let role_ident: String = query_scalar("SELECT quote_ident($1)")
        .bind(args.role_name.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|error| format!("failed to quote role_name: {error}"))?;

    let public_ident: String = query_scalar("SELECT quote_ident($1)")
        .bind(args.public_role.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|error| format!("failed to quote public_role: {error}"))?;

    // The server role gets no password here; one is minted on every server start.
    let flags = "NOSUPERUSER NOCREATEDB NOCREATEROLE NOREPLICATION NOBYPASSRLS";

    for (ident, name, login) in [
        (&role_ident, &args.role_name, "LOGIN"),
        (&public_ident, &args.public_role, "NOLOGIN"),
    ] {
        let exists: bool =
            query_scalar("SELECT EXISTS (SELECT 1 FROM pg_roles WHERE rolname = $1)")
                .bind(name.as_str())
                .fetch_one(&mut *tx)
                .await
                .map_err(|error| format!("failed to check role existence: {error}"))?;

        let verb = if exists { "ALTER" } else { "CREATE" };

        query(&format!("{verb} ROLE {ident} {login} {flags}"))
            .execute(&mut *tx)
            .await
            .map_err(|error| format!("failed to create/update role {name}: {error}"))?;
    }

    let database_ident: String = query_scalar("SELECT quote_ident(current_database())")
        .fetch_one(&mut *tx)
        .await
        .map_err(|error| format!("failed to resolve database name: {error}"))?;

    let grant_sql = [
        format!("GRANT CONNECT ON DATABASE {database_ident} TO {role_ident}"),
        format!("GRANT USAGE ON SCHEMA public TO {role_ident}, {public_ident}"),
        format!(
            "GRANT SELECT, INSERT, UPDATE, DELETE ON ALL TABLES IN SCHEMA public TO {role_ident}"
        ),
        format!("GRANT USAGE, SELECT, UPDATE ON ALL SEQUENCES IN SCHEMA public TO {role_ident}"),
        format!(
            "ALTER DEFAULT PRIVILEGES IN SCHEMA public GRANT SELECT, INSERT, UPDATE, DELETE ON TABLES TO {role_ident}"
        ),
        format!(
            "ALTER DEFAULT PRIVILEGES IN SCHEMA public GRANT USAGE, SELECT, UPDATE ON SEQUENCES TO {role_ident}"
        ),
        format!("GRANT {public_ident} TO {role_ident}"),
    ];

    for sql in grant_sql {
        query(&sql)
            .execute(&mut *tx)
            .await
            .map_err(|error| format!("failed to apply grant/default privilege `{sql}`: {error}"))?;
    }

    tx.commit()
        .await
        .map_err(|error| format!("failed to commit changes: {error}"))?;

    println!("ensured server role: {}", args.role_name);
    println!("ensured public role: {}", args.public_role);

    Ok(())
}
