use clap::Parser;
use dotenvy::dotenv;
use pizza_api::config::{Cli, Commands, ServeArgs};
use pizza_api::{app, AppState};
use pizza_store::{database_url_from_env, establish_connection, run_migrations, seed};
use tracing::info;
use tracing_subscriber::EnvFilter;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let database_url = database_url_from_env()?;

    match cli.command {
        Some(Commands::Migrate) => {
            run_migrations(&mut establish_connection(&database_url)?)?;
            info!(%database_url, "database is up to date");
            Ok(())
        }
        Some(Commands::Seed) => {
            let conn = &mut establish_connection(&database_url)?;
            run_migrations(conn)?;
            seed::run(conn)?;
            Ok(())
        }
        Some(Commands::Serve(args)) => serve(args, database_url).await,
        None => serve(cli.serve, database_url).await,
    }
}

async fn serve(args: ServeArgs, database_url: String) -> Result<(), BoxError> {
    run_migrations(&mut establish_connection(&database_url)?)?;

    let app = app(AppState::new(database_url.as_str()));

    let listener = tokio::net::TcpListener::bind(args.socket_addr()).await?;
    info!(%database_url, "Pizza API listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
