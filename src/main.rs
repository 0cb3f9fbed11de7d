use prompt_market_server::{config::Config, create_app, database::Database, handlers::AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "prompt_market_server=info,tower_http=info".into()
        }))
        .init();

    let config = Config::from_env()?;

    let database = Database::new(&config.database_url).await?;
    database.migrate().await?;
    tracing::info!("connected to database");

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("listening on {}", addr);

    let app = create_app(AppState { database, config });
    axum::serve(listener, app).await?;

    Ok(())
}
