use std::sync::Arc;
use tokio::net::TcpListener;
use tourbook::mail::LogMailer;
use tourbook::payment::LocalCheckout;
use tourbook::{app, apply_migrations, AppConfig, AppState};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tourbook=info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "fatal startup failure");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    apply_migrations(&pool).await?;

    let bind_addr = config.bind_addr.clone();
    let state = AppState {
        pool,
        config: Arc::new(config),
        checkout: Arc::new(LocalCheckout),
        mailer: Arc::new(LogMailer),
    };

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
