use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use deckwise::{app, config, db, state::AppState};

#[tokio::main]
async fn main() {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "deckwise=debug,tower_http=debug".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = config::load();

  let pool = match db::init_db(&config.database_path) {
    Ok(pool) => pool,
    Err(e) => {
      tracing::error!(
        "Failed to initialize database {}: {}",
        config.database_path.display(),
        e
      );
      std::process::exit(1);
    }
  };

  let app = app::router(AppState::new(pool, &config));

  let bind_addr = config.bind_addr();
  let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
    Ok(listener) => listener,
    Err(e) => {
      tracing::error!("Failed to bind to {}: {}", bind_addr, e);
      std::process::exit(1);
    }
  };

  tracing::info!("Server running on http://{}", bind_addr);

  if let Err(e) = axum::serve(listener, app).await {
    tracing::error!("Server error: {}", e);
    std::process::exit(1);
  }
}
