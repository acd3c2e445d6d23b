//! AuthGate - account registration and login service
//! Mission: Hand out signed 24-hour tokens to users who prove their password

use anyhow::{Context, Result};
use authgate_backend::{
    api,
    auth::{AuthService, AuthState, UserStore},
    config::ServerArgs,
};
use clap::Parser;
use dotenv::dotenv;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing();

    // Fails fast when JWT_SECRET or BCRYPT_ROUNDS is missing
    let args = ServerArgs::parse();
    let auth_config = args.auth_config().context("Invalid auth configuration")?;

    info!("🚀 AuthGate starting");
    info!("🔐 bcrypt cost: {}", auth_config.bcrypt_cost());

    let user_store = Arc::new(UserStore::new(&args.db_path)?);
    user_store
        .seed_roles(&args.seed_roles)
        .await
        .context("Failed to seed roles")?;

    info!("📊 Auth database initialized at: {}", args.db_path);

    let service = Arc::new(AuthService::new(
        user_store.clone(),
        user_store,
        &auth_config,
    ));
    let app = api::create_router(AuthState::new(service));

    let listener = TcpListener::bind(args.bind_addr).await?;
    info!("🎯 API server listening on {}", args.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "authgate_backend=debug,authgate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // Standard dotenv search (cwd + parents)
    let _ = dotenv();

    // Also try the crate's own .env when launched from elsewhere
    let manifest_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if manifest_env.exists() {
        let _ = dotenv::from_path(&manifest_env);
    }
}
