use std::{net::SocketAddr, sync::Arc};

use tokio::signal;
use tracing::{info, warn};

use alumpro_api as api;
use api::auth::{AuthContext, InMemorySessionStore};
use api::entities::user::UserRole;
use api::notifications::LoggingDispatcher;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = api::config::load_config()?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);

    // Init DB
    let db_pool = api::db::establish_connection_from_app_config(&cfg).await?;
    if cfg.auto_migrate {
        api::db::run_migrations(&db_pool).await?;
    }
    let db_arc = Arc::new(db_pool);

    // Sessions: in-memory store; a production deployment plugs its own
    // SessionStore implementation in here.
    let sessions = Arc::new(InMemorySessionStore::new());
    if let Some(token) = cfg.bootstrap_admin_token.clone() {
        warn!("bootstrap admin token configured; intended for development only");
        sessions.insert(
            token,
            AuthContext {
                user_id: 0,
                role: UserRole::Admin,
                branch_id: None,
            },
        );
    }

    // Outbound notifications: log-only until a real transport is wired in.
    let dispatcher = Arc::new(LoggingDispatcher);

    let services = api::services::AppServices::new(db_arc.clone(), &cfg, dispatcher);

    let app_state = api::AppState {
        db: db_arc,
        config: cfg.clone(),
        services,
        sessions,
    };

    let app = api::app_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    info!("alumpro-api listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
