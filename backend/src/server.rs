use std::{path::PathBuf, sync::Arc, time::Duration};

use aide::openapi::OpenApi;
use axum::{Extension, Router};
use plant_storage::{plant::PlantStore, user::UserStore};
use tokio::{net::TcpListener, signal};
use tower_http::{services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    jwt::JwtManager,
    media_storage::{MediaStore, PublicStorageUrl},
    routes,
    types::Environment,
};

/// Upper bound for a single request, uploads included
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Services shared by every request
#[derive(Clone)]
pub struct AppDependencies {
    pub plant_store: Arc<dyn PlantStore>,
    pub user_store: Arc<dyn UserStore>,
    pub media_store: Arc<dyn MediaStore>,
    pub jwt_manager: Arc<JwtManager>,
    pub storage_url: PublicStorageUrl,
    /// Served under `/storage` when images are kept on the local disk
    pub local_storage_root: Option<PathBuf>,
}

/// Builds the application router with docs, extensions and middleware attached
pub fn build_router(environment: Environment, dependencies: AppDependencies) -> Router {
    let mut openapi = OpenApi::default();

    let mut router = routes::handler().finish_api(&mut openapi);

    if let Some(root) = dependencies.local_storage_root {
        router = router.nest_service("/storage", ServeDir::new(root));
    }

    router
        .layer(Extension(openapi))
        .layer(Extension(environment))
        .layer(Extension(dependencies.plant_store))
        .layer(Extension(dependencies.user_store))
        .layer(Extension(dependencies.media_store))
        .layer(Extension(dependencies.jwt_manager))
        .layer(Extension(dependencies.storage_url))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
}

/// Starts the server with the given environment and dependencies
///
/// # Errors
///
/// Returns an error if the server fails to start or bind to the port
pub async fn start(environment: Environment, dependencies: AppDependencies) -> anyhow::Result<()> {
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], environment.port()?));
    let router = build_router(environment, dependencies);

    let listener = TcpListener::bind(&addr).await?;
    info!("🌱 Plants backend started on http://{addr}");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(anyhow::Error::from)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {err}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                tracing::error!("Failed to install terminate handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
