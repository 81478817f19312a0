use minigame_arena::assets::{FsAssetStore, JsonCatalogSource, ResourceLoader};
use minigame_arena::remote::{
    CredentialBroker, HttpRemote, LoggingRemote, RemoteSubmitter, StaticToken,
    SubmissionDispatcher,
};
use minigame_arena::scoring::{FileBlobStore, ScoringService};
use minigame_arena::{router, start_clock, AppState, ArenaConfig, ArenaController};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "minigame_arena=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ArenaConfig::from_env();
    info!(
        data_dir = %config.data_dir.display(),
        asset_dir = %config.asset_dir.display(),
        "Starting minigame arena"
    );

    let loader = ResourceLoader::new(
        Arc::new(JsonCatalogSource::new(config.data_dir.clone())),
        Arc::new(FsAssetStore::new(config.asset_dir.clone())),
    );
    let scoring = ScoringService::new(Arc::new(FileBlobStore::new(config.store_dir())));
    let broker = CredentialBroker::new(
        Arc::new(StaticToken(config.session_token.clone())),
        Arc::new(StaticToken(config.challenge_token.clone())),
    );
    let remote: Arc<dyn RemoteSubmitter> = match &config.api_base {
        Some(base) => match HttpRemote::new(base.as_str(), config.api_timeout) {
            Ok(remote) => {
                info!(api_base = %base, "Mirroring submissions to remote server");
                Arc::new(remote)
            }
            Err(e) => {
                error!(api_base = %base, error = %e, "Failed to build submission client");
                return;
            }
        },
        None => {
            info!("ARENA_API_BASE not set, submissions are only logged");
            Arc::new(LoggingRemote)
        }
    };
    let dispatcher = SubmissionDispatcher::new(remote, Arc::new(broker));

    let bind_addr = config.bind_addr.clone();
    let tick_interval = config.tick_interval;
    let controller = Arc::new(ArenaController::new(
        config,
        Arc::new(loader),
        Arc::new(scoring),
        dispatcher,
    ));

    if let Some(session) = controller.restore().await {
        info!(phase = ?session.phase, "Resumed saved progress");
    }
    let clock = start_clock(Arc::clone(&controller), tick_interval);

    let app = router(AppState::new(controller));

    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(%bind_addr, error = %e, "Failed to bind");
            return;
        }
    };
    info!("Server running on http://{}", bind_addr);
    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "Server stopped");
    }
    clock.cancel();
}
