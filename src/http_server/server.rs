//! # HTTP Server
//!
//! The matchmaker gateway: route table, request tracing and the startup
//! sequence.
//!
//! The server starts `Initializing` with its routes built, waits for the
//! store to answer, and only then binds and moves to `Serving`. If the
//! store never answers, or the listener cannot be bound, it ends `Failed`.
//! There is no way back to `Initializing`.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};
use tracing::{error, info, Level};

use crate::sessions::SessionRepository;
use crate::store::{wait_for_connection, RetryPolicy, StorePool};

use super::config::HttpServerConfig;
use super::errors::ServerError;
use super::game_routes::{game_routes, GameState};
use super::health_routes::health_routes;

/// Gateway lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Routes registered, waiting for the store
    Initializing,
    /// Accepting connections
    Serving,
    /// Startup aborted: store unreachable or listener not bound
    Failed,
}

/// HTTP server for game sessions
pub struct GameServer {
    config: HttpServerConfig,
    pool: Arc<dyn StorePool>,
    retry: RetryPolicy,
    router: Router,
    state: watch::Sender<ServerState>,
}

impl GameServer {
    /// Create a server with the standard session lifetime
    pub fn new(config: HttpServerConfig, pool: Arc<dyn StorePool>) -> Self {
        let repository = SessionRepository::new(Arc::clone(&pool));
        Self::with_repository(config, pool, repository)
    }

    /// Create a server around an existing repository
    pub fn with_repository(
        config: HttpServerConfig,
        pool: Arc<dyn StorePool>,
        repository: SessionRepository,
    ) -> Self {
        let router = build_router(repository, Arc::clone(&pool));
        let (state, _) = watch::channel(ServerState::Initializing);
        Self {
            config,
            pool,
            retry: RetryPolicy::default(),
            router,
            state,
        }
    }

    /// Bound the startup wait for the store
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Current lifecycle state
    pub fn state(&self) -> ServerState {
        *self.state.borrow()
    }

    /// Watch lifecycle transitions
    pub fn subscribe(&self) -> watch::Receiver<ServerState> {
        self.state.subscribe()
    }

    /// Get the router (for testing)
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Wait for the store, bind the configured address and serve until Ctrl-C
    pub async fn start(self) -> Result<(), ServerError> {
        let addr: SocketAddr = match self.config.socket_addr().parse() {
            Ok(addr) => addr,
            Err(_) => return Err(self.fail(ServerError::InvalidAddress(self.socket_addr()))),
        };

        self.wait_for_store().await?;

        let listener = match TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(e) => return Err(self.fail(ServerError::Bind(e))),
        };
        self.serve(listener, shutdown_signal()).await
    }

    /// Wait for the store, then serve on `listener` until `shutdown` resolves
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.wait_for_store().await?;
        self.serve(listener, shutdown).await
    }

    async fn wait_for_store(&self) -> Result<(), ServerError> {
        info!(version = crate::VERSION, addr = %self.config.socket_addr(), "starting server");

        wait_for_connection(self.pool.as_ref(), &self.retry)
            .await
            .map_err(|e| self.fail(ServerError::StoreUnavailable(e)))
    }

    /// Publish the terminal `Failed` state for a startup error
    fn fail(&self, err: ServerError) -> ServerError {
        error!(error = %err, "aborting startup");
        self.state.send_replace(ServerState::Failed);
        err
    }

    async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local = listener.local_addr().map_err(ServerError::Bind)?;
        self.state.send_replace(ServerState::Serving);
        info!(addr = %local, "serving");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(ServerError::Serve)
    }
}

/// Build the route table
pub fn build_router(repository: SessionRepository, pool: Arc<dyn StorePool>) -> Router {
    Router::new()
        .merge(game_routes(Arc::new(GameState::new(repository))))
        .merge(health_routes(pool))
        .layer(
            TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::new().level(Level::INFO)),
        )
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
