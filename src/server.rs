use std::{net::SocketAddr, ops::Deref, sync::Arc, time::Duration};

use axum::{
    extract::{FromRef, State},
    response::IntoResponse,
    routing, Json, Router,
};
use error_stack::{Report, ResultExt};
use futures::{Future, FutureExt};
use tokio::{net::TcpListener, signal};
use tower_http::{
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{event, Level};

use crate::{
    admin::photo::PhotoAdmin,
    auth::{permissions::list_permissions, Authed, UserDirectory},
    errors::{panic_handler, WrapReport},
    event_log::EventLogSink,
    models, Error,
};

/// Shared state used by the server
pub struct ServerStateInner {
    /// If the app is running in production mode. This should be used sparingly as there should
    /// be a minimum of difference between production and development to prevent surprises.
    pub production: bool,
    pub photo_admin: PhotoAdmin,
    pub users: Arc<dyn UserDirectory>,
    /// The audit trail, exposed read-only to superusers
    pub event_log: Arc<dyn EventLogSink>,
}

/// The state passed to every handler
#[derive(Clone)]
pub struct ServerState(Arc<ServerStateInner>);

impl ServerState {
    pub fn new(inner: ServerStateInner) -> Self {
        Self(Arc::new(inner))
    }
}

impl Deref for ServerState {
    type Target = ServerStateInner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRef<ServerState> for Arc<dyn UserDirectory> {
    fn from_ref(inner: &ServerState) -> Self {
        inner.0.users.clone()
    }
}

async fn list_event_logs(
    State(state): State<ServerState>,
    auth: Authed,
) -> Result<impl IntoResponse, WrapReport<Error>> {
    if !auth.is_superuser {
        return Err(Error::Forbidden.into());
    }

    let entries = state
        .event_log
        .entries()
        .await
        .change_context(Error::EventLog)?;
    Ok(Json(entries))
}

fn admin_routes() -> Router<ServerState> {
    Router::new()
        .route("/permissions", routing::get(list_permissions))
        .route("/event-logs", routing::get(list_event_logs))
        .merge(models::photo::endpoints::create_routes())
}

/// Build the application router with its middleware.
pub fn create_routes(state: ServerState, request_timeout: Duration) -> Router {
    let production = state.production;

    Router::new()
        .nest("/admin", admin_routes())
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(panic_handler(production))
}

/// Configuration for the server
pub struct Config {
    /// The environment we're running in. Currently this just distinguishes between
    /// "development" and any other value.
    pub env: String,
    /// The host to bind to.
    pub host: String,
    /// The port to bind to. Zero picks a random port.
    pub port: u16,
    /// How long to wait before timing out a request
    pub request_timeout: Duration,
    pub photo_admin: PhotoAdmin,
    pub users: Arc<dyn UserDirectory>,
    pub event_log: Arc<dyn EventLogSink>,
}

/// The server and related information
pub struct Server {
    /// The host the server is bound to
    pub host: String,
    /// The port the server is bound to
    pub port: u16,
    /// The server created by Axum
    app: Router,
    listener: TcpListener,
}

impl Server {
    /// Run the server, and perform a graceful shutdown when receiving a ctrl+c (SIGINT or
    /// equivalent).
    pub async fn run(self) -> Result<(), Report<Error>> {
        self.run_with_shutdown_signal(shutdown_signal()).await
    }

    /// Run the server, and shut it down when `shutdown_rx` resolves.
    pub async fn run_with_shutdown_signal(
        self,
        shutdown_rx: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), Report<Error>> {
        axum::serve(
            self.listener,
            self.app
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_rx)
        .await
        .change_context(Error::ServerStart)?;

        event!(Level::INFO, "Server shut down");
        Ok(())
    }
}

/// Create the server and return it, ready to run.
pub async fn create_server(config: Config) -> Result<Server, Report<Error>> {
    let production = config.env != "development";
    let state = ServerState::new(ServerStateInner {
        production,
        photo_admin: config.photo_admin,
        users: config.users,
        event_log: config.event_log,
    });

    let app = create_routes(state, config.request_timeout);

    let bind_ip = config
        .host
        .parse::<std::net::IpAddr>()
        .change_context(Error::ServerStart)
        .attach_printable_lazy(|| format!("Invalid host {}", config.host))?;
    let bind_addr = SocketAddr::from((bind_ip, config.port));
    let listener = TcpListener::bind(bind_addr)
        .await
        .change_context(Error::ServerStart)?;
    let port = listener
        .local_addr()
        .change_context(Error::ServerStart)?
        .port();

    event!(Level::INFO, "Listening on {}:{}", config.host, port);

    Ok(Server {
        host: config.host,
        port,
        app,
        listener,
    })
}

/// Create a future which will resolve when receiving SIGINT or SIGTERM
pub async fn shutdown_signal() {
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::task::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                event!(Level::ERROR, err=%e, "Failed to listen for ctrl+c");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                }
                Err(e) => {
                    event!(Level::ERROR, err=%e, "Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }

        shutdown_tx.send(()).ok();
    });

    shutdown_rx.map(|_| ()).await
}
