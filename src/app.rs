use std::net::SocketAddr;

use anyhow::Context;
use axum::{
    extract::{MatchedPath, Request, State},
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{applications, auth, error::ApiError, jobs, state::AppState, users};

/// Routes that sit behind the session guard. Everything else is open.
///
/// This table is the only place a route gets guarded. Mutating job routes stay open until the
/// frontend sends the session cookie on those calls.
pub const GUARDED_ROUTES: &[(Method, &str)] = &[
    (Method::GET, "/all-jobs/:id"),
    (Method::GET, "/applied-jobs"),
];

pub fn is_guarded(method: &Method, path: &str) -> bool {
    GUARDED_ROUTES
        .iter()
        .any(|(m, p)| m == method && *p == path)
}

/// Runs the session guard for requests whose matched route is listed in [`GUARDED_ROUTES`].
async fn session_gate(
    state: State<AppState>,
    matched: Option<MatchedPath>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let guarded = matched
        .as_ref()
        .is_some_and(|path| is_guarded(request.method(), path.as_str()));
    if guarded {
        auth::guard::require_session(state, request, next).await
    } else {
        Ok(next.run(request).await)
    }
}

pub fn build_app(state: AppState) -> Router {
    let api = Router::new()
        .route("/", get(|| async { "Server running successfully!" }))
        .route("/health", get(|| async { "ok" }))
        .merge(auth::router())
        .merge(users::router())
        .merge(jobs::job_routes())
        .merge(applications::application_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), session_gate));

    let cors = cors_layer(&state.config.cors_origins);

    api.with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, ?latency, "response");
                        } else {
                            tracing::info!(%status, ?latency, "response");
                        }
                    },
                ),
        )
}

/// Credentialed CORS for the configured frontend origins.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
}

pub async fn serve(app: Router, state: AppState) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", state.config.host, state.config.port)
        .parse()
        .context("parse listen address")?;

    for (method, path) in GUARDED_ROUTES {
        tracing::info!(%method, path, "session guard active");
    }
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.shutdown().await;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
