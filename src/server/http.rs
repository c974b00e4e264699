//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo, one task per connection. Each request body
//! is read up front (bounded) and handed to [`routes::dispatch`] together with
//! the requester's address.

use bytes::Bytes;
use http_body_util::{BodyExt, Limited};
use hyper::body::Incoming;
use hyper::header::HeaderMap;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::config::Args;
use crate::db::DocumentStore;
use crate::routes::{self, ApiRequest};
use crate::services::{AnalyticsService, ClientInfo, ContactService, ContentService};
use crate::types::{ApiError, Clock};
use crate::worker::SideEffectQueue;

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Largest request body accepted
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Process-wide store handle, closed at shutdown
    pub store: Arc<dyn DocumentStore>,
    pub contacts: ContactService,
    pub content: ContentService,
    pub analytics: AnalyticsService,
    /// Sending half of the side-effect queue
    pub queue: SideEffectQueue,
}

impl AppState {
    /// Wire the services around one store, clock and queue
    pub fn new(
        args: Args,
        store: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
        queue: SideEffectQueue,
    ) -> Self {
        let window = chrono::Duration::days(i64::from(args.analytics_window_days));
        Self {
            contacts: ContactService::new(Arc::clone(&store), Arc::clone(&clock), queue.clone()),
            content: ContentService::new(Arc::clone(&store), Arc::clone(&clock)),
            analytics: AnalyticsService::new(Arc::clone(&store), clock).with_window(window),
            store,
            queue,
            args,
        }
    }
}

/// Address of the original client: first `X-Forwarded-For` hop, else the peer
pub fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| peer.ip().to_string())
}

/// Run the server until Ctrl-C
pub async fn run(state: Arc<AppState>) -> Result<(), ApiError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!("Mabratech API listening on {}", state.args.listen);

    if state.args.dev_mode {
        warn!("Development mode enabled");
    }

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown signal received, no longer accepting connections");
                return Ok(());
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    let state = Arc::clone(&state);
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);

                        let service = service_fn(move |req| {
                            let state = Arc::clone(&state);
                            async move { handle_request(state, addr, req).await }
                        });

                        if let Err(err) = http1::Builder::new()
                            .serve_connection(io, service)
                            .await
                        {
                            error!("Error serving connection from {}: {:?}", addr, err);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {:?}", e);
                }
            }
        }
    }
}

async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let (parts, body) = req.into_parts();

    debug!("[{}] {} {}", addr, parts.method, parts.uri.path());

    let client = ClientInfo {
        ip_address: Some(client_ip(&parts.headers, addr)),
        user_agent: parts
            .headers
            .get(hyper::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };

    let body = match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!("[{}] Rejected request body: {}", addr, e);
            return Ok(routes::error_response(&ApiError::BadRequest(
                "Request body too large or unreadable".into(),
            )));
        }
    };

    let request = ApiRequest {
        method: parts.method,
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        body,
        client,
    };

    let response = routes::dispatch(&state, request).await;
    Ok(response)
}
