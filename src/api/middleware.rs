//! Request tracking and audit middleware.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use crate::models::AuditEntry;

use super::caller::Caller;
use super::state::AppState;

/// Paths under this prefix are never audited.
pub const AUDIT_PATH_PREFIX: &str = "/audit";

/// Tags the request with a correlation id, logs it, and queues an audit
/// entry for identified callers once the handler has run.
pub async fn track_request(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let correlation_id = Uuid::new_v4();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let caller = Caller::from_headers(request.headers());
    let ip_address = client_address(&request);
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let span = info_span!("request", correlation_id = %correlation_id, %method, %path);
    let start = Instant::now();
    let response = async {
        info!("Handling request");
        next.run(request).await
    }
    .instrument(span.clone())
    .await;

    span.in_scope(|| {
        info!(
            status = response.status().as_u16(),
            duration_us = start.elapsed().as_micros(),
            "Request completed"
        );
    });

    match caller {
        Some(caller) if !path.starts_with(AUDIT_PATH_PREFIX) => {
            let mut entry = AuditEntry::new(caller.user_id, method, path, state.now());
            entry.ip_address = ip_address;
            entry.user_agent = user_agent;
            state.audit().record(entry);
        }
        _ => {}
    }
    response
}

fn client_address(request: &Request) -> Option<String> {
    forwarded_for(request.headers()).or_else(|| {
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    })
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
