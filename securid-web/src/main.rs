#![deny(missing_docs)]
//! A web server exposing SecurID-compatible token codes over HTTP.

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use local_ip_address::local_ip;
use log::{error, info, warn};
use securid_core::{SecurIdError, TokenCredential, TokenGenerator, TokenRecord};
use serde::Deserialize;
use serde_json::{Value, json};
use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

const DEFAULT_PORT: u16 = 3000;
const MAX_UPCOMING: u8 = 20;

/// Shared application state
#[derive(Clone)]
struct AppState {
    started_at: DateTime<Utc>,
}

/// Query string of the plain-text token endpoint.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenQuery {
    serial: String,
    #[serde(alias = "seed")]
    seed_octets: String,
    pin: Option<String>,
    flags: Option<u16>,
    length: Option<usize>,
    at: Option<i64>,
}

impl TokenQuery {
    fn into_parts(self) -> (TokenRecord, Option<i64>) {
        let record = TokenRecord {
            serial: self.serial,
            seed_octets: self.seed_octets,
            pin: self.pin,
            flags: self.flags,
            length: self.length,
        };
        (record, self.at)
    }
}

#[derive(Deserialize)]
struct PasscodeRequest {
    #[serde(flatten)]
    token: TokenRecord,
    at: Option<i64>,
    next: Option<u8>,
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let port = env::var("SECURID_WEB_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let bind: IpAddr = env::var("SECURID_WEB_BIND")
        .ok()
        .and_then(|b| b.parse().ok())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    let app = app(Arc::new(AppState {
        started_at: Utc::now(),
    }));

    let addr = SocketAddr::new(bind, port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };

    info!("listening on:");
    if let Ok(my_local_ip) = local_ip() {
        info!("  - http://{my_local_ip}:{port}/token");
    }
    info!("  - http://127.0.0.1:{port}/token");

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Builds the Axum router.
fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/token", get(token_handler))
        .route("/api/token", post(passcode_handler))
        .route("/api/token/info", post(info_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Returns the bare passcode as text, like the original token endpoint.
async fn token_handler(Query(query): Query<TokenQuery>) -> (StatusCode, String) {
    let request_id = Uuid::new_v4();
    let (record, at) = query.into_parts();

    let result = resolve_instant(at).and_then(|at| {
        let credential = TokenCredential::try_from(record)?;
        info!(
            "[{request_id}] token request for serial {}",
            credential.serial().masked()
        );
        securid_core::compute_passcode(&credential, &at)
    });

    match result {
        Ok(code) => (StatusCode::OK, code),
        Err(e) => {
            let (status, _) = error_response(request_id, &e);
            (status, e.to_string())
        }
    }
}

/// Returns the passcode, its validity window and optionally the following codes.
async fn passcode_handler(Json(payload): Json<PasscodeRequest>) -> (StatusCode, Json<Value>) {
    let request_id = Uuid::new_v4();
    let count = payload.next.unwrap_or(1).clamp(1, MAX_UPCOMING);

    let result = resolve_instant(payload.at).and_then(|at| {
        let generator = TokenGenerator::new(TokenCredential::try_from(payload.token)?)?;
        info!(
            "[{request_id}] passcode request for serial {} ({count} code(s))",
            generator.credential().serial().masked()
        );
        Ok((at, generator.upcoming(&at, usize::from(count))?))
    });

    match result {
        Ok((at, passcodes)) => {
            let Some(current) = passcodes.first() else {
                return error_response(request_id, &SecurIdError::TimeOutOfRange(at.timestamp()));
            };
            let response = json!({
                "requestId": request_id.to_string(),
                "passcode": current.code,
                "intervalSeconds": current.interval_seconds,
                "validFrom": current.valid_from,
                "validUntil": current.valid_until,
                "secondsRemaining": current.seconds_remaining(&at),
                "upcoming": &passcodes[1..],
            });
            (StatusCode::OK, Json(response))
        }
        Err(e) => error_response(request_id, &e),
    }
}

/// Describes a token without revealing its seed or PIN.
async fn info_handler(Json(record): Json<TokenRecord>) -> (StatusCode, Json<Value>) {
    let request_id = Uuid::new_v4();
    match TokenCredential::try_from(record).and_then(TokenGenerator::new) {
        Ok(generator) => {
            info!("[{request_id}] info request for serial {}", generator.info().serial);
            (StatusCode::OK, Json(json!(generator.info())))
        }
        Err(e) => error_response(request_id, &e),
    }
}

/// Reports liveness and uptime.
async fn health_handler(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    let uptime = (Utc::now() - state.started_at).num_seconds();
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "uptimeSeconds": uptime })),
    )
}

/// The requested instant, or now when none is given.
fn resolve_instant(at: Option<i64>) -> Result<DateTime<Utc>, SecurIdError> {
    match at {
        Some(secs) => DateTime::from_timestamp(secs, 0).ok_or(SecurIdError::TimeOutOfRange(secs)),
        None => Ok(Utc::now()),
    }
}

fn error_response(request_id: Uuid, e: &SecurIdError) -> (StatusCode, Json<Value>) {
    let status = match e {
        SecurIdError::CipherFailure(_) => {
            error!("[{request_id}] {e}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
        _ => {
            warn!("[{request_id}] rejected: {e}");
            StatusCode::BAD_REQUEST
        }
    };
    (
        status,
        Json(json!({ "requestId": request_id.to_string(), "error": e.to_string() })),
    )
}
