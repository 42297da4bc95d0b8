use axum::{Json, extract::State};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::AppState;
use crate::constants::SERVICE_NAME;
use crate::models::HealthResponse;
use crate::response::{Envelope, ok};

pub async fn health(State(state): State<AppState>) -> Json<Envelope<HealthResponse>> {
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default();

    ok(HealthResponse {
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        status: "online",
        uptime: format!("{}s", state.started_at.elapsed().as_secs()),
        timestamp,
    })
}
