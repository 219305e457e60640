// src/handlers/session.rs

use std::{convert::Infallible, time::Duration};

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use serde::Serialize;
use tokio_stream::{Stream, StreamExt};

use crate::{
    config::AppState,
    middleware::auth::AuthenticatedUser,
    services::session_gate::{GateState, SessionGate},
};

#[derive(Debug, Serialize)]
pub struct GateResponse {
    pub state: GateState,
}

// GET /api/session (leitura única do estado de acesso)
pub async fn current_state(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Json<GateResponse> {
    let gate = SessionGate::open(
        app_state.backend.clone(),
        user.account.id,
        app_state.config.backend_timeout,
    );
    Json(GateResponse {
        state: gate.settled().await,
    })
}

// GET /api/session/watch (SSE). O portão vive enquanto a conexão estiver aberta;
// quando o cliente desconecta, o stream cai e a assinatura é cancelada.
pub async fn watch(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let gate = SessionGate::open(
        app_state.backend.clone(),
        user.account.id,
        app_state.config.backend_timeout,
    );
    tracing::debug!("Observando o acesso do usuário {}", gate.profile_id());

    let events = gate
        .into_stream()
        .filter(|state| *state != GateState::Loading)
        .map(|state| Ok(Event::default().event("access").data(state.as_str())));

    Sse::new(events).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
