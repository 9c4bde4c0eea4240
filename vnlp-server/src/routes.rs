//! Rotas HTTP: `/`, `/annotators` e `POST /handle`.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Form, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::error;
use vnlp_core::{handle, AnnotatorSet, Engine, ResponseEnvelope};

/// Texto devolvido por `GET /`.
pub const READY_MESSAGE: &str = "vnlp-server is running.";

/// Estado compartilhado da aplicação
#[derive(Clone)]
pub struct AppState {
    engine: Arc<Engine>,
}

/// Parâmetros de `/handle`, aceitos na query ou em corpo `x-www-form-urlencoded`.
///
/// Chaves repetidas não são erro: vale o primeiro valor de cada uma.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct HandleParams {
    text: Option<String>,
    props: Option<String>,
}

impl HandleParams {
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "text" => &mut params.text,
                "props" => &mut params.props,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        params
    }
}

pub fn router(engine: Arc<Engine>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/annotators", get(annotators_handler))
        .route("/handle", post(handle_handler))
        .layer(cors)
        .with_state(AppState { engine })
}

async fn index_handler() -> &'static str {
    READY_MESSAGE
}

async fn annotators_handler(State(state): State<AppState>) -> Json<AnnotatorSet> {
    Json(state.engine.annotators())
}

/// Anotação síncrona (CPU) executada fora das threads do runtime.
async fn handle_handler(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
    form: Option<Form<Vec<(String, String)>>>,
) -> Json<ResponseEnvelope> {
    let query = match query {
        Ok(Query(pairs)) => HandleParams::from_pairs(pairs),
        Err(rejection) => {
            return Json(ResponseEnvelope::failure(format!(
                "Invalid query string: {}",
                rejection.body_text()
            )))
        }
    };
    let body = form
        .map(|Form(pairs)| HandleParams::from_pairs(pairs))
        .unwrap_or_default();
    let text = query.text.or(body.text);
    let props = query.props.or(body.props);

    let engine = Arc::clone(&state.engine);
    let result = tokio::task::spawn_blocking(move || {
        handle(&engine, text.as_deref(), props.as_deref())
    })
    .await;

    match result {
        Ok(envelope) => Json(envelope),
        Err(e) => {
            error!("Requisição abortada: {e}");
            Json(ResponseEnvelope::failure(format!("Internal error: {e}")))
        }
    }
}
