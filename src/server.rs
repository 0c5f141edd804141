/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Query, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chessie::Game;
use percent_encoding::percent_decode_str;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    apply_player_move, check_best_move, is_legal_move, play_against_engine, Evaluation, Handle,
    QuizCatalog, SessionError, SessionPool, Termination,
};

/// Everything the HTTP handlers share.
#[derive(Debug)]
pub struct AppState {
    pub pool: SessionPool,
    pub quiz: QuizCatalog,
}

type SharedState = Arc<AppState>;

/// Builds the router exposing every session operation.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/hello", get(hello))
        .route("/", post(player_move))
        .route("/bestMove", get(best_move).post(check_move))
        .route("/valid", get(valid))
        .route("/info", get(evaluation).post(set_elo))
        .route("/reset", get(reset))
        .route("/stockfish", post(play_engine))
        .route("/undoStockfish", post(undo))
        .route("/quizStart", get(quiz_start))
        .route("/fen", get(fen))
        .route("/startMatch", get(start_match))
        .with_state(Arc::new(state))
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::InvalidHandle(_) | Self::MalformedInput(_) => StatusCode::BAD_REQUEST,
            Self::EmptySlot(_) => StatusCode::NOT_FOUND,
            // Allocation routes answer with the `{"response": 404}` sentinel instead.
            Self::PoolExhausted => StatusCode::SERVICE_UNAVAILABLE,
            Self::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if self.is_client_error() {
            tracing::debug!("rejected request: {self}");
        } else {
            tracing::error!("{self}");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, SessionError>;

/// Runs `f` on a blocking thread. Engine calls block on the engine process for the length of a search.
async fn blocking<T, F>(state: SharedState, f: F) -> Result<T, SessionError>
where
    T: Send + 'static,
    F: FnOnce(&AppState) -> Result<T, SessionError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| SessionError::Engine(anyhow::anyhow!("engine task failed: {e}")))?
}

/// Serializes a boolean the way clients of this API expect: as a string.
fn flag(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Query string parameters. Unlike a bare [`Query`], a missing or malformed field is reported
/// as [`SessionError::MalformedInput`], with the usual JSON error body.
struct Params<T>(T);

impl<S, T> FromRequestParts<S> for Params<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = SessionError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| SessionError::MalformedInput(rejection.body_text()))?;
        Ok(Self(params))
    }
}

#[derive(Debug, Deserialize)]
struct IndexParams {
    index: Handle,
}

#[derive(Debug, Deserialize)]
struct MoveParams {
    index: Handle,
    #[serde(rename = "move")]
    mv: String,
}

#[derive(Debug, Deserialize)]
struct EloParams {
    index: Handle,
    #[serde(rename = "ELO")]
    elo: u32,
}

#[derive(Debug, Deserialize)]
struct FenParams {
    index: Handle,
    #[serde(default)]
    fen: String,
}

#[derive(Debug, Serialize)]
struct MoveResponse {
    valid: bool,
    mate: &'static str,
}

#[derive(Debug, Serialize)]
struct ValidResponse {
    valid: bool,
}

#[derive(Debug, Serialize)]
struct BestMoveResponse {
    #[serde(rename = "move")]
    mv: Option<String>,
}

#[derive(Debug, Serialize)]
struct CheckResponse {
    correct: &'static str,
    best: Option<String>,
}

#[derive(Debug, Serialize)]
struct ExchangeResponse {
    valid: bool,
    response: Option<String>,
    mate: &'static str,
}

#[derive(Debug, Serialize)]
struct ResetResponse {
    reset_id: Handle,
    errore: bool,
}

#[derive(Debug, Serialize)]
struct FenResponse {
    fen: String,
    state: String,
}

async fn hello() -> Json<Value> {
    Json(json!({ "state": "OK" }))
}

async fn player_move(
    State(state): State<SharedState>,
    Params(params): Params<MoveParams>,
) -> ApiResult<MoveResponse> {
    let outcome = blocking(state, move |state| {
        let mut session = state.pool.resolve(params.index)?;
        Ok(apply_player_move(&mut *session, &params.mv)?)
    })
    .await?;

    Ok(Json(MoveResponse {
        valid: outcome.valid,
        mate: flag(outcome.terminal),
    }))
}

async fn best_move(
    State(state): State<SharedState>,
    Params(params): Params<IndexParams>,
) -> ApiResult<BestMoveResponse> {
    let mv = blocking(state, move |state| {
        Ok(state.pool.resolve(params.index)?.best_move()?)
    })
    .await?;

    Ok(Json(BestMoveResponse { mv }))
}

async fn check_move(
    State(state): State<SharedState>,
    Params(params): Params<MoveParams>,
) -> ApiResult<CheckResponse> {
    let check = blocking(state, move |state| {
        let mut session = state.pool.resolve(params.index)?;
        Ok(check_best_move(&mut *session, &params.mv)?)
    })
    .await?;

    Ok(Json(CheckResponse {
        correct: flag(check.correct),
        best: check.best,
    }))
}

/// Checks a move without playing it, so clients can list the legal ones.
async fn valid(
    State(state): State<SharedState>,
    Params(params): Params<MoveParams>,
) -> ApiResult<ValidResponse> {
    let valid = blocking(state, move |state| {
        let session = state.pool.resolve(params.index)?;
        Ok(is_legal_move(&*session, &params.mv))
    })
    .await?;

    Ok(Json(ValidResponse { valid }))
}

async fn evaluation(
    State(state): State<SharedState>,
    Params(params): Params<IndexParams>,
) -> ApiResult<Evaluation> {
    let eval = blocking(state, move |state| {
        Ok(state.pool.resolve(params.index)?.evaluation()?)
    })
    .await?;

    Ok(Json(eval))
}

async fn set_elo(
    State(state): State<SharedState>,
    Params(params): Params<EloParams>,
) -> ApiResult<Value> {
    let elo = params.elo;
    blocking(state, move |state| {
        Ok(state.pool.resolve(params.index)?.set_elo_rating(elo)?)
    })
    .await?;

    Ok(Json(json!({ "ELO": elo })))
}

/// Tears down a session. Out-of-range handles are reported in the body, not as an HTTP error.
async fn reset(
    State(state): State<SharedState>,
    Params(params): Params<IndexParams>,
) -> ApiResult<ResetResponse> {
    let index = params.index;
    let released = blocking(state, move |state| match state.pool.release(index) {
        Ok(()) => Ok(true),
        Err(SessionError::InvalidHandle(_)) => Ok(false),
        Err(e) => Err(e),
    })
    .await?;

    Ok(Json(ResetResponse {
        reset_id: index,
        errore: !released,
    }))
}

async fn play_engine(
    State(state): State<SharedState>,
    Params(params): Params<MoveParams>,
) -> ApiResult<ExchangeResponse> {
    let index = params.index;
    let outcome = blocking(state, move |state| {
        let mut session = state.pool.resolve(index)?;
        Ok(play_against_engine(&mut *session, &params.mv)?)
    })
    .await?;

    tracing::debug!(index, ?outcome, "played against engine");
    Ok(Json(ExchangeResponse {
        valid: outcome.valid,
        response: outcome.response,
        mate: outcome.mate.map_or("", Termination::as_str),
    }))
}

/// Rolls a session back to a caller-supplied position.
async fn undo(
    State(state): State<SharedState>,
    Params(params): Params<FenParams>,
) -> ApiResult<Value> {
    // Clients percent-encode the FEN themselves, on top of the query string's own encoding.
    let fen = percent_decode_str(&params.fen)
        .decode_utf8()
        .map_err(|e| SessionError::MalformedInput(format!("FEN is not valid UTF-8: {e}")))?
        .into_owned();

    if let Err(e) = Game::from_fen(&fen) {
        return Err(SessionError::MalformedInput(format!("invalid FEN {fen:?}: {e}")));
    }

    blocking(state, move |state| {
        Ok(state.pool.resolve(params.index)?.set_fen_position(&fen)?)
    })
    .await?;

    Ok(Json(json!({ "response": "ok" })))
}

async fn quiz_start(State(state): State<SharedState>) -> ApiResult<Value> {
    let allocated = blocking(state, |state| {
        let Some(fen) = state.quiz.choose(&mut rand::thread_rng()) else {
            return Err(SessionError::Engine(anyhow::anyhow!("quiz catalog is empty")));
        };

        match state.pool.allocate_with_position(fen) {
            Ok(index) => Ok(Some((fen.to_string(), index))),
            Err(SessionError::PoolExhausted) => Ok(None),
            Err(e) => Err(e),
        }
    })
    .await?;

    Ok(Json(match allocated {
        Some((fen, index)) => json!({ "response": fen, "IDMatch": index }),
        None => json!({ "response": 404 }),
    }))
}

async fn fen(
    State(state): State<SharedState>,
    Params(params): Params<IndexParams>,
) -> ApiResult<FenResponse> {
    let response = blocking(state, move |state| {
        let session = state.pool.resolve(params.index)?;
        Ok(FenResponse {
            fen: session.fen(),
            state: session.board_visual(),
        })
    })
    .await?;

    Ok(Json(response))
}

async fn start_match(State(state): State<SharedState>) -> ApiResult<Value> {
    let allocated = blocking(state, |state| match state.pool.allocate() {
        Ok(index) => Ok(Some(index)),
        Err(SessionError::PoolExhausted) => Ok(None),
        Err(e) => Err(e),
    })
    .await?;

    Ok(Json(json!({ "response": allocated.unwrap_or(404) })))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Method, Request},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::{engine::scripted::ScriptedEngine, STARTPOS_FEN};

    fn app(capacity: usize, quiz: QuizCatalog) -> Router {
        let pool = SessionPool::new(capacity, || Ok(ScriptedEngine::default()));
        router(AppState { pool, quiz })
    }

    async fn call(app: &Router, method: Method, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_hello() {
        let app = app(1, QuizCatalog::builtin());
        let (status, body) = call(&app, Method::GET, "/hello").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "state": "OK" }));
    }

    #[tokio::test]
    async fn test_match_lifecycle() {
        let app = app(2, QuizCatalog::builtin());

        let (_, body) = call(&app, Method::GET, "/startMatch").await;
        assert_eq!(body, json!({ "response": 0 }));

        let (_, body) = call(&app, Method::POST, "/?index=0&move=e2e4").await;
        assert_eq!(body, json!({ "valid": true, "mate": "false" }));

        let (_, body) = call(&app, Method::POST, "/?index=0&move=e7e9").await;
        assert_eq!(body, json!({ "valid": false, "mate": "false" }));

        let (_, body) = call(&app, Method::GET, "/fen?index=0").await;
        assert!(body["fen"].as_str().unwrap().contains(" b "));
        assert!(body["state"].is_string());

        let (_, body) = call(&app, Method::GET, "/reset?index=0").await;
        assert_eq!(body, json!({ "reset_id": 0, "errore": false }));

        let (status, _) = call(&app, Method::GET, "/fen?index=0").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_pool_full_sentinel() {
        let app = app(1, QuizCatalog::builtin());

        let (_, body) = call(&app, Method::GET, "/startMatch").await;
        assert_eq!(body, json!({ "response": 0 }));

        let (status, body) = call(&app, Method::GET, "/startMatch").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "response": 404 }));

        let (_, body) = call(&app, Method::GET, "/quizStart").await;
        assert_eq!(body, json!({ "response": 404 }));
    }

    #[tokio::test]
    async fn test_reset_out_of_range() {
        let app = app(2, QuizCatalog::builtin());
        let (status, body) = call(&app, Method::GET, "/reset?index=7").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "reset_id": 7, "errore": true }));

        let (_, body) = call(&app, Method::GET, "/reset?index=-1").await;
        assert_eq!(body, json!({ "reset_id": -1, "errore": true }));
    }

    #[tokio::test]
    async fn test_unguarded_handles_are_client_errors() {
        let app = app(2, QuizCatalog::builtin());

        let (status, body) = call(&app, Method::GET, "/bestMove?index=1").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].is_string());

        let (status, _) = call(&app, Method::POST, "/stockfish?index=9&move=e2e4").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(&app, Method::GET, "/info?index=abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("malformed input"));

        let (status, body) = call(&app, Method::GET, "/fen").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("index"));

        let (status, body) = call(&app, Method::POST, "/?index=0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_valid_move_query() {
        let app = app(1, QuizCatalog::builtin());

        let (status, body) = call(&app, Method::GET, "/valid?index=0&move=e2e4").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].is_string());

        call(&app, Method::GET, "/startMatch").await;

        let (_, body) = call(&app, Method::GET, "/valid?index=0&move=e2e4").await;
        assert_eq!(body, json!({ "valid": true }));

        let (_, body) = call(&app, Method::GET, "/valid?index=0&move=e2e5").await;
        assert_eq!(body, json!({ "valid": false }));

        // Castling is not available from the starting position
        let (_, body) = call(&app, Method::GET, "/valid?index=0&move=00").await;
        assert_eq!(body, json!({ "valid": false }));

        // Nothing was played
        let (_, body) = call(&app, Method::GET, "/fen?index=0").await;
        assert_eq!(body["fen"], json!(STARTPOS_FEN));
    }

    #[tokio::test]
    async fn test_play_against_engine() {
        let app = app(1, QuizCatalog::builtin());
        call(&app, Method::GET, "/startMatch").await;

        let (_, body) = call(&app, Method::POST, "/stockfish?index=0&move=e2e4").await;
        assert_eq!(body["valid"], json!(true));
        assert!(body["response"].is_string());
        assert_eq!(body["mate"], json!(""));

        let (_, body) = call(&app, Method::GET, "/bestMove?index=0").await;
        assert!(body["move"].is_string());
    }

    #[tokio::test]
    async fn test_check_best_move() {
        let app = app(1, QuizCatalog::builtin());
        call(&app, Method::GET, "/startMatch").await;

        let (_, body) = call(&app, Method::GET, "/bestMove?index=0").await;
        let best = body["move"].as_str().unwrap().to_string();

        let (_, body) = call(&app, Method::POST, &format!("/bestMove?index=0&move={best}")).await;
        assert_eq!(body, json!({ "correct": "true", "best": best }));
    }

    #[tokio::test]
    async fn test_quiz_start_uses_catalog() {
        let fen = "6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1";
        let app = app(2, QuizCatalog::new(vec![fen.to_string()]));

        let (_, body) = call(&app, Method::GET, "/quizStart").await;
        assert_eq!(body, json!({ "response": fen, "IDMatch": 0 }));

        let (_, body) = call(&app, Method::POST, "/stockfish?index=0&move=a1a8").await;
        assert_eq!(body, json!({ "valid": true, "response": null, "mate": "player" }));
    }

    #[tokio::test]
    async fn test_undo_restores_position() {
        let app = app(1, QuizCatalog::builtin());
        call(&app, Method::GET, "/startMatch").await;
        call(&app, Method::POST, "/stockfish?index=0&move=e2e4").await;

        // Double-encoded, as clients send it
        let encoded = STARTPOS_FEN.replace('/', "%252F").replace(' ', "%2520");
        let (_, body) = call(&app, Method::POST, &format!("/undoStockfish?index=0&fen={encoded}")).await;
        assert_eq!(body, json!({ "response": "ok" }));

        let (_, body) = call(&app, Method::GET, "/fen?index=0").await;
        assert_eq!(body["fen"], json!(STARTPOS_FEN));

        let (status, _) = call(&app, Method::POST, "/undoStockfish?index=0&fen=garbage").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_set_elo() {
        let app = app(1, QuizCatalog::builtin());
        call(&app, Method::GET, "/startMatch").await;

        let (_, body) = call(&app, Method::POST, "/info?index=0&ELO=1350").await;
        assert_eq!(body, json!({ "ELO": 1350 }));

        let (_, body) = call(&app, Method::GET, "/info?index=0").await;
        assert_eq!(body, json!({ "type": "cp", "value": 0 }));
    }
}
