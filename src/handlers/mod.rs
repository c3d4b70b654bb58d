/// HTTP request handlers
use crate::domain::{Board, Health, QuickTime, Settings};
use crate::errors::ApiError;
use crate::lookup::Lookup;
use crate::render::render_board;
use crate::services::{BoardService, RuleDraft, RuleStore};
use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub rules: Arc<RuleStore>,
    pub board: Arc<BoardService>,
    pub lookup: Arc<Lookup>,
}

/// Successful response wrapper
#[derive(Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub ok: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self { ok: true, data }
    }
}

#[derive(Serialize)]
pub struct RuleList {
    pub quick_times: Vec<QuickTime>,
}

#[derive(Serialize)]
pub struct RuleBody {
    pub quick_time: QuickTime,
}

#[derive(Serialize)]
pub struct BoardText {
    pub text: String,
}

#[derive(Serialize)]
pub struct NameBody {
    pub code: String,
    pub name: String,
}

type Reply<T> = Result<Json<SuccessResponse<T>>, ApiError>;

/// Health check handler
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        now: Utc::now(),
    })
}

/// Latest board snapshot
pub async fn get_board(State(state): State<AppState>) -> Reply<Board> {
    Ok(Json(SuccessResponse::new(state.board.latest().await)))
}

/// Run a refresh pass now. While the ticker's pass is still running this
/// returns the previous board; its `generated_at` shows how old it is.
pub async fn refresh_board(State(state): State<AppState>) -> Reply<Board> {
    let board = state.board.refresh().await?;
    Ok(Json(SuccessResponse::new(board)))
}

/// Latest board as the text table
pub async fn get_board_text(State(state): State<AppState>) -> Reply<BoardText> {
    let board = state.board.latest().await;
    Ok(Json(SuccessResponse::new(BoardText {
        text: render_board(&board, &state.lookup),
    })))
}

pub async fn list_rules(State(state): State<AppState>) -> Reply<RuleList> {
    Ok(Json(SuccessResponse::new(RuleList {
        quick_times: state.rules.list().await,
    })))
}

pub async fn get_rule(Path(id): Path<String>, State(state): State<AppState>) -> Reply<RuleBody> {
    let quick_time = state.rules.get(parse_id(&id)?).await?;
    Ok(Json(SuccessResponse::new(RuleBody { quick_time })))
}

pub async fn create_rule(State(state): State<AppState>, body: Bytes) -> Reply<RuleBody> {
    let draft = parse_draft(&body)?;
    let quick_time = state.rules.create(draft).await?;
    Ok(Json(SuccessResponse::new(RuleBody { quick_time })))
}

pub async fn update_rule(
    Path(id): Path<String>,
    State(state): State<AppState>,
    body: Bytes,
) -> Reply<RuleBody> {
    let id = parse_id(&id)?;
    let draft = parse_draft(&body)?;
    let quick_time = state.rules.replace(id, draft).await?;
    Ok(Json(SuccessResponse::new(RuleBody { quick_time })))
}

pub async fn delete_rule(Path(id): Path<String>, State(state): State<AppState>) -> Reply<RuleBody> {
    let quick_time = state.rules.delete(parse_id(&id)?).await?;
    Ok(Json(SuccessResponse::new(RuleBody { quick_time })))
}

/// Settings with the key masked; read-only for the lifetime of the process
pub async fn get_settings(State(state): State<AppState>) -> Reply<Settings> {
    Ok(Json(SuccessResponse::new(state.board.settings().masked())))
}

pub async fn get_station(Path(crs): Path<String>, State(state): State<AppState>) -> Reply<NameBody> {
    let code = crs.to_uppercase();
    let name = state.lookup.station_name(&code)?.to_string();
    Ok(Json(SuccessResponse::new(NameBody { code, name })))
}

pub async fn get_operator(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Reply<NameBody> {
    let code = code.to_uppercase();
    let name = state.lookup.operator_name(&code)?.to_string();
    Ok(Json(SuccessResponse::new(NameBody { code, name })))
}

// Body and id are decoded here rather than by extractors so that bad input
// still comes back in the error envelope.
fn parse_draft(body: &[u8]) -> Result<RuleDraft, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::InvalidInput(e.to_string()))
}

fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::InvalidInput(format!("{:?} is not a quick time id", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_draft_accepts_day_names() {
        let body = json!({
            "start": "07:00",
            "end": "09:00",
            "org": "RDG",
            "dest": "*",
            "days": ["Mon", 2]
        })
        .to_string();
        let draft = parse_draft(body.as_bytes()).unwrap();
        assert_eq!(draft.org, "RDG");
        assert_eq!(draft.days.len(), 2);
    }

    #[test]
    fn test_parse_draft_missing_field() {
        let err = parse_draft(br#"{"start": "07:00"}"#).unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");
    }

    #[test]
    fn test_parse_draft_malformed_body() {
        assert_eq!(parse_draft(b"{not json").unwrap_err().code(), "INVALID_INPUT");
        assert_eq!(parse_draft(b"").unwrap_err().code(), "INVALID_INPUT");
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert_eq!(parse_id("abc").unwrap_err().code(), "INVALID_INPUT");
        assert!(parse_id("").is_err());
    }

    #[test]
    fn test_success_envelope_flattens() {
        let value = serde_json::to_value(SuccessResponse::new(BoardText {
            text: "hi".to_string(),
        }))
        .unwrap();
        assert_eq!(value, json!({"ok": true, "text": "hi"}));
    }
}
