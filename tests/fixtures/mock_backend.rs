//! In-memory stand-in for the detective game backend
//!
//! Serves the REST contract the built-in scenarios exercise, with the same
//! status codes and error texts as the real server, over one hard-coded
//! case. Bound to an ephemeral localhost port.

#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const CASE_ID: &str = "7d3c2a10-0000-4000-8000-000000000001";
pub const GUILTY_ID: &str = "7d3c2a10-0000-4000-8000-0000000000a2";

struct Suspect {
    id: &'static str,
    name: &'static str,
    backstory: &'static str,
    is_guilty: bool,
}

struct Evidence {
    id: &'static str,
    name: &'static str,
    required: bool,
    keywords: &'static [&'static str],
}

const SUSPECTS: &[Suspect] = &[
    Suspect {
        id: "7d3c2a10-0000-4000-8000-0000000000a1",
        name: "Margaret Hale",
        backstory: "The gallery owner, deep in debt",
        is_guilty: false,
    },
    Suspect {
        id: GUILTY_ID,
        name: "Victor Crane",
        backstory: "Night guard with a gambling problem",
        is_guilty: true,
    },
    Suspect {
        id: "7d3c2a10-0000-4000-8000-0000000000a3",
        name: "Elena Voss",
        backstory: "Restorer who found the empty frame",
        is_guilty: false,
    },
];

const EVIDENCE: &[Evidence] = &[
    Evidence {
        id: "7d3c2a10-0000-4000-8000-0000000000e1",
        name: "Security camera footage",
        required: true,
        keywords: &["camera", "footage"],
    },
    Evidence {
        id: "7d3c2a10-0000-4000-8000-0000000000e2",
        name: "Guard rota",
        required: true,
        keywords: &["rota", "shift"],
    },
    Evidence {
        id: "7d3c2a10-0000-4000-8000-0000000000e3",
        name: "Pawn shop receipt",
        required: true,
        keywords: &["receipt", "pawn"],
    },
    Evidence {
        id: "7d3c2a10-0000-4000-8000-0000000000e4",
        name: "Muddy footprints",
        required: false,
        keywords: &["footprint", "mud"],
    },
    Evidence {
        id: "7d3c2a10-0000-4000-8000-0000000000e5",
        name: "Torn invitation",
        required: false,
        keywords: &["invitation"],
    },
];

/// Deliberate contract violations for negative tests
#[derive(Debug, Clone, Copy, Default)]
pub struct Faults {
    /// Accept unlocking the same evidence twice
    pub allow_duplicate_unlock: bool,
}

#[derive(Default)]
struct Game {
    is_completed: bool,
    message_count: u64,
    messages: Vec<Value>,
    unlocked: Vec<&'static str>,
    last_updated: u64,
}

#[derive(Default)]
struct Backend {
    faults: Faults,
    games: HashMap<String, Game>,
    next_game: u64,
    clock: u64,
}

impl Backend {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

type Shared = Arc<Mutex<Backend>>;

/// A running mock server
pub struct MockBackend {
    pub base_url: String,
    handle: JoinHandle<()>,
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub async fn spawn() -> MockBackend {
    spawn_with(Faults::default()).await
}

pub async fn spawn_with(faults: Faults) -> MockBackend {
    let state: Shared = Arc::new(Mutex::new(Backend {
        faults,
        ..Backend::default()
    }));

    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/cases", get(list_cases))
        .route("/api/cases/ping", get(cases_ping))
        .route("/api/cases/:case_id", get(case_detail))
        .route("/api/cases/:case_id/test", get(case_test))
        .route("/api/games/start", post(start_game))
        .route("/api/games/:game_id", get(get_game).delete(end_game))
        .route("/api/chat/:game_id/chat", post(chat))
        .route("/api/evidence/case/:case_id", get(case_evidence))
        .route("/api/evidence/game/:game_id/unlocked", get(unlocked_evidence))
        .route("/api/evidence/game/:game_id/unlock", post(unlock_evidence))
        .route("/api/evidence/game/:game_id/stats", get(evidence_stats))
        .route("/api/accusation/:game_id", post(accuse))
        .fallback(not_found)
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock backend");
    let addr = listener.local_addr().expect("mock backend address");
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockBackend {
        base_url: format!("http://{}", addr),
        handle,
    }
}

/// An origin nothing listens on
pub async fn closed_port() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("address");
    drop(listener);
    format!("http://{}", addr)
}

fn reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn error(status: StatusCode, message: &str) -> Response {
    reply(status, json!({ "success": false, "error": message }))
}

/// Decode a JSON request body; an empty body reads as `{}`
///
/// Malformed JSON gets the HTML page Express's default error handler
/// serves when its body parser throws.
fn parse_body(body: &Bytes) -> Result<Value, Response> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(json!({}));
    }
    serde_json::from_slice(body).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Html(format!(
                "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>Error</title>\n</head>\n<body>\n<pre>SyntaxError: {}</pre>\n</body>\n</html>\n",
                e
            )),
        )
            .into_response()
    })
}

/// JavaScript truthiness for a request field that must be a string
fn present_str<'a>(body: &'a Value, field: &str) -> Option<&'a str> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn evidence_json(e: &Evidence) -> Value {
    json!({
        "evidence_id": e.id,
        "case_id": CASE_ID,
        "display_name": e.name,
        "is_required_for_accusation": e.required,
    })
}

fn suspect_json(s: &Suspect) -> Value {
    json!({
        "suspect_id": s.id,
        "name": s.name,
        "backstory": s.backstory,
        "is_guilty": s.is_guilty,
    })
}

fn timestamp(tick: u64) -> String {
    format!("2025-01-01T00:00:{:02}.000Z", tick % 60)
}

async fn not_found() -> Response {
    error(StatusCode::NOT_FOUND, "Endpoint not found")
}

async fn health() -> Response {
    reply(
        StatusCode::OK,
        json!({ "status": "OK", "message": "Detective game backend is running" }),
    )
}

async fn list_cases() -> Response {
    reply(
        StatusCode::OK,
        json!({
            "success": true,
            "cases": [{
                "case_id": CASE_ID,
                "title": "The Empty Frame",
                "description": "A painting vanished from a locked gallery",
            }],
        }),
    )
}

async fn cases_ping() -> Response {
    reply(
        StatusCode::OK,
        json!({ "message": "Cases router is working!" }),
    )
}

async fn case_detail(Path(case_id): Path<String>) -> Response {
    if case_id != CASE_ID {
        return error(StatusCode::NOT_FOUND, "Case not found");
    }
    reply(
        StatusCode::OK,
        json!({
            "success": true,
            "case": { "case_id": CASE_ID, "title": "The Empty Frame" },
            "suspects": SUSPECTS.iter().map(suspect_json).collect::<Vec<_>>(),
            "scene_objects": [
                { "object_id": "o-1", "name": "Empty frame" },
                { "object_id": "o-2", "name": "Guard desk" },
            ],
            "evidence": EVIDENCE.iter().map(evidence_json).collect::<Vec<_>>(),
        }),
    )
}

async fn case_test(Path(case_id): Path<String>) -> Response {
    if case_id != CASE_ID {
        return error(StatusCode::NOT_FOUND, "Case not found");
    }
    reply(
        StatusCode::OK,
        json!({
            "success": true,
            "valid": true,
            "tests": {
                "has_suspects": true,
                "has_one_guilty_suspect": true,
                "has_evidence": true,
                "has_required_evidence": true,
            },
            "summary": { "passed_tests": 4, "total_tests": 4 },
        }),
    )
}

async fn start_game(State(state): State<Shared>, body: Bytes) -> Response {
    let body = match parse_body(&body) {
        Ok(body) => body,
        Err(page) => return page,
    };
    let Some(case_id) = present_str(&body, "case_id") else {
        return error(StatusCode::BAD_REQUEST, "case_id is required");
    };
    if case_id != CASE_ID {
        return error(StatusCode::NOT_FOUND, "Case not found");
    }

    let mut backend = state.lock().unwrap();
    backend.next_game += 1;
    let game_id = format!("9b1e4f00-0000-4000-8000-{:012}", backend.next_game);
    let tick = backend.tick();
    backend.games.insert(
        game_id.clone(),
        Game {
            last_updated: tick,
            ..Game::default()
        },
    );

    reply(
        StatusCode::CREATED,
        json!({
            "success": true,
            "game": {
                "game_id": game_id,
                "case_id": CASE_ID,
                "is_completed": false,
                "message_count": 0,
                "last_updated": timestamp(tick),
            },
        }),
    )
}

async fn get_game(State(state): State<Shared>, Path(game_id): Path<String>) -> Response {
    let backend = state.lock().unwrap();
    let Some(game) = backend.games.get(&game_id) else {
        return error(StatusCode::NOT_FOUND, "Game session not found");
    };
    let unlocked: Vec<Value> = EVIDENCE
        .iter()
        .filter(|e| game.unlocked.contains(&e.id))
        .map(evidence_json)
        .collect();

    reply(
        StatusCode::OK,
        json!({
            "success": true,
            "game": {
                "game_id": game_id,
                "case_id": CASE_ID,
                "case_title": "The Empty Frame",
                "is_completed": game.is_completed,
                "message_count": game.message_count,
                "last_updated": timestamp(game.last_updated),
            },
            "messages": game.messages,
            "unlocked_evidence": unlocked,
            "stats": {
                "total_messages": game.messages.len(),
                "evidence_found": game.unlocked.len(),
            },
        }),
    )
}

async fn end_game(State(state): State<Shared>, Path(game_id): Path<String>) -> Response {
    let mut backend = state.lock().unwrap();
    let tick = backend.tick();
    let Some(game) = backend.games.get_mut(&game_id) else {
        return error(StatusCode::NOT_FOUND, "Game session not found");
    };
    game.is_completed = true;
    game.last_updated = tick;
    reply(
        StatusCode::OK,
        json!({ "success": true, "message": "Game session ended" }),
    )
}

async fn chat(
    State(state): State<Shared>,
    Path(game_id): Path<String>,
    body: Bytes,
) -> Response {
    let body = match parse_body(&body) {
        Ok(body) => body,
        Err(page) => return page,
    };
    let Some(message) = present_str(&body, "message") else {
        return error(StatusCode::BAD_REQUEST, "Message is required and must be a string");
    };
    let message = message.trim();
    if message.is_empty() {
        return error(StatusCode::BAD_REQUEST, "Message cannot be empty");
    }
    if message.chars().count() == 1 {
        return error(StatusCode::BAD_REQUEST, "Message must be at least 2 characters long");
    }
    if !message.chars().any(|c| c.is_ascii_alphabetic()) {
        return error(
            StatusCode::BAD_REQUEST,
            "Message must contain at least one alphabetic character",
        );
    }

    let mut backend = state.lock().unwrap();
    let tick = backend.tick();
    let Some(game) = backend.games.get_mut(&game_id) else {
        return error(StatusCode::NOT_FOUND, "Game session not found");
    };
    if game.is_completed {
        return error(StatusCode::BAD_REQUEST, "This game has already been completed");
    }

    let lowered = message.to_lowercase();
    let mut newly = Vec::new();
    for e in EVIDENCE {
        if !game.unlocked.contains(&e.id) && e.keywords.iter().any(|k| lowered.contains(k)) {
            game.unlocked.push(e.id);
            newly.push(evidence_json(e));
        }
    }

    let ai_response = format!("The detective considers: \"{}\"", message);
    game.messages.push(json!({ "role": "user", "content": message }));
    game.messages.push(json!({ "role": "assistant", "content": ai_response }));
    game.message_count += 1;
    game.last_updated = tick;
    let count = game.message_count;

    reply(
        StatusCode::OK,
        json!({
            "success": true,
            "ai_response": ai_response,
            "new_evidence_unlocked": newly,
            "message_count": count,
            "summary_triggered": count > 0 && count % 5 == 0,
        }),
    )
}

async fn case_evidence(Path(case_id): Path<String>) -> Response {
    let evidence: Vec<Value> = if case_id == CASE_ID {
        EVIDENCE.iter().map(evidence_json).collect()
    } else {
        Vec::new()
    };
    reply(
        StatusCode::OK,
        json!({ "success": true, "count": evidence.len(), "evidence": evidence }),
    )
}

async fn unlocked_evidence(State(state): State<Shared>, Path(game_id): Path<String>) -> Response {
    let backend = state.lock().unwrap();
    let unlocked: Vec<Value> = backend
        .games
        .get(&game_id)
        .map(|game| {
            EVIDENCE
                .iter()
                .filter(|e| game.unlocked.contains(&e.id))
                .map(evidence_json)
                .collect()
        })
        .unwrap_or_default();
    reply(
        StatusCode::OK,
        json!({ "success": true, "count": unlocked.len(), "evidence": unlocked }),
    )
}

async fn unlock_evidence(
    State(state): State<Shared>,
    Path(game_id): Path<String>,
    body: Bytes,
) -> Response {
    let body = match parse_body(&body) {
        Ok(body) => body,
        Err(page) => return page,
    };
    let Some(evidence_id) = present_str(&body, "evidence_id") else {
        return error(StatusCode::BAD_REQUEST, "Evidence ID is required");
    };
    let Some(evidence) = EVIDENCE.iter().find(|e| e.id == evidence_id) else {
        return error(StatusCode::NOT_FOUND, "Evidence not found");
    };

    let mut backend = state.lock().unwrap();
    let allow_duplicate = backend.faults.allow_duplicate_unlock;
    let Some(game) = backend.games.get_mut(&game_id) else {
        return error(StatusCode::NOT_FOUND, "Game not found");
    };
    if game.unlocked.contains(&evidence.id) {
        if !allow_duplicate {
            return error(StatusCode::BAD_REQUEST, "Evidence already unlocked");
        }
    } else {
        game.unlocked.push(evidence.id);
    }

    reply(
        StatusCode::OK,
        json!({
            "success": true,
            "message": "Evidence unlocked successfully",
            "evidence_id": evidence.id,
        }),
    )
}

async fn evidence_stats(State(state): State<Shared>, Path(game_id): Path<String>) -> Response {
    let backend = state.lock().unwrap();
    let Some(game) = backend.games.get(&game_id) else {
        return error(StatusCode::NOT_FOUND, "Game not found");
    };

    let total = EVIDENCE.len();
    let unlocked = game.unlocked.len();
    let required: Vec<_> = EVIDENCE.iter().filter(|e| e.required).collect();
    let required_unlocked = required
        .iter()
        .filter(|e| game.unlocked.contains(&e.id))
        .count();
    let progress = (unlocked as f64 / total as f64 * 100.0).round() as u64;

    reply(
        StatusCode::OK,
        json!({
            "success": true,
            "stats": {
                "total_evidence": total,
                "unlocked_count": unlocked,
                "required_count": required.len(),
                "required_unlocked": required_unlocked,
                "can_make_accusation": required_unlocked == required.len() && !required.is_empty(),
                "progress_percent": progress,
            },
        }),
    )
}

async fn accuse(
    State(state): State<Shared>,
    Path(game_id): Path<String>,
    body: Bytes,
) -> Response {
    let body = match parse_body(&body) {
        Ok(body) => body,
        Err(page) => return page,
    };
    let Some(accused_id) = present_str(&body, "accused_suspect_id") else {
        return error(StatusCode::BAD_REQUEST, "Missing required field: accused_suspect_id");
    };

    let mut backend = state.lock().unwrap();
    let tick = backend.tick();
    let Some(game) = backend.games.get_mut(&game_id) else {
        return error(StatusCode::NOT_FOUND, "Game session not found");
    };
    if game.is_completed {
        return error(StatusCode::BAD_REQUEST, "Game session is already completed");
    }

    let required: Vec<_> = EVIDENCE.iter().filter(|e| e.required).collect();
    let missing = required
        .iter()
        .filter(|e| !game.unlocked.contains(&e.id))
        .count();
    if missing > 0 {
        return reply(
            StatusCode::BAD_REQUEST,
            json!({
                "error": "Cannot make accusation: missing required evidence",
                "missing_count": missing,
                "total_required": required.len(),
            }),
        );
    }

    let Some(accused) = SUSPECTS.iter().find(|s| s.id == accused_id) else {
        return error(
            StatusCode::BAD_REQUEST,
            "Invalid suspect_id: suspect not found in this case",
        );
    };
    let guilty = &SUSPECTS[1];
    let is_correct = accused.is_guilty;

    game.is_completed = true;
    game.last_updated = tick;

    let message = if is_correct {
        format!(
            "Congratulations! You correctly identified {} as the guilty party. The case is solved!",
            accused.name
        )
    } else {
        format!(
            "Incorrect! You accused {}, but {} was actually guilty.",
            accused.name, guilty.name
        )
    };

    reply(
        StatusCode::OK,
        json!({
            "success": true,
            "result": {
                "is_correct": is_correct,
                "game_over": true,
                "message": message,
                "guilty_suspect": {
                    "suspect_id": guilty.id,
                    "name": guilty.name,
                    "backstory": guilty.backstory,
                },
                "accused_suspect": {
                    "suspect_id": accused.id,
                    "name": accused.name,
                    "backstory": accused.backstory,
                },
                "evidence_collected": game.unlocked.len(),
                "total_evidence": EVIDENCE.len(),
                "required_evidence_collected": required.len(),
            },
        }),
    )
}
