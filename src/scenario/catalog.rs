//! Built-in conformance scenarios
//!
//! Each scenario starts its own game, since the backend offers no reset and
//! earlier runs leave completed games behind.

use serde_json::json;

use super::fixtures::Fixture;
use super::model::{JsonType, Predicate, Scenario, Step};
use crate::http::Method;

/// A well-formed UUID that no case, game or suspect uses
pub const UNKNOWN_ID: &str = "00000000-0000-0000-0000-000000000000";

/// Every built-in scenario in execution order
pub fn builtin() -> Vec<Scenario> {
    vec![
        health(),
        cases(),
        game_lifecycle(),
        chat(),
        evidence(),
        accusation_gating(),
        correct_accusation(),
        accusation_validation(),
        request_validation(),
    ]
}

fn chat_step(name: &str, message: &str) -> Step {
    Step::post(
        name,
        "/api/chat/${game_id}/chat",
        json!({ "message": message }),
    )
}

fn accuse(name: &str, suspect: &str) -> Step {
    Step::post(
        name,
        "/api/accusation/${game_id}",
        json!({ "accused_suspect_id": suspect }),
    )
}

pub fn health() -> Scenario {
    Scenario::new("health")
        .describe("Backend is up and the cases router answers")
        .step(Step::get("Health check", "/api/health").expect(Predicate::at("status").equals("OK")))
        .step(
            Step::get("Cases router ping", "/api/cases/ping")
                .expect(Predicate::at("message").contains("working")),
        )
}

pub fn cases() -> Scenario {
    Scenario::new("cases")
        .describe("Case listing, detail and data integrity")
        .fixture(Fixture::Case)
        .step(
            Step::get("Fetch case detail", "/api/cases/${case_id}")
                .expect(Predicate::at("suspects").min_len(2))
                .expect(Predicate::at("scene_objects").is_type(JsonType::Array))
                .expect(Predicate::at("evidence").min_len(1)),
        )
        .step(
            Step::get("Check case data integrity", "/api/cases/${case_id}/test")
                .expect(Predicate::at("tests").is_type(JsonType::Object))
                .expect(Predicate::at("summary.total_tests").gt(0.0))
                .expect(Predicate::at("summary.passed_tests").is_type(JsonType::Number)),
        )
        .step(
            Step::get("Unknown case is rejected", format!("/api/cases/{}", UNKNOWN_ID))
                .status(404)
                .expect_error("not found"),
        )
}

pub fn game_lifecycle() -> Scenario {
    Scenario::new("game_lifecycle")
        .describe("Start, inspect and end a game session")
        .fixture(Fixture::StartedGame)
        .step(
            Step::get("Fetch new game", "/api/games/${game_id}")
                .expect(Predicate::at("game.game_id").equals("${game_id}"))
                .expect(Predicate::at("game.is_completed").equals(false))
                .expect(Predicate::at("stats.total_messages").equals(0))
                .expect(Predicate::at("stats.evidence_found").equals(0)),
        )
        .step(
            Step::delete("End game", "/api/games/${game_id}")
                .expect(Predicate::at("success").equals(true))
                .expect(Predicate::at("message").exists(true)),
        )
        .step(
            Step::get("Ended game is completed", "/api/games/${game_id}")
                .expect(Predicate::at("game.is_completed").equals(true))
                .expect(Predicate::at("game.last_updated").exists(true)),
        )
        .step(
            Step::get("Unknown game is rejected", format!("/api/games/{}", UNKNOWN_ID))
                .status(404)
                .expect_error("not found"),
        )
}

pub fn chat() -> Scenario {
    Scenario::new("chat")
        .describe("Message validation, counting, summarization trigger and completion lock")
        .fixture(Fixture::StartedGame)
        .step(
            chat_step("Empty message is rejected", "")
                .status(400)
                .expect_error("required"),
        )
        .step(
            chat_step("Whitespace-only message is rejected", "   ")
                .status(400)
                .expect_error("cannot be empty"),
        )
        .step(
            chat_step("Single character is rejected", "a")
                .status(400)
                .expect_error("2 characters"),
        )
        .step(
            chat_step("Digits only are rejected", "123 456")
                .status(400)
                .expect_error("alphabetic"),
        )
        .step(
            chat_step("First message", "Who are the suspects in this case?")
                .expect(Predicate::at("ai_response").is_type(JsonType::String))
                .expect(Predicate::at("new_evidence_unlocked").is_type(JsonType::Array))
                .expect(Predicate::at("message_count").equals(1))
                .expect(Predicate::at("summary_triggered").equals(false)),
        )
        .step(
            chat_step("Message with evidence keywords", "Tell me about the security camera footage")
                .expect(Predicate::at("new_evidence_unlocked").is_type(JsonType::Array))
                .expect(Predicate::at("message_count").equals(2)),
        )
        .step(
            chat_step("Third message", "What else can you tell me about the case? Question one")
                .expect(Predicate::at("message_count").equals(3))
                .expect(Predicate::at("summary_triggered").equals(false)),
        )
        .step(
            chat_step("Fourth message", "What else can you tell me about the case? Question two")
                .expect(Predicate::at("message_count").equals(4))
                .expect(Predicate::at("summary_triggered").equals(false)),
        )
        .step(
            chat_step("Fifth message triggers summary", "What else can you tell me about the case? Question three")
                .expect(Predicate::at("message_count").equals(5))
                .expect(Predicate::at("summary_triggered").equals(true)),
        )
        .step(
            Step::get("Messages are stored", "/api/games/${game_id}")
                .expect(Predicate::at("game.message_count").equals(5))
                .expect(Predicate::at("messages").min_len(5))
                .expect(Predicate::at("unlocked_evidence").is_type(JsonType::Array)),
        )
        .step(Step::delete("End game", "/api/games/${game_id}"))
        .step(
            chat_step("Chat on completed game is rejected", "This should fail")
                .status(400)
                .expect_error("completed"),
        )
}

pub fn evidence() -> Scenario {
    Scenario::new("evidence")
        .describe("Evidence listing, manual unlock, duplicate prevention and stats")
        .fixture(Fixture::Case)
        .step(
            Step::get("List case evidence", "/api/evidence/case/${case_id}")
                .expect(Predicate::at("count").gt(0.0))
                .expect(Predicate::at("evidence.0.display_name").is_type(JsonType::String))
                .expect(Predicate::at("evidence.0.is_required_for_accusation").is_type(JsonType::Bool))
                .capture("evidence_id", "evidence.0.evidence_id")
                .capture("evidence_total", "count"),
        )
        .fixture(Fixture::StartedGame)
        .step(
            Step::get("Nothing unlocked yet", "/api/evidence/game/${game_id}/unlocked")
                .expect(Predicate::at("count").equals(0)),
        )
        .step(
            Step::get("Initial stats", "/api/evidence/game/${game_id}/stats")
                .expect(Predicate::at("stats.total_evidence").equals("${evidence_total}"))
                .expect(Predicate::at("stats.unlocked_count").equals(0))
                .expect(Predicate::at("stats.progress_percent").equals(0))
                .expect(Predicate::at("stats.can_make_accusation").equals(false)),
        )
        .step(
            Step::post(
                "Unlock evidence",
                "/api/evidence/game/${game_id}/unlock",
                json!({ "evidence_id": "${evidence_id}" }),
            )
            .expect(Predicate::at("success").equals(true)),
        )
        .step(
            Step::get("One item unlocked", "/api/evidence/game/${game_id}/unlocked")
                .expect(Predicate::at("count").equals(1)),
        )
        .step(
            Step::get("Stats after unlock", "/api/evidence/game/${game_id}/stats")
                .expect(Predicate::at("stats.unlocked_count").equals(1))
                .expect(Predicate::at("stats.progress_percent").gt(0.0)),
        )
        .step(
            Step::post(
                "Duplicate unlock is rejected",
                "/api/evidence/game/${game_id}/unlock",
                json!({ "evidence_id": "${evidence_id}" }),
            )
            .status(400)
            .expect_error("already unlocked"),
        )
        .step(
            chat_step("Evidence unlock through chat", "Tell me about the security camera footage")
                .expect(Predicate::at("new_evidence_unlocked").is_type(JsonType::Array)),
        )
        .step(
            Step::get("Final stats", "/api/evidence/game/${game_id}/stats")
                .expect(Predicate::at("stats.unlocked_count").gte(1.0))
                .expect(Predicate::at("stats.required_count").gt(0.0))
                .expect(Predicate::at("stats.required_unlocked").is_type(JsonType::Number)),
        )
}

pub fn accusation_gating() -> Scenario {
    Scenario::new("accusation_gating")
        .describe("Accusation needs all required evidence; a wrong accusation ends the game")
        .fixture(Fixture::StartedGame)
        .fixture(Fixture::Suspects)
        .step(
            accuse("Accusation without evidence is rejected", "${guilty_suspect_id}")
                .status(400)
                .expect_error("missing required evidence")
                .expect(Predicate::at("total_required").gt(0.0)),
        )
        .fixture(Fixture::EvidencedGame)
        .step(
            Step::get("Accusation is now allowed", "/api/evidence/game/${game_id}/stats")
                .expect(Predicate::at("stats.can_make_accusation").equals(true)),
        )
        .step(
            accuse("Wrong accusation", "${innocent_suspect_id}")
                .expect(Predicate::at("result.is_correct").equals(false))
                .expect(Predicate::at("result.game_over").equals(true))
                .expect(Predicate::at("result.accused_suspect.suspect_id").equals("${innocent_suspect_id}"))
                .expect(Predicate::at("result.guilty_suspect.suspect_id").equals("${guilty_suspect_id}")),
        )
        .step(
            accuse("Second accusation is rejected", "${guilty_suspect_id}")
                .status(400)
                .expect_error("already completed"),
        )
        .step(
            chat_step("Chat after accusation is rejected", "Who did it after all?")
                .status(400)
                .expect_error("completed"),
        )
        .step(
            Step::get("Game is completed", "/api/games/${game_id}")
                .expect(Predicate::at("game.is_completed").equals(true)),
        )
}

pub fn correct_accusation() -> Scenario {
    Scenario::new("correct_accusation")
        .describe("Accusing the guilty suspect with all required evidence solves the case")
        .fixture(Fixture::EvidencedGame)
        .fixture(Fixture::Suspects)
        .step(
            accuse("Correct accusation", "${guilty_suspect_id}")
                .expect(Predicate::at("success").equals(true))
                .expect(Predicate::at("result.is_correct").equals(true))
                .expect(Predicate::at("result.game_over").equals(true))
                .expect(Predicate::at("result.message").contains("congratulations"))
                .expect(Predicate::at("result.guilty_suspect.suspect_id").equals("${guilty_suspect_id}"))
                .expect(Predicate::at("result.evidence_collected").gte(1.0))
                .expect(Predicate::at("result.total_evidence").gt(0.0)),
        )
        .step(
            chat_step("Chat after solving is rejected", "Can we talk more?")
                .status(400)
                .expect_error("completed"),
        )
}

pub fn accusation_validation() -> Scenario {
    Scenario::new("accusation_validation")
        .describe("Unknown suspects and missing fields are rejected without ending the game")
        .fixture(Fixture::EvidencedGame)
        .step(
            accuse("Unknown suspect is rejected", UNKNOWN_ID)
                .status(400)
                .expect_error("suspect not found"),
        )
        .step(accuse("Non-UUID suspect id is rejected", "not-a-uuid").status(400))
        .step(
            Step::post("Missing suspect id is rejected", "/api/accusation/${game_id}", json!({}))
                .status(400)
                .expect_error("missing"),
        )
        .step(
            Step::get("Game is still open", "/api/games/${game_id}")
                .expect(Predicate::at("game.is_completed").equals(false)),
        )
}

pub fn request_validation() -> Scenario {
    Scenario::new("request_validation")
        .describe("Malformed identifiers, missing fields and unknown routes")
        .fixture(Fixture::StartedGame)
        .step(
            Step::post(
                "Malformed game id is rejected",
                "/api/chat/invalid-uuid/chat",
                json!({ "message": "Test message" }),
            )
            .status_in(&[400, 404]),
        )
        .step(
            Step::post("Missing message is rejected", "/api/chat/${game_id}/chat", json!({}))
                .status(400)
                .expect(Predicate::at("error").exists(true)),
        )
        .step(chat_step("Blank message is rejected", "   ").status(400))
        .step(
            Step::new(Method::Post, "Malformed JSON body is rejected", "/api/games/start")
                .raw_body(r#"{"invalid json"#)
                .status(400),
        )
        .step(
            Step::post("Missing case id is rejected", "/api/games/start", json!({}))
                .status(400)
                .expect_error("case_id"),
        )
        .step(Step::get("Unknown route", "/api/nonexistent/route").status(404))
}
