//! Reusable setup step groups
//!
//! Scenarios compose these by reference instead of repeating the
//! "get cases, start game, unlock evidence" preamble. A fixture declares the
//! fixtures it depends on; [`Scenario::fixture`](super::Scenario::fixture)
//! pulls those in once.
//!
//! Context keys provided:
//!
//! | Fixture | Keys |
//! |---|---|
//! | `case` | `case_id`, `case_title` |
//! | `suspects` | `guilty_suspect_id`, `innocent_suspect_id` |
//! | `required_evidence` | `required_evidence_ids` |
//! | `started_game` | `game_id` |
//! | `evidenced_game` | `game_id` with every required item unlocked |

use serde::Deserialize;
use serde_json::json;

use super::model::{Predicate, Step};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fixture {
    /// First case returned by the backend
    Case,
    /// One guilty and one innocent suspect of the case
    Suspects,
    /// Ids of the evidence flagged as required for accusation
    RequiredEvidence,
    /// A fresh game on the case
    StartedGame,
    /// A fresh game with all required evidence unlocked
    EvidencedGame,
}

impl Fixture {
    pub const ALL: [Fixture; 5] = [
        Fixture::Case,
        Fixture::Suspects,
        Fixture::RequiredEvidence,
        Fixture::StartedGame,
        Fixture::EvidencedGame,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Fixture::Case => "case",
            Fixture::Suspects => "suspects",
            Fixture::RequiredEvidence => "required_evidence",
            Fixture::StartedGame => "started_game",
            Fixture::EvidencedGame => "evidenced_game",
        }
    }

    /// Fixtures whose context keys this one reads
    pub fn requires(self) -> &'static [Fixture] {
        match self {
            Fixture::Case => &[],
            Fixture::Suspects | Fixture::RequiredEvidence | Fixture::StartedGame => {
                &[Fixture::Case]
            }
            Fixture::EvidencedGame => &[Fixture::StartedGame, Fixture::RequiredEvidence],
        }
    }

    /// This fixture's own steps, dependencies excluded
    pub fn steps(self) -> Vec<Step> {
        match self {
            Fixture::Case => vec![Step::get("Fetch available cases", "/api/cases")
                .expect(Predicate::at("cases").min_len(1))
                .capture("case_id", "cases.0.case_id")
                .capture("case_title", "cases.0.title")],

            Fixture::Suspects => vec![Step::get("Fetch case suspects", "/api/cases/${case_id}")
                .expect(Predicate::at("suspects[?is_guilty]").len(1))
                .expect(Predicate::at("suspects[?!is_guilty]").min_len(1))
                .capture("guilty_suspect_id", "suspects[?is_guilty].0.suspect_id")
                .capture("innocent_suspect_id", "suspects[?!is_guilty].0.suspect_id")],

            Fixture::RequiredEvidence => vec![Step::get(
                "Fetch required evidence",
                "/api/evidence/case/${case_id}",
            )
            .expect(Predicate::at("evidence[?is_required_for_accusation]").min_len(1))
            .capture(
                "required_evidence_ids",
                "evidence[?is_required_for_accusation].evidence_id",
            )],

            Fixture::StartedGame => vec![Step::post(
                "Start a game",
                "/api/games/start",
                json!({ "case_id": "${case_id}" }),
            )
            .status(201)
            .expect(Predicate::at("game.is_completed").equals(false))
            .capture("game_id", "game.game_id")],

            Fixture::EvidencedGame => vec![Step::post(
                "Unlock required evidence",
                "/api/evidence/game/${game_id}/unlock",
                json!({ "evidence_id": "${item}" }),
            )
            .for_each("required_evidence_ids")],
        }
    }
}
