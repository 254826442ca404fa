//! The error taxonomy from the error handling design: kinds, not types.
//! Every `GameClient` call and every action's `execute` body resolves its
//! failure into one of these variants so the executor and the loop can
//! decide retry vs. surface vs. fatal-exit without inspecting transport
//! details.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
    /// Inputs violate preconditions locally; no API call was made.
    #[error("validation error: {0}")]
    Validation(String),

    /// The server returned 404 for an entity. Recoverable by learning and
    /// skipping the entity.
    #[error("not found: {0}")]
    NotFound(String),

    /// The server refused because the character is on cooldown.
    #[error("character on cooldown, {seconds:.1}s remaining")]
    Cooldown { seconds: f64 },

    /// Code 490 on `move`: treated as success, not failure, by callers —
    /// surfaced as a distinct variant so the HTTP layer can still report
    /// it through the `Result` plumbing before the action layer folds it
    /// into a success-equivalent `MoveResult`.
    #[error("already at destination")]
    AlreadyAtDestination,

    /// Timeouts, 5xx, connection errors. Retried with exponential backoff
    /// by the caller.
    #[error("transient network error: {0}")]
    Transient(String),

    /// Other 4xx (insufficient materials, invalid slot, etc). Triggers a
    /// replan.
    #[error("rejected: {0}")]
    Rejected(String),

    /// Unrecoverable: authentication failure, or repeated `Rejected` on
    /// the same action with the same inputs within one loop iteration.
    /// Causes the loop to exit.
    #[error("fatal error: {0}")]
    Fatal(String),
}

impl GameError {
    /// Classifies an HTTP status code and body into the taxonomy. `490` is
    /// ArtifactsMMO's "already at destination" code on `move`; other
    /// status ranges follow the general REST convention assumed by §7.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            490 => GameError::AlreadyAtDestination,
            404 => GameError::NotFound(body),
            401 | 403 => GameError::Fatal(body),
            499 | 408 => GameError::Cooldown { seconds: parse_cooldown_seconds(&body) },
            500..=599 => GameError::Transient(body),
            400..=499 => GameError::Rejected(body),
            _ => GameError::Transient(body),
        }
    }

    /// Whether the caller should retry with backoff rather than surface
    /// this immediately.
    pub fn is_transient(&self) -> bool {
        matches!(self, GameError::Transient(_))
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, GameError::Fatal(_))
    }
}

/// Extracts the remaining-cooldown seconds from a 499/408 body, e.g. the
/// server's "Character in cooldown: 12.34 seconds left" text. Falls back to
/// `0.0` if the body carries no parseable number, so an unrecognized body
/// shape still arms the gate rather than panicking.
fn parse_cooldown_seconds(body: &str) -> f64 {
    body.split(|c: char| !c.is_ascii_digit() && c != '.')
        .find_map(|token| token.parse::<f64>().ok())
        .unwrap_or(0.0)
}
