//! Free helper functions shared across action families: movement,
//! state-delta formatting, and the nested-key constructors every
//! descriptor uses to build `StateMap` preconditions/effects.
//!
//! Kept as free functions rather than a base `Action` class (Design Notes
//! §9): each descriptor composes what it needs instead of inheriting a
//! chain of overrides.

use agent_client::{CharacterSnapshot, GameClient, GameError};
use agent_planning::{StateMap, StateValue};

/// Builds a one-level-deep `StateMap` with dotted notation flattened into
/// nested maps, e.g. `state(&[("character_status.alive", true.into())])`.
pub fn state(pairs: &[(&str, StateValue)]) -> StateMap {
    let mut result = StateMap::new();
    for (path, value) in pairs {
        set_path(&mut result, path, value.clone());
    }
    result
}

pub fn set_path(map: &mut StateMap, path: &str, value: StateValue) {
    let mut segments = path.split('.').peekable();
    let mut cursor = map;
    loop {
        let segment = segments.next().expect("path must have at least one segment");
        if segments.peek().is_none() {
            cursor.insert(segment.to_string(), value);
            return;
        }
        let entry = cursor.entry(segment.to_string()).or_insert_with(|| StateValue::Map(StateMap::new()));
        match entry {
            StateValue::Map(nested) => cursor = nested,
            _ => {
                *entry = StateValue::Map(StateMap::new());
                match entry {
                    StateValue::Map(nested) => cursor = nested,
                    _ => unreachable!(),
                }
            }
        }
    }
}

/// The character-derived slice of state every action effect set overlays:
/// position, hp, and the immediately-checkable "alive" flag.
pub fn character_state_delta(snapshot: &CharacterSnapshot) -> StateMap {
    state(&[
        ("character_status.x", (snapshot.x as f64).into()),
        ("character_status.y", (snapshot.y as f64).into()),
        ("character_status.hp", (snapshot.hp as f64).into()),
        ("character_status.alive", (snapshot.hp > 0).into()),
    ])
}

/// Moves the character to `(x, y)` and classifies code-490 "already there"
/// as a success-equivalent rather than a failure (§7).
pub async fn move_character(
    client: &dyn GameClient,
    character: &str,
    x: i32,
    y: i32,
) -> Result<agent_client::MoveResult, GameError> {
    match client.move_to(character, x, y).await {
        Ok(result) => Ok(result),
        Err(GameError::AlreadyAtDestination) => {
            let snapshot = client.get_character(character).await?;
            Ok(agent_client::MoveResult { character: snapshot, cooldown_seconds: 0.0, already_at_destination: true })
        }
        Err(e) => Err(e),
    }
}
