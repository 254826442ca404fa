//! The nested state map that preconditions, effects, and goal predicates are
//! all expressed in. Two layers of nesting are typical
//! (`character_status.alive`, `combat_context.status`), but the
//! representation is recursive and doesn't enforce a depth limit.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A nested mapping of string keys to scalar/bool/numeric values.
///
/// `BTreeMap` keeps keys in sorted order so two structurally equal states
/// always serialize identically — that stable serialization is what
/// [`state_hash`] hashes for the planner's closed set.
pub type StateMap = BTreeMap<String, StateValue>;

/// A single value in a [`StateMap`].
///
/// The same shape is reused for preconditions, effects, and goal
/// predicates. A `Text` value that starts with a comparison operator
/// (`<`, `<=`, `>`, `>=`) followed by a number is interpreted as a numeric
/// predicate rather than a literal string when matched against state (see
/// [`value_matches`]); plain numbers and plain text are matched by exact
/// equality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
    Map(StateMap),
    /// Sentinel for an effect whose concrete value is only known once the
    /// action actually runs (the "set-on-success" case from the action
    /// descriptor's effects). For planning purposes this satisfies any
    /// predicate checked against its key; the executor overwrites it with
    /// the action's real `state_changes` once the action completes.
    Pending,
}

impl From<bool> for StateValue {
    fn from(v: bool) -> Self {
        StateValue::Bool(v)
    }
}

impl From<f64> for StateValue {
    fn from(v: f64) -> Self {
        StateValue::Number(v)
    }
}

impl From<&str> for StateValue {
    fn from(v: &str) -> Self {
        StateValue::Text(v.to_string())
    }
}

impl From<String> for StateValue {
    fn from(v: String) -> Self {
        StateValue::Text(v)
    }
}

/// Overlays `delta` onto `base`: nested `Map` keys merge recursively, every
/// other leaf overwrites.
pub fn merge(base: &mut StateMap, delta: &StateMap) {
    for (key, value) in delta {
        match (base.get_mut(key), value) {
            (Some(StateValue::Map(base_map)), StateValue::Map(delta_map)) => {
                merge(base_map, delta_map);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Reads a dotted path (`"character_status.alive"`) out of a nested state
/// map.
pub fn get_path<'a>(state: &'a StateMap, path: &str) -> Option<&'a StateValue> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = state.get(first)?;
    for segment in segments {
        match current {
            StateValue::Map(nested) => current = nested.get(segment)?,
            _ => return None,
        }
    }
    Some(current)
}

fn parse_comparison(text: &str) -> Option<(&'static str, f64)> {
    for op in ["<=", ">=", "<", ">"] {
        if let Some(rest) = text.strip_prefix(op) {
            if let Ok(n) = rest.trim().parse::<f64>() {
                return Some((op, n));
            }
        }
    }
    None
}

fn as_number(value: &StateValue) -> Option<f64> {
    match value {
        StateValue::Number(n) => Some(*n),
        StateValue::Text(s) => s.parse::<f64>().ok(),
        _ => None,
    }
}

/// Does `actual` (a leaf from the live state, `None` if absent) satisfy the
/// predicate leaf `expected`?
///
/// - Exact equality for scalars.
/// - Numeric comparison when `expected` is text prefixed with `<`, `<=`,
///   `>`, or `>=`.
/// - Set-containment when either side is list-valued: a scalar predicate
///   against a list-valued state checks membership; a list-valued
///   predicate against a list-valued state checks subset.
/// - [`StateValue::Pending`] on the state side always satisfies (the value
///   is not known yet, but the action that produced it asserted it would
///   make this key true).
pub fn value_matches(actual: Option<&StateValue>, expected: &StateValue) -> bool {
    if let Some(StateValue::Pending) = actual {
        return true;
    }
    match expected {
        StateValue::Text(text) => {
            if let Some((op, target)) = parse_comparison(text) {
                let Some(actual_n) = actual.and_then(as_number) else {
                    return false;
                };
                return match op {
                    "<" => actual_n < target,
                    "<=" => actual_n <= target,
                    ">" => actual_n > target,
                    ">=" => actual_n >= target,
                    _ => unreachable!(),
                };
            }
            match actual {
                Some(StateValue::List(items)) => items.contains(text),
                Some(other) => other == expected,
                None => false,
            }
        }
        StateValue::List(expected_items) => match actual {
            Some(StateValue::List(actual_items)) => {
                expected_items.iter().all(|item| actual_items.contains(item))
            }
            _ => false,
        },
        other => actual.is_some_and(|a| a == other),
    }
}

/// Does `state` satisfy every key in `predicate`, recursing into nested
/// maps?
pub fn matches(state: &StateMap, predicate: &StateMap) -> bool {
    predicate.iter().all(|(key, expected)| match expected {
        StateValue::Map(nested_predicate) => match state.get(key) {
            Some(StateValue::Map(nested_state)) => matches(nested_state, nested_predicate),
            _ => false,
        },
        other => value_matches(state.get(key), other),
    })
}

/// A* heuristic: count of unsatisfied *top-level* goal keys. Admissible as
/// long as every action's weight is >= 1, since satisfying a top-level key
/// takes at least one action.
pub fn unsatisfied_top_level_count(state: &StateMap, goal: &StateMap) -> usize {
    goal.iter()
        .filter(|(key, expected)| match expected {
            StateValue::Map(nested_predicate) => match state.get(*key) {
                Some(StateValue::Map(nested_state)) => !matches(nested_state, nested_predicate),
                _ => true,
            },
            other => !value_matches(state.get(*key), other),
        })
        .count()
}

/// A stable serialization of `state`, used as the closed-set key. `BTreeMap`
/// guarantees key order, so structurally equal states always hash equal.
pub fn state_hash(state: &StateMap) -> String {
    serde_json::to_string(state).expect("StateMap serialization is infallible")
}
