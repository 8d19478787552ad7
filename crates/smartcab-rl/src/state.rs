//! Discrete state encoding

use serde::{Deserialize, Serialize};

use smartcab_core::{Direction, Light, Sensed};

/// Discrete state used as the Q-table key.
///
/// Remaining deadline is not part of the state, which keeps the state space
/// at 4 × 2 × 4 × 4 = 128 entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct State {
    /// Intended direction of the car to the left
    pub left: Option<Direction>,

    /// Signal color for the cab's heading
    pub light: Light,

    /// Intended direction of the oncoming car
    pub oncoming: Option<Direction>,

    /// Next waypoint from the route planner
    pub waypoint: Option<Direction>,
}

impl State {
    /// Encode sensed inputs and the routing waypoint into a state
    pub fn encode(inputs: &Sensed, waypoint: Option<Direction>) -> Self {
        Self {
            left: inputs.left,
            light: inputs.light,
            oncoming: inputs.oncoming,
            waypoint,
        }
    }
}

fn fmt_slot(slot: Option<Direction>) -> String {
    slot.map_or_else(|| "none".to_string(), |d| d.to_string())
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            fmt_slot(self.left),
            self.light,
            fmt_slot(self.oncoming),
            fmt_slot(self.waypoint)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn sensed(left: Option<Direction>, light: Light, oncoming: Option<Direction>) -> Sensed {
        Sensed {
            light,
            left,
            oncoming,
            right: None,
        }
    }

    #[test]
    fn test_encode_copies_fields() {
        let inputs = sensed(Some(Direction::Left), Light::Green, None);
        let state = State::encode(&inputs, Some(Direction::Forward));

        assert_eq!(state.left, Some(Direction::Left));
        assert_eq!(state.light, Light::Green);
        assert_eq!(state.oncoming, None);
        assert_eq!(state.waypoint, Some(Direction::Forward));
    }

    #[test]
    fn test_encode_is_deterministic() {
        let inputs = sensed(None, Light::Red, Some(Direction::Right));
        let a = State::encode(&inputs, Some(Direction::Left));
        let b = State::encode(&inputs, Some(Direction::Left));

        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_right_traffic_is_not_encoded() {
        let mut inputs = sensed(None, Light::Green, None);
        let without = State::encode(&inputs, None);
        inputs.right = Some(Direction::Forward);
        let with = State::encode(&inputs, None);

        assert_eq!(without, with);
    }

    #[test]
    fn test_state_display() {
        let state = State::encode(&sensed(None, Light::Green, None), Some(Direction::Forward));
        assert_eq!(state.to_string(), "(none, green, none, forward)");
    }

    #[test]
    fn test_state_serialization() {
        let state = State::encode(&sensed(Some(Direction::Forward), Light::Red, None), None);
        let json = serde_json::to_string(&state).unwrap();
        let parsed: State = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, state);
    }
}
