//! Q-table keyed by discrete state

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use smartcab_core::Action;

use crate::error::{AgentError, Result};
use crate::state::State;

/// One Q-table row: a value for every action in [`Action::ALL`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionValues([f64; Action::COUNT]);

impl ActionValues {
    /// A row with every action at 0.0
    pub fn zeroed() -> Self {
        Self([0.0; Action::COUNT])
    }

    pub fn get(&self, action: Action) -> f64 {
        self.0[action.index()]
    }

    pub fn set(&mut self, action: Action, value: f64) {
        self.0[action.index()] = value;
    }

    /// Maximum value across all actions
    pub fn max(&self) -> f64 {
        self.0.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Actions whose value equals the row maximum exactly
    pub fn best_actions(&self) -> Vec<Action> {
        let max = self.max();
        Action::ALL
            .iter()
            .copied()
            .filter(|action| self.get(*action) == max)
            .collect()
    }

    /// Actions in `actions` whose value equals the best among them exactly
    pub fn best_among(&self, actions: &[Action]) -> Vec<Action> {
        let max = actions
            .iter()
            .map(|action| self.get(*action))
            .fold(f64::NEG_INFINITY, f64::max);
        actions
            .iter()
            .copied()
            .filter(|action| self.get(*action) == max)
            .collect()
    }

    /// Iterate `(action, value)` pairs in [`Action::ALL`] order
    pub fn iter(&self) -> impl Iterator<Item = (Action, f64)> + '_ {
        Action::ALL.iter().map(move |action| (*action, self.get(*action)))
    }
}

impl Default for ActionValues {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// Serializable view of a single row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QTableEntry {
    pub state: State,
    pub values: BTreeMap<Action, f64>,
}

/// Lazily populated mapping from state to per-action value estimates.
///
/// Rows are only created by [`QTable::ensure`] and are never evicted.
#[derive(Debug, Clone, Default)]
pub struct QTable {
    rows: HashMap<State, ActionValues>,
}

impl QTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a zeroed row for `state` if absent. Returns true when inserted.
    pub fn ensure(&mut self, state: State) -> bool {
        if self.rows.contains_key(&state) {
            return false;
        }
        self.rows.insert(state, ActionValues::zeroed());
        true
    }

    pub fn contains(&self, state: &State) -> bool {
        self.rows.contains_key(state)
    }

    /// The complete row for `state`
    pub fn row(&self, state: &State) -> Result<&ActionValues> {
        self.rows
            .get(state)
            .ok_or(AgentError::StateNotFound(*state))
    }

    pub fn get(&self, state: &State, action: Action) -> Result<f64> {
        Ok(self.row(state)?.get(action))
    }

    pub fn set(&mut self, state: &State, action: Action, value: f64) -> Result<()> {
        let row = self
            .rows
            .get_mut(state)
            .ok_or(AgentError::StateNotFound(*state))?;
        row.set(action, value);
        Ok(())
    }

    /// Maximum value across all actions for `state`
    pub fn max_value(&self, state: &State) -> Result<f64> {
        Ok(self.row(state)?.max())
    }

    /// Actions tied for the maximum value of `state`
    pub fn best_actions(&self, state: &State) -> Result<Vec<Action>> {
        Ok(self.row(state)?.best_actions())
    }

    /// Number of states seen
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&State, &ActionValues)> {
        self.rows.iter()
    }

    /// Rows sorted by state, for stable output
    pub fn entries(&self) -> Vec<QTableEntry> {
        let mut states: Vec<&State> = self.rows.keys().collect();
        states.sort();
        states
            .into_iter()
            .map(|state| QTableEntry {
                state: *state,
                values: self.rows[state].iter().collect(),
            })
            .collect()
    }

    /// JSON snapshot of every row
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "states": self.len(),
            "entries": self.entries(),
        })
    }

    /// Human-readable dump, one state per block
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str("/-----------------------------------------\n");
        out.push_str("| State-action rewards from Q-Learning\n");
        out.push_str("\\-----------------------------------------\n\n");

        for entry in self.entries() {
            let _ = writeln!(out, "{}", entry.state);
            for (action, value) in &entry.values {
                let _ = writeln!(out, " -- {action} : {value:.2}");
            }
            out.push('\n');
        }
        out
    }
}
