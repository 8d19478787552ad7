//! Single-step learning rule
//!
//! Each update moves the stored value towards the immediate reward. There is
//! no discount factor and no bootstrap from the next state's value.

use smartcab_core::{Action, Reward};

use crate::error::Result;
use crate::q_table::QTable;
use crate::state::State;

/// Weighted average of the prior value and the observed reward
#[inline]
pub fn blend(prior: f64, alpha: f64, reward: Reward) -> f64 {
    (1.0 - alpha) * prior + alpha * reward
}

/// Apply the learning rule to `(state, action)` and return the new value
pub fn apply(
    table: &mut QTable,
    state: &State,
    action: Action,
    reward: Reward,
    alpha: f64,
) -> Result<f64> {
    let prior = table.get(state, action)?;
    let value = blend(prior, alpha, reward);
    table.set(state, action, value)?;
    Ok(value)
}
