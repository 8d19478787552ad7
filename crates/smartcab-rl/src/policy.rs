//! Action selection policies

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use smartcab_core::Action;

use crate::error::{AgentError, Result};
use crate::q_table::QTable;
use crate::state::State;

/// Which branch of a policy produced an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Branch {
    /// Non-learning agent, uniform choice
    Random,
    /// Learning agent, uniform choice with probability epsilon
    Explore,
    /// Learning agent, uniform choice among the best-valued actions
    Exploit,
}

impl std::fmt::Display for Branch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Branch::Random => write!(f, "random"),
            Branch::Explore => write!(f, "explore"),
            Branch::Exploit => write!(f, "exploit"),
        }
    }
}

/// An action together with the branch that chose it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub action: Action,
    pub branch: Branch,
}

/// Trait for action selection policies
pub trait ActionSelector: Send + Sync {
    /// Policy name
    fn name(&self) -> &str;

    /// Choose one of `actions` for `state`
    fn select(
        &self,
        table: &QTable,
        state: &State,
        actions: &[Action],
        epsilon: f64,
        rng: &mut dyn RngCore,
    ) -> Result<Selection>;
}

fn choose_uniform(actions: &[Action], rng: &mut dyn RngCore) -> Result<Action> {
    actions.choose(rng).copied().ok_or(AgentError::NoValidActions)
}

/// Ignores the Q-table and picks uniformly at random
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformRandom;

impl ActionSelector for UniformRandom {
    fn name(&self) -> &str {
        "uniform_random"
    }

    fn select(
        &self,
        _table: &QTable,
        _state: &State,
        actions: &[Action],
        _epsilon: f64,
        rng: &mut dyn RngCore,
    ) -> Result<Selection> {
        Ok(Selection {
            action: choose_uniform(actions, rng)?,
            branch: Branch::Random,
        })
    }
}

/// Epsilon-greedy selection with a randomized tie-break
#[derive(Debug, Clone, Copy, Default)]
pub struct EpsilonGreedy;

impl ActionSelector for EpsilonGreedy {
    fn name(&self) -> &str {
        "epsilon_greedy"
    }

    fn select(
        &self,
        table: &QTable,
        state: &State,
        actions: &[Action],
        epsilon: f64,
        rng: &mut dyn RngCore,
    ) -> Result<Selection> {
        if rng.gen::<f64>() < epsilon {
            return Ok(Selection {
                action: choose_uniform(actions, rng)?,
                branch: Branch::Explore,
            });
        }

        // Untouched actions all sit at 0.0, so ties are common early on.
        let best = table.row(state)?.best_among(actions);
        Ok(Selection {
            action: choose_uniform(&best, rng)?,
            branch: Branch::Exploit,
        })
    }
}
