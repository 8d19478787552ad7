//! Smartcab Simulation - The world the learning agent drives in
//!
//! This crate provides:
//! - A wrap-around grid world with traffic lights and dummy traffic
//! - A route planner producing turn-by-turn waypoints
//! - The trial driver that trains and then tests an agent
//! - Trial metrics and Q-table logs

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::float_cmp)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod light;
pub mod metrics;
pub mod planner;
pub mod simulator;
pub mod world;

pub use config::{Config, SimulationConfig, WorldConfig};
pub use metrics::{grade, MetricsLog, Rating, Report, TrialRecord};
pub use planner::GridPlanner;
pub use simulator::{SimulationSummary, Simulator};
pub use world::{GridWorld, TrialData, Violation};
