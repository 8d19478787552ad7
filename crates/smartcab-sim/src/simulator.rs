//! Trial driver
//!
//! Runs training trials until the agent is done exploring, then a fixed
//! number of testing trials with learning switched off.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use smartcab_rl::LearningAgent;

use crate::config::Config;
use crate::metrics::{self, MetricsLog, Rating, TrialRecord};
use crate::planner::GridPlanner;
use crate::world::{GridWorld, Violation};

/// Outcome of a full simulation run
#[derive(Debug, Clone, Serialize)]
pub struct SimulationSummary {
    pub run_id: Uuid,
    pub learning: bool,
    pub training_trials: u32,
    pub testing_trials: u32,
    pub training_successes: u32,
    pub testing_successes: u32,
    /// Share of testing actions without any violation
    pub safe_action_rate: f64,
    pub success_rate: f64,
    pub safety: Option<Rating>,
    pub reliability: Option<Rating>,
    pub final_epsilon: f64,
    pub states_learned: usize,
}

/// Drives a [`LearningAgent`] through trials in a [`GridWorld`]
pub struct Simulator {
    config: Config,
    run_id: Uuid,
    world: GridWorld,
    agent: LearningAgent<GridPlanner>,
    log: Option<MetricsLog>,
    records: Vec<TrialRecord>,
}

impl Simulator {
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        let world = GridWorld::new(config.world.clone())?;
        let planner = GridPlanner::new(config.world.columns(), config.world.rows());
        let agent = LearningAgent::new(&config.agent, planner)?;

        let log = if config.simulation.log_metrics {
            Some(MetricsLog::create(
                &config.simulation.log_dir,
                config.log_stem(),
            )?)
        } else {
            None
        };

        let run_id = Uuid::new_v4();
        info!(
            "Simulator ready: run_id={}, grid={}x{}, dummies={}",
            run_id,
            config.world.columns(),
            config.world.rows(),
            config.world.num_dummies
        );

        Ok(Self {
            config: config.clone(),
            run_id,
            world,
            agent,
            log,
            records: Vec::new(),
        })
    }

    pub fn agent(&self) -> &LearningAgent<GridPlanner> {
        &self.agent
    }

    pub fn world(&self) -> &GridWorld {
        &self.world
    }

    pub fn records(&self) -> &[TrialRecord] {
        &self.records
    }

    /// Whether another training trial should run after `trained` trials
    fn keep_training(&self, trained: u32) -> bool {
        let sim = &self.config.simulation;
        if trained < sim.untrained_trials {
            return true;
        }
        if !self.agent.is_learning() {
            return false;
        }
        if trained >= sim.max_training_trials {
            warn!(
                "Stopping training at {} trials with epsilon {:.4} above tolerance {}",
                trained,
                self.agent.epsilon(),
                sim.tolerance
            );
            return false;
        }
        self.agent.epsilon() >= sim.tolerance
    }

    /// Run one trial to completion and record it
    pub async fn run_trial(&mut self, testing: bool) -> Result<TrialRecord> {
        let destination = self.world.reset()?;
        self.agent.reset(destination, testing);
        debug!(testing, "Trial starting towards {}", destination);

        let delay = self.config.simulation.update_delay_ms;
        while !self.world.is_done() {
            self.agent
                .update(&mut self.world)
                .context("Agent update failed")?;
            self.world.advance();

            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay)).await;
            } else {
                tokio::task::yield_now().await;
            }
        }

        let data = self.world.trial_data().clone();
        let record = TrialRecord::new(
            self.run_id,
            self.agent.trial(),
            testing,
            self.agent.epsilon(),
            self.agent.alpha(),
            data,
        );

        if record.data.success {
            info!(
                trial = record.trial,
                testing,
                epsilon = record.epsilon,
                alpha = record.alpha,
                "Reached destination with {} to spare, net reward {:.2}",
                record.data.final_deadline,
                record.data.net_reward
            );
        } else {
            warn!(
                trial = record.trial,
                testing,
                epsilon = record.epsilon,
                alpha = record.alpha,
                "Missed the deadline after {} steps, net reward {:.2}",
                record.data.steps(),
                record.data.net_reward
            );
        }

        if let Some(log) = self.log.as_mut() {
            log.append(&record)?;
        }
        self.records.push(record.clone());
        Ok(record)
    }

    /// Train, then test, then dump the Q-table when learning
    pub async fn run(&mut self) -> Result<SimulationSummary> {
        info!("Training phase starting");
        let mut trained = 0;
        let mut training_successes = 0;
        while self.keep_training(trained) {
            let record = self.run_trial(false).await?;
            trained += 1;
            if record.data.success {
                training_successes += 1;
            }
            if trained % 100 == 0 {
                info!(
                    "Trained {} trials, epsilon={:.4}, states={}",
                    trained,
                    self.agent.epsilon(),
                    self.agent.q_table().len()
                );
            }
        }

        info!("Testing phase starting: {} trials", self.config.simulation.n_test);
        let mut testing = Vec::new();
        for _ in 0..self.config.simulation.n_test {
            testing.push(self.run_trial(true).await?);
        }

        if self.agent.is_learning() && self.config.simulation.log_metrics {
            metrics::dump_q_table(
                self.agent.q_table(),
                &self.config.simulation.log_dir,
                self.config.log_stem(),
            )?;
        }

        let summary = self.summarize(trained, training_successes, &testing);
        info!(
            "Simulation finished: {} training, {} testing, success rate {:.2}",
            summary.training_trials, summary.testing_trials, summary.success_rate
        );
        Ok(summary)
    }

    fn summarize(
        &self,
        trained: u32,
        training_successes: u32,
        testing: &[TrialRecord],
    ) -> SimulationSummary {
        let testing_successes = testing.iter().filter(|r| r.data.success).count() as u32;
        let actions: u32 = testing
            .iter()
            .flat_map(|r| r.data.actions.iter())
            .sum();
        let safe: u32 = testing
            .iter()
            .map(|r| r.data.violations(Violation::None))
            .sum();

        SimulationSummary {
            run_id: self.run_id,
            learning: self.agent.is_learning(),
            training_trials: trained,
            testing_trials: testing.len() as u32,
            training_successes,
            testing_successes,
            safe_action_rate: if actions > 0 {
                f64::from(safe) / f64::from(actions)
            } else {
                0.0
            },
            success_rate: if testing.is_empty() {
                0.0
            } else {
                f64::from(testing_successes) / testing.len() as f64
            },
            safety: Rating::safety(testing),
            reliability: Rating::reliability(testing),
            final_epsilon: self.agent.epsilon(),
            states_learned: self.agent.q_table().len(),
        }
    }
}
