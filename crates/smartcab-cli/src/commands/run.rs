//! Simulation run command

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::info;

use smartcab_rl::DecayConfig;
use smartcab_sim::{Config, SimulationSummary, Simulator};

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Configuration file (defaults to the usual search path)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Learn from rewards instead of driving randomly
    #[arg(long)]
    pub learning: bool,

    /// Initial exploration rate
    #[arg(long)]
    pub epsilon: Option<f64>,

    /// Learning rate
    #[arg(long)]
    pub alpha: Option<f64>,

    /// Exploration decay (exponential, linear, inverse_square, inverse_trial)
    #[arg(long)]
    pub decay: Option<DecayConfig>,

    /// Stop training once epsilon drops below this
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Number of testing trials
    #[arg(long)]
    pub n_test: Option<u32>,

    /// Seed for both the agent and the world
    #[arg(long)]
    pub seed: Option<u64>,

    /// Pause between ticks in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Label logs as coming from a tuned agent
    #[arg(long)]
    pub optimized: bool,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    /// Overlay command-line flags onto a loaded configuration
    pub fn apply(&self, config: &mut Config) {
        if self.learning {
            config.agent.learning = true;
        }
        if let Some(epsilon) = self.epsilon {
            config.agent.epsilon = epsilon;
        }
        if let Some(alpha) = self.alpha {
            config.agent.alpha = alpha;
        }
        if let Some(decay) = self.decay {
            config.agent.decay = decay;
        }
        if let Some(tolerance) = self.tolerance {
            config.simulation.tolerance = tolerance;
        }
        if let Some(n_test) = self.n_test {
            config.simulation.n_test = n_test;
        }
        if let Some(seed) = self.seed {
            config.agent.seed = Some(seed);
            config.world.seed = Some(seed.wrapping_add(1));
        }
        if let Some(delay) = self.delay_ms {
            config.simulation.update_delay_ms = delay;
        }
        if self.optimized {
            config.simulation.optimized = true;
        }
    }
}

pub async fn run(args: RunArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::load_from(Some(path))?,
        None => Config::load()?,
    };
    args.apply(&mut config);
    config.validate()?;

    let mut simulator = Simulator::new(&config)?;
    let summary = simulator.run().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    if config.simulation.log_metrics {
        info!("Logs written under {}", config.simulation.log_dir.display());
    }
    Ok(())
}

fn print_summary(summary: &SimulationSummary) {
    let grade = |rating: Option<smartcab_sim::Rating>| {
        rating.map_or_else(|| "n/a".to_string(), |r| r.to_string())
    };

    println!("Simulation Summary");
    println!("==================");
    println!("Run:              {}", summary.run_id);
    println!("Learning:         {}", summary.learning);
    println!(
        "Training trials:  {} ({} successful)",
        summary.training_trials, summary.training_successes
    );
    println!(
        "Testing trials:   {} ({} successful)",
        summary.testing_trials, summary.testing_successes
    );
    println!("Safe actions:     {:.1}%", summary.safe_action_rate * 100.0);
    println!("Success rate:     {:.1}%", summary.success_rate * 100.0);
    println!("Safety rating:    {}", grade(summary.safety));
    println!("Reliability:      {}", grade(summary.reliability));
    println!("Final epsilon:    {:.4}", summary.final_epsilon);
    println!("States learned:   {}", summary.states_learned);
}
