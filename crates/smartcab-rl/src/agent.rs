//! Learning agent - ties state encoding, selection, and learning together

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use smartcab_core::{Action, Direction, Environment, Location, Reward, RoutePlanner};

use crate::config::AgentConfig;
use crate::decay::{DecaySchedule, ParameterSchedule};
use crate::error::Result;
use crate::learning;
use crate::policy::{ActionSelector, Branch, EpsilonGreedy, Selection, UniformRandom};
use crate::q_table::QTable;
use crate::state::State;

/// What the agent saw on its latest tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub state: State,
    pub waypoint: Option<Direction>,
    /// Observed but not part of the state; `None` outside [`LearningAgent::update`]
    pub deadline: Option<i32>,
}

/// Outcome of one tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub state: State,
    pub action: Action,
    pub branch: Branch,
    pub reward: Reward,
    /// Remaining deadline when the state was observed
    pub deadline: i32,
}

/// Agent statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct AgentStats {
    pub total_steps: u64,
    pub total_reward: f64,
    pub average_reward: f64,
    pub explore_steps: u64,
    pub exploit_steps: u64,
    pub states_seen: usize,
    pub epsilon: f64,
    pub alpha: f64,
    pub trial: u32,
}

/// Tabular Q-learning driving agent.
///
/// The external driver calls [`LearningAgent::reset`] once per trial and
/// [`LearningAgent::update`] once per tick.
pub struct LearningAgent<P> {
    planner: P,
    learning: bool,
    schedule: ParameterSchedule,
    q_table: QTable,
    selector: Box<dyn ActionSelector>,
    rng: StdRng,
    last_observation: Option<Observation>,
    total_steps: u64,
    total_reward: f64,
    explore_steps: u64,
    exploit_steps: u64,
}

impl<P: RoutePlanner> LearningAgent<P> {
    /// Create an agent from a validated configuration
    pub fn new(config: &AgentConfig, planner: P) -> Result<Self> {
        config.validate()?;

        let selector: Box<dyn ActionSelector> = if config.learning {
            Box::new(EpsilonGreedy)
        } else {
            Box::new(UniformRandom)
        };
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        info!(
            "Agent initialized: learning={}, epsilon={}, alpha={}, decay={}, policy={}",
            config.learning,
            config.epsilon,
            config.alpha,
            config.decay,
            selector.name()
        );

        Ok(Self {
            planner,
            learning: config.learning,
            schedule: ParameterSchedule::new(config.epsilon, config.alpha, config.decay.build()),
            q_table: QTable::new(),
            selector,
            rng,
            last_observation: None,
            total_steps: 0,
            total_reward: 0.0,
            explore_steps: 0,
            exploit_steps: 0,
        })
    }

    /// Replace the random source
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Replace the decay strategy
    pub fn with_decay(mut self, decay: Box<dyn DecaySchedule>) -> Self {
        self.schedule.set_decay(decay);
        self
    }

    /// Start a new trial towards `destination`
    pub fn reset(&mut self, destination: Location, testing: bool) {
        self.planner.route_to(destination);
        self.schedule.begin_trial(testing);
    }

    /// Encode the current observations into a state
    pub fn build_state<E: Environment + ?Sized>(&self, env: &E) -> State {
        let waypoint = self.planner.next_waypoint(env.pose());
        let inputs = env.sense();
        State::encode(&inputs, waypoint)
    }

    /// Make sure `state` has a row, when learning
    pub fn ensure_state(&mut self, state: State) {
        if self.learning && self.q_table.ensure(state) {
            debug!("New state: {} ({} known)", state, self.q_table.len());
        }
    }

    /// Highest Q-value for `state`
    pub fn max_q(&self, state: &State) -> Result<f64> {
        self.q_table.max_value(state)
    }

    /// Pick an action for `state` and record it as the latest observation
    pub fn choose_action(&mut self, state: &State, actions: &[Action]) -> Result<Selection> {
        self.last_observation = Some(Observation {
            state: *state,
            waypoint: state.waypoint,
            deadline: None,
        });

        let selection = self.selector.select(
            &self.q_table,
            state,
            actions,
            self.schedule.epsilon(),
            &mut self.rng,
        )?;

        match selection.branch {
            Branch::Explore => self.explore_steps += 1,
            Branch::Exploit => self.exploit_steps += 1,
            Branch::Random => {}
        }
        Ok(selection)
    }

    /// Move the value of `(state, action)` towards `reward`
    pub fn learn(&mut self, state: &State, action: Action, reward: Reward) -> Result<()> {
        if !self.learning {
            return Ok(());
        }
        let value = learning::apply(
            &mut self.q_table,
            state,
            action,
            reward,
            self.schedule.alpha(),
        )?;
        debug!("Q{} {} -> {:.4}", state, action, value);
        Ok(())
    }

    /// Run one tick: observe, decide, act, learn
    pub fn update<E: Environment + ?Sized>(&mut self, env: &mut E) -> Result<Step> {
        let deadline = env.deadline();
        let state = self.build_state(env);

        self.ensure_state(state);
        let selection = self.choose_action(&state, env.valid_actions())?;
        if let Some(observation) = self.last_observation.as_mut() {
            observation.deadline = Some(deadline);
        }

        let reward = env.act(selection.action);
        self.learn(&state, selection.action, reward)?;

        self.total_steps += 1;
        self.total_reward += reward;

        debug!(
            deadline,
            branch = %selection.branch,
            "state={} action={} reward={:.2}",
            state,
            selection.action,
            reward
        );

        Ok(Step {
            state,
            action: selection.action,
            branch: selection.branch,
            reward,
            deadline,
        })
    }

    pub fn is_learning(&self) -> bool {
        self.learning
    }

    pub fn epsilon(&self) -> f64 {
        self.schedule.epsilon()
    }

    pub fn alpha(&self) -> f64 {
        self.schedule.alpha()
    }

    /// Number of training trials started
    pub fn trial(&self) -> u32 {
        self.schedule.trial()
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    pub fn last_observation(&self) -> Option<&Observation> {
        self.last_observation.as_ref()
    }

    pub fn planner(&self) -> &P {
        &self.planner
    }

    pub fn planner_mut(&mut self) -> &mut P {
        &mut self.planner
    }

    /// Name of the active action selector
    pub fn policy_name(&self) -> &str {
        self.selector.name()
    }

    pub fn stats(&self) -> AgentStats {
        AgentStats {
            total_steps: self.total_steps,
            total_reward: self.total_reward,
            average_reward: if self.total_steps > 0 {
                self.total_reward / self.total_steps as f64
            } else {
                0.0
            },
            explore_steps: self.explore_steps,
            exploit_steps: self.exploit_steps,
            states_seen: self.q_table.len(),
            epsilon: self.schedule.epsilon(),
            alpha: self.schedule.alpha(),
            trial: self.schedule.trial(),
        }
    }
}

impl<P> std::fmt::Debug for LearningAgent<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LearningAgent")
            .field("learning", &self.learning)
            .field("schedule", &self.schedule)
            .field("states", &self.q_table.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentError;
    use smartcab_core::{Heading, Light, Pose, Sensed};

    struct FixedPlanner {
        destination: Option<Location>,
        waypoint: Option<Direction>,
    }

    impl RoutePlanner for FixedPlanner {
        fn route_to(&mut self, destination: Location) {
            self.destination = Some(destination);
        }

        fn destination(&self) -> Option<Location> {
            self.destination
        }

        fn next_waypoint(&self, _pose: Pose) -> Option<Direction> {
            self.waypoint
        }
    }

    struct ConstantEnv {
        inputs: Sensed,
        reward: Reward,
        acted: Vec<Action>,
    }

    impl Environment for ConstantEnv {
        fn sense(&self) -> Sensed {
            self.inputs
        }

        fn deadline(&self) -> i32 {
            20
        }

        fn pose(&self) -> Pose {
            Pose {
                location: Location::new(0, 0),
                heading: Heading::NORTH,
            }
        }

        fn act(&mut self, action: Action) -> Reward {
            self.acted.push(action);
            self.reward
        }
    }

    fn planner() -> FixedPlanner {
        FixedPlanner {
            destination: None,
            waypoint: Some(Direction::Forward),
        }
    }

    fn green_env(reward: Reward) -> ConstantEnv {
        ConstantEnv {
            inputs: Sensed {
                light: Light::Green,
                ..Sensed::default()
            },
            reward,
            acted: vec![],
        }
    }

    fn green_forward() -> State {
        State {
            left: None,
            light: Light::Green,
            oncoming: None,
            waypoint: Some(Direction::Forward),
        }
    }

    #[test]
    fn test_agent_creation() {
        let agent = LearningAgent::new(&AgentConfig::default(), planner()).unwrap();
        assert!(!agent.is_learning());
        assert_eq!(agent.epsilon(), 1.0);
        assert_eq!(agent.alpha(), 0.5);
        assert_eq!(agent.trial(), 0);
        assert_eq!(agent.policy_name(), "uniform_random");
        assert!(agent.last_observation().is_none());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AgentConfig::learning().with_epsilon(f64::NAN);
        let result = LearningAgent::new(&config, planner());
        assert!(matches!(
            result,
            Err(AgentError::InvalidParameter { name: "epsilon", .. })
        ));
    }

    #[test]
    fn test_ensure_state_noop_without_learning() {
        let mut agent = LearningAgent::new(&AgentConfig::default(), planner()).unwrap();
        agent.ensure_state(green_forward());
        assert!(agent.q_table().is_empty());
    }

    #[test]
    fn test_learn_end_to_end() {
        let config = AgentConfig::learning().with_alpha(0.5).with_epsilon(1.0);
        let mut agent = LearningAgent::new(&config, planner()).unwrap();
        let state = green_forward();

        agent.ensure_state(state);
        agent.learn(&state, Action::Forward, 2.0).unwrap();
        assert_eq!(agent.q_table().get(&state, Action::Forward).unwrap(), 1.0);

        agent.learn(&state, Action::Forward, 0.0).unwrap();
        assert_eq!(agent.q_table().get(&state, Action::Forward).unwrap(), 0.5);
    }

    #[test]
    fn test_learn_without_ensure_fails() {
        let mut agent = LearningAgent::new(&AgentConfig::learning(), planner()).unwrap();
        let result = agent.learn(&green_forward(), Action::Hold, 1.0);
        assert_eq!(result, Err(AgentError::StateNotFound(green_forward())));
    }

    #[test]
    fn test_max_q_requires_state() {
        let mut agent = LearningAgent::new(&AgentConfig::learning(), planner()).unwrap();
        assert!(agent.max_q(&green_forward()).is_err());

        agent.ensure_state(green_forward());
        assert_eq!(agent.max_q(&green_forward()).unwrap(), 0.0);
    }

    #[test]
    fn test_update_records_observation_and_learns() {
        let config = AgentConfig::learning().with_seed(9);
        let mut agent = LearningAgent::new(&config, planner()).unwrap();
        let mut env = green_env(2.0);

        let step = agent.update(&mut env).unwrap();

        assert_eq!(step.state, green_forward());
        assert_eq!(step.deadline, 20);
        assert_eq!(step.branch, Branch::Explore);
        assert_eq!(env.acted, vec![step.action]);
        assert_eq!(agent.q_table().get(&step.state, step.action).unwrap(), 1.0);

        let observation = agent.last_observation().unwrap();
        assert_eq!(observation.state, green_forward());
        assert_eq!(observation.waypoint, Some(Direction::Forward));
        assert_eq!(observation.deadline, Some(20));
    }

    #[test]
    fn test_choose_action_records_observation() {
        let mut agent =
            LearningAgent::new(&AgentConfig::learning().with_seed(4), planner()).unwrap();
        let state = green_forward();
        agent.ensure_state(state);

        let selection = agent.choose_action(&state, &Action::ALL).unwrap();
        assert!(Action::ALL.contains(&selection.action));

        let observation = agent.last_observation().unwrap();
        assert_eq!(observation.state, state);
        assert_eq!(observation.waypoint, Some(Direction::Forward));
        assert_eq!(observation.deadline, None);

        let red = State {
            light: Light::Red,
            ..state
        };
        agent.ensure_state(red);
        agent.choose_action(&red, &Action::ALL).unwrap();
        assert_eq!(agent.last_observation().unwrap().state, red);
    }

    #[test]
    fn test_reset_routes_and_decays() {
        let mut agent = LearningAgent::new(&AgentConfig::learning(), planner()).unwrap();

        agent.reset(Location::new(3, 4), false);
        assert_eq!(agent.planner().destination(), Some(Location::new(3, 4)));
        assert_eq!(agent.trial(), 1);
        assert!((agent.epsilon() - 0.999).abs() < 1e-12);

        agent.reset(Location::new(1, 1), true);
        assert_eq!(agent.epsilon(), 0.0);
        assert_eq!(agent.alpha(), 0.0);
        assert_eq!(agent.trial(), 1);
    }

    #[test]
    fn test_with_decay_override() {
        let mut agent = LearningAgent::new(&AgentConfig::learning(), planner())
            .unwrap()
            .with_decay(Box::new(|_epsilon: f64, _trial: u32| 0.25));

        agent.reset(Location::new(0, 1), false);
        assert_eq!(agent.epsilon(), 0.25);
    }

    #[test]
    fn test_stats() {
        let mut agent =
            LearningAgent::new(&AgentConfig::learning().with_seed(1), planner()).unwrap();
        let mut env = green_env(1.0);

        for _ in 0..4 {
            agent.update(&mut env).unwrap();
        }

        let stats = agent.stats();
        assert_eq!(stats.total_steps, 4);
        assert_eq!(stats.total_reward, 4.0);
        assert_eq!(stats.average_reward, 1.0);
        assert_eq!(stats.explore_steps, 4);
        assert_eq!(stats.exploit_steps, 0);
        assert_eq!(stats.states_seen, 1);
    }
}
