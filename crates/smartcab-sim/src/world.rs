//! Grid world with traffic lights and dummy traffic
//!
//! The world owns one primary cab, driven through the [`Environment`] trait,
//! and any number of dummy cars that follow right-of-way rules on their own.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use smartcab_core::{
    Action, Direction, Environment, Heading, Light, Location, Pose, Reward, Sensed,
    SmartcabError,
};

use crate::config::WorldConfig;
use crate::light::TrafficLight;
use crate::planner::{grid_distance, route_direction};

/// Maximum attempts at drawing a start/destination pair
const PLACEMENT_ATTEMPTS: usize = 10_000;

/// Base of the deadline penalty curve
const PENALTY_GRADIENT: f64 = 10.0;

/// Severity of an attempted move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Violation {
    None,
    /// Idling on green with nothing to yield to
    Minor,
    /// Running a red light
    Major,
    /// Causing an accident while committing a minor violation
    MinorAccident,
    /// Running a red light into cross traffic
    MajorAccident,
}

impl Violation {
    pub const ALL: [Violation; 5] = [
        Violation::None,
        Violation::Minor,
        Violation::Major,
        Violation::MinorAccident,
        Violation::MajorAccident,
    ];

    pub fn index(self) -> usize {
        match self {
            Violation::None => 0,
            Violation::Minor => 1,
            Violation::Major => 2,
            Violation::MinorAccident => 3,
            Violation::MajorAccident => 4,
        }
    }

    /// Reward added for an invalid move
    pub fn penalty(self) -> f64 {
        match self {
            Violation::None => 0.0,
            Violation::Minor => -5.0,
            Violation::Major => -10.0,
            Violation::MinorAccident => -20.0,
            Violation::MajorAccident => -40.0,
        }
    }
}

/// Per-trial bookkeeping for the primary cab
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrialData {
    pub initial_distance: i32,
    pub initial_deadline: i32,
    pub final_deadline: i32,
    pub net_reward: f64,
    /// Action counts indexed by [`Violation::index`]
    pub actions: [u32; 5],
    pub success: bool,
}

impl TrialData {
    pub fn violations(&self, violation: Violation) -> u32 {
        self.actions[violation.index()]
    }

    /// Ticks spent in the trial
    pub fn steps(&self) -> i32 {
        self.initial_deadline - self.final_deadline
    }
}

#[derive(Debug, Clone, Copy)]
struct DummyCar {
    pose: Pose,
    intent: Direction,
}

#[derive(Debug, Clone, Copy)]
struct PrimaryCab {
    pose: Pose,
    destination: Location,
    deadline: i32,
    /// Planner waypoint at the last action, as seen by other cars
    intent: Option<Direction>,
}

/// Wrap-around grid of intersections
pub struct GridWorld {
    config: WorldConfig,
    rng: StdRng,
    t: u32,
    lights: Vec<TrafficLight>,
    dummies: Vec<DummyCar>,
    primary: Option<PrimaryCab>,
    done: bool,
    trial: TrialData,
}

impl GridWorld {
    pub fn new(config: WorldConfig) -> Result<Self, SmartcabError> {
        config
            .validate()
            .map_err(|e| SmartcabError::Config(e.to_string()))?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let cells = (config.columns() * config.rows()) as usize;
        let lights = (0..cells).map(|_| TrafficLight::random(&mut rng)).collect();

        Ok(Self {
            config,
            rng,
            t: 0,
            lights,
            dummies: Vec::new(),
            primary: None,
            done: false,
            trial: TrialData::default(),
        })
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Start a new trial and return the primary cab's destination
    pub fn reset(&mut self) -> Result<Location, SmartcabError> {
        self.t = 0;
        self.done = false;

        for light in &mut self.lights {
            *light = TrafficLight::random(&mut self.rng);
        }

        let (start, destination) = self.draw_route()?;
        let distance = self.distance(start, destination);
        let deadline = distance * self.config.deadline_per_step;
        let heading = self.random_heading();

        self.primary = Some(PrimaryCab {
            pose: Pose {
                location: start,
                heading,
            },
            destination,
            deadline,
            intent: None,
        });

        let mut dummies = Vec::with_capacity(self.config.num_dummies);
        for _ in 0..self.config.num_dummies {
            let pose = Pose {
                location: self.random_location(),
                heading: self.random_heading(),
            };
            let intent = self.random_intent();
            dummies.push(DummyCar { pose, intent });
        }
        self.dummies = dummies;

        self.trial = TrialData {
            initial_distance: distance,
            initial_deadline: deadline,
            final_deadline: deadline,
            ..TrialData::default()
        };

        debug!(
            "Trial reset: start={}, destination={}, deadline={}",
            start, destination, deadline
        );
        Ok(destination)
    }

    /// Advance the clock: move dummy traffic, cycle lights, tick the deadline
    pub fn advance(&mut self) {
        if self.done {
            return;
        }

        for i in 0..self.dummies.len() {
            self.step_dummy(i);
        }

        let t = self.t;
        for light in &mut self.lights {
            light.update(t);
        }

        if let Some(primary) = self.primary.as_mut() {
            if primary.deadline <= self.config.hard_time_limit {
                debug!("Hard time limit reached");
                self.done = true;
            } else if self.config.enforce_deadline && primary.deadline <= 0 {
                debug!("Deadline exhausted");
                self.done = true;
            }
            primary.deadline -= 1;
        }

        self.t += 1;
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Ticks since the trial started
    pub fn time(&self) -> u32 {
        self.t
    }

    pub fn trial_data(&self) -> &TrialData {
        &self.trial
    }

    pub fn destination(&self) -> Option<Location> {
        self.primary.map(|p| p.destination)
    }

    /// Wrap-aware Manhattan distance
    pub fn distance(&self, a: Location, b: Location) -> i32 {
        grid_distance(a, b, self.config.columns(), self.config.rows())
    }

    /// Place the primary cab explicitly, e.g. for scripted scenarios
    pub fn place_primary(&mut self, pose: Pose, destination: Location, deadline: i32) {
        let pose = Pose {
            location: self.wrap(pose.location),
            ..pose
        };
        let destination = self.wrap(destination);
        self.primary = Some(PrimaryCab {
            pose,
            destination,
            deadline,
            intent: None,
        });
        self.trial = TrialData {
            initial_distance: self.distance(pose.location, destination),
            initial_deadline: deadline,
            final_deadline: deadline,
            ..TrialData::default()
        };
        self.done = false;
    }

    /// Add a dummy car, e.g. for scripted scenarios
    pub fn add_dummy(&mut self, pose: Pose, intent: Direction) {
        let pose = Pose {
            location: self.wrap(pose.location),
            ..pose
        };
        self.dummies.push(DummyCar { pose, intent });
    }

    /// Remove all dummy traffic
    pub fn clear_dummies(&mut self) {
        self.dummies.clear();
    }

    /// Force the light at `location` so that `heading` sees `light`
    pub fn set_light(&mut self, location: Location, heading: Heading, light: Light) {
        let north_south_green = heading.is_north_south() == (light == Light::Green);
        let index = self.light_index(self.wrap(location));
        self.lights[index] = TrafficLight::new(north_south_green, u32::MAX);
    }

    /// Fold an arbitrary location back onto the torus
    fn wrap(&self, location: Location) -> Location {
        Location::new(
            location.x.rem_euclid(self.config.columns()),
            location.y.rem_euclid(self.config.rows()),
        )
    }

    fn light_index(&self, location: Location) -> usize {
        (location.y * self.config.columns() + location.x) as usize
    }

    fn random_location(&mut self) -> Location {
        Location::new(
            self.rng.gen_range(0..self.config.columns()),
            self.rng.gen_range(0..self.config.rows()),
        )
    }

    fn random_heading(&mut self) -> Heading {
        Heading::ALL[self.rng.gen_range(0..Heading::ALL.len())]
    }

    fn random_intent(&mut self) -> Direction {
        *Direction::ALL
            .choose(&mut self.rng)
            .unwrap_or(&Direction::Forward)
    }

    fn draw_route(&mut self) -> Result<(Location, Location), SmartcabError> {
        for _ in 0..PLACEMENT_ATTEMPTS {
            let start = self.random_location();
            let destination = self.random_location();
            if self.distance(start, destination) >= self.config.min_route_distance {
                return Ok((start, destination));
            }
        }
        Err(SmartcabError::InvalidWorld(format!(
            "No start/destination pair at distance {} after {} attempts",
            self.config.min_route_distance, PLACEMENT_ATTEMPTS
        )))
    }

    fn moved(&self, pose: Pose, direction: Direction) -> Pose {
        let heading = pose.heading.turn(direction);
        Pose {
            location: Location::new(
                (pose.location.x + heading.dx).rem_euclid(self.config.columns()),
                (pose.location.y + heading.dy).rem_euclid(self.config.rows()),
            ),
            heading,
        }
    }

    /// Light and traffic as seen from `pose`, ignoring dummy `skip`
    fn sense_from(&self, pose: Pose, skip: Option<usize>, include_primary: bool) -> Sensed {
        let light = self.lights[self.light_index(pose.location)].signal_for(pose.heading);
        let mut sensed = Sensed {
            light,
            ..Sensed::default()
        };

        let primary = self
            .primary
            .filter(|_| include_primary)
            .map(|p| (p.pose, p.intent));
        let others = self
            .dummies
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != skip)
            .map(|(_, car)| (car.pose, Some(car.intent)))
            .chain(primary);

        for (other, intent) in others {
            if other.location != pose.location || other.heading == pose.heading {
                continue;
            }
            if other.heading == pose.heading.reverse() {
                if sensed.oncoming != Some(Direction::Left) {
                    sensed.oncoming = intent;
                }
            } else if other.heading == pose.heading.left() {
                // Travelling towards our left, so it approaches from the right
                if !matches!(sensed.right, Some(Direction::Forward | Direction::Left)) {
                    sensed.right = intent;
                }
            } else if sensed.left != Some(Direction::Forward) {
                sensed.left = intent;
            }
        }
        sensed
    }

    fn step_dummy(&mut self, i: usize) {
        let car = self.dummies[i];
        let inputs = self.sense_from(car.pose, Some(i), true);

        let may_move = match car.intent {
            Direction::Right => {
                !(inputs.light == Light::Red && inputs.left == Some(Direction::Forward))
            }
            Direction::Forward => inputs.light == Light::Green,
            Direction::Left => {
                inputs.light == Light::Green
                    && !matches!(
                        inputs.oncoming,
                        Some(Direction::Forward | Direction::Right)
                    )
            }
        };

        if may_move {
            let pose = self.moved(car.pose, car.intent);
            let intent = self.random_intent();
            self.dummies[i] = DummyCar { pose, intent };
        }
    }

    /// Classify an attempted primary move
    fn classify(action: Action, inputs: &Sensed) -> Violation {
        let green = inputs.light == Light::Green;
        let cross_traffic = inputs.left == Some(Direction::Forward)
            || inputs.right == Some(Direction::Forward);

        match action {
            Action::Forward => {
                if green {
                    Violation::None
                } else if cross_traffic {
                    Violation::MajorAccident
                } else {
                    Violation::Major
                }
            }
            Action::Left => {
                if green {
                    if matches!(inputs.oncoming, Some(Direction::Right | Direction::Forward)) {
                        Violation::MinorAccident
                    } else {
                        Violation::None
                    }
                } else if cross_traffic || inputs.oncoming == Some(Direction::Right) {
                    Violation::MajorAccident
                } else {
                    Violation::Major
                }
            }
            Action::Right => {
                if !green && inputs.left == Some(Direction::Forward) {
                    Violation::MinorAccident
                } else {
                    Violation::None
                }
            }
            Action::Hold => {
                if green && inputs.oncoming != Some(Direction::Left) {
                    Violation::Minor
                } else {
                    Violation::None
                }
            }
        }
    }

    /// Multiplicative deadline pressure in [0, 1]
    fn deadline_penalty(&self, deadline: i32) -> f64 {
        if !self.config.enforce_deadline {
            return 0.0;
        }
        let t = f64::from(self.t);
        let total = t + f64::from(deadline);
        let fraction = if total > 0.0 { (t / total).clamp(0.0, 1.0) } else { 1.0 };
        (PENALTY_GRADIENT.powf(fraction) - 1.0) / (PENALTY_GRADIENT - 1.0)
    }
}

impl Environment for GridWorld {
    fn sense(&self) -> Sensed {
        match self.primary {
            Some(primary) => self.sense_from(primary.pose, None, false),
            None => Sensed::default(),
        }
    }

    fn deadline(&self) -> i32 {
        self.primary.map_or(0, |p| p.deadline)
    }

    fn pose(&self) -> Pose {
        self.primary.map_or(
            Pose {
                location: Location::new(0, 0),
                heading: Heading::EAST,
            },
            |p| p.pose,
        )
    }

    fn act(&mut self, action: Action) -> Reward {
        let Some(mut primary) = self.primary else {
            return 0.0;
        };

        let inputs = self.sense();
        let waypoint = route_direction(
            primary.pose,
            primary.destination,
            self.config.columns(),
            self.config.rows(),
        );
        let violation = Self::classify(action, &inputs);

        let mut reward: f64 = self.rng.gen_range(-1.0..1.0);

        if violation == Violation::None {
            let penalty = self.deadline_penalty(primary.deadline);
            let on_route = action == Action::from(waypoint);
            let stuck_at_red = action == Action::Hold && inputs.light != Light::Green;

            reward += if on_route {
                2.0 - penalty
            } else if stuck_at_red && waypoint == Some(Direction::Right) {
                // Could have turned right on red
                1.0 - penalty
            } else if stuck_at_red {
                2.0 - penalty
            } else {
                1.0 - penalty
            };

            if let Some(direction) = action.direction() {
                primary.pose = self.moved(primary.pose, direction);
            }
        } else {
            reward += violation.penalty();
        }
        primary.intent = waypoint;

        if primary.pose.location == primary.destination {
            self.trial.success = primary.deadline >= 0;
            self.done = true;
        }

        self.trial.final_deadline = primary.deadline - 1;
        self.trial.net_reward += reward;
        self.trial.actions[violation.index()] += 1;
        self.primary = Some(primary);

        trace!(
            "act {} -> {:?}, reward {:.2}, at {}",
            action,
            violation,
            reward,
            primary.pose.location
        );
        reward
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_world() -> GridWorld {
        let config = WorldConfig {
            num_dummies: 0,
            seed: Some(12),
            ..WorldConfig::default()
        };
        GridWorld::new(config).unwrap()
    }

    fn pose(x: i32, y: i32, heading: Heading) -> Pose {
        Pose {
            location: Location::new(x, y),
            heading,
        }
    }

    #[test]
    fn test_invalid_world_rejected() {
        let config = WorldConfig {
            grid_size: [1, 6],
            ..WorldConfig::default()
        };
        assert!(matches!(
            GridWorld::new(config),
            Err(SmartcabError::Config(_))
        ));
    }

    #[test]
    fn test_reset_places_route() {
        let mut world = quiet_world();
        let destination = world.reset().unwrap();

        let start = world.pose().location;
        let distance = world.distance(start, destination);
        assert!(distance >= 4);
        assert_eq!(world.deadline(), distance * 5);
        assert_eq!(world.trial_data().initial_deadline, distance * 5);
        assert!(!world.is_done());
    }

    #[test]
    fn test_reset_places_dummies() {
        let mut world = GridWorld::new(WorldConfig {
            num_dummies: 25,
            seed: Some(3),
            ..WorldConfig::default()
        })
        .unwrap();
        world.reset().unwrap();
        assert_eq!(world.dummies.len(), 25);
    }

    #[test]
    fn test_sense_classifies_traffic() {
        let mut world = quiet_world();
        world.place_primary(pose(3, 3, Heading::EAST), Location::new(6, 3), 20);
        world.set_light(Location::new(3, 3), Heading::EAST, Light::Green);
        world.add_dummy(pose(3, 3, Heading::WEST), Direction::Left);
        world.add_dummy(pose(3, 3, Heading::SOUTH), Direction::Forward);
        world.add_dummy(pose(3, 3, Heading::NORTH), Direction::Right);
        world.add_dummy(pose(4, 3, Heading::WEST), Direction::Forward);

        let sensed = world.sense();
        assert_eq!(sensed.light, Light::Green);
        assert_eq!(sensed.oncoming, Some(Direction::Left));
        // Southbound car comes from the north, which is our left when heading east
        assert_eq!(sensed.left, Some(Direction::Forward));
        assert_eq!(sensed.right, Some(Direction::Right));
    }

    #[test]
    fn test_left_keeps_forward_intent() {
        let mut world = quiet_world();
        world.place_primary(pose(2, 2, Heading::NORTH), Location::new(2, 5), 20);
        world.add_dummy(pose(2, 2, Heading::EAST), Direction::Forward);
        world.add_dummy(pose(2, 2, Heading::EAST), Direction::Right);

        assert_eq!(world.sense().left, Some(Direction::Forward));
    }

    #[test]
    fn test_other_cars_see_primary_waypoint() {
        let mut world = quiet_world();
        // Destination to the north while heading east: the planner says turn left
        world.place_primary(pose(3, 3, Heading::EAST), Location::new(3, 1), 20);
        world.set_light(Location::new(3, 3), Heading::EAST, Light::Red);
        world.add_dummy(pose(3, 3, Heading::WEST), Direction::Forward);
        let dummy = pose(3, 3, Heading::WEST);

        assert_eq!(world.sense_from(dummy, Some(0), true).oncoming, None);

        world.act(Action::Hold);
        assert_eq!(world.pose().location, Location::new(3, 3));
        assert_eq!(
            world.sense_from(dummy, Some(0), true).oncoming,
            Some(Direction::Left)
        );

        // Running the red light is refused but the waypoint is still visible
        world.act(Action::Forward);
        assert_eq!(world.trial_data().violations(Violation::Major), 1);
        assert_eq!(
            world.sense_from(dummy, Some(0), true).oncoming,
            Some(Direction::Left)
        );
    }

    #[test]
    fn test_scripted_locations_wrap_onto_grid() {
        let mut world = quiet_world();
        world.set_light(Location::new(-1, 9), Heading::EAST, Light::Green);
        world.place_primary(pose(-1, -3, Heading::EAST), Location::new(10, 3), 20);
        world.add_dummy(pose(15, 9, Heading::WEST), Direction::Right);

        assert_eq!(world.pose().location, Location::new(7, 3));
        assert_eq!(world.destination(), Some(Location::new(2, 3)));

        let sensed = world.sense();
        assert_eq!(sensed.light, Light::Green);
        assert_eq!(sensed.oncoming, Some(Direction::Right));
    }

    #[test]
    fn test_classify_rules() {
        let green = Sensed {
            light: Light::Green,
            ..Sensed::default()
        };
        let red = Sensed::default();

        assert_eq!(GridWorld::classify(Action::Forward, &green), Violation::None);
        assert_eq!(GridWorld::classify(Action::Forward, &red), Violation::Major);
        assert_eq!(GridWorld::classify(Action::Hold, &green), Violation::Minor);
        assert_eq!(GridWorld::classify(Action::Hold, &red), Violation::None);
        assert_eq!(GridWorld::classify(Action::Right, &red), Violation::None);

        let red_cross = Sensed {
            left: Some(Direction::Forward),
            ..Sensed::default()
        };
        assert_eq!(
            GridWorld::classify(Action::Forward, &red_cross),
            Violation::MajorAccident
        );
        assert_eq!(
            GridWorld::classify(Action::Right, &red_cross),
            Violation::MinorAccident
        );

        let green_oncoming = Sensed {
            light: Light::Green,
            oncoming: Some(Direction::Forward),
            ..Sensed::default()
        };
        assert_eq!(
            GridWorld::classify(Action::Left, &green_oncoming),
            Violation::MinorAccident
        );

        let green_oncoming_left = Sensed {
            light: Light::Green,
            oncoming: Some(Direction::Left),
            ..Sensed::default()
        };
        assert_eq!(
            GridWorld::classify(Action::Hold, &green_oncoming_left),
            Violation::None
        );
    }

    #[test]
    fn test_act_on_route_moves_and_rewards() {
        let mut world = quiet_world();
        world.place_primary(pose(1, 1, Heading::EAST), Location::new(4, 1), 20);
        world.set_light(Location::new(1, 1), Heading::EAST, Light::Green);

        let reward = world.act(Action::Forward);

        // Base noise in [-1, 1) plus 2 with no deadline pressure at t = 0
        assert!((1.0..3.0).contains(&reward), "reward {reward}");
        assert_eq!(world.pose().location, Location::new(2, 1));
        assert_eq!(world.trial_data().violations(Violation::None), 1);
    }

    #[test]
    fn test_act_violation_stays_put() {
        let mut world = quiet_world();
        world.place_primary(pose(1, 1, Heading::EAST), Location::new(4, 1), 20);
        world.set_light(Location::new(1, 1), Heading::EAST, Light::Red);

        let reward = world.act(Action::Forward);

        assert!((-11.0..-9.0).contains(&reward), "reward {reward}");
        assert_eq!(world.pose().location, Location::new(1, 1));
        assert_eq!(world.trial_data().violations(Violation::Major), 1);
    }

    #[test]
    fn test_arrival_ends_trial_with_success() {
        let mut world = quiet_world();
        world.place_primary(pose(3, 2, Heading::NORTH), Location::new(3, 1), 5);
        world.set_light(Location::new(3, 2), Heading::NORTH, Light::Green);

        world.act(Action::Forward);

        assert!(world.is_done());
        assert!(world.trial_data().success);
    }

    #[test]
    fn test_deadline_ends_trial() {
        let mut world = quiet_world();
        world.place_primary(pose(0, 0, Heading::EAST), Location::new(4, 3), 2);

        let mut ticks = 0;
        while !world.is_done() {
            world.act(Action::Hold);
            world.advance();
            ticks += 1;
            assert!(ticks < 10);
        }
        assert!(!world.trial_data().success);
        assert_eq!(ticks, 3);
    }

    #[test]
    fn test_hard_time_limit_without_enforcement() {
        let mut world = GridWorld::new(WorldConfig {
            num_dummies: 0,
            enforce_deadline: false,
            hard_time_limit: -3,
            seed: Some(1),
            ..WorldConfig::default()
        })
        .unwrap();
        world.place_primary(pose(0, 0, Heading::EAST), Location::new(4, 3), 1);

        let mut ticks = 0;
        while !world.is_done() {
            world.advance();
            ticks += 1;
        }
        assert_eq!(ticks, 5);
    }

    #[test]
    fn test_dummy_waits_at_red() {
        let mut world = quiet_world();
        world.add_dummy(pose(2, 2, Heading::EAST), Direction::Forward);
        world.set_light(Location::new(2, 2), Heading::EAST, Light::Red);

        world.step_dummy(0);
        assert_eq!(world.dummies[0].pose.location, Location::new(2, 2));

        world.set_light(Location::new(2, 2), Heading::EAST, Light::Green);
        world.step_dummy(0);
        assert_eq!(world.dummies[0].pose.location, Location::new(3, 2));
    }

    #[test]
    fn test_deadline_penalty_curve() {
        let mut world = quiet_world();
        assert_eq!(world.deadline_penalty(10), 0.0);

        world.t = 10;
        assert!((world.deadline_penalty(0) - 1.0).abs() < 1e-12);

        world.config.enforce_deadline = false;
        assert_eq!(world.deadline_penalty(0), 0.0);
    }
}
