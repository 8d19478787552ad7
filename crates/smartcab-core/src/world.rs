//! Collaborator contracts between the agent and the simulated world

use crate::types::{Action, Direction, Location, Pose, Reward, Sensed};

/// The world a driving agent acts in.
///
/// Calls are synchronous and concern the single primary cab.
pub trait Environment {
    /// The legal actions, in a fixed order
    fn valid_actions(&self) -> &[Action] {
        &Action::ALL
    }

    /// Current light and traffic observations at the cab's intersection
    fn sense(&self) -> Sensed;

    /// Remaining ticks before the trial deadline
    fn deadline(&self) -> i32;

    /// Current location and heading of the cab
    fn pose(&self) -> Pose;

    /// Execute an action and return its reward
    fn act(&mut self, action: Action) -> Reward;
}

/// Computes the next heading towards an active destination
pub trait RoutePlanner {
    /// Set or replace the target destination
    fn route_to(&mut self, destination: Location);

    /// The active destination, if any
    fn destination(&self) -> Option<Location>;

    /// Recommended turn from `pose`, `None` once the destination is reached
    fn next_waypoint(&self, pose: Pose) -> Option<Direction>;
}
