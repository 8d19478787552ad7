//! Common types used throughout smartcab

use serde::{Deserialize, Serialize};

/// Reward value returned by the environment for a single action
pub type Reward = f64;

/// A turn relative to the current heading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Left,
    Right,
}

impl Direction {
    /// All relative directions, in canonical order
    pub const ALL: [Direction; 3] = [Direction::Forward, Direction::Left, Direction::Right];
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Left => write!(f, "left"),
            Direction::Right => write!(f, "right"),
        }
    }
}

/// Traffic signal color as seen from the cab's heading
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Light {
    #[default]
    Red,
    Green,
}

impl std::fmt::Display for Light {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Light::Red => write!(f, "red"),
            Light::Green => write!(f, "green"),
        }
    }
}

/// A driving action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Stay at the intersection
    #[serde(rename = "none")]
    Hold,
    Forward,
    Left,
    Right,
}

impl Action {
    /// Number of discrete actions
    pub const COUNT: usize = 4;

    /// The fixed, ordered set of valid actions
    pub const ALL: [Action; Action::COUNT] =
        [Action::Hold, Action::Forward, Action::Left, Action::Right];

    /// Convert action to its slot in [`Action::ALL`]
    pub fn index(self) -> usize {
        match self {
            Action::Hold => 0,
            Action::Forward => 1,
            Action::Left => 2,
            Action::Right => 3,
        }
    }

    /// Create action from its slot in [`Action::ALL`]
    pub fn from_index(index: usize) -> Option<Self> {
        Action::ALL.get(index).copied()
    }

    /// The movement this action performs, `None` for [`Action::Hold`]
    pub fn direction(self) -> Option<Direction> {
        match self {
            Action::Hold => None,
            Action::Forward => Some(Direction::Forward),
            Action::Left => Some(Direction::Left),
            Action::Right => Some(Direction::Right),
        }
    }
}

impl From<Option<Direction>> for Action {
    fn from(direction: Option<Direction>) -> Self {
        match direction {
            None => Action::Hold,
            Some(Direction::Forward) => Action::Forward,
            Some(Direction::Left) => Action::Left,
            Some(Direction::Right) => Action::Right,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.direction() {
            Some(direction) => write!(f, "{direction}"),
            None => write!(f, "none"),
        }
    }
}

/// Unit compass heading on the grid. `dy` grows southwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Heading {
    pub dx: i32,
    pub dy: i32,
}

impl Heading {
    pub const NORTH: Heading = Heading { dx: 0, dy: -1 };
    pub const SOUTH: Heading = Heading { dx: 0, dy: 1 };
    pub const EAST: Heading = Heading { dx: 1, dy: 0 };
    pub const WEST: Heading = Heading { dx: -1, dy: 0 };

    /// The four compass headings
    pub const ALL: [Heading; 4] = [Heading::EAST, Heading::SOUTH, Heading::WEST, Heading::NORTH];

    /// Heading after a left turn
    pub fn left(self) -> Self {
        Heading {
            dx: self.dy,
            dy: -self.dx,
        }
    }

    /// Heading after a right turn
    pub fn right(self) -> Self {
        Heading {
            dx: -self.dy,
            dy: self.dx,
        }
    }

    /// Opposite heading
    pub fn reverse(self) -> Self {
        Heading {
            dx: -self.dx,
            dy: -self.dy,
        }
    }

    /// Heading after performing a relative turn
    pub fn turn(self, direction: Direction) -> Self {
        match direction {
            Direction::Forward => self,
            Direction::Left => self.left(),
            Direction::Right => self.right(),
        }
    }

    /// True when travelling along a north-south street
    pub fn is_north_south(self) -> bool {
        self.dx == 0
    }
}

/// Intersection coordinates on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub x: i32,
    pub y: i32,
}

impl Location {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Where a cab is and which way it faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pose {
    pub location: Location,
    pub heading: Heading,
}

/// Raw intersection inputs sensed by a cab.
///
/// Traffic fields hold the intended direction of the car in that position,
/// or `None` when the position is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sensed {
    pub light: Light,
    pub left: Option<Direction>,
    pub oncoming: Option<Direction>,
    pub right: Option<Direction>,
}
