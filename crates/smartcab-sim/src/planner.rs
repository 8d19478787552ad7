//! Turn-by-turn route planning on the wrap-around grid

use smartcab_core::{Direction, Heading, Location, Pose, RoutePlanner};

/// Shortest signed displacement along an axis of length `size` that wraps
pub fn wrap_delta(delta: i32, size: i32) -> i32 {
    let d = delta.rem_euclid(size);
    if d > size / 2 {
        d - size
    } else {
        d
    }
}

/// Wrap-aware Manhattan distance
pub fn grid_distance(a: Location, b: Location, columns: i32, rows: i32) -> i32 {
    wrap_delta(b.x - a.x, columns).abs() + wrap_delta(b.y - a.y, rows).abs()
}

/// Next turn from `pose` towards `destination`.
///
/// East-west displacement is closed first, then north-south. When the
/// destination lies behind the cab, it turns towards the remaining
/// north-south displacement, or right when there is none.
pub fn route_direction(
    pose: Pose,
    destination: Location,
    columns: i32,
    rows: i32,
) -> Option<Direction> {
    let dx = wrap_delta(destination.x - pose.location.x, columns);
    let dy = wrap_delta(destination.y - pose.location.y, rows);

    if dx == 0 && dy == 0 {
        return None;
    }

    let target = if dx != 0 {
        Heading {
            dx: dx.signum(),
            dy: 0,
        }
    } else {
        Heading {
            dx: 0,
            dy: dy.signum(),
        }
    };

    let heading = pose.heading;
    if heading == target {
        return Some(Direction::Forward);
    }
    if heading.left() == target {
        return Some(Direction::Left);
    }
    if heading.right() == target {
        return Some(Direction::Right);
    }

    // Facing away from the target
    if dy != 0 {
        let north_south = Heading {
            dx: 0,
            dy: dy.signum(),
        };
        if heading.left() == north_south {
            return Some(Direction::Left);
        }
    }
    Some(Direction::Right)
}

/// Route planner for a [`crate::GridWorld`] of the given size
#[derive(Debug, Clone)]
pub struct GridPlanner {
    columns: i32,
    rows: i32,
    destination: Option<Location>,
}

impl GridPlanner {
    pub fn new(columns: i32, rows: i32) -> Self {
        Self {
            columns,
            rows,
            destination: None,
        }
    }
}

impl RoutePlanner for GridPlanner {
    fn route_to(&mut self, destination: Location) {
        self.destination = Some(destination);
    }

    fn destination(&self) -> Option<Location> {
        self.destination
    }

    fn next_waypoint(&self, pose: Pose) -> Option<Direction> {
        let destination = self.destination?;
        route_direction(pose, destination, self.columns, self.rows)
    }
}
