use serde::{Deserialize, Serialize};

use crate::Position;

/// One of the four axis-aligned unit moves. Up increases `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Returns the (dx, dy) offset of this move.
    pub const fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (0, 1),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// The position one step from `from`, or `None` if it would leave a
    /// `width` x `height` board.
    pub fn apply(self, from: Position, width: usize, height: usize) -> Option<Position> {
        let (dx, dy) = self.delta();
        let x = from.x.checked_add_signed(dx)?;
        let y = from.y.checked_add_signed(dy)?;
        (x < width && y < height).then_some(Position { x, y })
    }
}

/// Chooses a single step from `current` toward `destination`.
///
/// The x axis is always resolved before the y axis. Returns `None` when the
/// two positions are equal.
pub fn step_toward(current: Position, destination: Position) -> Option<Direction> {
    if current.x < destination.x {
        Some(Direction::Right)
    } else if current.x > destination.x {
        Some(Direction::Left)
    } else if current.y < destination.y {
        Some(Direction::Up)
    } else if current.y > destination.y {
        Some(Direction::Down)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::right((0, 0), (2, 3), Direction::Right)]
    #[case::left((3, 1), (2, 3), Direction::Left)]
    #[case::up_when_x_aligned((0, 0), (0, 3), Direction::Up)]
    #[case::down_when_x_aligned((3, 3), (3, 1), Direction::Down)]
    #[case::x_before_y((3, 3), (0, 0), Direction::Left)]
    fn resolves_x_before_y(
        #[case] current: (usize, usize),
        #[case] destination: (usize, usize),
        #[case] expected: Direction,
    ) {
        let current = Position::new(current.0, current.1);
        let destination = Position::new(destination.0, destination.1);
        assert_eq!(step_toward(current, destination), Some(expected));
    }

    #[test]
    fn no_step_when_already_there() {
        let here = Position::new(2, 2);
        assert_eq!(step_toward(here, here), None);
    }

    #[test]
    fn every_step_changes_one_coordinate_by_one() {
        let size = 5;
        for cx in 0..size {
            for cy in 0..size {
                for dx in 0..size {
                    for dy in 0..size {
                        let current = Position::new(cx, cy);
                        let destination = Position::new(dx, dy);
                        let Some(direction) = step_toward(current, destination) else {
                            assert_eq!(current, destination);
                            continue;
                        };
                        let next = direction.apply(current, size, size).unwrap();
                        assert_eq!(next.manhattan_distance(&current), 1);
                        assert_eq!(
                            next.manhattan_distance(&destination) + 1,
                            current.manhattan_distance(&destination)
                        );
                        if cx != dx {
                            assert_eq!(next.y, current.y, "y moved before x was aligned");
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn apply_stops_at_the_board_edge() {
        let corner = Position::new(0, 0);
        assert_eq!(Direction::Left.apply(corner, 3, 3), None);
        assert_eq!(Direction::Down.apply(corner, 3, 3), None);
        assert_eq!(
            Direction::Up.apply(corner, 3, 3),
            Some(Position::new(0, 1))
        );
        assert_eq!(Direction::Right.apply(Position::new(2, 0), 3, 3), None);
    }
}
