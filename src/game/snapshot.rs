//! Read-only render state. Snapshots are copied out of the world so a renderer can blend
//! two fixed steps without touching simulation state.

use super::math::lerp;
use super::types::{Pellet, Point, Snake, SnakeId};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnakeSnapshot {
    pub id: SnakeId,
    pub name: String,
    pub color: String,
    pub is_player: bool,
    pub alive: bool,
    pub boosting: bool,
    pub heading: f64,
    pub radius: f64,
    pub body: Vec<Point>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub elapsed: f64,
    pub snakes: Vec<SnakeSnapshot>,
    pub pellets: Vec<Pellet>,
}

impl SnakeSnapshot {
    pub fn capture(snake: &Snake) -> Self {
        Self {
            id: snake.id,
            name: snake.name.clone(),
            color: snake.color.clone(),
            is_player: snake.is_player,
            alive: snake.alive,
            boosting: snake.boosting,
            heading: snake.heading,
            radius: snake.radius,
            body: snake.body.clone(),
        }
    }
}

impl WorldSnapshot {
    pub fn capture(tick: u64, elapsed: f64, snakes: &[Snake], pellets: &[Pellet]) -> Self {
        Self {
            tick,
            elapsed,
            snakes: snakes.iter().map(SnakeSnapshot::capture).collect(),
            pellets: pellets.to_vec(),
        }
    }
}

/// Blends two snapshots for rendering. Entities are matched by id; anything that is new,
/// respawned or dead in `curr` is taken as-is.
pub fn interpolate(prev: &WorldSnapshot, curr: &WorldSnapshot, alpha: f64) -> WorldSnapshot {
    let t = if alpha.is_finite() {
        alpha.clamp(0.0, 1.0)
    } else {
        1.0
    };
    if t >= 1.0 {
        return curr.clone();
    }
    let snakes = curr
        .snakes
        .iter()
        .map(|snake| {
            let Some(before) = prev
                .snakes
                .iter()
                .find(|other| other.id == snake.id && other.alive && snake.alive)
            else {
                return snake.clone();
            };
            let body = snake
                .body
                .iter()
                .enumerate()
                .map(|(index, point)| match before.body.get(index) {
                    Some(old) => lerp(*old, *point, t),
                    None => *point,
                })
                .collect();
            SnakeSnapshot {
                radius: before.radius + (snake.radius - before.radius) * t,
                body,
                ..snake.clone()
            }
        })
        .collect();
    WorldSnapshot {
        tick: curr.tick,
        elapsed: prev.elapsed + (curr.elapsed - prev.elapsed) * t,
        snakes,
        pellets: curr.pellets.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::snake::make_test_snake;

    fn snapshot_of(snakes: &[Snake], tick: u64) -> WorldSnapshot {
        WorldSnapshot::capture(tick, tick as f64 / 60.0, snakes, &[])
    }

    #[test]
    fn halfway_blend_averages_points() {
        let a = make_test_snake(1, Point::new(0.0, 0.0), 12);
        let b = make_test_snake(1, Point::new(10.0, 0.0), 12);
        let prev = snapshot_of(&[a], 1);
        let curr = snapshot_of(&[b], 2);
        let mid = interpolate(&prev, &curr, 0.5);
        assert_eq!(mid.tick, 2);
        assert!((mid.snakes[0].body[0].x - 5.0).abs() < 1e-9);
    }

    #[test]
    fn alpha_is_clamped() {
        let a = make_test_snake(1, Point::new(0.0, 0.0), 12);
        let b = make_test_snake(1, Point::new(10.0, 0.0), 12);
        let prev = snapshot_of(&[a], 1);
        let curr = snapshot_of(&[b], 2);
        assert_eq!(interpolate(&prev, &curr, 4.0).snakes, curr.snakes);
        assert_eq!(interpolate(&prev, &curr, f64::NAN).snakes, curr.snakes);
        assert_eq!(interpolate(&prev, &curr, -1.0).snakes[0].body, prev.snakes[0].body);
    }

    #[test]
    fn new_and_grown_entities_pass_through() {
        let a = make_test_snake(1, Point::new(0.0, 0.0), 12);
        let grown = make_test_snake(1, Point::new(0.0, 0.0), 13);
        let newcomer = make_test_snake(2, Point::new(50.0, 0.0), 12);
        let prev = snapshot_of(&[a], 1);
        let curr = snapshot_of(&[grown.clone(), newcomer.clone()], 2);
        let blended = interpolate(&prev, &curr, 0.3);
        assert_eq!(blended.snakes[0].body.len(), 13);
        assert_eq!(blended.snakes[0].body[12], grown.body[12]);
        assert_eq!(blended.snakes[1].body, newcomer.body);
    }
}
