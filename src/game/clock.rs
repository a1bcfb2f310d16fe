//! Tick pipeline and the fixed-step driver that feeds it.

use super::snapshot::{interpolate, WorldSnapshot};
use super::types::PlayerInput;
use super::world::World;

pub const DEFAULT_STEP_DT: f64 = 1.0 / 60.0;
pub const DEFAULT_MAX_STEPS: usize = 5;

/// Runs one fixed step. A zero, negative or non-finite `dt` leaves the world untouched.
/// While a duel is active only the duel advances.
pub fn step(world: &mut World, input: &PlayerInput, dt: f64) {
    if !dt.is_finite() || dt <= 0.0 {
        return;
    }
    if world.duel.is_some() {
        advance_duel(world, input, dt);
        return;
    }

    world.sanitize();
    world.apply_input(input);
    world.update_bots(dt);
    world.move_snakes(dt);
    world.update_pellets(dt);
    world.rebuild_grids();
    world.resolve_collisions();

    let trimmed = world.pellets.trim();
    if trimmed > 0 {
        tracing::trace!(trimmed, "pellets trimmed");
    }
    world.update_lifecycle(dt);
    world.update_leaderboard(dt);
    world.rebuild_grids();
    world.tick += 1;
    world.elapsed += dt;
}

fn advance_duel(world: &mut World, input: &PlayerInput, dt: f64) {
    let resolved = match world.duel.as_mut() {
        Some(duel) => match duel.advance(dt, input.duel_action, &mut world.rng) {
            Some(_) => duel.winner_loser(),
            None => None,
        },
        None => return,
    };
    if let Some((winner, loser)) = resolved {
        world.resolve_duel(winner, loser);
    }
}

/// Converts variable frame time into fixed steps and keeps the two most recent snapshots
/// for interpolated rendering.
#[derive(Debug)]
pub struct FixedStepDriver {
    step_dt: f64,
    max_steps: usize,
    accumulator: f64,
    /// A duel press from a frame that ran no step, held for the next step.
    pending_action: bool,
    previous: WorldSnapshot,
    current: WorldSnapshot,
}

impl FixedStepDriver {
    pub fn new(step_dt: f64, max_steps: usize, world: &World) -> Self {
        let step_dt = if step_dt.is_finite() && step_dt > 0.0 {
            step_dt
        } else {
            DEFAULT_STEP_DT
        };
        let snapshot = world.snapshot();
        Self {
            step_dt,
            max_steps: max_steps.max(1),
            accumulator: 0.0,
            pending_action: false,
            previous: snapshot.clone(),
            current: snapshot,
        }
    }

    pub fn step_dt(&self) -> f64 {
        self.step_dt
    }

    /// Feeds one frame. Returns the number of fixed steps that ran.
    pub fn advance(&mut self, world: &mut World, input: &PlayerInput, frame_dt: f64) -> usize {
        if frame_dt.is_finite() && frame_dt > 0.0 {
            self.accumulator += frame_dt;
        }
        self.pending_action |= input.duel_action;
        let mut input = *input;
        let mut steps = 0;
        while self.accumulator >= self.step_dt && steps < self.max_steps {
            input.duel_action = self.pending_action;
            step(world, &input, self.step_dt);
            self.pending_action = false;
            self.accumulator -= self.step_dt;
            steps += 1;
        }
        if self.accumulator >= self.step_dt {
            let dropped = (self.accumulator / self.step_dt).floor() as u64;
            tracing::debug!(dropped, "frame backlog dropped");
            self.accumulator %= self.step_dt;
        }
        if steps > 0 {
            self.previous = std::mem::replace(&mut self.current, world.snapshot());
        }
        steps
    }

    pub fn alpha(&self) -> f64 {
        (self.accumulator / self.step_dt).clamp(0.0, 1.0)
    }

    pub fn render(&self) -> WorldSnapshot {
        interpolate(&self.previous, &self.current, self.alpha())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::duel::{Duel, DuelOutcome, DuelPhase};
    use crate::game::math::wrap_angle;
    use crate::game::world::WorldConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn small_world() -> World {
        World::create(WorldConfig {
            bot_count: 2,
            seed: 5,
            max_pellets: 50,
            ..WorldConfig::default()
        })
    }

    #[test]
    fn frame_time_becomes_whole_steps() {
        let mut world = small_world();
        let mut driver = FixedStepDriver::new(1.0 / 60.0, 5, &world);
        let input = PlayerInput::default();
        assert_eq!(driver.advance(&mut world, &input, 1.0 / 120.0), 0);
        assert_eq!(world.tick(), 0);
        assert_eq!(driver.advance(&mut world, &input, 1.0 / 120.0 + 1e-9), 1);
        assert_eq!(driver.advance(&mut world, &input, 2.0 / 60.0), 2);
        assert_eq!(world.tick(), 3);
        assert!((0.0..=1.0).contains(&driver.alpha()));
    }

    #[test]
    fn long_frames_are_capped() {
        let mut world = small_world();
        let mut driver = FixedStepDriver::new(1.0 / 60.0, 4, &world);
        let steps = driver.advance(&mut world, &PlayerInput::default(), 1.0);
        assert_eq!(steps, 4);
        assert_eq!(world.tick(), 4);
        assert!(driver.alpha() < 1.0);
    }

    #[test]
    fn bad_frame_time_is_ignored() {
        let mut world = small_world();
        let mut driver = FixedStepDriver::new(1.0 / 60.0, 4, &world);
        assert_eq!(driver.advance(&mut world, &PlayerInput::default(), f64::NAN), 0);
        assert_eq!(driver.advance(&mut world, &PlayerInput::default(), -1.0), 0);
        assert_eq!(world.tick(), 0);
    }

    #[test]
    fn render_reports_latest_tick() {
        let mut world = small_world();
        let mut driver = FixedStepDriver::new(1.0 / 60.0, 4, &world);
        driver.advance(&mut world, &PlayerInput::default(), 1.0 / 60.0);
        let rendered = driver.render();
        assert_eq!(rendered.tick, world.tick());
    }

    #[test]
    fn press_in_a_stepless_frame_reaches_the_next_step() {
        let mut world = small_world();
        let mut rng = StdRng::seed_from_u64(9);
        let mut duel = Duel::new(0, 1, &mut rng);
        duel.phase = DuelPhase::Play;
        duel.arc_center = wrap_angle(duel.pointer + std::f64::consts::PI);
        world.duel = Some(duel);

        let mut driver = FixedStepDriver::new(1.0 / 60.0, 4, &world);
        let press = PlayerInput {
            duel_action: true,
            ..PlayerInput::default()
        };
        assert_eq!(driver.advance(&mut world, &press, 1.0 / 240.0), 0);
        assert_eq!(world.duel().and_then(|duel| duel.outcome), None);

        assert_eq!(driver.advance(&mut world, &PlayerInput::default(), 1.0 / 60.0), 1);
        assert_eq!(world.duel().and_then(|duel| duel.outcome), Some(DuelOutcome::PlayerLost));
        assert!(!driver.pending_action);
    }
}
