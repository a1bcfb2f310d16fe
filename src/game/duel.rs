//! Head-bust duel: a timing mini-game that replaces instant death when the player's head
//! meets a significantly different-sized head.
//!
//! A pointer sweeps a ring while the player tries to act inside a target arc. The hit
//! geometry lives here so the engine and any UI agree on what counts.

use super::math::{angle_diff, wrap_angle};
use super::types::SnakeId;
use rand::Rng;
use serde::Serialize;
use std::f64::consts::TAU;

pub const DUEL_INTRO_SECS: f64 = 1.2;
pub const DUEL_OUTRO_SECS: f64 = 0.9;
pub const DUEL_TIMEOUT_SECS: f64 = 6.0;
pub const DUEL_STREAK_GOAL: u32 = 3;
pub const DUEL_INITIAL_PERIOD: f64 = 1.6;
pub const DUEL_SPEEDUP: f64 = 1.15;
pub const DUEL_INITIAL_ARC: f64 = 0.9;
pub const DUEL_ARC_SHRINK: f64 = 0.8;
pub const DUEL_MIN_ARC: f64 = 0.22;
pub const DUEL_RING_RADIUS: f64 = 90.0;
pub const DUEL_STROKE_WIDTH: f64 = 10.0;
/// Step length assumed for the hit window until the first step arrives.
pub const DUEL_FRAME_DT: f64 = 1.0 / 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuelPhase {
    Intro,
    Play,
    Outro,
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuelOutcome {
    PlayerWon,
    PlayerLost,
}

#[derive(Debug, Clone, Serialize)]
pub struct Duel {
    pub player: SnakeId,
    pub opponent: SnakeId,
    pub phase: DuelPhase,
    /// Seconds spent in the current phase.
    pub phase_time: f64,
    pub pointer: f64,
    pub previous_pointer: f64,
    /// +1 counter-clockwise, -1 clockwise.
    pub direction: f64,
    /// Seconds per revolution.
    pub period: f64,
    pub arc_center: f64,
    pub arc_width: f64,
    pub streak: u32,
    pub outcome: Option<DuelOutcome>,
    /// Length of the latest step; the pointer travels `angular_speed * step_dt` per step.
    pub step_dt: f64,
}

/// Half-width slack: the stroke's angular half-thickness plus one frame of pointer travel.
pub fn hit_tolerance(stroke_width: f64, ring_radius: f64, angular_speed: f64, frame_dt: f64) -> f64 {
    let stroke = if ring_radius > 0.0 {
        stroke_width.max(0.0) / (2.0 * ring_radius)
    } else {
        0.0
    };
    stroke + angular_speed.abs() * frame_dt.max(0.0)
}

pub fn in_arc(angle: f64, arc_center: f64, arc_width: f64, tolerance: f64) -> bool {
    angle_diff(arc_center, angle).abs() <= arc_width.max(0.0) / 2.0 + tolerance.max(0.0)
}

/// A press counts if either the current or the preceding pointer sample was in the arc.
pub fn is_hit(current: f64, previous: f64, arc_center: f64, arc_width: f64, tolerance: f64) -> bool {
    in_arc(current, arc_center, arc_width, tolerance)
        || in_arc(previous, arc_center, arc_width, tolerance)
}

impl Duel {
    pub fn new<R: Rng + ?Sized>(player: SnakeId, opponent: SnakeId, rng: &mut R) -> Self {
        let pointer = wrap_angle(rng.gen::<f64>() * TAU);
        let direction = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        let arc_center = wrap_angle(pointer + direction * rng.gen_range(1.5..4.0));
        Self {
            player,
            opponent,
            phase: DuelPhase::Intro,
            phase_time: 0.0,
            pointer,
            previous_pointer: pointer,
            direction,
            period: DUEL_INITIAL_PERIOD,
            arc_center,
            arc_width: DUEL_INITIAL_ARC,
            streak: 0,
            outcome: None,
            step_dt: DUEL_FRAME_DT,
        }
    }

    pub fn involves(&self, id: SnakeId) -> bool {
        self.player == id || self.opponent == id
    }

    pub fn angular_speed(&self) -> f64 {
        TAU / self.period
    }

    pub fn tolerance(&self) -> f64 {
        hit_tolerance(
            DUEL_STROKE_WIDTH,
            DUEL_RING_RADIUS,
            self.angular_speed(),
            self.step_dt,
        )
    }

    /// `(winner, loser)` once an outcome is known.
    pub fn winner_loser(&self) -> Option<(SnakeId, SnakeId)> {
        match self.outcome? {
            DuelOutcome::PlayerWon => Some((self.player, self.opponent)),
            DuelOutcome::PlayerLost => Some((self.opponent, self.player)),
        }
    }

    /// Advances timers and the pointer. Returns the outcome once the outro has played out.
    pub fn advance<R: Rng + ?Sized>(&mut self, dt: f64, action: bool, rng: &mut R) -> Option<DuelOutcome> {
        if !dt.is_finite() || dt <= 0.0 {
            return None;
        }
        self.step_dt = dt;
        self.phase_time += dt;
        match self.phase {
            DuelPhase::Intro => {
                if self.phase_time >= DUEL_INTRO_SECS {
                    self.enter(DuelPhase::Play);
                }
                None
            }
            DuelPhase::Play => {
                self.previous_pointer = self.pointer;
                self.pointer = wrap_angle(self.pointer + self.direction * self.angular_speed() * dt);
                if action {
                    let hit = is_hit(
                        self.pointer,
                        self.previous_pointer,
                        self.arc_center,
                        self.arc_width,
                        self.tolerance(),
                    );
                    if hit {
                        self.register_hit(rng);
                    } else {
                        self.finish(DuelOutcome::PlayerLost);
                        return None;
                    }
                }
                if self.streak >= DUEL_STREAK_GOAL {
                    self.finish(DuelOutcome::PlayerWon);
                } else if self.phase_time >= DUEL_TIMEOUT_SECS {
                    self.finish(DuelOutcome::PlayerLost);
                }
                None
            }
            DuelPhase::Outro => {
                if self.phase_time >= DUEL_OUTRO_SECS {
                    self.enter(DuelPhase::Resolved);
                    return self.outcome;
                }
                None
            }
            DuelPhase::Resolved => None,
        }
    }

    fn enter(&mut self, phase: DuelPhase) {
        tracing::debug!(player = self.player, opponent = self.opponent, ?phase, "duel phase");
        self.phase = phase;
        self.phase_time = 0.0;
    }

    fn finish(&mut self, outcome: DuelOutcome) {
        self.outcome = Some(outcome);
        self.enter(DuelPhase::Outro);
    }

    fn register_hit<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.streak += 1;
        self.arc_width = (self.arc_width * DUEL_ARC_SHRINK).max(DUEL_MIN_ARC);
        self.direction = -self.direction;
        self.period /= DUEL_SPEEDUP;
        self.arc_center = wrap_angle(self.pointer + self.direction * rng.gen_range(1.2..4.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const DT: f64 = 1.0 / 60.0;

    fn default_tolerance() -> f64 {
        hit_tolerance(
            DUEL_STROKE_WIDTH,
            DUEL_RING_RADIUS,
            TAU / DUEL_INITIAL_PERIOD,
            DUEL_FRAME_DT,
        )
    }

    fn play_duel(rng: &mut StdRng) -> Duel {
        let mut duel = Duel::new(1, 2, rng);
        while duel.phase == DuelPhase::Intro {
            duel.advance(DT, true, rng);
        }
        duel
    }

    #[test]
    fn arc_hit_rule() {
        let tolerance = default_tolerance();
        assert!(is_hit(0.05, 0.05, 0.0, 0.3, tolerance));
        assert!(!is_hit(1.0, 1.0, 0.0, 0.3, tolerance));
    }

    #[test]
    fn previous_sample_rescues_a_late_press() {
        let tolerance = 0.0;
        assert!(is_hit(0.5, 0.1, 0.0, 0.3, tolerance));
        assert!(!is_hit(0.5, 0.4, 0.0, 0.3, tolerance));
    }

    #[test]
    fn arc_test_wraps_around_pi() {
        assert!(in_arc(-3.1, 3.1, 0.2, 0.0));
    }

    #[test]
    fn intro_ignores_input() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut duel = Duel::new(1, 2, &mut rng);
        duel.advance(DT, true, &mut rng);
        assert_eq!(duel.phase, DuelPhase::Intro);
        assert_eq!(duel.outcome, None);
        let duel = play_duel(&mut rng);
        assert_eq!(duel.phase, DuelPhase::Play);
        assert_eq!(duel.streak, 0);
    }

    #[test]
    fn hit_shrinks_arc_reverses_and_speeds_up() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut duel = play_duel(&mut rng);
        let direction = duel.direction;
        let period = duel.period;
        duel.arc_center = wrap_angle(duel.pointer + duel.direction * duel.angular_speed() * DT);
        duel.advance(DT, true, &mut rng);
        assert_eq!(duel.streak, 1);
        assert_eq!(duel.direction, -direction);
        assert!(duel.period < period);
        assert!((duel.arc_width - DUEL_INITIAL_ARC * DUEL_ARC_SHRINK).abs() < 1e-12);
        assert_eq!(duel.phase, DuelPhase::Play);
    }

    #[test]
    fn miss_loses_and_outro_then_resolves() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut duel = play_duel(&mut rng);
        duel.arc_center = wrap_angle(duel.pointer + std::f64::consts::PI);
        duel.advance(DT, true, &mut rng);
        assert_eq!(duel.phase, DuelPhase::Outro);
        assert_eq!(duel.winner_loser(), Some((2, 1)));

        let mut resolved = None;
        for _ in 0..120 {
            if let Some(outcome) = duel.advance(DT, false, &mut rng) {
                resolved = Some(outcome);
                break;
            }
        }
        assert_eq!(resolved, Some(DuelOutcome::PlayerLost));
        assert_eq!(duel.phase, DuelPhase::Resolved);
    }

    #[test]
    fn streak_goal_wins() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut duel = play_duel(&mut rng);
        for _ in 0..DUEL_STREAK_GOAL {
            duel.arc_center = wrap_angle(duel.pointer + duel.direction * duel.angular_speed() * DT);
            duel.advance(DT, true, &mut rng);
        }
        assert_eq!(duel.outcome, Some(DuelOutcome::PlayerWon));
        assert_eq!(duel.winner_loser(), Some((1, 2)));
    }

    #[test]
    fn hit_window_follows_step_length() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut duel = play_duel(&mut rng);
        let slow_dt = 0.1;
        let travel = duel.angular_speed() * slow_dt;
        let stroke = DUEL_STROKE_WIDTH / (2.0 * DUEL_RING_RADIUS);
        // the arc edge sits just past where the pointer lands after one long step
        let landing = duel.pointer + duel.direction * travel;
        duel.arc_center = wrap_angle(landing + duel.direction * (duel.arc_width / 2.0 + stroke + travel / 2.0));
        duel.advance(slow_dt, true, &mut rng);
        assert_eq!(duel.streak, 1);
        assert_eq!(duel.outcome, None);
        assert!((duel.step_dt - slow_dt).abs() < 1e-12);
    }

    #[test]
    fn timeout_loses() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut duel = play_duel(&mut rng);
        let ticks = (DUEL_TIMEOUT_SECS / DT).ceil() as usize + 2;
        for _ in 0..ticks {
            duel.advance(DT, false, &mut rng);
            if duel.phase != DuelPhase::Play {
                break;
            }
        }
        assert_eq!(duel.outcome, Some(DuelOutcome::PlayerLost));
    }
}
