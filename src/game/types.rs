use serde::{Deserialize, Serialize};

pub type SnakeId = u32;
pub type PelletId = u32;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
  pub x: f64,
  pub y: f64,
}

impl Point {
  pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

  pub fn new(x: f64, y: f64) -> Self {
    Self { x, y }
  }

  pub fn is_finite(self) -> bool {
    self.x.is_finite() && self.y.is_finite()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PelletKind {
  Small,
  Medium,
  Large,
  Gold,
  Death,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BotMode {
  #[default]
  Idle,
  Chasing,
  Escaping,
}

/// Scratch state a bot carries between thinks.
#[derive(Debug, Clone, Default)]
pub struct AiState {
  pub reaction_timer: f64,
  pub wander_timer: f64,
  pub wander_angle: f64,
  pub evasion_timer: f64,
  pub evasion_heading: f64,
  pub aim: f64,
  pub mode: BotMode,
  pub victim: Option<SnakeId>,
  pub boost: bool,
}

#[derive(Debug, Clone)]
pub struct Snake {
  pub id: SnakeId,
  pub name: String,
  pub color: String,
  pub is_player: bool,
  /// `body[0]` is the head.
  pub body: Vec<Point>,
  pub heading: f64,
  pub desired_heading: f64,
  pub angular_velocity: f64,
  pub speed: f64,
  pub target_speed: f64,
  pub radius: f64,
  pub mass: f64,
  pub desired_length: usize,
  pub alive: bool,
  pub respawn_timer: f64,
  pub invulnerable_timer: f64,
  pub boost_requested: bool,
  pub boosting: bool,
  pub energy: f64,
  pub boost_drop_timer: f64,
  pub boost_drained: f64,
  pub score: f64,
  pub kills: u32,
  pub ai: AiState,
}

impl Snake {
  pub fn head(&self) -> Option<Point> {
    self.body.first().copied()
  }

  pub fn is_invulnerable(&self) -> bool {
    self.invulnerable_timer > 0.0
  }

  /// Alive and past the spawn grace window.
  pub fn is_collidable(&self) -> bool {
    self.alive && !self.is_invulnerable() && !self.body.is_empty()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pellet {
  pub id: PelletId,
  pub position: Point,
  pub radius: f64,
  pub value: f64,
  pub kind: PelletKind,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Aim {
  /// A heading vector; need not be normalized.
  Direction(Point),
  /// A world-space point to steer at.
  Point(Point),
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerInput {
  pub aim: Option<Aim>,
  pub boost: bool,
  /// True on the frame the player pressed the duel action.
  pub duel_action: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
  pub id: SnakeId,
  pub name: String,
  pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum WorldEvent {
  DuelRequested { player: SnakeId, opponent: SnakeId },
  DuelResolved { winner: SnakeId, loser: SnakeId },
  PlayerDied { killer: Option<SnakeId> },
  LastKillTime { elapsed: f64 },
}
