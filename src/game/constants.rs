pub const WORLD_RADIUS: f64 = 2000.0;
pub const SPAWN_RADIUS_FRACTION: f64 = 0.7;
pub const PELLET_SPAWN_RADIUS_FRACTION: f64 = 0.97;

pub const MIN_LEN: usize = 10;
pub const MAX_LEN: usize = 600;
pub const START_LEN: usize = 40;
pub const GROWTH_PER_TICK: usize = 1;
pub const SEGMENT_SPACING: f64 = 6.0;
pub const RELAX_ITERATIONS: usize = 2;

pub const BASE_SPEED: f64 = 150.0;
pub const SPEED_MASS_FACTOR: f64 = 0.15;
pub const ACCEL_RATE: f64 = 400.0;
pub const DECEL_RATE: f64 = 600.0;
pub const SHARP_TURN_ANGLE: f64 = 1.2;
pub const SHARP_TURN_DAMPING: f64 = 1.5;
pub const MAX_TURN_RATE: f64 = 4.5;
pub const MIN_TURN_RATE: f64 = 1.2;
pub const TURN_MASS_FACTOR: f64 = 0.004;

pub const BASE_RADIUS: f64 = 6.0;
pub const RADIUS_GROWTH: f64 = 0.9;
pub const MAX_RADIUS: f64 = 30.0;

pub const BOOST_MULTIPLIER: f64 = 1.8;
pub const ENERGY_MAX: f64 = 1.0;
pub const ENERGY_DRAIN_PER_SEC: f64 = 0.35;
pub const ENERGY_RECHARGE_PER_SEC: f64 = 0.2;
pub const BOOST_MIN_ENERGY: f64 = 0.1;
pub const BOOST_MIN_MASS_MARGIN: f64 = 5.0;
pub const BOOST_MASS_DRAIN_PER_SEC: f64 = 2.0;
pub const BOOST_DROP_INTERVAL: f64 = 0.25;
pub const BOOST_DROP_RETURN: f64 = 0.6;

pub const BODY_GRID_CELL: f64 = 48.0;
pub const PELLET_GRID_CELL: f64 = 96.0;

pub const MAX_PELLETS: usize = 900;
pub const PELLET_SPAWN_RATE: f64 = 60.0;
pub const MAGNET_RANGE: f64 = 28.0;
pub const MAGNET_PULL: f64 = 220.0;
pub const MIN_SPILL: usize = 6;
pub const MAX_SPILL: usize = 80;
pub const DEATH_MASS_RETURN: f64 = 0.5;
pub const DEATH_PELLET_RADIUS: f64 = 6.0;
pub const DEATH_SPILL_JITTER: f64 = 8.0;

pub const SIGNIFICANT_RATIO: f64 = 1.12;
pub const POWER_SCORE_WEIGHT: f64 = 0.1;
pub const POWER_KILL_WEIGHT: f64 = 5.0;
pub const POWER_JITTER: f64 = 0.5;

pub const SPAWN_GRACE: f64 = 2.0;
pub const BOT_RESPAWN_DELAY: f64 = 3.0;
pub const PLAYER_RESPAWN_DELAY: f64 = 2.0;
pub const SPAWN_CLEARANCE: f64 = 120.0;
pub const MAX_SPAWN_ATTEMPTS: usize = 32;

pub const LEADERBOARD_INTERVAL: f64 = 0.5;
pub const LEADERBOARD_SIZE: usize = 10;

pub const BOT_COUNT: usize = 12;
pub const DEFAULT_DIFFICULTY: f64 = 0.5;

pub const COLOR_POOL: [&str; 8] = [
  "#ff6b6b",
  "#ffd166",
  "#06d6a0",
  "#4dabf7",
  "#f06595",
  "#845ef7",
  "#20c997",
  "#fcc419",
];
