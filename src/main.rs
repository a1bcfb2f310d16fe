use slither_arena::app::config::RunnerConfig;
use slither_arena::game::clock::{FixedStepDriver, DEFAULT_MAX_STEPS};
use slither_arena::game::duel::{in_arc, DuelPhase};
use slither_arena::game::math::{from_angle, length};
use slither_arena::game::types::{Aim, PlayerInput, Point};
use slither_arena::game::world::World;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing_subscriber::EnvFilter;

/// Fraction of the arena radius beyond which the autopilot heads back to the centre.
const HOME_FRACTION: f64 = 0.6;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let config = RunnerConfig::from_env()?;
  let mut world = World::create(config.world.clone());
  let mut driver = FixedStepDriver::new(config.step_dt(), DEFAULT_MAX_STEPS, &world);
  tracing::info!(
    bots = config.world.bot_count,
    seed = config.world.seed,
    tick_hz = config.tick_hz,
    sim_seconds = ?config.sim_seconds,
    "simulation started"
  );

  let mut interval = tokio::time::interval(Duration::from_secs_f64(driver.step_dt()));
  interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
  let ctrl_c = tokio::signal::ctrl_c();
  tokio::pin!(ctrl_c);

  let mut last_frame = Instant::now();
  let mut since_report = 0.0;
  loop {
    tokio::select! {
      result = &mut ctrl_c => {
        result?;
        tracing::info!("interrupted");
        break;
      }
      _ = interval.tick() => {}
    }

    let now = Instant::now();
    let frame_dt = now.duration_since(last_frame).as_secs_f64();
    last_frame = now;

    let input = autopilot(&world);
    let steps = driver.advance(&mut world, &input, frame_dt);
    for event in world.drain_events() {
      tracing::info!(event = %serde_json::to_string(&event)?, "world event");
    }

    since_report += steps as f64 * driver.step_dt();
    if since_report >= config.leaderboard_log_secs {
      since_report = 0.0;
      tracing::info!(
        tick = world.tick(),
        pellets = world.pellets().len(),
        leaderboard = %serde_json::to_string(world.leaderboard())?,
        "leaderboard"
      );
    }

    if let Some(limit) = config.sim_seconds {
      if world.elapsed() >= limit {
        break;
      }
    }
  }

  tracing::info!(tick = world.tick(), elapsed = world.elapsed(), "simulation finished");
  println!("{}", serde_json::to_string_pretty(world.leaderboard())?);
  Ok(())
}

/// Stand-in for a human: wanders, returns home near the wall and presses the duel action
/// while the pointer is inside the arc.
fn autopilot(world: &World) -> PlayerInput {
  if let Some(duel) = world.duel() {
    let press = duel.phase == DuelPhase::Play && in_arc(duel.pointer, duel.arc_center, duel.arc_width, 0.0);
    return PlayerInput {
      duel_action: press,
      ..PlayerInput::default()
    };
  }
  let Some(head) = world.player().and_then(|player| player.head()) else {
    return PlayerInput::default();
  };
  let aim = if length(head) > world.radius() * HOME_FRACTION {
    Aim::Point(Point::ZERO)
  } else {
    Aim::Direction(from_angle(world.elapsed() * 0.4))
  };
  PlayerInput {
    aim: Some(aim),
    boost: false,
    duel_action: false,
  }
}
