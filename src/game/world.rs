use super::bot::{self, BotView};
use super::clock;
use super::collision::{apply_bump, detect, Death};
use super::constants::{
  BODY_GRID_CELL, BOT_COUNT, BOT_RESPAWN_DELAY, COLOR_POOL, DEFAULT_DIFFICULTY, LEADERBOARD_INTERVAL,
  LEADERBOARD_SIZE, MAX_PELLETS, PELLET_GRID_CELL, PLAYER_RESPAWN_DELAY, WORLD_RADIUS,
};
use super::duel::Duel;
use super::grid::{rebuild_body_grid, rebuild_pellet_grid, BodyGrid, PelletGrid};
use super::input::aim_heading;
use super::kinetics::{self, feed};
use super::pellets::PelletField;
use super::snake::{apply_repair, create_snake, find_spawn_point, inspect, kill, respawn, Repair};
use super::snapshot::WorldSnapshot;
use super::types::{
  LeaderboardEntry, Pellet, PelletKind, PlayerInput, Snake, SnakeId, WorldEvent,
};
use crate::shared::names::{bot_name, sanitize_color, sanitize_player_name};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

const MIN_WORLD_RADIUS: f64 = 200.0;
const MAX_WORLD_RADIUS: f64 = 20_000.0;
const MAX_BOTS: usize = 200;
const MAX_PELLET_TARGET: usize = 20_000;
const MAX_LEADERBOARD_SIZE: usize = 100;
const PLAYER_FALLBACK_NAME: &str = "Player";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
  pub bot_count: usize,
  pub difficulty: f64,
  pub player_color: String,
  pub player_name: String,
  pub seed: u64,
  pub world_radius: f64,
  pub max_pellets: usize,
  pub leaderboard_size: usize,
}

impl Default for WorldConfig {
  fn default() -> Self {
    Self {
      bot_count: BOT_COUNT,
      difficulty: DEFAULT_DIFFICULTY,
      player_color: COLOR_POOL[0].to_string(),
      player_name: PLAYER_FALLBACK_NAME.to_string(),
      seed: 0,
      world_radius: WORLD_RADIUS,
      max_pellets: MAX_PELLETS,
      leaderboard_size: LEADERBOARD_SIZE,
    }
  }
}

impl WorldConfig {
  /// Clamps out-of-range values into something the engine can run with.
  pub fn normalized(mut self) -> Self {
    if !self.difficulty.is_finite() || !(0.0..=1.0).contains(&self.difficulty) {
      tracing::warn!(difficulty = self.difficulty, "difficulty out of range, clamping");
      self.difficulty = if self.difficulty.is_finite() {
        self.difficulty.clamp(0.0, 1.0)
      } else {
        DEFAULT_DIFFICULTY
      };
    }
    if !self.world_radius.is_finite() || self.world_radius < MIN_WORLD_RADIUS {
      tracing::warn!(world_radius = self.world_radius, "world radius too small, clamping");
      self.world_radius = if self.world_radius.is_finite() {
        MIN_WORLD_RADIUS
      } else {
        WORLD_RADIUS
      };
    }
    if self.world_radius > MAX_WORLD_RADIUS {
      tracing::warn!(world_radius = self.world_radius, "world radius too large, clamping");
      self.world_radius = MAX_WORLD_RADIUS;
    }
    if self.bot_count > MAX_BOTS {
      tracing::warn!(bot_count = self.bot_count, "too many bots, clamping");
      self.bot_count = MAX_BOTS;
    }
    if self.max_pellets > MAX_PELLET_TARGET {
      tracing::warn!(max_pellets = self.max_pellets, "pellet target too large, clamping");
      self.max_pellets = MAX_PELLET_TARGET;
    }
    if !(1..=MAX_LEADERBOARD_SIZE).contains(&self.leaderboard_size) {
      tracing::warn!(leaderboard_size = self.leaderboard_size, "leaderboard size out of range, clamping");
      self.leaderboard_size = self.leaderboard_size.clamp(1, MAX_LEADERBOARD_SIZE);
    }
    self.player_name = sanitize_player_name(&self.player_name, PLAYER_FALLBACK_NAME);
    self.player_color = sanitize_color(&self.player_color, COLOR_POOL[0]);
    self
  }
}

#[derive(Debug)]
pub struct World {
  pub(crate) config: WorldConfig,
  pub(crate) radius: f64,
  pub(crate) difficulty: f64,
  pub(crate) tick: u64,
  pub(crate) elapsed: f64,
  pub(crate) snakes: Vec<Snake>,
  pub(crate) pellets: PelletField,
  pub(crate) body_grid: BodyGrid,
  pub(crate) pellet_grid: PelletGrid,
  pub(crate) rng: StdRng,
  pub(crate) duel: Option<Duel>,
  pub(crate) events: Vec<WorldEvent>,
  pub(crate) leaderboard: Vec<LeaderboardEntry>,
  pub(crate) leaderboard_timer: f64,
}

impl World {
  pub fn create(config: WorldConfig) -> Self {
    let config = config.normalized();
    let radius = config.world_radius;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut snakes: Vec<Snake> = Vec::with_capacity(config.bot_count + 1);

    let (head, heading) = find_spawn_point(&mut rng, &snakes, radius);
    snakes.push(create_snake(
      0,
      config.player_name.clone(),
      config.player_color.clone(),
      true,
      head,
      heading,
    ));
    for index in 0..config.bot_count {
      let (head, heading) = find_spawn_point(&mut rng, &snakes, radius);
      let color = COLOR_POOL[index % COLOR_POOL.len()].to_string();
      let id = (index + 1) as SnakeId;
      snakes.push(create_snake(id, bot_name(index), color, false, head, heading));
    }

    let mut pellets = PelletField::new(config.max_pellets, radius);
    pellets.seed_population(&mut rng);

    let mut world = Self {
      radius,
      difficulty: config.difficulty,
      tick: 0,
      elapsed: 0.0,
      snakes,
      pellets,
      body_grid: BodyGrid::new(BODY_GRID_CELL, radius),
      pellet_grid: PelletGrid::new(PELLET_GRID_CELL, radius),
      rng,
      duel: None,
      events: Vec::new(),
      leaderboard: Vec::new(),
      leaderboard_timer: 0.0,
      config,
    };
    world.rebuild_grids();
    world.refresh_leaderboard();
    tracing::debug!(
      bots = world.config.bot_count,
      pellets = world.pellets.len(),
      seed = world.config.seed,
      "world created"
    );
    world
  }

  pub fn step(&mut self, input: &PlayerInput, dt: f64) {
    clock::step(self, input, dt);
  }

  /// Ends the active duel with the given participants. Returns false when no duel with
  /// exactly that pair is running.
  pub fn resolve_duel(&mut self, winner: SnakeId, loser: SnakeId) -> bool {
    let Some(duel) = self.duel.as_ref() else { return false };
    let pair_matches = winner != loser && duel.involves(winner) && duel.involves(loser);
    if !pair_matches {
      tracing::warn!(winner, loser, "resolve_duel called with wrong participants");
      return false;
    }
    self.duel = None;
    let winner_index = self.index_of(winner);
    if let Some(loser_index) = self.index_of(loser) {
      self.apply_death(Death {
        victim: loser_index,
        killer: winner_index,
      });
    }
    self.events.push(WorldEvent::DuelResolved { winner, loser });
    tracing::debug!(winner, loser, "duel resolved");
    true
  }

  pub fn leaderboard(&self) -> &[LeaderboardEntry] {
    &self.leaderboard
  }

  pub fn drain_events(&mut self) -> Vec<WorldEvent> {
    std::mem::take(&mut self.events)
  }

  pub fn snapshot(&self) -> WorldSnapshot {
    WorldSnapshot::capture(self.tick, self.elapsed, &self.snakes, self.pellets.pellets())
  }

  pub fn duel(&self) -> Option<&Duel> {
    self.duel.as_ref()
  }

  pub fn snakes(&self) -> &[Snake] {
    &self.snakes
  }

  pub fn pellets(&self) -> &[Pellet] {
    self.pellets.pellets()
  }

  pub fn player(&self) -> Option<&Snake> {
    self.snakes.iter().find(|snake| snake.is_player)
  }

  pub fn tick(&self) -> u64 {
    self.tick
  }

  pub fn elapsed(&self) -> f64 {
    self.elapsed
  }

  pub fn radius(&self) -> f64 {
    self.radius
  }

  pub fn config(&self) -> &WorldConfig {
    &self.config
  }

  fn index_of(&self, id: SnakeId) -> Option<usize> {
    self.snakes.iter().position(|snake| snake.id == id)
  }

  pub(crate) fn sanitize(&mut self) {
    for index in 0..self.snakes.len() {
      let repairs = inspect(&self.snakes[index]);
      if repairs.is_empty() {
        continue;
      }
      let fallback = if repairs.contains(&Repair::Reinitialize) {
        find_spawn_point(&mut self.rng, &self.snakes, self.radius)
      } else {
        (self.snakes[index].head().unwrap_or_default(), self.snakes[index].heading)
      };
      let snake = &mut self.snakes[index];
      tracing::warn!(snake_id = snake.id, ?repairs, "repairing snake state");
      for repair in repairs {
        apply_repair(snake, repair, fallback);
      }
    }
  }

  pub(crate) fn apply_input(&mut self, input: &PlayerInput) {
    let Some(player) = self.snakes.iter_mut().find(|snake| snake.is_player) else { return };
    if !player.alive {
      return;
    }
    player.boost_requested = input.boost;
    let Some(head) = player.head() else { return };
    if let Some(heading) = input.aim.and_then(|aim| aim_heading(aim, head)) {
      player.desired_heading = heading;
    }
  }

  pub(crate) fn update_bots(&mut self, dt: f64) {
    for index in 0..self.snakes.len() {
      let snake = &mut self.snakes[index];
      if snake.is_player || !snake.alive {
        continue;
      }
      if bot::tick_timers(&mut snake.ai, dt) {
        let view = BotView {
          snakes: &self.snakes,
          pellets: self.pellets.pellets(),
          body_grid: &self.body_grid,
          pellet_grid: &self.pellet_grid,
          world_radius: self.radius,
          difficulty: self.difficulty,
        };
        let ai = bot::think(&view, index, &mut self.rng);
        self.snakes[index].ai = ai;
      }
      bot::apply(&mut self.snakes[index]);
    }
  }

  pub(crate) fn move_snakes(&mut self, dt: f64) {
    for snake in self.snakes.iter_mut() {
      if let Some(spill) = kinetics::advance(snake, dt) {
        self.pellets.push(spill.position, PelletKind::Small, spill.value);
      }
    }
  }

  pub(crate) fn update_pellets(&mut self, dt: f64) {
    self.pellets.fill(&mut self.rng, dt);
    rebuild_pellet_grid(&mut self.pellet_grid, self.pellets.pellets());
    for meal in self.pellets.eat(&self.snakes, &self.pellet_grid, dt) {
      if let Some(snake) = self.snakes.get_mut(meal.snake) {
        feed(snake, meal.value);
      }
    }
  }

  pub(crate) fn rebuild_grids(&mut self) {
    rebuild_body_grid(&mut self.body_grid, &self.snakes);
    rebuild_pellet_grid(&mut self.pellet_grid, self.pellets.pellets());
  }

  pub(crate) fn resolve_collisions(&mut self) {
    let report = detect(
      &self.snakes,
      &self.body_grid,
      self.radius,
      self.duel.is_none(),
      &mut self.rng,
    );
    for (a, b) in report.bumps {
      apply_bump(&mut self.snakes, a, b);
    }
    for death in report.deaths {
      self.apply_death(death);
    }
    if let Some((player, opponent)) = report.duel {
      self.start_duel(player, opponent);
    }
  }

  fn start_duel(&mut self, player_index: usize, opponent_index: usize) {
    let player = self.snakes[player_index].id;
    let opponent = self.snakes[opponent_index].id;
    if self.duel.is_some() {
      tracing::warn!(player, opponent, "duel already active, request rejected");
      return;
    }
    self.duel = Some(Duel::new(player, opponent, &mut self.rng));
    self.events.push(WorldEvent::DuelRequested { player, opponent });
    tracing::debug!(player, opponent, "duel requested");
  }

  pub(crate) fn apply_death(&mut self, death: Death) {
    let Some(victim) = self.snakes.get(death.victim) else { return };
    if !victim.alive {
      return;
    }
    let spilled = self
      .pellets
      .spill_death(&mut self.rng, &victim.body, victim.mass);
    let killer = death.killer.and_then(|index| self.snakes.get_mut(index));
    let killer_id = killer.map(|killer| {
      killer.kills += 1;
      (killer.id, killer.is_player)
    });
    if let Some((_, true)) = killer_id {
      self.events.push(WorldEvent::LastKillTime {
        elapsed: self.elapsed,
      });
    }

    let victim = &mut self.snakes[death.victim];
    if victim.is_player {
      self.events.push(WorldEvent::PlayerDied {
        killer: killer_id.map(|(id, _)| id),
      });
    }
    let delay = if victim.is_player {
      PLAYER_RESPAWN_DELAY
    } else {
      BOT_RESPAWN_DELAY
    };
    tracing::debug!(
      snake_id = victim.id,
      is_player = victim.is_player,
      killer = ?killer_id.map(|(id, _)| id),
      spilled,
      "snake died"
    );
    kill(victim, delay);
  }

  pub(crate) fn update_lifecycle(&mut self, dt: f64) {
    for index in 0..self.snakes.len() {
      let snake = &mut self.snakes[index];
      if snake.alive {
        snake.invulnerable_timer = (snake.invulnerable_timer - dt).max(0.0);
        continue;
      }
      snake.respawn_timer -= dt;
      if snake.respawn_timer > 0.0 {
        continue;
      }
      let (head, heading) = find_spawn_point(&mut self.rng, &self.snakes, self.radius);
      let snake = &mut self.snakes[index];
      respawn(snake, head, heading);
      tracing::debug!(snake_id = snake.id, is_player = snake.is_player, "snake respawned");
    }
  }

  pub(crate) fn update_leaderboard(&mut self, dt: f64) {
    self.leaderboard_timer += dt;
    if self.leaderboard_timer >= LEADERBOARD_INTERVAL {
      self.leaderboard_timer = 0.0;
      self.refresh_leaderboard();
    }
  }

  fn refresh_leaderboard(&mut self) {
    let mut ranked: Vec<&Snake> = self.snakes.iter().filter(|snake| snake.alive).collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.id.cmp(&b.id)));
    self.leaderboard = ranked
      .into_iter()
      .take(self.config.leaderboard_size)
      .map(|snake| LeaderboardEntry {
        id: snake.id,
        name: snake.name.clone(),
        score: snake.score.round() as i64,
      })
      .collect();
  }
}
