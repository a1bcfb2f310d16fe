use crate::game::world::WorldConfig;
use anyhow::{bail, Context};
use std::env;
use std::fs;
use std::path::Path;

const DEFAULT_TICK_HZ: u32 = 60;
const MAX_TICK_HZ: u32 = 480;
const DEFAULT_LEADERBOARD_LOG_SECS: f64 = 5.0;

#[derive(Debug, Clone, PartialEq)]
pub struct RunnerConfig {
    pub world: WorldConfig,
    pub tick_hz: u32,
    /// Stop after this much simulated time; `None` runs until interrupted.
    pub sim_seconds: Option<f64>,
    pub leaderboard_log_secs: f64,
}

impl RunnerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut world = match lookup("WORLD_CONFIG") {
            Some(path) => load_world_config(Path::new(path.trim()))?,
            None => WorldConfig::default(),
        };
        if let Some(bot_count) = parse_var::<usize>(&lookup, "BOT_COUNT")? {
            world.bot_count = bot_count;
        }
        if let Some(difficulty) = parse_var::<f64>(&lookup, "DIFFICULTY")? {
            world.difficulty = difficulty;
        }
        if let Some(seed) = parse_var::<u64>(&lookup, "SEED")? {
            world.seed = seed;
        }
        if let Some(name) = lookup("PLAYER_NAME") {
            world.player_name = name;
        }
        if let Some(color) = lookup("PLAYER_COLOR") {
            world.player_color = color;
        }

        Self {
            world: world.normalized(),
            tick_hz: parse_var::<u32>(&lookup, "TICK_HZ")?.unwrap_or(DEFAULT_TICK_HZ),
            sim_seconds: parse_var::<f64>(&lookup, "SIM_SECONDS")?,
            leaderboard_log_secs: parse_var::<f64>(&lookup, "LEADERBOARD_LOG_SECS")?
                .unwrap_or(DEFAULT_LEADERBOARD_LOG_SECS),
        }
        .validate()
    }

    pub fn step_dt(&self) -> f64 {
        1.0 / self.tick_hz as f64
    }

    fn validate(mut self) -> anyhow::Result<Self> {
        if self.tick_hz == 0 {
            bail!("TICK_HZ must be positive");
        }
        if self.tick_hz > MAX_TICK_HZ {
            tracing::warn!(tick_hz = self.tick_hz, "tick rate too high, clamping");
            self.tick_hz = MAX_TICK_HZ;
        }
        if let Some(seconds) = self.sim_seconds {
            if !seconds.is_finite() || seconds <= 0.0 {
                bail!("SIM_SECONDS must be a positive number");
            }
        }
        if !self.leaderboard_log_secs.is_finite() || self.leaderboard_log_secs <= 0.0 {
            tracing::warn!(
                leaderboard_log_secs = self.leaderboard_log_secs,
                "invalid leaderboard log interval, using default"
            );
            self.leaderboard_log_secs = DEFAULT_LEADERBOARD_LOG_SECS;
        }
        Ok(self)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let Some(raw) = lookup(key) else { return Ok(None) };
    let value = raw
        .trim()
        .parse::<T>()
        .with_context(|| format!("invalid {key}: {raw:?}"))?;
    Ok(Some(value))
}

pub fn load_world_config(path: &Path) -> anyhow::Result<WorldConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read world config {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse world config {}", path.display()))
}
