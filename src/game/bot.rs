//! Heuristic steering for non-player snakes.
//!
//! A bot thinks at most once per reaction delay. A think sums attraction and repulsion
//! vectors (pellet, victim, threats, wall, wander, remembered evasion) and aims along the
//! result. Between thinks the previous aim and boost request persist.

use super::grid::{segment_points, BodyGrid, PelletGrid, SegmentRef};
use super::math::{
    add, angle_diff, angle_of, clamp, distance, from_angle, length, normalize, scale, sub,
};
use super::types::{AiState, BotMode, Pellet, Point, Snake};
use rand::Rng;

const REACTION_BASE: f64 = 0.35;
const PERCEPTION_BASE: f64 = 260.0;
const THREAT_LOOKAHEAD: f64 = 0.4;
const HEAD_THREAT_WEIGHT: f64 = 60.0;
const BODY_THREAT_WEIGHT: f64 = 40.0;
const BODY_AVOID_RANGE: f64 = 70.0;
const PELLET_THREAT_PENALTY: f64 = 0.6;
const PELLET_AHEAD_BONUS: f64 = 0.8;
const PELLET_DISTANCE_BIAS: f64 = 20.0;
const PELLET_JITTER: f64 = 0.25;
const PELLET_PULL: f64 = 1.0;
const VICTIM_PULL: f64 = 1.4;
const VICTIM_MASS_RATIO: f64 = 0.9;
const ISOLATION_RADIUS: f64 = 150.0;
const MIN_CLOSING_SPEED: f64 = 40.0;
const MAX_LEAD_SECS: f64 = 1.5;
const WALL_MARGIN: f64 = 0.85;
const WALL_PULL: f64 = 3.0;
const WANDER_INTERVAL: f64 = 1.5;
const WANDER_JITTER: f64 = 1.2;
const WANDER_PULL: f64 = 0.3;
const ESCAPE_THRESHOLD: f64 = 1.2;
const EVASION_MEMORY: f64 = 0.6;
const EVASION_PULL: f64 = 1.0;
const MIN_BOOST_ENERGY: f64 = 0.3;

/// Read-only view of the world a bot perceives.
pub struct BotView<'a> {
    pub snakes: &'a [Snake],
    pub pellets: &'a [Pellet],
    pub body_grid: &'a BodyGrid,
    pub pellet_grid: &'a PelletGrid,
    pub world_radius: f64,
    pub difficulty: f64,
}

pub fn reaction_delay(difficulty: f64) -> f64 {
    REACTION_BASE * (1.3 - 0.8 * clamp(difficulty, 0.0, 1.0))
}

pub fn perception_range(difficulty: f64, radius: f64) -> f64 {
    PERCEPTION_BASE * (0.7 + 0.6 * clamp(difficulty, 0.0, 1.0)) + 4.0 * radius
}

pub fn aggression(difficulty: f64) -> f64 {
    0.15 + 0.5 * clamp(difficulty, 0.0, 1.0)
}

/// Counts down the AI timers. Returns true when the bot is due to think again.
pub fn tick_timers(ai: &mut AiState, dt: f64) -> bool {
    ai.reaction_timer -= dt;
    ai.wander_timer -= dt;
    ai.evasion_timer = (ai.evasion_timer - dt).max(0.0);
    ai.reaction_timer <= 0.0
}

pub fn apply(snake: &mut Snake) {
    snake.desired_heading = snake.ai.aim;
    snake.boost_requested = snake.ai.boost;
}

#[derive(Debug, Clone, Copy)]
struct Threat {
    point: Point,
    weight: f64,
}

fn predicted_head(snake: &Snake) -> Option<Point> {
    let head = snake.head()?;
    let heading = snake.heading + snake.angular_velocity * THREAT_LOOKAHEAD;
    Some(add(head, scale(from_angle(heading), snake.speed * THREAT_LOOKAHEAD)))
}

fn nearby_heads(view: &BotView, index: usize, head: Point, range: f64) -> Vec<Threat> {
    let me = &view.snakes[index];
    view.snakes
        .iter()
        .enumerate()
        .filter(|(other, snake)| *other != index && snake.is_collidable())
        .filter_map(|(_, snake)| {
            let point = predicted_head(snake)?;
            if distance(point, head) > range {
                return None;
            }
            let size = clamp(snake.mass / me.mass.max(1.0), 0.5, 2.0);
            Some(Threat { point, weight: size })
        })
        .collect()
}

fn threat_at(threats: &[Threat], point: Point) -> f64 {
    threats
        .iter()
        .map(|threat| threat.weight / distance(threat.point, point).max(10.0))
        .sum()
}

fn threat_vector(view: &BotView, index: usize, head: Point, heads: &[Threat]) -> Point {
    let me = &view.snakes[index];
    let mut total = Point::ZERO;
    for threat in heads {
        let away = normalize(sub(head, threat.point));
        let d = distance(head, threat.point).max(1.0);
        total = add(total, scale(away, HEAD_THREAT_WEIGHT * threat.weight / d));
    }

    let mut segments: Vec<SegmentRef> = Vec::new();
    view.body_grid
        .query_radius_unique(head, BODY_AVOID_RANGE + me.radius, &mut segments);
    for segment in segments.iter().filter(|segment| segment.snake != index) {
        let Some(owner) = view.snakes.get(segment.snake) else { continue };
        let Some((a, b)) = segment_points(owner, segment.segment) else { continue };
        let closest = closest_on_segment(head, a, b);
        let offset = sub(head, closest);
        let gap = (length(offset) - me.radius - owner.radius).max(1.0);
        let toward = angle_of(scale(offset, -1.0));
        let ahead = angle_diff(me.heading, toward).cos().max(0.0);
        let weight = BODY_THREAT_WEIGHT / gap * (0.5 + 0.5 * ahead);
        total = add(total, scale(normalize(offset), weight));
    }
    total
}

fn closest_on_segment(point: Point, a: Point, b: Point) -> Point {
    let ab = sub(b, a);
    let len_sq = ab.x * ab.x + ab.y * ab.y;
    if len_sq <= f64::EPSILON {
        return a;
    }
    let t = clamp(((point.x - a.x) * ab.x + (point.y - a.y) * ab.y) / len_sq, 0.0, 1.0);
    add(a, scale(ab, t))
}

fn pellet_vector<R: Rng + ?Sized>(
    view: &BotView,
    me: &Snake,
    head: Point,
    range: f64,
    heads: &[Threat],
    rng: &mut R,
) -> Point {
    let mut candidates = Vec::new();
    view.pellet_grid.query_radius_unique(head, range, &mut candidates);
    let mut best: Option<(Point, f64)> = None;
    for pellet in candidates.iter().filter_map(|index| view.pellets.get(*index as usize)) {
        let d = distance(head, pellet.position);
        if d > range {
            continue;
        }
        let base = pellet.value / (d + PELLET_DISTANCE_BIAS);
        let toward = angle_of(sub(pellet.position, head));
        let ahead = angle_diff(me.heading, toward).cos().max(0.0);
        let score = base * (1.0 + PELLET_AHEAD_BONUS * ahead)
            - PELLET_THREAT_PENALTY * threat_at(heads, pellet.position)
            + base * PELLET_JITTER * rng.gen::<f64>();
        match best {
            Some((_, top)) if top >= score => {}
            _ => best = Some((pellet.position, score)),
        }
    }
    best.map(|(point, _)| scale(normalize(sub(point, head)), PELLET_PULL))
        .unwrap_or(Point::ZERO)
}

fn is_isolated(view: &BotView, hunter: usize, victim: usize) -> bool {
    let Some(victim_head) = view.snakes[victim].head() else { return false };
    !view.snakes.iter().enumerate().any(|(index, snake)| {
        index != hunter
            && index != victim
            && snake.alive
            && snake
                .head()
                .map(|head| distance(head, victim_head) < ISOLATION_RADIUS)
                .unwrap_or(false)
    })
}

fn pick_victim(view: &BotView, index: usize, head: Point, range: f64, current: Option<u32>) -> Option<usize> {
    let me = &view.snakes[index];
    let eligible = |other: usize, snake: &Snake| {
        other != index
            && snake.is_collidable()
            && snake.mass < me.mass * VICTIM_MASS_RATIO
            && snake
                .head()
                .map(|victim_head| distance(victim_head, head) <= range)
                .unwrap_or(false)
            && is_isolated(view, index, other)
    };
    if let Some(id) = current {
        if let Some((other, _)) = view
            .snakes
            .iter()
            .enumerate()
            .find(|(other, snake)| snake.id == id && eligible(*other, *snake))
        {
            return Some(other);
        }
    }
    view.snakes
        .iter()
        .enumerate()
        .filter(|(other, snake)| eligible(*other, *snake))
        .min_by(|(_, a), (_, b)| {
            let da = a.head().map(|p| distance(p, head)).unwrap_or(f64::INFINITY);
            let db = b.head().map(|p| distance(p, head)).unwrap_or(f64::INFINITY);
            da.total_cmp(&db)
        })
        .map(|(other, _)| other)
}

/// Lead point for cutting off `victim`: where it will be after the closing time.
pub fn intercept_point(hunter: &Snake, victim: &Snake) -> Option<Point> {
    let head = hunter.head()?;
    let target = victim.head()?;
    let d = distance(head, target);
    let line = angle_of(sub(head, target));
    let victim_toward = victim.speed * angle_diff(victim.heading, line).cos();
    let closing = (hunter.speed + victim_toward).max(MIN_CLOSING_SPEED);
    let t = clamp(d / closing, 0.0, MAX_LEAD_SECS);
    Some(add(target, scale(from_angle(victim.heading), victim.speed * t)))
}

fn wall_vector(head: Point, world_radius: f64) -> Point {
    let limit = world_radius * WALL_MARGIN;
    let dist = length(head);
    if dist <= limit || world_radius <= limit {
        return Point::ZERO;
    }
    let urgency = clamp((dist - limit) / (world_radius - limit), 0.0, 1.5);
    scale(normalize(scale(head, -1.0)), WALL_PULL * urgency)
}

/// A full think for the bot at `index`. Returns its next AI state.
pub fn think<R: Rng + ?Sized>(view: &BotView, index: usize, rng: &mut R) -> AiState {
    let me = &view.snakes[index];
    let mut ai = me.ai.clone();
    let Some(head) = me.head() else { return ai };
    let difficulty = clamp(view.difficulty, 0.0, 1.0);
    ai.reaction_timer = reaction_delay(difficulty) * rng.gen_range(0.75..1.25);
    let range = perception_range(difficulty, me.radius);

    let heads = nearby_heads(view, index, head, range);
    let threat = threat_vector(view, index, head, &heads);
    if length(threat) > ESCAPE_THRESHOLD {
        ai.evasion_heading = angle_of(threat);
        ai.evasion_timer = EVASION_MEMORY;
    }

    let pellet = pellet_vector(view, me, head, range, &heads, rng);

    let keep_hunting = ai.victim.is_some();
    let victim = if keep_hunting || rng.gen_bool(aggression(difficulty)) {
        pick_victim(view, index, head, range, ai.victim)
    } else {
        None
    };
    ai.victim = victim.map(|other| view.snakes[other].id);
    let chase = victim
        .and_then(|other| intercept_point(me, &view.snakes[other]))
        .map(|lead| scale(normalize(sub(lead, head)), VICTIM_PULL))
        .unwrap_or(Point::ZERO);

    if ai.wander_timer <= 0.0 {
        ai.wander_angle = me.heading + rng.gen_range(-1.0..1.0) * WANDER_JITTER;
        ai.wander_timer = WANDER_INTERVAL * rng.gen_range(0.7..1.3);
    }
    let wander = scale(from_angle(ai.wander_angle), WANDER_PULL);

    let evasion = if ai.evasion_timer > 0.0 {
        scale(
            from_angle(ai.evasion_heading),
            EVASION_PULL * ai.evasion_timer / EVASION_MEMORY,
        )
    } else {
        Point::ZERO
    };

    let wall = wall_vector(head, view.world_radius);
    let sum = [pellet, chase, threat, wall, wander, evasion]
        .into_iter()
        .fold(Point::ZERO, add);
    ai.aim = if length(sum) > 1e-6 {
        angle_of(sum)
    } else {
        me.heading
    };

    ai.mode = if ai.evasion_timer > 0.0 {
        BotMode::Escaping
    } else if ai.victim.is_some() {
        BotMode::Chasing
    } else {
        BotMode::Idle
    };
    let boost_chance = match ai.mode {
        BotMode::Escaping => 0.55,
        BotMode::Chasing => 0.4,
        BotMode::Idle => 0.03,
    } * (0.5 + difficulty);
    ai.boost = me.energy > MIN_BOOST_ENERGY && rng.gen_bool(clamp(boost_chance, 0.0, 1.0));
    ai
}
