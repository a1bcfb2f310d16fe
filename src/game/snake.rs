use super::constants::{
    ENERGY_MAX, MAX_LEN, MAX_SPAWN_ATTEMPTS, MIN_LEN, SEGMENT_SPACING, SPAWN_CLEARANCE,
    SPAWN_GRACE, SPAWN_RADIUS_FRACTION, START_LEN,
};
use super::kinetics::{desired_length_for_mass, radius_for_mass, set_mass, speed_for_mass};
use super::math::{add, angle_of, distance_sq, from_angle, random_in_disc, scale, wrap_angle};
use super::types::{AiState, Point, Snake, SnakeId};
use rand::Rng;

/// A specific fix for a snake whose state went bad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repair {
    ResetHeading,
    ResetSpeed,
    ResetRadius,
    ResetEnergy,
    ClampLength,
    /// Head missing or non-finite; rebuild the whole body at a fallback point.
    Reinitialize,
}

pub fn create_body(head: Point, heading: f64, length: usize) -> Vec<Point> {
    let back = scale(from_angle(heading), -SEGMENT_SPACING);
    (0..length.max(1))
        .map(|index| add(head, scale(back, index as f64)))
        .collect()
}

pub fn create_snake(
    id: SnakeId,
    name: String,
    color: String,
    is_player: bool,
    head: Point,
    heading: f64,
) -> Snake {
    let mass = START_LEN as f64;
    Snake {
        id,
        name,
        color,
        is_player,
        body: create_body(head, heading, START_LEN),
        heading,
        desired_heading: heading,
        angular_velocity: 0.0,
        speed: speed_for_mass(mass),
        target_speed: speed_for_mass(mass),
        radius: radius_for_mass(mass),
        mass,
        desired_length: desired_length_for_mass(mass),
        alive: true,
        respawn_timer: 0.0,
        invulnerable_timer: SPAWN_GRACE,
        boost_requested: false,
        boosting: false,
        energy: ENERGY_MAX,
        boost_drop_timer: 0.0,
        boost_drained: 0.0,
        score: 0.0,
        kills: 0,
        ai: AiState {
            aim: heading,
            ..AiState::default()
        },
    }
}

/// Marks the snake dead. The caller spills the body into pellets before this runs.
pub fn kill(snake: &mut Snake, respawn_delay: f64) {
    snake.alive = false;
    snake.respawn_timer = respawn_delay;
    snake.boosting = false;
    snake.boost_requested = false;
    snake.speed = 0.0;
    snake.body.clear();
    snake.ai = AiState::default();
}

pub fn respawn(snake: &mut Snake, head: Point, heading: f64) {
    let fresh = create_snake(
        snake.id,
        std::mem::take(&mut snake.name),
        std::mem::take(&mut snake.color),
        snake.is_player,
        head,
        heading,
    );
    *snake = fresh;
}

/// Looks for a head position at least `SPAWN_CLEARANCE` away from every live body point.
/// Falls back to the most open candidate seen.
pub fn find_spawn_point<R: Rng + ?Sized>(
    rng: &mut R,
    snakes: &[Snake],
    world_radius: f64,
) -> (Point, f64) {
    let spawn_radius = world_radius * SPAWN_RADIUS_FRACTION;
    let mut best: Option<(Point, f64)> = None;
    for _ in 0..MAX_SPAWN_ATTEMPTS {
        let candidate = random_in_disc(rng, spawn_radius);
        let clearance = nearest_body_distance_sq(snakes, candidate);
        if clearance >= SPAWN_CLEARANCE * SPAWN_CLEARANCE {
            best = Some((candidate, clearance));
            break;
        }
        match best {
            Some((_, seen)) if seen >= clearance => {}
            _ => best = Some((candidate, clearance)),
        }
    }
    let head = best.map(|(point, _)| point).unwrap_or(Point::ZERO);
    (head, spawn_heading(rng, head))
}

/// Roughly toward the centre so the straight spawn body trails outward.
fn spawn_heading<R: Rng + ?Sized>(rng: &mut R, head: Point) -> f64 {
    let jitter = rng.gen_range(-0.5..0.5);
    if head.x == 0.0 && head.y == 0.0 {
        return wrap_angle(jitter);
    }
    wrap_angle(angle_of(scale(head, -1.0)) + jitter)
}

fn nearest_body_distance_sq(snakes: &[Snake], point: Point) -> f64 {
    snakes
        .iter()
        .filter(|snake| snake.alive)
        .flat_map(|snake| snake.body.iter())
        .map(|node| distance_sq(*node, point))
        .fold(f64::INFINITY, f64::min)
}

pub fn inspect(snake: &Snake) -> Vec<Repair> {
    let mut repairs = Vec::new();
    if !snake.alive {
        return repairs;
    }
    let head_ok = snake.head().map(Point::is_finite).unwrap_or(false);
    if !head_ok || snake.body.iter().any(|point| !point.is_finite()) {
        repairs.push(Repair::Reinitialize);
        return repairs;
    }
    if !snake.heading.is_finite()
        || !snake.desired_heading.is_finite()
        || !snake.angular_velocity.is_finite()
    {
        repairs.push(Repair::ResetHeading);
    }
    if !snake.speed.is_finite()
        || snake.speed < 0.0
        || !snake.target_speed.is_finite()
        || snake.target_speed < 0.0
    {
        repairs.push(Repair::ResetSpeed);
    }
    if !snake.radius.is_finite() || snake.radius <= 0.0 {
        repairs.push(Repair::ResetRadius);
    }
    if !snake.energy.is_finite() || !snake.boost_drained.is_finite() {
        repairs.push(Repair::ResetEnergy);
    }
    let length_ok = snake.mass.is_finite()
        && snake.mass >= MIN_LEN as f64
        && snake.mass <= MAX_LEN as f64
        && (MIN_LEN..=MAX_LEN).contains(&snake.desired_length)
        && snake.desired_length == desired_length_for_mass(snake.mass)
        && snake.body.len() <= snake.desired_length;
    if !length_ok {
        repairs.push(Repair::ClampLength);
    }
    repairs
}

pub fn apply_repair(snake: &mut Snake, repair: Repair, fallback: (Point, f64)) {
    match repair {
        Repair::ResetHeading => {
            let heading = if snake.heading.is_finite() {
                wrap_angle(snake.heading)
            } else {
                0.0
            };
            snake.heading = heading;
            snake.desired_heading = heading;
            snake.angular_velocity = 0.0;
            snake.ai.aim = heading;
        }
        Repair::ResetSpeed => {
            snake.speed = speed_for_mass(snake.mass);
            snake.target_speed = snake.speed;
        }
        Repair::ResetRadius => {
            snake.radius = radius_for_mass(snake.mass);
        }
        Repair::ResetEnergy => {
            snake.energy = ENERGY_MAX;
            snake.boost_drained = 0.0;
        }
        Repair::ClampLength => {
            set_mass(snake, snake.mass);
        }
        Repair::Reinitialize => {
            let (head, heading) = fallback;
            set_mass(snake, snake.mass);
            snake.body = create_body(head, heading, snake.desired_length);
            snake.heading = heading;
            snake.desired_heading = heading;
            snake.angular_velocity = 0.0;
            snake.speed = speed_for_mass(snake.mass);
            snake.target_speed = snake.speed;
            snake.ai.aim = heading;
        }
    }
}

#[cfg(test)]
pub(crate) fn make_test_snake(id: SnakeId, head: Point, len: usize) -> Snake {
    let mut snake = create_snake(id, format!("Bot-{id}"), "#ffffff".to_string(), false, head, 0.0);
    snake.invulnerable_timer = 0.0;
    set_mass(&mut snake, len as f64);
    snake.body = create_body(head, 0.0, len);
    snake.speed = speed_for_mass(snake.mass);
    snake.target_speed = snake.speed;
    snake
}
