use super::constants::{
    ACCEL_RATE, BASE_RADIUS, BASE_SPEED, BOOST_DROP_INTERVAL, BOOST_DROP_RETURN,
    BOOST_MASS_DRAIN_PER_SEC, BOOST_MIN_ENERGY, BOOST_MIN_MASS_MARGIN, BOOST_MULTIPLIER,
    DECEL_RATE, ENERGY_DRAIN_PER_SEC, ENERGY_MAX, ENERGY_RECHARGE_PER_SEC, GROWTH_PER_TICK,
    MAX_LEN, MAX_RADIUS, MAX_TURN_RATE, MIN_LEN, MIN_TURN_RATE, RADIUS_GROWTH,
    RELAX_ITERATIONS, SEGMENT_SPACING, SHARP_TURN_ANGLE, SHARP_TURN_DAMPING,
    SPEED_MASS_FACTOR, TURN_MASS_FACTOR,
};
use super::math::{add, angle_diff, clamp, from_angle, length, rotate_toward, scale, sub};
use super::types::{Point, Snake};
use std::f64::consts::PI;

/// Mass lost to boosting, dropped behind the tail as a pellet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoostDrop {
    pub position: Point,
    pub value: f64,
}

pub fn clamp_mass(mass: f64) -> f64 {
    if !mass.is_finite() {
        return MIN_LEN as f64;
    }
    clamp(mass, MIN_LEN as f64, MAX_LEN as f64)
}

pub fn desired_length_for_mass(mass: f64) -> usize {
    (clamp_mass(mass).floor() as usize).clamp(MIN_LEN, MAX_LEN)
}

pub fn radius_for_mass(mass: f64) -> f64 {
    let extra = (clamp_mass(mass) - MIN_LEN as f64).max(0.0);
    (BASE_RADIUS + RADIUS_GROWTH * extra.sqrt()).min(MAX_RADIUS)
}

pub fn speed_for_mass(mass: f64) -> f64 {
    let ratio = clamp_mass(mass) / MIN_LEN as f64;
    BASE_SPEED / (1.0 + SPEED_MASS_FACTOR * ratio.ln())
}

pub fn turn_rate_for_mass(mass: f64) -> f64 {
    let extra = (clamp_mass(mass) - MIN_LEN as f64).max(0.0);
    (MAX_TURN_RATE / (1.0 + TURN_MASS_FACTOR * extra)).max(MIN_TURN_RATE)
}

/// Sets mass and everything derived from it. Over-long bodies are truncated right away.
pub fn set_mass(snake: &mut Snake, mass: f64) {
    snake.mass = clamp_mass(mass);
    snake.desired_length = desired_length_for_mass(snake.mass);
    snake.radius = radius_for_mass(snake.mass);
    if snake.body.len() > snake.desired_length {
        snake.body.truncate(snake.desired_length);
    }
}

pub fn feed(snake: &mut Snake, value: f64) {
    if !value.is_finite() || value <= 0.0 {
        return;
    }
    snake.score += value;
    set_mass(snake, snake.mass + value);
}

fn can_boost(snake: &Snake) -> bool {
    if !snake.boost_requested || snake.mass <= MIN_LEN as f64 + BOOST_MIN_MASS_MARGIN {
        return false;
    }
    snake.energy >= BOOST_MIN_ENERGY || (snake.boosting && snake.energy > 0.0)
}

fn update_boost(snake: &mut Snake, dt: f64) -> Option<BoostDrop> {
    snake.boosting = can_boost(snake);
    if snake.boosting {
        snake.energy = (snake.energy - ENERGY_DRAIN_PER_SEC * dt).max(0.0);
        let before = snake.mass;
        set_mass(snake, snake.mass - BOOST_MASS_DRAIN_PER_SEC * dt);
        snake.boost_drained += before - snake.mass;
        snake.boost_drop_timer -= dt;
    } else {
        if !snake.boost_requested {
            snake.energy = (snake.energy + ENERGY_RECHARGE_PER_SEC * dt).min(ENERGY_MAX);
        }
        snake.boost_drop_timer = snake.boost_drop_timer.max(0.0);
    }

    if snake.boost_drop_timer > 0.0 || snake.boost_drained <= 0.0 {
        return None;
    }
    snake.boost_drop_timer = BOOST_DROP_INTERVAL;
    let value = snake.boost_drained * BOOST_DROP_RETURN;
    snake.boost_drained = 0.0;
    let position = *snake.body.last()?;
    Some(BoostDrop { position, value })
}

fn steer(snake: &mut Snake, dt: f64) {
    let previous = snake.heading;
    snake.heading = rotate_toward(
        snake.heading,
        snake.desired_heading,
        turn_rate_for_mass(snake.mass) * dt,
    );
    snake.angular_velocity = angle_diff(previous, snake.heading) / dt;
}

fn update_speed(snake: &mut Snake, dt: f64) {
    let boost = if snake.boosting { BOOST_MULTIPLIER } else { 1.0 };
    snake.target_speed = speed_for_mass(snake.mass) * boost;
    if snake.speed < snake.target_speed {
        snake.speed = (snake.speed + ACCEL_RATE * dt).min(snake.target_speed);
    } else {
        snake.speed = (snake.speed - DECEL_RATE * dt).max(snake.target_speed);
    }

    let remaining = angle_diff(snake.heading, snake.desired_heading).abs();
    if remaining > SHARP_TURN_ANGLE {
        let severity = clamp((remaining - SHARP_TURN_ANGLE) / (PI - SHARP_TURN_ANGLE), 0.0, 1.0);
        let damping = clamp(SHARP_TURN_DAMPING * severity * dt, 0.0, 1.0);
        snake.speed -= snake.speed * damping;
    }
    snake.speed = snake.speed.max(0.0);
}

/// Follow-the-leader relaxation. Each point is pulled back to `spacing` from its
/// predecessor; points already closer are left alone, as are zero-length links.
pub fn relax_body(body: &mut [Point], spacing: f64, pin_tail: bool) {
    let Some(last) = body.len().checked_sub(1) else { return };
    for _ in 0..RELAX_ITERATIONS {
        for i in 1..body.len() {
            if pin_tail && i == last {
                continue;
            }
            let delta = sub(body[i], body[i - 1]);
            let dist = length(delta);
            if dist <= spacing || dist <= f64::EPSILON {
                continue;
            }
            body[i] = add(body[i - 1], scale(delta, spacing / dist));
        }
    }
}

/// Adds at most `GROWTH_PER_TICK` points, each only once the gap in front of the pinned
/// tail has opened beyond `spacing`.
pub fn grow_tail(body: &mut Vec<Point>, desired_length: usize, spacing: f64) {
    if body.is_empty() {
        return;
    }
    if body.len() == 1 && desired_length > 1 {
        body.push(body[0]);
        return;
    }
    for _ in 0..GROWTH_PER_TICK {
        if body.len() >= desired_length {
            return;
        }
        let last = body.len() - 1;
        let anchor = body[last - 1];
        let delta = sub(body[last], anchor);
        let gap = length(delta);
        if gap <= spacing {
            return;
        }
        let inserted = add(anchor, scale(delta, spacing / gap));
        body.insert(last, inserted);
    }
}

/// One kinetics tick: boost, steering, speed, head integration, body relaxation, growth.
pub fn advance(snake: &mut Snake, dt: f64) -> Option<BoostDrop> {
    if !snake.alive || snake.body.is_empty() || !dt.is_finite() || dt <= 0.0 {
        return None;
    }
    let spill = update_boost(snake, dt);
    snake.radius = radius_for_mass(snake.mass);
    steer(snake, dt);
    update_speed(snake, dt);

    let step = scale(from_angle(snake.heading), snake.speed * dt);
    snake.body[0] = add(snake.body[0], step);

    if snake.body.len() > snake.desired_length {
        snake.body.truncate(snake.desired_length);
    }
    let growing = snake.body.len() < snake.desired_length;
    relax_body(&mut snake.body, SEGMENT_SPACING, growing);
    if growing {
        grow_tail(&mut snake.body, snake.desired_length, SEGMENT_SPACING);
    }
    spill
}
