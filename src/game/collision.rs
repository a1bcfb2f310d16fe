use super::constants::{
    POWER_JITTER, POWER_KILL_WEIGHT, POWER_SCORE_WEIGHT, SIGNIFICANT_RATIO,
};
use super::grid::{segment_points, BodyGrid, SegmentRef};
use super::math::{
    add, distance_sq, from_angle, length_sq, normalize, point_segment_distance_sq, scale, sub,
};
use super::types::{Point, Snake};
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Death {
    pub victim: usize,
    pub killer: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionReport {
    pub deaths: Vec<Death>,
    pub bumps: Vec<(usize, usize)>,
    /// `(player, opponent)` snake indices.
    pub duel: Option<(usize, usize)>,
}

pub fn size_ratio(a: f64, b: f64) -> f64 {
    let small = a.min(b).max(f64::EPSILON);
    a.max(b) / small
}

pub fn power<R: Rng + ?Sized>(snake: &Snake, rng: &mut R) -> f64 {
    snake.mass
        + POWER_SCORE_WEIGHT * snake.score
        + POWER_KILL_WEIGHT * snake.kills as f64
        + rng.gen_range(-POWER_JITTER..=POWER_JITTER)
}

/// Runs wall, head-vs-head and head-vs-body checks against the current snapshot.
///
/// A significant head clash involving the player queues a duel (when `duel_slot_free`)
/// and stops resolution for the rest of the tick.
pub fn detect<R: Rng + ?Sized>(
    snakes: &[Snake],
    grid: &BodyGrid,
    world_radius: f64,
    duel_slot_free: bool,
    rng: &mut R,
) -> CollisionReport {
    let mut report = CollisionReport::default();
    let mut dead = vec![false; snakes.len()];

    for (index, snake) in snakes.iter().enumerate() {
        if !snake.alive {
            continue;
        }
        let Some(head) = snake.head() else { continue };
        if length_sq(head) > world_radius * world_radius {
            dead[index] = true;
            report.deaths.push(Death {
                victim: index,
                killer: None,
            });
        }
    }

    for i in 0..snakes.len() {
        for j in (i + 1)..snakes.len() {
            let (a, b) = (&snakes[i], &snakes[j]);
            if dead[i] || dead[j] || !a.is_collidable() || !b.is_collidable() {
                continue;
            }
            let (Some(head_a), Some(head_b)) = (a.head(), b.head()) else { continue };
            let reach = a.radius + b.radius;
            if distance_sq(head_a, head_b) >= reach * reach {
                continue;
            }

            if size_ratio(a.mass, b.mass) < SIGNIFICANT_RATIO {
                report.bumps.push((i, j));
                continue;
            }

            if a.is_player || b.is_player {
                if duel_slot_free && report.duel.is_none() {
                    let pair = if a.is_player { (i, j) } else { (j, i) };
                    report.duel = Some(pair);
                    return report;
                }
                tracing::warn!(a = a.id, b = b.id, "duel slot occupied, request rejected");
                report.bumps.push((i, j));
                continue;
            }

            let (victim, killer) = if power(a, rng) >= power(b, rng) {
                (j, i)
            } else {
                (i, j)
            };
            dead[victim] = true;
            report.deaths.push(Death {
                victim,
                killer: Some(killer),
            });
        }
    }

    for (victim, killer) in head_body_hits(snakes, grid, &dead, &report.bumps) {
        report.deaths.push(Death {
            victim,
            killer: Some(killer),
        });
    }
    report
}

#[derive(Debug, Clone, Copy)]
struct HeadProbe {
    point: Point,
    radius: f64,
}

fn exempt(pairs: &[(usize, usize)], a: usize, b: usize) -> bool {
    pairs
        .iter()
        .any(|&(x, y)| (x == a && y == b) || (x == b && y == a))
}

fn segment_hits(head: HeadProbe, owner: &Snake, segment: usize) -> bool {
    let Some((a, b)) = segment_points(owner, segment) else { return false };
    if length_sq(sub(b, a)) <= f64::EPSILON {
        return false;
    }
    let reach = head.radius + owner.radius;
    point_segment_distance_sq(head.point, a, b) < reach * reach
}

/// Head-vs-body via the grid. Returns `(victim, killer)`; among several hits the lowest
/// `(snake, segment)` is the killer. Every segment of another snake counts, including the
/// one behind its head; overlapping heads were already settled by the head-vs-head pass. Snakes flagged in `skip` neither die nor kill, and
/// `bumped` pairs cannot kill each other this tick.
pub fn head_body_hits(
    snakes: &[Snake],
    grid: &BodyGrid,
    skip: &[bool],
    bumped: &[(usize, usize)],
) -> Vec<(usize, usize)> {
    let mut hits = Vec::new();
    let mut candidates: Vec<SegmentRef> = Vec::new();
    for (index, snake) in snakes.iter().enumerate() {
        if skip.get(index).copied().unwrap_or(false) || !snake.is_collidable() {
            continue;
        }
        let Some(point) = snake.head() else { continue };
        let head = HeadProbe {
            point,
            radius: snake.radius,
        };
        grid.query_radius_unique(point, snake.radius, &mut candidates);
        let killer = candidates
            .iter()
            .filter(|candidate| {
                candidate.snake != index
                    && !skip.get(candidate.snake).copied().unwrap_or(false)
                    && !exempt(bumped, index, candidate.snake)
            })
            .find(|candidate| {
                snakes
                    .get(candidate.snake)
                    .map(|owner| segment_hits(head, owner, candidate.segment))
                    .unwrap_or(false)
            });
        if let Some(candidate) = killer {
            hits.push((index, candidate.snake));
        }
    }
    hits
}

/// Exhaustive reference for `head_body_hits`.
pub fn head_body_hits_brute_force(
    snakes: &[Snake],
    skip: &[bool],
    bumped: &[(usize, usize)],
) -> Vec<(usize, usize)> {
    let mut hits = Vec::new();
    for (index, snake) in snakes.iter().enumerate() {
        if skip.get(index).copied().unwrap_or(false) || !snake.is_collidable() {
            continue;
        }
        let Some(point) = snake.head() else { continue };
        let head = HeadProbe {
            point,
            radius: snake.radius,
        };
        'owners: for (owner_index, owner) in snakes.iter().enumerate() {
            if owner_index == index
                || !owner.is_collidable()
                || skip.get(owner_index).copied().unwrap_or(false)
                || exempt(bumped, index, owner_index)
            {
                continue;
            }
            for segment in 0..owner.body.len().saturating_sub(1) {
                if segment_hits(head, owner, segment) {
                    hits.push((index, owner_index));
                    break 'owners;
                }
            }
        }
    }
    hits
}

/// Pushes two overlapping heads apart along the line between them.
pub fn apply_bump(snakes: &mut [Snake], a: usize, b: usize) {
    let (Some(head_a), Some(head_b)) = (
        snakes.get(a).and_then(Snake::head),
        snakes.get(b).and_then(Snake::head),
    ) else {
        return;
    };
    let reach = snakes[a].radius + snakes[b].radius;
    let mut dir = normalize(sub(head_b, head_a));
    if length_sq(dir) == 0.0 {
        dir = from_angle(snakes[a].heading + std::f64::consts::FRAC_PI_2);
    }
    let overlap = (reach - distance_sq(head_a, head_b).sqrt()).max(0.0);
    let push = scale(dir, overlap / 2.0);
    snakes[a].body[0] = sub(head_a, push);
    snakes[b].body[0] = add(head_b, push);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::grid::rebuild_body_grid;
    use crate::game::kinetics::set_mass;
    use crate::game::snake::{create_body, make_test_snake};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn grid_for(snakes: &[Snake]) -> BodyGrid {
        let mut grid = BodyGrid::new(48.0, 1000.0);
        rebuild_body_grid(&mut grid, snakes);
        grid
    }

    #[test]
    fn size_ratio_is_symmetric() {
        assert!((size_ratio(50.0, 60.0) - 1.2).abs() < 1e-12);
        assert!((size_ratio(60.0, 50.0) - 1.2).abs() < 1e-12);
    }

    #[test]
    fn head_into_body_kills_and_credits_owner() {
        let wall = make_test_snake(1, Point::new(0.0, 0.0), 40);
        let mut rammer = make_test_snake(2, Point::new(-60.0, 0.0), 40);
        rammer.body = create_body(Point::new(-60.0, 4.0), std::f64::consts::FRAC_PI_2, 40);
        let snakes = vec![wall, rammer];
        let grid = grid_for(&snakes);
        let hits = head_body_hits(&snakes, &grid, &[false, false], &[]);
        assert_eq!(hits, vec![(1, 0)]);
        assert_eq!(hits, head_body_hits_brute_force(&snakes, &[false, false], &[]));
    }

    #[test]
    fn segment_behind_the_head_kills() {
        let owner = make_test_snake(1, Point::new(0.0, 0.0), 40);
        let mut visitor = make_test_snake(2, Point::new(-3.0, 0.0), 40);
        let reach = owner.radius + visitor.radius;
        // touches the first segment's midpoint but neither of its end points
        let offset = (reach * reach - 4.5).sqrt();
        visitor.body = create_body(Point::new(-3.0, offset), -std::f64::consts::FRAC_PI_2, 40);
        let snakes = vec![owner, visitor];
        assert!(distance_sq(snakes[0].body[0], snakes[1].body[0]) >= reach * reach);
        assert!(distance_sq(snakes[0].body[1], snakes[1].body[0]) >= reach * reach);

        let grid = grid_for(&snakes);
        let hits = head_body_hits(&snakes, &grid, &[false, false], &[]);
        assert_eq!(hits, vec![(1, 0)]);
        assert_eq!(hits, head_body_hits_brute_force(&snakes, &[false, false], &[]));

        let mut rng = StdRng::seed_from_u64(3);
        let report = detect(&snakes, &grid, 1000.0, true, &mut rng);
        assert!(report.bumps.is_empty());
        assert_eq!(
            report.deaths,
            vec![Death {
                victim: 1,
                killer: Some(0)
            }]
        );
    }

    #[test]
    fn own_body_never_kills() {
        let mut snake = make_test_snake(1, Point::new(0.0, 0.0), 40);
        let mut curled = snake.body.clone();
        curled[0] = curled[20];
        snake.body = curled;
        let snakes = vec![snake];
        let grid = grid_for(&snakes);
        assert!(head_body_hits(&snakes, &grid, &[false], &[]).is_empty());
    }

    #[test]
    fn zero_length_segments_are_skipped() {
        let mut owner = make_test_snake(1, Point::new(0.0, 0.0), 12);
        owner.body = vec![Point::new(0.0, 0.0); 12];
        let visitor = make_test_snake(2, Point::new(0.0, 1.0), 12);
        let snakes = vec![owner, visitor];
        let grid = grid_for(&snakes);
        assert!(head_body_hits(&snakes, &grid, &[false, false], &[])
            .iter()
            .all(|(victim, _)| *victim != 1));
    }

    #[test]
    fn bot_head_clash_kills_exactly_one() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut big = make_test_snake(1, Point::new(0.0, 0.0), 60);
        let mut small = make_test_snake(2, Point::new(5.0, 0.0), 50);
        set_mass(&mut big, 60.0);
        set_mass(&mut small, 50.0);
        small.body = create_body(Point::new(5.0, 0.0), std::f64::consts::PI, 50);
        let snakes = vec![big, small];
        let grid = grid_for(&snakes);
        let report = detect(&snakes, &grid, 1000.0, true, &mut rng);
        assert_eq!(
            report.deaths,
            vec![Death {
                victim: 1,
                killer: Some(0)
            }]
        );
    }

    #[test]
    fn player_clash_queues_duel_and_stops() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut player = make_test_snake(1, Point::new(0.0, 0.0), 60);
        player.is_player = true;
        let mut bot = make_test_snake(2, Point::new(5.0, 0.0), 40);
        bot.body = create_body(Point::new(5.0, 0.0), std::f64::consts::PI, 40);
        let snakes = vec![bot, player];
        let grid = grid_for(&snakes);
        let report = detect(&snakes, &grid, 1000.0, true, &mut rng);
        assert_eq!(report.duel, Some((1, 0)));
        assert!(report.deaths.is_empty());

        let busy = detect(&snakes, &grid, 1000.0, false, &mut rng);
        assert_eq!(busy.duel, None);
        assert_eq!(busy.bumps, vec![(0, 1)]);
    }

    #[test]
    fn bump_separates_heads() {
        let a = make_test_snake(1, Point::new(0.0, 0.0), 40);
        let b = make_test_snake(2, Point::new(4.0, 0.0), 40);
        let mut snakes = vec![a, b];
        apply_bump(&mut snakes, 0, 1);
        let gap = distance_sq(snakes[0].body[0], snakes[1].body[0]).sqrt();
        assert!((gap - (snakes[0].radius + snakes[1].radius)).abs() < 1e-9);
    }
}
