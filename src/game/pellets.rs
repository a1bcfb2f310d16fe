use super::constants::{
    DEATH_MASS_RETURN, DEATH_PELLET_RADIUS, DEATH_SPILL_JITTER, MAGNET_PULL, MAGNET_RANGE,
    MAX_SPILL, MIN_SPILL, PELLET_SPAWN_RADIUS_FRACTION, PELLET_SPAWN_RATE,
};
use super::grid::PelletGrid;
use super::math::{add, distance, random_in_disc, scale, sub};
use super::types::{Pellet, PelletId, PelletKind, Point, Snake};
use rand::Rng;

const SPAWN_TABLE: [PelletKind; 4] = [
    PelletKind::Small,
    PelletKind::Medium,
    PelletKind::Large,
    PelletKind::Gold,
];

const MAX_PELLET_RADIUS: f64 = 8.0;

impl PelletKind {
    pub fn spawn_weight(self) -> u32 {
        match self {
            PelletKind::Small => 70,
            PelletKind::Medium => 20,
            PelletKind::Large => 8,
            PelletKind::Gold => 2,
            PelletKind::Death => 0,
        }
    }

    pub fn base_value(self) -> f64 {
        match self {
            PelletKind::Small => 1.0,
            PelletKind::Medium => 2.0,
            PelletKind::Large => 4.0,
            PelletKind::Gold => 10.0,
            PelletKind::Death => 1.0,
        }
    }

    pub fn radius(self) -> f64 {
        match self {
            PelletKind::Small => 3.0,
            PelletKind::Medium => 4.5,
            PelletKind::Large => 6.0,
            PelletKind::Gold => MAX_PELLET_RADIUS,
            PelletKind::Death => DEATH_PELLET_RADIUS,
        }
    }

    pub fn pick<R: Rng + ?Sized>(rng: &mut R) -> PelletKind {
        let total: u32 = SPAWN_TABLE.iter().map(|kind| kind.spawn_weight()).sum();
        let mut roll = rng.gen_range(0..total);
        for kind in SPAWN_TABLE {
            let weight = kind.spawn_weight();
            if roll < weight {
                return kind;
            }
            roll -= weight;
        }
        PelletKind::Small
    }
}

/// A pellet claimed by a snake during `PelletField::eat`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Meal {
    pub snake: usize,
    pub value: f64,
}

#[derive(Debug, Clone)]
pub struct PelletField {
    pellets: Vec<Pellet>,
    next_id: PelletId,
    spawn_accumulator: f64,
    max_pellets: usize,
    spawn_radius: f64,
}

impl PelletField {
    pub fn new(max_pellets: usize, world_radius: f64) -> Self {
        Self {
            pellets: Vec::with_capacity(max_pellets),
            next_id: 0,
            spawn_accumulator: 0.0,
            max_pellets,
            spawn_radius: world_radius * PELLET_SPAWN_RADIUS_FRACTION,
        }
    }

    pub fn pellets(&self) -> &[Pellet] {
        &self.pellets
    }

    pub fn len(&self) -> usize {
        self.pellets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pellets.is_empty()
    }

    pub fn max_pellets(&self) -> usize {
        self.max_pellets
    }

    /// Hard population cap; death spills may overshoot `max_pellets` up to here.
    pub fn cap(&self) -> usize {
        self.max_pellets.saturating_add(self.max_pellets / 2)
    }

    pub fn push(&mut self, position: Point, kind: PelletKind, value: f64) -> PelletId {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.pellets.push(Pellet {
            id,
            position,
            radius: kind.radius(),
            value,
            kind,
        });
        id
    }

    pub fn spawn_random<R: Rng + ?Sized>(&mut self, rng: &mut R) -> PelletId {
        let kind = PelletKind::pick(rng);
        let position = random_in_disc(rng, self.spawn_radius);
        self.push(position, kind, kind.base_value())
    }

    /// Fills toward `max_pellets` at `PELLET_SPAWN_RATE` per simulated second.
    pub fn fill<R: Rng + ?Sized>(&mut self, rng: &mut R, dt: f64) -> usize {
        if self.pellets.len() >= self.max_pellets {
            self.spawn_accumulator = 0.0;
            return 0;
        }
        self.spawn_accumulator += PELLET_SPAWN_RATE * dt;
        let mut spawned = 0;
        while self.spawn_accumulator >= 1.0 && self.pellets.len() < self.max_pellets {
            self.spawn_accumulator -= 1.0;
            self.spawn_random(rng);
            spawned += 1;
        }
        spawned
    }

    pub fn seed_population<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        while self.pellets.len() < self.max_pellets {
            self.spawn_random(rng);
        }
    }

    /// Magnet pull and consumption. `grid` must index the current pellet list.
    pub fn eat(&mut self, snakes: &[Snake], grid: &PelletGrid, dt: f64) -> Vec<Meal> {
        let mut meals = Vec::new();
        let mut eaten = vec![false; self.pellets.len()];
        let mut candidates = Vec::new();
        let pull = MAGNET_PULL * dt;

        for (snake_index, snake) in snakes.iter().enumerate() {
            if !snake.alive {
                continue;
            }
            let Some(head) = snake.head() else { continue };
            let reach = snake.radius + MAGNET_RANGE + MAX_PELLET_RADIUS + pull;
            grid.query_radius_unique(head, reach, &mut candidates);

            for index in candidates.iter().map(|index| *index as usize) {
                if index >= self.pellets.len() || eaten[index] {
                    continue;
                }
                let pellet = &mut self.pellets[index];
                let eat_range = snake.radius + pellet.radius;
                let mut dist = distance(head, pellet.position);
                if dist > eat_range && dist <= eat_range + MAGNET_RANGE {
                    let step = pull.min(dist);
                    let toward = scale(sub(head, pellet.position), step / dist.max(f64::EPSILON));
                    pellet.position = add(pellet.position, toward);
                    dist = distance(head, pellet.position);
                }
                if dist <= eat_range {
                    eaten[index] = true;
                    meals.push(Meal {
                        snake: snake_index,
                        value: pellet.value,
                    });
                }
            }
        }

        for index in (0..eaten.len()).rev() {
            if eaten[index] {
                self.pellets.swap_remove(index);
            }
        }
        meals
    }

    /// Converts a dead body into `clamp(len / 2)` death pellets sharing half its mass.
    pub fn spill_death<R: Rng + ?Sized>(&mut self, rng: &mut R, body: &[Point], mass: f64) -> usize {
        if body.is_empty() {
            return 0;
        }
        let count = (body.len() / 2).clamp(MIN_SPILL, MAX_SPILL);
        let value = (mass.max(0.0) * DEATH_MASS_RETURN / count as f64).max(0.0);
        for k in 0..count {
            let anchor = body[(k * body.len()) / count];
            let jitter = Point::new(
                rng.gen_range(-DEATH_SPILL_JITTER..DEATH_SPILL_JITTER),
                rng.gen_range(-DEATH_SPILL_JITTER..DEATH_SPILL_JITTER),
            );
            self.push(add(anchor, jitter), PelletKind::Death, value);
        }
        count
    }

    /// Drops back under `cap()`: regular pellets go first, then the oldest death drops.
    pub fn trim(&mut self) -> usize {
        let cap = self.cap();
        let mut excess = self.pellets.len().saturating_sub(cap);
        let removed = excess;
        let mut index = self.pellets.len();
        while excess > 0 && index > 0 {
            index -= 1;
            if self.pellets[index].kind != PelletKind::Death {
                self.pellets.swap_remove(index);
                excess -= 1;
            }
        }
        while excess > 0 {
            let Some(oldest) = self
                .pellets
                .iter()
                .enumerate()
                .min_by_key(|(_, pellet)| pellet.id)
                .map(|(index, _)| index)
            else {
                break;
            };
            self.pellets.swap_remove(oldest);
            excess -= 1;
        }
        removed
    }

    #[cfg(test)]
    pub(crate) fn pellets_mut(&mut self) -> &mut Vec<Pellet> {
        &mut self.pellets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::grid::rebuild_pellet_grid;
    use crate::game::snake::make_test_snake;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const DT: f64 = 1.0 / 60.0;

    fn grid_for(field: &PelletField) -> PelletGrid {
        let mut grid = PelletGrid::new(96.0, 1000.0);
        rebuild_pellet_grid(&mut grid, field.pellets());
        grid
    }

    #[test]
    fn kind_table_draws_every_regular_kind() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = [0usize; 4];
        for _ in 0..5_000 {
            match PelletKind::pick(&mut rng) {
                PelletKind::Small => seen[0] += 1,
                PelletKind::Medium => seen[1] += 1,
                PelletKind::Large => seen[2] += 1,
                PelletKind::Gold => seen[3] += 1,
                PelletKind::Death => panic!("death pellets are never drawn"),
            }
        }
        assert!(seen.iter().all(|count| *count > 0));
        assert!(seen[0] > seen[1] && seen[1] > seen[2] && seen[2] > seen[3]);
    }

    #[test]
    fn fill_rate_is_frame_rate_independent() {
        let mut coarse_rng = StdRng::seed_from_u64(1);
        let mut fine_rng = StdRng::seed_from_u64(1);
        let mut coarse = PelletField::new(10_000, 1000.0);
        let mut fine = PelletField::new(10_000, 1000.0);
        for _ in 0..30 {
            coarse.fill(&mut coarse_rng, 1.0 / 30.0);
        }
        for _ in 0..120 {
            fine.fill(&mut fine_rng, 1.0 / 120.0);
        }
        let expected = PELLET_SPAWN_RATE as i64;
        assert!((coarse.len() as i64 - expected).abs() <= 1);
        assert!((fine.len() as i64 - expected).abs() <= 1);
    }

    #[test]
    fn fill_stops_at_target() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut field = PelletField::new(50, 1000.0);
        for _ in 0..600 {
            field.fill(&mut rng, DT);
        }
        assert_eq!(field.len(), 50);
    }

    #[test]
    fn head_eats_overlapping_pellet() {
        let snake = make_test_snake(1, Point::new(0.0, 0.0), 40);
        let mut field = PelletField::new(10, 1000.0);
        field.push(Point::new(snake.radius, 0.0), PelletKind::Medium, 2.0);
        field.push(Point::new(400.0, 0.0), PelletKind::Small, 1.0);
        let grid = grid_for(&field);

        let meals = field.eat(&[snake], &grid, DT);
        assert_eq!(meals, vec![Meal { snake: 0, value: 2.0 }]);
        assert_eq!(field.len(), 1);
        assert_eq!(field.pellets()[0].position, Point::new(400.0, 0.0));
    }

    #[test]
    fn magnet_nudges_near_miss_pellets_toward_head() {
        let snake = make_test_snake(1, Point::new(0.0, 0.0), 40);
        let start = snake.radius + PelletKind::Small.radius() + MAGNET_RANGE - 1.0;
        let mut field = PelletField::new(10, 1000.0);
        field.push(Point::new(0.0, start), PelletKind::Small, 1.0);
        let grid = grid_for(&field);

        let meals = field.eat(&[snake], &grid, DT);
        assert!(meals.is_empty());
        let moved = field.pellets()[0].position;
        assert!(moved.y < start);
        assert!((start - moved.y - MAGNET_PULL * DT).abs() < 1e-9);
    }

    #[test]
    fn a_pellet_feeds_only_one_snake() {
        let a = make_test_snake(1, Point::new(0.0, 0.0), 40);
        let b = make_test_snake(2, Point::new(2.0, 0.0), 40);
        let mut field = PelletField::new(10, 1000.0);
        field.push(Point::new(1.0, 0.0), PelletKind::Gold, 10.0);
        let grid = grid_for(&field);
        let meals = field.eat(&[a, b], &grid, DT);
        assert_eq!(meals.len(), 1);
        assert_eq!(meals[0].snake, 0);
        assert!(field.is_empty());
    }

    #[test]
    fn death_spill_is_clamped() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut field = PelletField::new(10, 1000.0);
        let short: Vec<Point> = (0..4).map(|i| Point::new(i as f64, 0.0)).collect();
        assert_eq!(field.spill_death(&mut rng, &short, 10.0), MIN_SPILL);

        let long: Vec<Point> = (0..600).map(|i| Point::new(i as f64, 0.0)).collect();
        assert_eq!(field.spill_death(&mut rng, &long, 600.0), MAX_SPILL);

        let medium: Vec<Point> = (0..40).map(|i| Point::new(i as f64, 0.0)).collect();
        let before = field.len();
        assert_eq!(field.spill_death(&mut rng, &medium, 40.0), 20);
        let spilled = &field.pellets()[before..];
        assert!(spilled.iter().all(|p| p.kind == PelletKind::Death));
        let total: f64 = spilled.iter().map(|p| p.value).sum();
        assert!((total - 40.0 * DEATH_MASS_RETURN).abs() < 1e-9);
    }

    #[test]
    fn trim_removes_regular_pellets_before_death_drops() {
        let mut field = PelletField::new(10, 1000.0);
        for i in 0..12 {
            field.push(Point::new(i as f64, 0.0), PelletKind::Small, 1.0);
        }
        for i in 0..6 {
            field.push(Point::new(i as f64, 5.0), PelletKind::Death, 2.0);
        }
        assert_eq!(field.len(), 18);
        assert_eq!(field.trim(), 18 - field.cap());
        assert_eq!(field.len(), field.cap());
        let deaths = field.pellets().iter().filter(|p| p.kind == PelletKind::Death).count();
        assert_eq!(deaths, 6);
    }

    #[test]
    fn trim_falls_back_to_oldest_death_drops() {
        let mut field = PelletField::new(2, 1000.0);
        for i in 0..5 {
            field.push(Point::new(i as f64, 0.0), PelletKind::Death, 1.0);
        }
        field.trim();
        assert_eq!(field.len(), field.cap());
        let mut ids: Vec<PelletId> = field.pellets().iter().map(|p| p.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![2, 3, 4]);
    }
}
