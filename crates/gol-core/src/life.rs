use crate::params::Params;
use crate::world::World;

/// Row bounds `[start, end)` assigned to `stripe_index` out of `worker_count`
/// stripes, with the last stripe absorbing `image_height % worker_count`.
pub fn stripe_bounds(image_height: u32, worker_count: u32, stripe_index: u32) -> (u32, u32) {
    assert!(worker_count > 0, "worker_count must be at least 1");
    assert!(stripe_index < worker_count, "stripe_index out of range");
    let rows_per_worker = image_height / worker_count;
    let start = stripe_index * rows_per_worker;
    let end = if stripe_index + 1 == worker_count {
        image_height
    } else {
        start + rows_per_worker
    };
    (start, end)
}

fn neighbour_sum(world: &World, x: u32, y: u32) -> u32 {
    let w = world.width() as i64;
    let h = world.height() as i64;
    let (x, y) = (x as i64, y as i64);
    let mut sum = 0u32;
    for dy in [-1i64, 0, 1] {
        for dx in [-1i64, 0, 1] {
            if dx == 0 && dy == 0 {
                continue;
            }
            let ny = (((y + dy) % h) + h) % h;
            let nx = (((x + dx) % w) + w) % w;
            sum += world.get(nx as u32, ny as u32) as u32;
        }
    }
    sum
}

fn next_cell(alive: bool, neighbour_sum: u32) -> u8 {
    if alive {
        if neighbour_sum == 2 * 255 || neighbour_sum == 3 * 255 {
            255
        } else {
            0
        }
    } else if neighbour_sum == 3 * 255 {
        255
    } else {
        0
    }
}

/// The worker's compute contract: the next-generation values for rows
/// `[start, end)` of `stripe_index`, read-only over `world`. Never mutates
/// the input. Pure by construction — the only error path (stripe_index out
/// of range) is a programming error in the caller, not a runtime failure.
pub fn compute_stripe(params: &Params, world: &World, stripe_index: u32, worker_count: u32) -> Vec<Vec<u8>> {
    let (start, end) = stripe_bounds(params.image_height, worker_count, stripe_index);
    let mut stripe = Vec::with_capacity((end - start) as usize);
    for y in start..end {
        let mut row = Vec::with_capacity(params.image_width as usize);
        for x in 0..params.image_width {
            let alive = world.get(x, y) == 255;
            row.push(next_cell(alive, neighbour_sum(world, x, y)));
        }
        stripe.push(row);
    }
    stripe
}

/// Single-machine reference transition, used only to state property (P2) in
/// tests — the broker never calls this, it always fans out to workers.
pub fn step_full(params: &Params, world: &World) -> World {
    let rows = compute_stripe(params, world, 0, 1);
    World::from_rows_unchecked(rows)
}

/// Concatenates stripes produced for `i in [0, worker_count)` in ascending
/// stripe order into the next-generation world, per the broker's
/// fan-out/fan-in algorithm.
pub fn assemble(stripes: Vec<Vec<Vec<u8>>>) -> World {
    let rows = stripes.into_iter().flatten().collect();
    World::from_rows_unchecked(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_world() -> World {
        // 2x2 block at (1,1)-(2,2) on a 16x16 board.
        let mut rows = vec![vec![0u8; 16]; 16];
        for y in 1..=2 {
            for x in 1..=2 {
                rows[y][x] = 255;
            }
        }
        World::from_rows(rows).unwrap()
    }

    fn blinker_world() -> World {
        // horizontal 3-cell row at (7,6)-(7,8) on 16x16: y=7, x in 6..=8
        let mut rows = vec![vec![0u8; 16]; 16];
        for x in 6..=8 {
            rows[7][x] = 255;
        }
        World::from_rows(rows).unwrap()
    }

    #[test]
    fn block_is_a_still_life() {
        let p = Params::new(1, 1, 16, 16);
        let w = block_world();
        let next = step_full(&p, &w);
        assert_eq!(next, w);
        assert_eq!(next.alive_count(), 4);
    }

    #[test]
    fn blinker_oscillates_with_period_two() {
        let p = Params::new(1, 1, 16, 16);
        let w = blinker_world();
        let t1 = step_full(&p, &w);
        assert_eq!(t1.alive_count(), 3);
        assert_eq!(t1.get(7, 6), 255);
        assert_eq!(t1.get(7, 7), 255);
        assert_eq!(t1.get(7, 8), 255);
        let t2 = step_full(&p, &t1);
        assert_eq!(t2, w);
    }

    #[test]
    fn stripe_bounds_last_stripe_absorbs_remainder() {
        assert_eq!(stripe_bounds(10, 3, 0), (0, 3));
        assert_eq!(stripe_bounds(10, 3, 1), (3, 6));
        assert_eq!(stripe_bounds(10, 3, 2), (6, 10));
    }

    #[test]
    fn stripe_bounds_allow_zero_rows_when_height_less_than_workers() {
        // height=2, 4 workers: rows_per_worker=0, so stripes 0..3 are empty
        // and the last stripe (3) carries all 2 rows.
        assert_eq!(stripe_bounds(2, 4, 0), (0, 0));
        assert_eq!(stripe_bounds(2, 4, 1), (0, 0));
        assert_eq!(stripe_bounds(2, 4, 2), (0, 0));
        assert_eq!(stripe_bounds(2, 4, 3), (0, 2));
    }

    #[test]
    fn concatenated_stripes_equal_single_machine_step() {
        let p = Params::new(1, 1, 16, 16);
        let w = blinker_world();
        for &n in &[1u32, 2, 3, 4, 5, 7] {
            let stripes: Vec<_> = (0..n).map(|i| compute_stripe(&p, &w, i, n)).collect();
            let assembled = assemble(stripes);
            assert_eq!(assembled, step_full(&p, &w));
        }
    }

    #[test]
    fn toroidal_translation_commutes_with_stepping() {
        let p = Params::new(1, 1, 16, 16);
        let w = blinker_world();
        let shifted = w.translated(3, 5);
        let stepped_then_shifted = step_full(&p, &w).translated(3, 5);
        let shifted_then_stepped = step_full(&p, &shifted);
        assert_eq!(stepped_then_shifted, shifted_then_stepped);
    }

    #[test]
    fn glider_returns_home_after_64_turns_on_16x16_torus() {
        let p = Params::new(64, 1, 16, 16);
        let mut rows = vec![vec![0u8; 16]; 16];
        // classic glider at top-left
        for (x, y) in [(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)] {
            rows[y][x] = 255;
        }
        let mut world = World::from_rows(rows).unwrap();
        let start = world.clone();
        for _ in 0..p.turns {
            world = step_full(&p, &world);
            assert_eq!(world.alive_count(), 4);
        }
        assert_eq!(world, start);
    }

    #[test]
    fn empty_board_stays_empty() {
        let p = Params::new(1, 1, 10, 10);
        let w = World::empty(10, 10);
        let next = step_full(&p, &w);
        assert_eq!(next.alive_count(), 0);
    }
}
