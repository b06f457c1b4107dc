/// Ground tile variants and neighbour-aware selection.
///
/// A ground cell's look depends on how much ground is stacked above it
/// (surface, fill, deep fill, deeper) and whether its left/right
/// neighbours are open. Selection is a pure function of the grid plus an
/// injected RNG, which only matters for the cosmetic deeper tiles.

use rand::Rng;

use super::level::{LevelGrid, Symbol};

/// Which horizontal edge of a run a tile sits on.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Edge {
    Left,
    Right,
    Single,
    Enclosed,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TileVariant {
    /// Top row of a ground stack.
    Surface(Edge),
    /// One ground cell above.
    Fill(Edge),
    /// Two ground cells above.
    DeepFill(Edge),
    /// Three or more ground cells above; sub-variant 0..=2.
    Deeper(u8),
    /// Platform tile (never neighbour-dependent).
    Platform,
}

impl Default for TileVariant {
    fn default() -> Self {
        TileVariant::Surface(Edge::Single)
    }
}

/// Ground cells stacked directly above `(x, y)`, counting at most 3.
/// Counting stops at the first space; other symbols are skipped over.
pub fn ground_above(grid: &LevelGrid, x: i64, y: i64) -> usize {
    let mut count = 0;
    for i in 1..=3 {
        match grid.get(x, y - i) {
            Symbol::Ground => count += 1,
            Symbol::Space => break,
            _ => {}
        }
    }
    count
}

pub fn edge_at(grid: &LevelGrid, x: i64, y: i64) -> Edge {
    let left = grid.get(x - 1, y);
    let right = grid.get(x + 1, y);
    if left == Symbol::Space && right == Symbol::Ground {
        Edge::Left
    } else if left == Symbol::Ground && right == Symbol::Space {
        Edge::Right
    } else if left == Symbol::Space && right == Symbol::Space {
        Edge::Single
    } else {
        Edge::Enclosed
    }
}

/// Pick the variant for the ground cell at `(x, y)`.
pub fn select_variant<R: Rng + ?Sized>(grid: &LevelGrid, x: usize, y: usize, rng: &mut R) -> TileVariant {
    let (x, y) = (x as i64, y as i64);
    match ground_above(grid, x, y) {
        3 => {
            // 19/30, 8/30, 3/30
            let roll = rng.gen_range(1..=30);
            let sub = if roll <= 19 {
                0
            } else if roll <= 27 {
                1
            } else {
                2
            };
            TileVariant::Deeper(sub)
        }
        2 => TileVariant::DeepFill(edge_at(grid, x, y)),
        1 => TileVariant::Fill(edge_at(grid, x, y)),
        _ => TileVariant::Surface(edge_at(grid, x, y)),
    }
}
