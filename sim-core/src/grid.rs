//! C3 (board half): a fixed-size 2D tile grid with block get/set and vision queries
//! (§3, §4.3). `Set` is only ever called from inside a room tick or the owning
//! manager's synchronous handler (both mode crates uphold this by construction — the
//! grid itself has no locking, matching the single-writer invariant).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Tile {
    pub block_id: String,
    pub biome: String,
}

#[derive(Debug, Clone)]
pub struct Grid {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
}

impl Grid {
    pub fn new(width: i32, height: i32, fill: Tile) -> Self {
        Grid {
            width,
            height,
            tiles: vec![fill; (width * height) as usize],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    fn index(&self, x: i32, y: i32) -> usize {
        (y * self.width + x) as usize
    }

    pub fn get(&self, x: i32, y: i32) -> Option<&Tile> {
        if self.in_bounds(x, y) {
            Some(&self.tiles[self.index(x, y)])
        } else {
            None
        }
    }

    /// Only to be called from within a room tick or synchronous handler holding the
    /// room lock (§4.3).
    pub fn set(&mut self, x: i32, y: i32, tile: Tile) {
        if self.in_bounds(x, y) {
            let idx = self.index(x, y);
            self.tiles[idx] = tile;
        }
    }

    /// L1 (diamond, Manhattan) distance.
    pub fn l1_distance(ax: i32, ay: i32, bx: i32, by: i32) -> i32 {
        (ax - bx).abs() + (ay - by).abs()
    }

    /// Tiles within `radius + 2` L1 slack of `(cx, cy)`, to avoid pop-in at the radius
    /// edge (§4.3).
    pub fn tiles_in_vision(&self, cx: i32, cy: i32, radius: i32) -> Vec<(i32, i32, &Tile)> {
        let r = radius + 2;
        let mut out = Vec::new();
        for dy in -r..=r {
            for dx in -r..=r {
                if dx.abs() + dy.abs() > r {
                    continue;
                }
                let (x, y) = (cx + dx, cy + dy);
                if let Some(t) = self.get(x, y) {
                    out.push((x, y, t));
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grass() -> Tile {
        Tile { block_id: "grass".into(), biome: "plains".into() }
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut g = Grid::new(8, 8, grass());
        g.set(3, 4, Tile { block_id: "stone".into(), biome: "plains".into() });
        assert_eq!(g.get(3, 4).unwrap().block_id, "stone");
    }

    #[test]
    fn out_of_bounds_get_is_none() {
        let g = Grid::new(4, 4, grass());
        assert!(g.get(-1, 0).is_none());
        assert!(g.get(4, 0).is_none());
    }

    #[test]
    fn out_of_bounds_set_is_noop() {
        let mut g = Grid::new(4, 4, grass());
        g.set(100, 100, Tile { block_id: "stone".into(), biome: "plains".into() });
        // No panic, and nothing else moved.
        assert_eq!(g.get(0, 0).unwrap().block_id, "grass");
    }

    #[test]
    fn vision_radius_includes_slack() {
        let g = Grid::new(20, 20, grass());
        let tiles = g.tiles_in_vision(10, 10, 3);
        // Every tile must be within radius+2 L1 distance.
        for (x, y, _) in &tiles {
            assert!(Grid::l1_distance(*x, *y, 10, 10) <= 5);
        }
        // The center and the edge at exactly radius+2 must be included.
        assert!(tiles.iter().any(|(x, y, _)| *x == 10 && *y == 10));
        assert!(tiles.iter().any(|(x, y, _)| Grid::l1_distance(*x, *y, 10, 10) == 5));
    }
}
