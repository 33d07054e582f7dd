use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::error::GolError;
use crate::params::Params;

/// Row-major grid of cell states. Every byte is exactly 0 (dead) or 255
/// (alive) — see [`World::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct World {
    rows: Vec<Vec<u8>>,
}

impl World {
    /// Builds a world from already-validated rows without checking the
    /// 0/255 invariant. Internal helper for the transition function, which
    /// only ever produces 0/255 by construction.
    pub(crate) fn from_rows_unchecked(rows: Vec<Vec<u8>>) -> Self {
        Self { rows }
    }

    /// Builds a world from externally supplied bytes (PGM read, wire
    /// deserialisation) and checks invariant (I1)/semantic invariant: every
    /// byte is 0 or 255 and every row has the same length.
    pub fn from_rows(rows: Vec<Vec<u8>>) -> Result<Self, GolError> {
        let width = rows.first().map(|r| r.len()).unwrap_or(0);
        for row in &rows {
            if row.len() != width {
                return Err(GolError::MalformedWorld("ragged row".into()));
            }
            if row.iter().any(|&b| b != 0 && b != 255) {
                return Err(GolError::MalformedWorld("byte not in {0, 255}".into()));
            }
        }
        Ok(Self { rows })
    }

    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            rows: vec![vec![0u8; width as usize]; height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.rows.first().map(|r| r.len()).unwrap_or(0) as u32
    }

    pub fn height(&self) -> u32 {
        self.rows.len() as u32
    }

    /// Invariant (I1): dimensions must match the session's params.
    pub fn matches(&self, params: &Params) -> bool {
        self.width() == params.image_width && self.height() == params.image_height
    }

    pub fn rows(&self) -> &[Vec<u8>] {
        &self.rows
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.rows[y as usize][x as usize]
    }

    pub fn alive_cells(&self) -> Vec<Cell> {
        let mut cells = Vec::new();
        for (y, row) in self.rows.iter().enumerate() {
            for (x, &byte) in row.iter().enumerate() {
                if byte == 255 {
                    cells.push(Cell::new(x as u32, y as u32));
                }
            }
        }
        cells
    }

    pub fn alive_count(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|r| r.iter())
            .filter(|&&b| b == 255)
            .count()
    }

    /// Toroidal translation by `(dx, dy)`, used by property tests (P5).
    pub fn translated(&self, dx: i64, dy: i64) -> World {
        let h = self.height() as i64;
        let w = self.width() as i64;
        let mut rows = vec![vec![0u8; w as usize]; h as usize];
        for y in 0..h {
            for x in 0..w {
                let sy = (((y - dy) % h) + h) % h;
                let sx = (((x - dx) % w) + w) % w;
                rows[y as usize][x as usize] = self.get(sx as u32, sy as u32);
            }
        }
        World { rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_ragged_rows() {
        let rows = vec![vec![0, 0], vec![0]];
        assert!(World::from_rows(rows).is_err());
    }

    #[test]
    fn rejects_non_binary_bytes() {
        let rows = vec![vec![0, 128]];
        assert!(World::from_rows(rows).is_err());
    }

    #[test]
    fn empty_world_has_requested_dimensions() {
        let w = World::empty(10, 5);
        assert_eq!(w.width(), 10);
        assert_eq!(w.height(), 5);
        assert_eq!(w.alive_count(), 0);
    }

    #[test]
    fn translate_wraps_toroidally() {
        let mut rows = vec![vec![0u8; 4]; 4];
        rows[0][0] = 255;
        let w = World::from_rows(rows).unwrap();
        let shifted = w.translated(1, 1);
        assert_eq!(shifted.get(1, 1), 255);
        assert_eq!(shifted.alive_count(), 1);
    }
}
