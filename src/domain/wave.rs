//! Discrete stress waves travelling through a single layer

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Travel direction of a wave inside its host layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Toward node 0 (the impactor side)
    TowardStart,
    /// Toward node `size - 1` (the backing side)
    TowardEnd,
}

impl Direction {
    /// The opposite direction
    pub fn reversed(self) -> Self {
        match self {
            Direction::TowardStart => Direction::TowardEnd,
            Direction::TowardEnd => Direction::TowardStart,
        }
    }
}

/// A stress pulse confined to one layer
///
/// Waves never move between layers. Reaching an interface spawns a new wave
/// in the neighbouring layer while this one is reflected in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Wave {
    /// Current node index within the host layer
    pub pos: usize,
    /// Node count of the host layer
    pub size: usize,
    /// Travel direction
    pub direction: Direction,
    /// Signed stress carried by the wave (Pa)
    pub value: f64,
}

impl Wave {
    /// Create a new wave
    pub fn new(pos: usize, size: usize, direction: Direction, value: f64) -> Self {
        Self {
            pos,
            size,
            direction,
            value,
        }
    }

    /// Wave sitting on the first node, heading into the layer
    pub fn at_start(size: usize, value: f64) -> Self {
        Self::new(0, size, Direction::TowardEnd, value)
    }

    /// Wave sitting on the last node, heading back toward node 0
    pub fn at_end(size: usize, value: f64) -> Self {
        Self::new(size.saturating_sub(1), size, Direction::TowardStart, value)
    }

    /// Index of the last node of the host layer
    pub fn last_node(&self) -> usize {
        self.size - 1
    }

    /// Whether the position respects `pos <= size - 1`
    pub fn in_bounds(&self) -> bool {
        self.size > 0 && self.pos < self.size
    }
}

/// Merge waves sharing the same `(pos, direction)`
///
/// Values are summed into the first occurrence and later duplicates are
/// dropped. Survivors keep their relative order. Returns how many waves were
/// removed.
pub fn merge_coincident(waves: &mut Vec<Wave>) -> usize {
    if waves.len() < 2 {
        return 0;
    }

    let before = waves.len();
    let mut slots: HashMap<(usize, Direction), usize> = HashMap::with_capacity(before);
    let mut merged: Vec<Wave> = Vec::with_capacity(before);

    for wave in waves.drain(..) {
        match slots.get(&(wave.pos, wave.direction)) {
            Some(&slot) => merged[slot].value += wave.value,
            None => {
                slots.insert((wave.pos, wave.direction), merged.len());
                merged.push(wave);
            }
        }
    }

    *waves = merged;
    before - waves.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_wave_constructors() {
        let start = Wave::at_start(10, 2.0);
        assert_eq!(start.pos, 0);
        assert_eq!(start.direction, Direction::TowardEnd);

        let end = Wave::at_end(10, -1.0);
        assert_eq!(end.pos, 9);
        assert_eq!(end.last_node(), 9);
        assert_eq!(end.direction, Direction::TowardStart);
        assert!(end.in_bounds());

        assert!(!Wave::new(10, 10, Direction::TowardEnd, 1.0).in_bounds());
    }

    #[test]
    fn test_merge_sums_coincident_waves() {
        let mut waves = vec![
            Wave::new(3, 10, Direction::TowardEnd, 1.0),
            Wave::new(3, 10, Direction::TowardStart, 5.0),
            Wave::new(3, 10, Direction::TowardEnd, 0.5),
            Wave::new(7, 10, Direction::TowardEnd, -2.0),
            Wave::new(3, 10, Direction::TowardEnd, 0.25),
        ];

        let removed = merge_coincident(&mut waves);

        assert_eq!(removed, 2);
        assert_eq!(waves.len(), 3);
        assert_eq!(waves[0].pos, 3);
        assert_eq!(waves[0].direction, Direction::TowardEnd);
        assert_abs_diff_eq!(waves[0].value, 1.75, epsilon = 1e-12);
        assert_abs_diff_eq!(waves[1].value, 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(waves[2].value, -2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut waves: Vec<Wave> = (0..40)
            .map(|i| {
                let direction = if i % 3 == 0 {
                    Direction::TowardStart
                } else {
                    Direction::TowardEnd
                };
                Wave::new(i % 7, 12, direction, i as f64 * 0.1)
            })
            .collect();

        merge_coincident(&mut waves);
        let once = waves.clone();
        let removed = merge_coincident(&mut waves);

        assert_eq!(removed, 0);
        assert_eq!(waves, once);
    }

    #[test]
    fn test_merge_keeps_zero_valued_waves() {
        let mut waves = vec![
            Wave::new(1, 5, Direction::TowardEnd, 0.0),
            Wave::new(2, 5, Direction::TowardEnd, 0.0),
        ];
        assert_eq!(merge_coincident(&mut waves), 0);
        assert_eq!(waves.len(), 2);
    }
}
