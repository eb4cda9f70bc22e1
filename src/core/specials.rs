//! Specials module - starflowers, black pearls, multipliers, bombs
//!
//! Detection is split into pure scans and mutating detects: the rotation
//! loop peeks with scans after every step, while the resolver commits with
//! the detect variants. Each detect is idempotent; a second run on the
//! resulting board finds nothing new.

use std::collections::{BTreeSet, VecDeque};

use crate::core::board::Board;
use crate::core::hex::{in_bounds, neighbors};
use crate::types::{Cell, CellKey, Special};

/// A starflower birth: the converted center plus its same-color ring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StarflowerBirth {
    pub center: CellKey,
    pub ring: [CellKey; 6],
    pub ring_color: i8,
}

/// A black-pearl birth: the converted center plus the six absorbed
/// starflowers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlackPearlBirth {
    pub center: CellKey,
    pub ring: [CellKey; 6],
}

/// Whether a regular cell at `center` is surrounded by six same-color
/// regular cells of a different color; returns the ring color
fn starflower_ring_color(board: &Board, center: CellKey, center_color: i8) -> Option<i8> {
    let ring = neighbors(center.0, center.1);
    let mut ring_color = None;

    for &(col, row) in &ring {
        if !in_bounds(col, row) {
            return None;
        }
        let cell = board.cell_at((col, row))?;
        if cell.color < 0 {
            return None;
        }
        match ring_color {
            None => ring_color = Some(cell.color),
            Some(c) if c != cell.color => return None,
            Some(_) => {}
        }
    }

    ring_color.filter(|&c| c != center_color)
}

/// Pure whole-board starflower scan: regular cells whose six in-bounds
/// neighbors all share one non-negative color different from the center's
pub fn scan_starflowers(board: &Board) -> Vec<StarflowerBirth> {
    let mut births = Vec::new();

    for key in Board::keys() {
        let Some(cell) = board.cell_at(key) else {
            continue;
        };
        if cell.color < 0 {
            continue;
        }
        if let Some(ring_color) = starflower_ring_color(board, key, cell.color) {
            births.push(StarflowerBirth {
                center: key,
                ring: neighbors(key.0, key.1),
                ring_color,
            });
        }
    }

    births
}

/// Whole-board starflower detection: converts each center in place.
/// The ring cells are left alone; the resolver clears them.
pub fn detect_starflowers(board: &mut Board) -> Vec<StarflowerBirth> {
    let births = scan_starflowers(board);
    for birth in &births {
        board.set(birth.center.0, birth.center.1, Some(Cell::starflower()));
    }
    births
}

/// Starflower births at just-cleared gaps: an empty slot whose six neighbors
/// are all present, non-starflower, outside the cleared set, and share a
/// common non-negative color. A fresh starflower is placed into each gap.
pub fn detect_starflowers_at(
    board: &mut Board,
    cleared: &BTreeSet<CellKey>,
) -> Vec<StarflowerBirth> {
    let mut births = Vec::new();

    for &key in cleared {
        if !matches!(board.get(key.0, key.1), Some(None)) {
            continue;
        }

        let ring = neighbors(key.0, key.1);
        let mut ring_color = None;
        let mut ok = true;
        for &(col, row) in &ring {
            if !in_bounds(col, row) || cleared.contains(&(col, row)) {
                ok = false;
                break;
            }
            let Some(cell) = board.cell_at((col, row)) else {
                ok = false;
                break;
            };
            if cell.is_starflower() || cell.color < 0 {
                ok = false;
                break;
            }
            match ring_color {
                None => ring_color = Some(cell.color),
                Some(c) if c != cell.color => {
                    ok = false;
                    break;
                }
                Some(_) => {}
            }
        }

        if ok {
            if let Some(ring_color) = ring_color {
                board.set(key.0, key.1, Some(Cell::starflower()));
                births.push(StarflowerBirth {
                    center: key,
                    ring,
                    ring_color,
                });
            }
        }
    }

    births
}

/// Whether the six neighbors of `center` are all in-bounds starflowers
fn pearl_ring(board: &Board, center: CellKey) -> Option<[CellKey; 6]> {
    let ring = neighbors(center.0, center.1);
    for &(col, row) in &ring {
        if !in_bounds(col, row) {
            return None;
        }
        match board.cell_at((col, row)) {
            Some(cell) if cell.is_starflower() => {}
            _ => return None,
        }
    }
    Some(ring)
}

/// Pure black-pearl scan on the frozen board
pub fn scan_black_pearls(board: &Board) -> Vec<BlackPearlBirth> {
    let mut births = Vec::new();

    for key in Board::keys() {
        let Some(cell) = board.cell_at(key) else {
            continue;
        };
        if cell.color < 0 {
            continue;
        }
        if let Some(ring) = pearl_ring(board, key) {
            births.push(BlackPearlBirth { center: key, ring });
        }
    }

    births
}

/// Black-pearl detection: converts each center to a pearl and absorbs the
/// six starflowers (their slots become empty; gravity must follow).
/// Candidates are checked sequentially so overlapping rings consume exactly
/// six starflowers per pearl.
pub fn detect_black_pearls(board: &mut Board) -> Vec<BlackPearlBirth> {
    let mut births = Vec::new();

    for key in Board::keys() {
        let Some(cell) = board.cell_at(key) else {
            continue;
        };
        if cell.color < 0 {
            continue;
        }
        let Some(ring) = pearl_ring(board, key) else {
            continue;
        };

        board.set(key.0, key.1, Some(Cell::black_pearl()));
        for &(col, row) in &ring {
            board.set(col, row, None);
        }
        births.push(BlackPearlBirth { center: key, ring });
    }

    births
}

/// Connected components of multiplier tiles, size >= 3
pub fn find_multiplier_clusters(board: &Board) -> Vec<BTreeSet<CellKey>> {
    let mut clusters = Vec::new();
    let mut visited: BTreeSet<CellKey> = BTreeSet::new();

    for key in Board::keys() {
        if visited.contains(&key) {
            continue;
        }
        match board.cell_at(key) {
            Some(cell) if cell.special == Special::Multiplier => {}
            _ => continue,
        }

        let mut component = BTreeSet::new();
        let mut queue = VecDeque::from([key]);
        visited.insert(key);
        while let Some(cur) = queue.pop_front() {
            component.insert(cur);
            for (col, row) in neighbors(cur.0, cur.1) {
                if !in_bounds(col, row) || visited.contains(&(col, row)) {
                    continue;
                }
                if let Some(cell) = board.cell_at((col, row)) {
                    if cell.special == Special::Multiplier {
                        visited.insert((col, row));
                        queue.push_back((col, row));
                    }
                }
            }
        }

        if component.len() >= 3 {
            clusters.push(component);
        }
    }

    clusters
}

/// Result of one bomb tick pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BombTickReport {
    /// Every live bomb with its remaining count after the tick
    pub ticked: Vec<(CellKey, u32)>,
    /// Bombs whose timer reached zero this tick
    pub expired: Vec<CellKey>,
}

/// Decrement every bomb timer by one. Expired bombs are left on the board
/// at timer zero; the session decides between game-over and defusal.
pub fn tick_bombs(board: &mut Board) -> BombTickReport {
    let mut report = BombTickReport::default();

    for key in Board::keys() {
        let Some(cell) = board.cell_at(key) else {
            continue;
        };
        if let Special::Bomb { timer } = cell.special {
            let remaining = timer.saturating_sub(1);
            board.set(
                key.0,
                key.1,
                Some(Cell::bomb(cell.color, remaining)),
            );
            report.ticked.push((key, remaining));
            if remaining == 0 {
                report.expired.push(key);
            }
        }
    }

    report
}

/// Turn an expired bomb back into a regular tile of its color
pub fn defuse_bomb(board: &mut Board, key: CellKey) {
    if let Some(cell) = board.cell_at(key) {
        if cell.special.is_bomb() {
            board.set(key.0, key.1, Some(Cell::regular(cell.color)));
        }
    }
}
