//! Matcher module - line and triangle match scanners
//!
//! Line matches are 3+ runs along one of the three axial axes; triangle
//! matches are three mutually-adjacent same-color cells. Starflowers and
//! black pearls never participate in either. Results are key sets with
//! deterministic iteration order.

use std::collections::BTreeSet;

use crate::core::board::Board;
use crate::core::hex::{axial_to_offset, neighbors, offset_to_axial};
use crate::types::{CellKey, MatchMode};

/// The three axial walk directions; the opposite directions are covered by
/// starting each run at its first cell
const AXIAL_DIRS: [(i8, i8); 3] = [(1, 0), (0, 1), (1, -1)];

/// True when the key holds a regular cell of the given color
fn matches_color(board: &Board, key: CellKey, color: i8) -> bool {
    match board.cell_at(key) {
        Some(cell) => !cell.is_blocker() && cell.color == color,
        None => false,
    }
}

/// All cells participating in a 3+ colinear same-color run
pub fn find_line_matches(board: &Board) -> BTreeSet<CellKey> {
    let mut out = BTreeSet::new();

    for (col, row) in Board::keys() {
        let Some(cell) = board.cell_at((col, row)) else {
            continue;
        };
        if cell.is_blocker() {
            continue;
        }

        let (q, r) = offset_to_axial(col, row);
        for &(dq, dr) in &AXIAL_DIRS {
            // Only start a run at its first cell
            if matches_color(board, axial_to_offset(q - dq, r - dr), cell.color) {
                continue;
            }

            let mut run = vec![(col, row)];
            let (mut nq, mut nr) = (q + dq, r + dr);
            loop {
                let key = axial_to_offset(nq, nr);
                if !matches_color(board, key, cell.color) {
                    break;
                }
                run.push(key);
                nq += dq;
                nr += dr;
            }

            if run.len() >= 3 {
                out.extend(run);
            }
        }
    }

    out
}

/// All cells participating in a mutually-adjacent same-color triple.
/// The fixed clockwise neighbor ordering guarantees ring[i] and ring[i+1]
/// are adjacent to each other, so every reported triple is a genuine
/// triangle.
pub fn find_triangle_matches(board: &Board) -> BTreeSet<CellKey> {
    let mut out = BTreeSet::new();

    for key in Board::keys() {
        let Some(cell) = board.cell_at(key) else {
            continue;
        };
        if cell.is_blocker() {
            continue;
        }

        let ring = neighbors(key.0, key.1);
        for i in 0..6 {
            let b = ring[i];
            let d = ring[(i + 1) % 6];
            if matches_color(board, b, cell.color) && matches_color(board, d, cell.color) {
                out.insert(key);
                out.insert(b);
                out.insert(d);
            }
        }
    }

    out
}

/// Dispatch by the active match mode
pub fn find_matches_for_mode(board: &Board, mode: MatchMode) -> BTreeSet<CellKey> {
    match mode {
        MatchMode::Line => find_line_matches(board),
        MatchMode::Triangle => find_triangle_matches(board),
    }
}
