//! Rotation module - the rotate-until-hit-or-full-cycle loop
//!
//! Every player move goes through here: apply one generator step of the
//! selection's cycle, test the board, and either stop on a hit or keep
//! stepping. A full silent cycle returns the board to its pre-rotation
//! contents, and the move still counts (rotating forever is not a way to
//! stall bombs).

use std::collections::BTreeSet;

use crate::core::board::Board;
use crate::core::matcher::find_matches_for_mode;
use crate::core::specials::{scan_black_pearls, scan_starflowers};
use crate::types::{CellKey, Direction, MatchMode};

/// What the player has picked up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Three mutually-adjacent cells sharing a vertex; rotates as a 3-cycle
    Cluster([CellKey; 3]),
    /// A starflower center plus its six neighbors; the ring rotates as a
    /// 6-cycle around the fixed center
    Ring {
        center: CellKey,
        ring: [CellKey; 6],
    },
    /// A black-pearl center plus alternating neighbors (indices 0, 2, 4);
    /// the arms rotate as a 3-cycle
    Y {
        center: CellKey,
        arms: [CellKey; 3],
    },
}

impl Selection {
    /// Steps in one full cycle of the rotation generator
    pub fn max_steps(&self) -> u8 {
        match self {
            Selection::Cluster(_) => 3,
            Selection::Ring { .. } => 6,
            Selection::Y { .. } => 3,
        }
    }

    /// The slots whose data moves; nothing outside these is mutated
    pub fn slots(&self) -> &[CellKey] {
        match self {
            Selection::Cluster(keys) => keys,
            Selection::Ring { ring, .. } => ring,
            Selection::Y { arms, .. } => arms,
        }
    }
}

/// How a rotation loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationOutcome {
    /// Rotation produced matches; the full match set is handed to the
    /// cascade resolver
    Matches(BTreeSet<CellKey>),
    /// No matches, but a starflower or black pearl would now form
    Specials,
    /// The cycle completed silently; the board is back to its pre-rotation
    /// contents and the move is a bomb-ticking no-op
    FullCycle,
}

/// Drive one rotation action to its outcome.
///
/// A selection whose slots all hold identical data is fixed under every
/// step of its cycle; the loop short-circuits to the silent full cycle
/// without testing the (unchanged) board, so rotating inside a uniform
/// patch is a pure no-op rather than a re-trigger of whatever the board
/// already contains.
pub fn run_rotation(
    board: &mut Board,
    selection: &Selection,
    direction: Direction,
    match_mode: MatchMode,
) -> RotationOutcome {
    let clockwise = direction == Direction::Cw;
    let slots = selection.slots();

    let data: Option<Vec<_>> = slots.iter().map(|&key| board.cell_at(key)).collect();
    if let Some(data) = data {
        if data.windows(2).all(|pair| pair[0] == pair[1]) {
            return RotationOutcome::FullCycle;
        }
    }

    for _ in 0..selection.max_steps() {
        if !board.rotate_slots(slots, clockwise) {
            // Stale selection (a slot emptied under us); treat as a no-op
            return RotationOutcome::FullCycle;
        }

        let matches = find_matches_for_mode(board, match_mode);
        if !matches.is_empty() {
            return RotationOutcome::Matches(matches);
        }
        if !scan_starflowers(board).is_empty() || !scan_black_pearls(board).is_empty() {
            return RotationOutcome::Specials;
        }
    }

    RotationOutcome::FullCycle
}
