//! Game events - the host boundary
//!
//! The engine emits a transcript of discrete events per transition; a host
//! binds them to visuals, audio, and persistence. Event order within one
//! transition is fixed: score, clear, special births, gravity, refill,
//! post-settle specials, chain advance, next-level matches.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::{Cell, CellKey, Phase, Slot, BOARD_COLS, BOARD_ROWS};

/// One cell dropping within its column during gravity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FallStep {
    pub col: i8,
    pub from_row: i8,
    pub to_row: i8,
    pub cell: Cell,
}

/// Read-only copy of the grid, attached to game-over events so the host can
/// play the final animation against the exact board state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub cols: u8,
    pub rows: u8,
    /// Column-major: `grid[col][row]`
    pub grid: Vec<Vec<Slot>>,
}

impl BoardSnapshot {
    pub fn empty() -> Self {
        Self {
            cols: BOARD_COLS,
            rows: BOARD_ROWS,
            grid: vec![vec![None; BOARD_ROWS as usize]; BOARD_COLS as usize],
        }
    }
}

/// Why a session ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameOverReason {
    /// A bomb timer reached zero; carries the offending position and the
    /// remaining board so the host can animate the explosion
    BombExpired {
        pos: CellKey,
        board: Box<BoardSnapshot>,
    },
    /// The player ended a chill session
    SessionEnded,
}

/// One discrete game event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A match (plus special-interaction expansion) was scored.
    /// `centroid` is in unit-layout space (origin (0,0), hex size 1.0).
    Matched {
        cells: BTreeSet<CellKey>,
        points: u32,
        chain_level: u32,
        centroid: (f32, f32),
    },
    Cleared {
        cells: BTreeSet<CellKey>,
    },
    StarflowerBorn {
        center: CellKey,
        ring: [CellKey; 6],
        ring_color: i8,
    },
    BlackPearlBorn {
        center: CellKey,
        absorbed_ring: [CellKey; 6],
    },
    Gravity {
        falls: Vec<FallStep>,
    },
    Refilled {
        cells: Vec<(CellKey, Cell)>,
    },
    BombSpawned {
        pos: CellKey,
    },
    BombTicked {
        pos: CellKey,
        remaining: u32,
    },
    ScoreChanged {
        score: u32,
    },
    ChainAdvanced {
        level: u32,
    },
    PhaseChanged {
        phase: Phase,
    },
    /// A resolver step observed impossible state (e.g. clearing an empty
    /// slot); the operation was skipped. Diagnostics only.
    InvariantViolated {
        pos: CellKey,
    },
    /// A saved state failed validation; a fresh session was created instead
    RestoreFailed {
        reason: String,
    },
    GameOver {
        reason: GameOverReason,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_serialize_round_trip() {
        let ev = GameEvent::Matched {
            cells: BTreeSet::from([(4, 2), (4, 3), (4, 4)]),
            points: 5,
            chain_level: 0,
            centroid: (6.0, 5.19),
        };
        let json = serde_json::to_string(&ev).unwrap();
        let back: GameEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(ev, back);
    }

    #[test]
    fn test_game_over_carries_snapshot() {
        let reason = GameOverReason::BombExpired {
            pos: (4, 3),
            board: Box::new(BoardSnapshot::empty()),
        };
        let json = serde_json::to_string(&reason).unwrap();
        assert!(json.contains("BombExpired"));
        let back: GameOverReason = serde_json::from_str(&json).unwrap();
        assert_eq!(reason, back);
    }
}
