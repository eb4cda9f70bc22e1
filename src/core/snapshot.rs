//! Snapshot module - persistent session state
//!
//! One `SavedState` record per combined mode id, written by the host between
//! transitions and validated strictly on restore: the engine never continues
//! from partially-valid state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::board::Board;
use crate::types::{ModeConfig, Slot, BOARD_COLS, BOARD_ROWS};

/// The host-facing save layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedState {
    /// Column-major: `grid[col][row]`
    pub grid: Vec<Vec<Slot>>,
    pub move_count: u32,
    pub score: u32,
    pub display_score: u32,
    pub chain_level: u32,
    pub combo_count: u32,
    /// Live RNG state; optional in the layout but required for replay
    /// determinism
    pub rng_seed: Option<u64>,
    pub mode_id: String,
}

/// Why a saved state was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RestoreError {
    #[error("saved grid is {cols}x{rows}, expected {expected_cols}x{expected_rows}")]
    BadDimensions {
        cols: usize,
        rows: usize,
        expected_cols: usize,
        expected_rows: usize,
    },
    #[error("saved grid has an empty slot at ({col}, {row})")]
    EmptySlot { col: usize, row: usize },
    #[error("saved cell at ({col}, {row}) violates the cell invariants")]
    BadCell { col: usize, row: usize },
    #[error("unknown mode id {0:?}")]
    BadModeId(String),
    #[error("saved mode {found:?} does not match session mode {expected:?}")]
    ModeMismatch { expected: String, found: String },
}

impl SavedState {
    /// Parse and check the combined mode id against the booting session's
    pub fn validate_mode(&self, expected: ModeConfig) -> Result<ModeConfig, RestoreError> {
        let mode = ModeConfig::from_mode_id(&self.mode_id)
            .ok_or_else(|| RestoreError::BadModeId(self.mode_id.clone()))?;
        if mode != expected {
            return Err(RestoreError::ModeMismatch {
                expected: expected.mode_id(),
                found: self.mode_id.clone(),
            });
        }
        Ok(mode)
    }

    /// Rebuild the board, enforcing dimensions and per-cell invariants.
    /// When `convert_bombs` is set (chill sessions), restored bombs become
    /// regular cells of their color.
    pub fn validate_grid(&self, palette_size: u8, convert_bombs: bool) -> Result<Board, RestoreError> {
        let rows_found = self.grid.first().map_or(0, Vec::len);
        if self.grid.len() != BOARD_COLS as usize
            || self.grid.iter().any(|col| col.len() != BOARD_ROWS as usize)
        {
            return Err(RestoreError::BadDimensions {
                cols: self.grid.len(),
                rows: rows_found,
                expected_cols: BOARD_COLS as usize,
                expected_rows: BOARD_ROWS as usize,
            });
        }

        let mut board = Board::new();
        for (col, column) in self.grid.iter().enumerate() {
            for (row, &slot) in column.iter().enumerate() {
                let cell = slot.ok_or(RestoreError::EmptySlot { col, row })?;
                if !cell.is_well_formed(palette_size) {
                    return Err(RestoreError::BadCell { col, row });
                }
                let cell = if convert_bombs && cell.special.is_bomb() {
                    crate::types::Cell::regular(cell.color)
                } else {
                    cell
                };
                board.set(col as i8, row as i8, Some(cell));
            }
        }

        Ok(board)
    }
}
