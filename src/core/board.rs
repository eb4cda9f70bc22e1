//! Board module - manages the hex grid
//!
//! The board is a 9x9 grid where each slot is empty or holds a Cell.
//! Uses a flat array for better cache locality and zero-allocation access.
//! Storage is column-major (columns are the outer index); visual parity
//! alternates with `col & 1`.

use crate::core::matcher::find_line_matches;
use crate::core::rng::SimpleRng;
use crate::events::{BoardSnapshot, FallStep};
use crate::types::{
    Cell, CellKey, Slot, Special, BOARD_COLS, BOARD_REROLL_PASSES, BOARD_ROWS,
    BOMB_INITIAL_TIMER, MULTIPLIER_SPAWN_P,
};

/// Total number of slots on the board
const BOARD_SIZE: usize = (BOARD_COLS as usize) * (BOARD_ROWS as usize);

/// The game board - 9 columns x 9 rows using flat array storage
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    /// Flat array of slots, column-major order (col * ROWS + row)
    cells: [Slot; BOARD_SIZE],
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Self {
            cells: [None; BOARD_SIZE],
        }
    }

    /// Create a full board of random colors, re-rolling any cell that starts
    /// inside a 3+ axial run so turn 1 never opens with a free cascade.
    /// The re-roll is fix-point iterated with a bounded pass count.
    pub fn new_random(rng: &mut SimpleRng, palette_size: u8) -> Self {
        let mut board = Self::new();
        for col in 0..BOARD_COLS as i8 {
            for row in 0..BOARD_ROWS as i8 {
                board.set(col, row, Some(Cell::regular(rng.next_color(palette_size))));
            }
        }

        for _ in 0..BOARD_REROLL_PASSES {
            let matched = find_line_matches(&board);
            if matched.is_empty() {
                break;
            }
            for &(col, row) in &matched {
                board.set(col, row, Some(Cell::regular(rng.next_color(palette_size))));
            }
        }

        board
    }

    /// Calculate flat index from (col, row) coordinates
    #[inline(always)]
    fn index(col: i8, row: i8) -> Option<usize> {
        if col < 0 || col >= BOARD_COLS as i8 || row < 0 || row >= BOARD_ROWS as i8 {
            return None;
        }
        Some((col as usize) * (BOARD_ROWS as usize) + (row as usize))
    }

    pub fn cols(&self) -> u8 {
        BOARD_COLS
    }

    pub fn rows(&self) -> u8 {
        BOARD_ROWS
    }

    /// Get slot at (col, row); `None` when out of bounds
    pub fn get(&self, col: i8, row: i8) -> Option<Slot> {
        Self::index(col, row).map(|idx| self.cells[idx])
    }

    /// The cell at a key, flattened: `None` for out-of-bounds or empty slots
    pub fn cell_at(&self, key: CellKey) -> Option<Cell> {
        self.get(key.0, key.1).flatten()
    }

    /// Set slot at (col, row); returns false when out of bounds
    pub fn set(&mut self, col: i8, row: i8, slot: Slot) -> bool {
        match Self::index(col, row) {
            Some(idx) => {
                self.cells[idx] = slot;
                true
            }
            None => false,
        }
    }

    /// Check if position holds a cell (in bounds and occupied)
    pub fn is_occupied(&self, col: i8, row: i8) -> bool {
        matches!(self.get(col, row), Some(Some(_)))
    }

    /// True when no slot is empty
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|slot| slot.is_some())
    }

    /// All keys in column-major order (the canonical sweep order)
    pub fn keys() -> impl Iterator<Item = CellKey> {
        (0..BOARD_COLS as i8)
            .flat_map(|col| (0..BOARD_ROWS as i8).map(move |row| (col, row)))
    }

    /// Rotate cell data one generator step among the given slots; positions
    /// do not move. CW: slot i receives the contents of slot (i-1) mod n.
    /// Returns false (board untouched) if any slot is out of bounds or empty.
    pub fn rotate_slots(&mut self, keys: &[CellKey], clockwise: bool) -> bool {
        let n = keys.len();
        if n == 0 {
            return false;
        }

        let mut data = Vec::with_capacity(n);
        for &(col, row) in keys {
            match self.get(col, row) {
                Some(Some(cell)) => data.push(cell),
                _ => return false,
            }
        }

        for (i, &(col, row)) in keys.iter().enumerate() {
            let src = if clockwise { (i + n - 1) % n } else { (i + 1) % n };
            self.set(col, row, Some(data[src]));
        }

        true
    }

    /// Collapse every column: cells drop into the lowest empty slot below
    /// them, preserving order within the column. Returns the fall map
    /// (empty when nothing moved).
    pub fn apply_gravity(&mut self) -> Vec<FallStep> {
        let mut falls = Vec::new();

        for col in 0..BOARD_COLS as i8 {
            let mut write_row = BOARD_ROWS as i8 - 1;
            for row in (0..BOARD_ROWS as i8).rev() {
                if let Some(Some(cell)) = self.get(col, row) {
                    if row != write_row {
                        self.set(col, row, None);
                        self.set(col, write_row, Some(cell));
                        falls.push(FallStep {
                            col,
                            from_row: row,
                            to_row: write_row,
                            cell,
                        });
                    }
                    write_row -= 1;
                }
            }
        }

        falls
    }

    /// Fill every empty slot with a fresh random-color cell. Each new cell
    /// has an independent multiplier chance. When `spawn_bomb` is set and at
    /// least one slot was filled, one uniformly-random filled cell is
    /// promoted to a bomb. Returns the filled list and the bomb position.
    pub fn fill_empty(
        &mut self,
        rng: &mut SimpleRng,
        palette_size: u8,
        spawn_bomb: bool,
    ) -> (Vec<(CellKey, Cell)>, Option<CellKey>) {
        let mut filled = Vec::new();

        for (col, row) in Self::keys() {
            if matches!(self.get(col, row), Some(None)) {
                let color = rng.next_color(palette_size);
                let special = if rng.next_f64() < MULTIPLIER_SPAWN_P {
                    Special::Multiplier
                } else {
                    Special::None
                };
                let cell = Cell { color, special };
                self.set(col, row, Some(cell));
                filled.push(((col, row), cell));
            }
        }

        let mut bomb_pos = None;
        if spawn_bomb && !filled.is_empty() {
            let idx = rng.next_range(filled.len() as u64) as usize;
            let (key, cell) = filled[idx];
            let bomb = Cell::bomb(cell.color, BOMB_INITIAL_TIMER);
            self.set(key.0, key.1, Some(bomb));
            filled[idx].1 = bomb;
            bomb_pos = Some(key);
        }

        (filled, bomb_pos)
    }

    /// Read-only copy for game-over events and host rendering
    pub fn snapshot(&self) -> BoardSnapshot {
        let mut snap = BoardSnapshot::empty();
        for (col, row) in Self::keys() {
            snap.grid[col as usize][row as usize] = self.get(col, row).flatten();
        }
        snap
    }

    /// Count the number of occupied slots
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|slot| slot.is_some()).count()
    }

    /// Fill the whole board with one color (test scaffolding)
    #[cfg(test)]
    pub fn fill_solid(&mut self, color: i8) {
        for (col, row) in Self::keys() {
            self.set(col, row, Some(Cell::regular(color)));
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_new_empty() {
        let board = Board::new();
        assert_eq!(board.cols(), BOARD_COLS);
        assert_eq!(board.rows(), BOARD_ROWS);
        assert_eq!(board.occupied_count(), 0);

        for (col, row) in Board::keys() {
            assert_eq!(board.get(col, row), Some(None));
        }
    }

    #[test]
    fn test_board_set_and_get() {
        let mut board = Board::new();

        assert!(board.set(4, 4, Some(Cell::regular(2))));
        assert_eq!(board.get(4, 4), Some(Some(Cell::regular(2))));
        assert_eq!(board.cell_at((4, 4)), Some(Cell::regular(2)));

        // Out of bounds
        assert!(!board.set(-1, 0, Some(Cell::regular(0))));
        assert!(!board.set(9, 0, Some(Cell::regular(0))));
        assert_eq!(board.get(0, -1), None);
        assert_eq!(board.get(0, 9), None);
        assert_eq!(board.cell_at((9, 9)), None);
    }

    #[test]
    fn test_board_index() {
        assert_eq!(Board::index(0, 0), Some(0));
        assert_eq!(Board::index(0, 8), Some(8));
        assert_eq!(Board::index(1, 0), Some(9));
        assert_eq!(Board::index(8, 8), Some(80));

        assert_eq!(Board::index(-1, 0), None);
        assert_eq!(Board::index(9, 0), None);
        assert_eq!(Board::index(0, -1), None);
        assert_eq!(Board::index(0, 9), None);
    }

    #[test]
    fn test_new_random_full_and_matchless() {
        let mut rng = SimpleRng::new(12345);
        let board = Board::new_random(&mut rng, 5);

        assert!(board.is_full());
        for (col, row) in Board::keys() {
            let cell = board.cell_at((col, row)).unwrap();
            assert!(cell.is_well_formed(5));
            assert_eq!(cell.special, Special::None);
        }
        assert!(find_line_matches(&board).is_empty());
    }

    #[test]
    fn test_new_random_deterministic() {
        let mut rng1 = SimpleRng::new(777);
        let mut rng2 = SimpleRng::new(777);
        assert_eq!(Board::new_random(&mut rng1, 5), Board::new_random(&mut rng2, 5));
    }

    #[test]
    fn test_rotate_slots_cw_shift() {
        let mut board = Board::new();
        let keys = [(4, 4), (5, 4), (5, 3)];
        board.set(4, 4, Some(Cell::regular(0)));
        board.set(5, 4, Some(Cell::regular(1)));
        board.set(5, 3, Some(Cell::regular(2)));

        assert!(board.rotate_slots(&keys, true));

        // Slot i receives the contents of slot (i-1) mod 3
        assert_eq!(board.cell_at((4, 4)).unwrap().color, 2);
        assert_eq!(board.cell_at((5, 4)).unwrap().color, 0);
        assert_eq!(board.cell_at((5, 3)).unwrap().color, 1);
    }

    #[test]
    fn test_rotate_slots_ccw_reverses_cw() {
        let mut board = Board::new();
        let keys = [(4, 4), (5, 4), (5, 3)];
        board.set(4, 4, Some(Cell::regular(0)));
        board.set(5, 4, Some(Cell::bomb(1, 7)));
        board.set(5, 3, Some(Cell::multiplier(2)));
        let before = board.clone();

        assert!(board.rotate_slots(&keys, true));
        assert!(board.rotate_slots(&keys, false));
        assert_eq!(board, before);
    }

    #[test]
    fn test_rotate_slots_full_cycle_identity() {
        let mut board = Board::new();
        let cluster = [(4, 4), (5, 4), (5, 3)];
        board.set(4, 4, Some(Cell::regular(0)));
        board.set(5, 4, Some(Cell::regular(1)));
        board.set(5, 3, Some(Cell::regular(2)));
        let before = board.clone();

        for _ in 0..3 {
            assert!(board.rotate_slots(&cluster, true));
        }
        assert_eq!(board, before);

        let ring = [(5, 4), (5, 3), (4, 3), (3, 3), (3, 4), (4, 5)];
        for (i, &(c, r)) in ring.iter().enumerate() {
            board.set(c, r, Some(Cell::regular(i as i8 % 5)));
        }
        let before = board.clone();
        for _ in 0..6 {
            assert!(board.rotate_slots(&ring, false));
        }
        assert_eq!(board, before);
    }

    #[test]
    fn test_rotate_slots_rejects_empty_member() {
        let mut board = Board::new();
        board.set(4, 4, Some(Cell::regular(0)));
        board.set(5, 4, Some(Cell::regular(1)));
        // (5, 3) left empty
        let before = board.clone();

        assert!(!board.rotate_slots(&[(4, 4), (5, 4), (5, 3)], true));
        assert_eq!(board, before);
    }

    #[test]
    fn test_apply_gravity_collapses_columns() {
        let mut board = Board::new();
        board.set(3, 0, Some(Cell::regular(1)));
        board.set(3, 4, Some(Cell::regular(2)));

        let falls = board.apply_gravity();

        assert_eq!(board.cell_at((3, 8)).unwrap().color, 2);
        assert_eq!(board.cell_at((3, 7)).unwrap().color, 1);
        assert_eq!(board.get(3, 0), Some(None));
        assert_eq!(board.get(3, 4), Some(None));

        assert_eq!(falls.len(), 2);
        assert!(falls.contains(&FallStep {
            col: 3,
            from_row: 4,
            to_row: 8,
            cell: Cell::regular(2),
        }));
        assert!(falls.contains(&FallStep {
            col: 3,
            from_row: 0,
            to_row: 7,
            cell: Cell::regular(1),
        }));
    }

    #[test]
    fn test_apply_gravity_preserves_column_order() {
        let mut board = Board::new();
        board.set(2, 1, Some(Cell::regular(0)));
        board.set(2, 3, Some(Cell::regular(1)));
        board.set(2, 6, Some(Cell::regular(2)));

        board.apply_gravity();

        assert_eq!(board.cell_at((2, 8)).unwrap().color, 2);
        assert_eq!(board.cell_at((2, 7)).unwrap().color, 1);
        assert_eq!(board.cell_at((2, 6)).unwrap().color, 0);
    }

    #[test]
    fn test_apply_gravity_settled_board_is_noop() {
        let mut board = Board::new();
        board.fill_solid(3);
        let before = board.clone();

        assert!(board.apply_gravity().is_empty());
        assert_eq!(board, before);
    }

    #[test]
    fn test_gravity_invariant_no_hole_below_cell() {
        let mut board = Board::new();
        board.set(0, 2, Some(Cell::regular(0)));
        board.set(0, 5, Some(Cell::regular(1)));
        board.set(7, 0, Some(Cell::regular(2)));
        board.apply_gravity();

        for col in 0..BOARD_COLS as i8 {
            let mut seen_cell = false;
            for row in 0..BOARD_ROWS as i8 {
                match board.get(col, row) {
                    Some(Some(_)) => seen_cell = true,
                    Some(None) => assert!(!seen_cell, "hole below cell in col {}", col),
                    None => unreachable!(),
                }
            }
        }
    }

    #[test]
    fn test_fill_empty_fills_everything() {
        let mut board = Board::new();
        let mut rng = SimpleRng::new(42);

        let (filled, bomb) = board.fill_empty(&mut rng, 5, false);

        assert!(board.is_full());
        assert_eq!(filled.len(), BOARD_SIZE);
        assert_eq!(bomb, None);
        for &(key, cell) in &filled {
            assert_eq!(board.cell_at(key), Some(cell));
            assert!(!cell.special.is_bomb());
        }
    }

    #[test]
    fn test_fill_empty_spawns_at_most_one_bomb() {
        let mut board = Board::new();
        let mut rng = SimpleRng::new(42);

        let (filled, bomb) = board.fill_empty(&mut rng, 5, true);

        let pos = bomb.expect("a bomb should spawn when slots were filled");
        let bombs: Vec<_> = filled
            .iter()
            .filter(|(_, cell)| cell.special.is_bomb())
            .collect();
        assert_eq!(bombs.len(), 1);
        assert_eq!(bombs[0].0, pos);
        assert_eq!(
            board.cell_at(pos).unwrap().special.bomb_timer(),
            Some(BOMB_INITIAL_TIMER)
        );
    }

    #[test]
    fn test_fill_empty_no_bomb_on_full_board() {
        let mut board = Board::new();
        board.fill_solid(0);
        let mut rng = SimpleRng::new(42);

        let (filled, bomb) = board.fill_empty(&mut rng, 5, true);
        assert!(filled.is_empty());
        assert_eq!(bomb, None);
    }

    #[test]
    fn test_snapshot_mirrors_grid() {
        let mut board = Board::new();
        board.set(2, 7, Some(Cell::starflower()));
        board.set(8, 0, Some(Cell::bomb(4, 3)));

        let snap = board.snapshot();
        assert_eq!(snap.grid[2][7], Some(Cell::starflower()));
        assert_eq!(snap.grid[8][0], Some(Cell::bomb(4, 3)));
        assert_eq!(snap.grid[0][0], None);
    }
}
