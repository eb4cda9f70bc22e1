//! Session module - the top-level game orchestrator
//!
//! Owns the board, RNG, and score state, and drives the phase machine
//! `Idle -> Selected -> Rotating -> Cascading -> (Idle | GameOver)`.
//! Every player action is processed synchronously to completion and returns
//! the event transcript for that transition. Actions invalid for the
//! current phase are silently ignored.

use crate::core::board::Board;
use crate::core::cascade::{resolve_cascade, settle_specials, CascadeContext};
use crate::core::hex::{self, Layout};
use crate::core::rng::SimpleRng;
use crate::core::rotation::{run_rotation, RotationOutcome, Selection};
use crate::core::scoring::ScoreBoard;
use crate::core::snapshot::{RestoreError, SavedState};
use crate::core::specials;
use crate::events::{GameEvent, GameOverReason};
use crate::types::{
    Action, CellKey, Direction, Phase, SessionConfig, Slot, BOARD_COLS, BOARD_ROWS,
    BOMB_INTERVAL_BASE, BOMB_INTERVAL_FLOOR, BOMB_INTERVAL_SCORE_STEP,
};

/// One game from start to game-over; multiple sessions can coexist
#[derive(Debug, Clone)]
pub struct GameSession {
    config: SessionConfig,
    layout: Layout,
    board: Board,
    rng: SimpleRng,
    scoring: ScoreBoard,
    move_count: u32,
    bomb_queued: bool,
    phase: Phase,
    selection: Option<Selection>,
}

impl GameSession {
    /// Start a fresh session with the given seed
    pub fn new(config: SessionConfig, seed: u64) -> Self {
        let mut rng = SimpleRng::new(seed);
        let board = Board::new_random(&mut rng, config.palette_size);
        log::info!("new session, mode {}", config.mode.mode_id());

        Self {
            config,
            layout: Layout::default(),
            board,
            rng,
            scoring: ScoreBoard::new(),
            move_count: 0,
            bomb_queued: false,
            phase: Phase::Idle,
            selection: None,
        }
    }

    /// Rebuild a session from a saved record. Fails on any invariant
    /// violation; the engine never continues from partially-valid state.
    pub fn restore(saved: &SavedState, config: SessionConfig) -> Result<Self, RestoreError> {
        saved.validate_mode(config.mode)?;
        // Bombs never tick in modes without them; convert on load
        let convert_bombs = !config.mode.game.has_bombs();
        let board = saved.validate_grid(config.palette_size, convert_bombs)?;

        Ok(Self {
            config,
            layout: Layout::default(),
            board,
            rng: SimpleRng::new(saved.rng_seed.unwrap_or(1)),
            scoring: ScoreBoard::restore(saved.score, saved.chain_level, saved.combo_count),
            move_count: saved.move_count,
            bomb_queued: false,
            phase: Phase::Idle,
            selection: None,
        })
    }

    /// Restore, or fall back to a fresh session with a single
    /// `RestoreFailed` event for the host
    pub fn restore_or_new(
        saved: Option<&SavedState>,
        config: SessionConfig,
        seed: u64,
    ) -> (Self, Vec<GameEvent>) {
        match saved {
            Some(saved) => match Self::restore(saved, config) {
                Ok(session) => (session, Vec::new()),
                Err(err) => {
                    log::warn!("restore failed: {err}");
                    (
                        Self::new(config, seed),
                        vec![GameEvent::RestoreFailed {
                            reason: err.to_string(),
                        }],
                    )
                }
            },
            None => (Self::new(config, seed), Vec::new()),
        }
    }

    /// Export the session in the persistent layout
    pub fn save(&self) -> SavedState {
        let mut grid: Vec<Vec<Slot>> =
            vec![vec![None; BOARD_ROWS as usize]; BOARD_COLS as usize];
        for (col, row) in Board::keys() {
            grid[col as usize][row as usize] = self.board.get(col, row).flatten();
        }

        SavedState {
            grid,
            move_count: self.move_count,
            score: self.scoring.score(),
            display_score: self.scoring.score(),
            chain_level: self.scoring.chain_level(),
            combo_count: self.scoring.combo_count(),
            rng_seed: Some(self.rng.state()),
            mode_id: self.config.mode.mode_id(),
        }
    }

    /// The pixel layout used to interpret `Select` coordinates
    pub fn set_layout(&mut self, layout: Layout) {
        self.layout = layout;
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn score(&self) -> u32 {
        self.scoring.score()
    }

    pub fn chain_level(&self) -> u32 {
        self.scoring.chain_level()
    }

    pub fn combo_count(&self) -> u32 {
        self.scoring.combo_count()
    }

    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    pub fn rng_state(&self) -> u64 {
        self.rng.state()
    }

    /// Process one player action to completion, returning the transcript
    pub fn apply_action(&mut self, action: Action) -> Vec<GameEvent> {
        let mut events = Vec::new();

        match action {
            Action::Select { x, y } if matches!(self.phase, Phase::Idle | Phase::Selected) => {
                self.handle_select(x, y, &mut events);
            }
            Action::Rotate(direction) if self.phase == Phase::Selected => {
                self.handle_rotate(direction, &mut events);
            }
            Action::EndSession if self.config.mode.game.allows_end_session() => {
                log::info!("session ended after {} moves", self.move_count);
                self.selection = None;
                self.phase = Phase::GameOver;
                events.push(GameEvent::GameOver {
                    reason: GameOverReason::SessionEnded,
                });
                events.push(GameEvent::PhaseChanged {
                    phase: Phase::GameOver,
                });
            }
            Action::NewGame => self.handle_new_game(&mut events),
            // Invalid action for the current phase: not an error
            _ => {}
        }

        events
    }

    fn set_phase(&mut self, phase: Phase, events: &mut Vec<GameEvent>) {
        if self.phase != phase {
            self.phase = phase;
            events.push(GameEvent::PhaseChanged { phase });
        }
    }

    /// Resolve what a pixel picks up: black pearl first, then starflower,
    /// then the nearest 3-cluster
    fn selection_at(&self, x: f32, y: f32) -> Option<Selection> {
        if let Some(key) = hex::pixel_to_hex(x, y, &self.layout) {
            if let Some(cell) = self.board.cell_at(key) {
                if cell.is_black_pearl() {
                    if let Some(selection) = self.y_selection(key) {
                        return Some(selection);
                    }
                } else if cell.is_starflower() {
                    if let Some(selection) = self.ring_selection(key) {
                        return Some(selection);
                    }
                }
            }
        }
        hex::find_cluster_at_pixel(x, y, &self.layout).map(Selection::Cluster)
    }

    fn ring_selection(&self, center: CellKey) -> Option<Selection> {
        let ring = hex::neighbors(center.0, center.1);
        ring.iter()
            .all(|&(col, row)| self.board.is_occupied(col, row))
            .then_some(Selection::Ring { center, ring })
    }

    fn y_selection(&self, center: CellKey) -> Option<Selection> {
        let ring = hex::neighbors(center.0, center.1);
        let arms = [ring[0], ring[2], ring[4]];
        arms.iter()
            .all(|&(col, row)| self.board.is_occupied(col, row))
            .then_some(Selection::Y { center, arms })
    }

    fn handle_select(&mut self, x: f32, y: f32, events: &mut Vec<GameEvent>) {
        let Some(new_selection) = self.selection_at(x, y) else {
            return;
        };

        if self.selection == Some(new_selection) {
            // Re-selecting the same thing drops it
            self.selection = None;
            self.set_phase(Phase::Idle, events);
        } else {
            self.selection = Some(new_selection);
            self.set_phase(Phase::Selected, events);
        }
    }

    fn handle_rotate(&mut self, direction: Direction, events: &mut Vec<GameEvent>) {
        let Some(selection) = self.selection else {
            return;
        };

        self.set_phase(Phase::Rotating, events);
        let outcome = run_rotation(
            &mut self.board,
            &selection,
            direction,
            self.config.mode.match_mode,
        );

        // Per-move house-keeping, once per Rotating -> * transition
        self.move_count += 1;
        if self.config.mode.game.has_bombs() {
            if self.tick_bombs(events) {
                return;
            }
            if self.move_count % self.bomb_interval() == 0 {
                self.bomb_queued = true;
            }
        }

        match outcome {
            RotationOutcome::Matches(initial) => {
                self.selection = None;
                self.set_phase(Phase::Cascading, events);
                let mut ctx = CascadeContext {
                    board: &mut self.board,
                    rng: &mut self.rng,
                    scoring: &mut self.scoring,
                    match_mode: self.config.mode.match_mode,
                    palette_size: self.config.palette_size,
                    bombs_enabled: self.config.mode.game.has_bombs(),
                    bomb_queued: &mut self.bomb_queued,
                };
                resolve_cascade(&mut ctx, initial, events);
                self.set_phase(Phase::Idle, events);
            }
            RotationOutcome::Specials => {
                self.selection = None;
                self.set_phase(Phase::Cascading, events);
                let mut ctx = CascadeContext {
                    board: &mut self.board,
                    rng: &mut self.rng,
                    scoring: &mut self.scoring,
                    match_mode: self.config.mode.match_mode,
                    palette_size: self.config.palette_size,
                    bombs_enabled: self.config.mode.game.has_bombs(),
                    bomb_queued: &mut self.bomb_queued,
                };
                settle_specials(&mut ctx, events);
                self.set_phase(Phase::Idle, events);
            }
            RotationOutcome::FullCycle => {
                // Silent full cycle: the board is back where it was, the
                // move still counted and bombs still ticked
                self.set_phase(Phase::Selected, events);
            }
        }
    }

    /// Tick every bomb; returns true when the session just ended
    fn tick_bombs(&mut self, events: &mut Vec<GameEvent>) -> bool {
        let report = specials::tick_bombs(&mut self.board);
        for &(pos, remaining) in &report.ticked {
            events.push(GameEvent::BombTicked { pos, remaining });
        }

        if report.expired.is_empty() {
            return false;
        }

        if self.config.mode.game.has_game_over() {
            let pos = report.expired[0];
            log::info!("bomb expired at {:?} on move {}", pos, self.move_count);
            self.selection = None;
            self.phase = Phase::GameOver;
            events.push(GameEvent::GameOver {
                reason: GameOverReason::BombExpired {
                    pos,
                    board: Box::new(self.board.snapshot()),
                },
            });
            events.push(GameEvent::PhaseChanged {
                phase: Phase::GameOver,
            });
            true
        } else {
            for &pos in &report.expired {
                specials::defuse_bomb(&mut self.board, pos);
            }
            false
        }
    }

    /// Moves between bomb spawns, tightening as the score climbs
    fn bomb_interval(&self) -> u32 {
        BOMB_INTERVAL_BASE
            .saturating_sub(self.scoring.score() / BOMB_INTERVAL_SCORE_STEP)
            .max(BOMB_INTERVAL_FLOOR)
    }

    fn handle_new_game(&mut self, events: &mut Vec<GameEvent>) {
        self.board = Board::new_random(&mut self.rng, self.config.palette_size);
        self.scoring.reset();
        self.move_count = 0;
        self.bomb_queued = false;
        self.selection = None;
        self.set_phase(Phase::Idle, events);
    }
}
