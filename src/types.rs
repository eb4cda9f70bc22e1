//! Core types shared across the engine
//! This module contains pure data types with no game logic

use serde::{Deserialize, Serialize};

/// Board dimensions
pub const BOARD_COLS: u8 = 9;
pub const BOARD_ROWS: u8 = 9;

/// Palette sizes (teal tile enables the sixth color)
pub const PALETTE_DEFAULT: u8 = 5;
pub const PALETTE_EXTENDED: u8 = 6;

/// Color sentinels for special tiles
pub const COLOR_STARFLOWER: i8 = -1;
pub const COLOR_BLACK_PEARL: i8 = -2;

/// Bomb constants
pub const BOMB_INITIAL_TIMER: u32 = 15;
pub const BOMB_INTERVAL_BASE: u32 = 15;
pub const BOMB_INTERVAL_FLOOR: u32 = 4;
pub const BOMB_INTERVAL_SCORE_STEP: u32 = 5000;

/// Refill constants
pub const MULTIPLIER_SPAWN_P: f64 = 0.05;

/// Scoring: base points for match sizes 3, 4, 5; larger runs extrapolate as n*10
pub const SCORE_BASE: [u32; 3] = [5, 10, 20];
pub const CHAIN_MULTIPLIER_BASE: f64 = 1.5;

/// Initial-board re-roll is fix-point iterated up to this many passes
pub const BOARD_REROLL_PASSES: u32 = 100;

/// A grid position as (col, row); columns are the outer index
pub type CellKey = (i8, i8);

/// A board slot: `None` means empty (only transiently, during cascades)
pub type Slot = Option<Cell>;

/// Special tile kinds; the bomb timer lives inside the variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Special {
    None,
    Starflower,
    BlackPearl,
    Bomb { timer: u32 },
    Multiplier,
}

impl Special {
    pub fn is_bomb(&self) -> bool {
        matches!(self, Special::Bomb { .. })
    }

    pub fn bomb_timer(&self) -> Option<u32> {
        match self {
            Special::Bomb { timer } => Some(*timer),
            _ => None,
        }
    }
}

/// An occupied grid square
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// `0..K` for regular tiles; -1 = starflower, -2 = black pearl
    pub color: i8,
    pub special: Special,
}

impl Cell {
    /// A plain colored tile
    pub fn regular(color: i8) -> Self {
        Self {
            color,
            special: Special::None,
        }
    }

    pub fn starflower() -> Self {
        Self {
            color: COLOR_STARFLOWER,
            special: Special::Starflower,
        }
    }

    pub fn black_pearl() -> Self {
        Self {
            color: COLOR_BLACK_PEARL,
            special: Special::BlackPearl,
        }
    }

    pub fn bomb(color: i8, timer: u32) -> Self {
        Self {
            color,
            special: Special::Bomb { timer },
        }
    }

    pub fn multiplier(color: i8) -> Self {
        Self {
            color,
            special: Special::Multiplier,
        }
    }

    /// True for starflowers and black pearls, which never join matches
    pub fn is_blocker(&self) -> bool {
        self.color < 0
    }

    pub fn is_starflower(&self) -> bool {
        self.special == Special::Starflower
    }

    pub fn is_black_pearl(&self) -> bool {
        self.special == Special::BlackPearl
    }

    /// Cell-level invariants from the data model
    pub fn is_well_formed(&self, palette_size: u8) -> bool {
        match self.special {
            Special::Starflower => self.color == COLOR_STARFLOWER,
            Special::BlackPearl => self.color == COLOR_BLACK_PEARL,
            Special::Bomb { timer } => timer > 0 && self.color_in_palette(palette_size),
            Special::None | Special::Multiplier => self.color_in_palette(palette_size),
        }
    }

    fn color_in_palette(&self, palette_size: u8) -> bool {
        self.color >= 0 && (self.color as u8) < palette_size
    }
}

/// Game mode: bombs and game-over are arcade concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameMode {
    Arcade,
    Chill,
}

impl GameMode {
    pub fn has_bombs(&self) -> bool {
        matches!(self, GameMode::Arcade)
    }

    pub fn has_game_over(&self) -> bool {
        matches!(self, GameMode::Arcade)
    }

    pub fn allows_end_session(&self) -> bool {
        matches!(self, GameMode::Chill)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Arcade => "arcade",
            GameMode::Chill => "chill",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "arcade" => Some(GameMode::Arcade),
            "chill" => Some(GameMode::Chill),
            _ => None,
        }
    }
}

/// Match mode: axial line runs or mutual-adjacency triples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchMode {
    Line,
    Triangle,
}

impl MatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMode::Line => "line",
            MatchMode::Triangle => "triangle",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "line" => Some(MatchMode::Line),
            "triangle" => Some(MatchMode::Triangle),
            _ => None,
        }
    }
}

/// The orthogonal mode pair a session runs under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModeConfig {
    pub game: GameMode,
    pub match_mode: MatchMode,
}

impl ModeConfig {
    pub fn new(game: GameMode, match_mode: MatchMode) -> Self {
        Self { game, match_mode }
    }

    /// Combined id used by hosts for high-score bucketing, e.g. "arcade_line"
    pub fn mode_id(&self) -> String {
        format!("{}_{}", self.game.as_str(), self.match_mode.as_str())
    }

    pub fn from_mode_id(id: &str) -> Option<Self> {
        let (game, match_mode) = id.split_once('_')?;
        Some(Self {
            game: GameMode::from_str(game)?,
            match_mode: MatchMode::from_str(match_mode)?,
        })
    }
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self {
            game: GameMode::Arcade,
            match_mode: MatchMode::Line,
        }
    }
}

/// Session configuration fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub mode: ModeConfig,
    pub palette_size: u8,
}

impl SessionConfig {
    pub fn new(mode: ModeConfig) -> Self {
        Self {
            mode,
            palette_size: PALETTE_DEFAULT,
        }
    }

    pub fn with_palette(mut self, palette_size: u8) -> Self {
        self.palette_size = palette_size;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(ModeConfig::default())
    }
}

/// Rotation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Cw,
    Ccw,
}

/// Top-level session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Idle,
    Selected,
    Rotating,
    Cascading,
    GameOver,
}

/// Player actions consumed by the session
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Pick up (or drop) a selection at a pixel position
    Select { x: f32, y: f32 },
    /// Rotate the current selection one generator cycle
    Rotate(Direction),
    /// End the session early (chill mode only)
    EndSession,
    /// Discard the board and start over, reusing the session RNG stream
    NewGame,
}
