//! hexfall - deterministic rules engine for a hexagonal tile-matching game
//!
//! The engine is a pure transition function: a board state plus a player
//! action produces the next board state and a transcript of game events.
//! Given the same seed and action sequence, every replay yields identical
//! output. Rendering, animation, and input capture are host concerns driven
//! by the emitted events.

pub mod core;
pub mod events;
pub mod types;

pub use crate::core::{GameSession, Layout, Selection};
pub use crate::events::{GameEvent, GameOverReason};
pub use crate::types::{Action, Direction, GameMode, MatchMode, ModeConfig, Phase, SessionConfig};
