//! Core module - the pure rules engine
//!
//! All game rules, state, and logic live here. No rendering, no input
//! capture, no I/O: the session consumes actions and emits events.

pub mod board;
pub mod cascade;
pub mod hex;
pub mod matcher;
pub mod rng;
pub mod rotation;
pub mod scoring;
pub mod session;
pub mod snapshot;
pub mod specials;

// Re-export commonly used types
pub use board::Board;
pub use cascade::{resolve_cascade, settle_specials, CascadeContext};
pub use hex::Layout;
pub use matcher::{find_line_matches, find_matches_for_mode, find_triangle_matches};
pub use rng::SimpleRng;
pub use rotation::{run_rotation, RotationOutcome, Selection};
pub use scoring::ScoreBoard;
pub use session::GameSession;
pub use snapshot::{RestoreError, SavedState};
pub use specials::{
    detect_black_pearls, detect_starflowers, detect_starflowers_at, find_multiplier_clusters,
    scan_black_pearls, scan_starflowers, tick_bombs,
};
