//! Cascade module - resolves one player move end-to-end
//!
//! The pipeline per cascade level is fixed: expand the match set by special
//! interactions, award score, clear, mid-cascade specials, gravity, refill,
//! post-settle specials, chain advance, then look for next-level matches.
//! Later steps assume the state left by earlier ones, so the order must not
//! change. Implemented as an explicit work loop rather than recursion so
//! long cascades cannot grow the stack.

use std::collections::BTreeSet;

use crate::core::board::Board;
use crate::core::hex::{self, Layout};
use crate::core::matcher::find_matches_for_mode;
use crate::core::rng::SimpleRng;
use crate::core::scoring::ScoreBoard;
use crate::core::specials::{
    detect_black_pearls, detect_starflowers, detect_starflowers_at, find_multiplier_clusters,
};
use crate::events::GameEvent;
use crate::types::{CellKey, MatchMode, Special};

/// Everything the resolver mutates while processing one move
pub struct CascadeContext<'a> {
    pub board: &'a mut Board,
    pub rng: &'a mut SimpleRng,
    pub scoring: &'a mut ScoreBoard,
    pub match_mode: MatchMode,
    pub palette_size: u8,
    pub bombs_enabled: bool,
    pub bomb_queued: &'a mut bool,
}

/// Centroid of a key set in unit-layout space (hosts scale by their layout)
fn centroid(cells: &BTreeSet<CellKey>) -> (f32, f32) {
    if cells.is_empty() {
        return (0.0, 0.0);
    }
    let layout = Layout::default();
    let (mut sx, mut sy) = (0.0f32, 0.0f32);
    for &key in cells {
        let (x, y) = hex::hex_to_pixel(key, &layout);
        sx += x;
        sy += y;
    }
    let n = cells.len() as f32;
    (sx / n, sy / n)
}

/// Step 1: grow the pending set by multiplier clusters, color nukes, and
/// explosions; returns the score bonus factor
fn expand_pending(board: &Board, pending: &mut BTreeSet<CellKey>) -> f64 {
    let mut bonus = 1.0f64;
    let mut nuke_colors: BTreeSet<i8> = BTreeSet::new();
    let mut explosion_sources: BTreeSet<CellKey> = BTreeSet::new();

    // Multiplier cells that were matched directly (before cluster expansion)
    let matched_multipliers: Vec<CellKey> = pending
        .iter()
        .copied()
        .filter(|&key| {
            board
                .cell_at(key)
                .is_some_and(|cell| cell.special == Special::Multiplier)
        })
        .collect();

    let mut cluster_members: BTreeSet<CellKey> = BTreeSet::new();
    for cluster in find_multiplier_clusters(board) {
        bonus += 0.5 * cluster.len() as f64;

        let colors: BTreeSet<i8> = cluster
            .iter()
            .filter_map(|&key| board.cell_at(key))
            .map(|cell| cell.color)
            .collect();
        if colors.len() == 1 {
            nuke_colors.extend(colors);
        } else {
            explosion_sources.extend(cluster.iter().copied());
        }

        cluster_members.extend(cluster.iter().copied());
        pending.extend(cluster);
    }

    // Directly matched multipliers add a flat half each; cluster members
    // were already counted through the cluster term
    bonus += 0.5
        * matched_multipliers
            .iter()
            .filter(|key| !cluster_members.contains(*key))
            .count() as f64;

    // A bomb and a multiplier of the same color in pending nukes that color
    let mut bomb_colors: BTreeSet<i8> = BTreeSet::new();
    let mut mult_colors: BTreeSet<i8> = BTreeSet::new();
    for &key in pending.iter() {
        if let Some(cell) = board.cell_at(key) {
            match cell.special {
                Special::Bomb { .. } => {
                    bomb_colors.insert(cell.color);
                }
                Special::Multiplier => {
                    mult_colors.insert(cell.color);
                }
                _ => {}
            }
        }
    }
    nuke_colors.extend(bomb_colors.intersection(&mult_colors));

    // Color nuke: every regular cell of a nuked color, board-wide
    if !nuke_colors.is_empty() {
        for key in Board::keys() {
            if let Some(cell) = board.cell_at(key) {
                if cell.color >= 0 && nuke_colors.contains(&cell.color) {
                    pending.insert(key);
                }
            }
        }
    }

    // Explosions take each occupied neighbor; pearls are indestructible
    for &src in &explosion_sources {
        for key in hex::neighbors_in_bounds(src.0, src.1) {
            if let Some(cell) = board.cell_at(key) {
                if !cell.is_black_pearl() {
                    pending.insert(key);
                }
            }
        }
    }

    bonus
}

/// Settle whole-board specials after the board is full again: starflower
/// births (the resolver clears their rings), then black pearls, looping
/// until quiescent since each wave can enable the next. Returns true when
/// anything changed.
pub fn settle_specials(ctx: &mut CascadeContext, events: &mut Vec<GameEvent>) -> bool {
    let mut any = false;

    loop {
        let mut changed = false;

        for birth in detect_starflowers(ctx.board) {
            events.push(GameEvent::StarflowerBorn {
                center: birth.center,
                ring: birth.ring,
                ring_color: birth.ring_color,
            });
            for &(col, row) in &birth.ring {
                if ctx.board.is_occupied(col, row) {
                    ctx.board.set(col, row, None);
                }
            }
            changed = true;
        }

        for birth in detect_black_pearls(ctx.board) {
            events.push(GameEvent::BlackPearlBorn {
                center: birth.center,
                absorbed_ring: birth.ring,
            });
            changed = true;
        }

        if !changed {
            break;
        }
        any = true;

        let falls = ctx.board.apply_gravity();
        if !falls.is_empty() {
            events.push(GameEvent::Gravity { falls });
        }
        refill(ctx, events);
    }

    any
}

/// Step 6: fill empties, honouring the queued-bomb flag in bomb modes
fn refill(ctx: &mut CascadeContext, events: &mut Vec<GameEvent>) {
    let spawn_bomb = ctx.bombs_enabled && *ctx.bomb_queued;
    let (filled, bomb_pos) = ctx.board.fill_empty(ctx.rng, ctx.palette_size, spawn_bomb);
    if !filled.is_empty() {
        events.push(GameEvent::Refilled { cells: filled });
    }
    if let Some(pos) = bomb_pos {
        *ctx.bomb_queued = false;
        events.push(GameEvent::BombSpawned { pos });
    }
}

/// Resolve a full cascade starting from an initial match set.
/// Returns the number of cascade levels processed.
pub fn resolve_cascade(
    ctx: &mut CascadeContext,
    initial: BTreeSet<CellKey>,
    events: &mut Vec<GameEvent>,
) -> usize {
    let mut level_matches = initial;
    let mut levels = 0usize;

    while !level_matches.is_empty() {
        levels += 1;
        let mut pending = level_matches;

        // 1. Special interactions grow the pending set
        let bonus = expand_pending(ctx.board, &mut pending);

        // 2. Score
        let points = ctx.scoring.award_match(pending.len(), bonus);
        events.push(GameEvent::Matched {
            cells: pending.clone(),
            points,
            chain_level: ctx.scoring.chain_level(),
            centroid: centroid(&pending),
        });
        events.push(GameEvent::ScoreChanged {
            score: ctx.scoring.score(),
        });

        // 3. Clear
        for &key in &pending {
            if ctx.board.cell_at(key).is_some() {
                ctx.board.set(key.0, key.1, None);
            } else {
                events.push(GameEvent::InvariantViolated { pos: key });
            }
        }
        events.push(GameEvent::Cleared {
            cells: pending.clone(),
        });

        // 4. Mid-cascade specials: births in the just-cleared gaps. Their
        // rings are not cleared here; the ring was the cleared set.
        let gap_births = detect_starflowers_at(ctx.board, &pending);
        for birth in &gap_births {
            events.push(GameEvent::StarflowerBorn {
                center: birth.center,
                ring: birth.ring,
                ring_color: birth.ring_color,
            });
        }
        if !gap_births.is_empty() {
            for birth in detect_black_pearls(ctx.board) {
                events.push(GameEvent::BlackPearlBorn {
                    center: birth.center,
                    absorbed_ring: birth.ring,
                });
            }
        }

        // 5. Gravity
        let falls = ctx.board.apply_gravity();
        if !falls.is_empty() {
            events.push(GameEvent::Gravity { falls });
        }

        // 6. Refill
        refill(ctx, events);

        // 7. Post-settle specials
        settle_specials(ctx, events);

        // 8. Chain advance
        let level = ctx.scoring.advance_chain();
        events.push(GameEvent::ChainAdvanced { level });

        // 9. Next-level matches
        level_matches = find_matches_for_mode(ctx.board, ctx.match_mode);
        log::debug!(
            "cascade level {} cleared {} cells, {} follow-up matches",
            levels,
            pending.len(),
            level_matches.len()
        );
    }

    ctx.scoring.reset_chain();
    levels
}
