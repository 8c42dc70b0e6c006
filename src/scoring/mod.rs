//! Prediction scoring engine.
//!
//! Pure, synchronous functions over in-memory snapshots of a quiniela. Nothing
//! here performs I/O or holds state; callers load a snapshot, apply these
//! functions and persist the result.

mod outcome;
mod points;
mod ranking;
mod recompute;

pub use outcome::{classify, Outcome};
pub use points::{point_table, score};
pub use ranking::{
    global_leaderboard, rank_participants, user_performance, GlobalStanding, LeaderboardEntry,
    PoolPerformance,
};
pub use recompute::{recompute_all, recompute_participant, remove_match};
