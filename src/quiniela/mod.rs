// Public API - what other modules can use
pub use handlers::{
    add_match, calculate_results, clear_result, create_quiniela, delete_quiniela, get_quiniela,
    global_leaderboard, join_quiniela, leaderboard, leave_quiniela, list_quinielas, record_result,
    remove_match, remove_participant, submit_prediction, update_match, user_stats,
};
pub use service::QuinielaService;

// Internal modules
pub mod clock;
mod handlers;
pub mod models;
pub mod repository;
mod service;
pub mod types;
