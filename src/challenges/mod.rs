//! Challenge domain services
//!
//! - **service**: create/join/leave and the member-facing query surface
//! - **records**: folds activity submissions into per-day records and
//!   marks goals passed (the record aggregator)
//! - **progress**: challenge-wide completion percentage and the pass rule
//! - **ranking**: contribution aggregation and leaderboard rank

pub mod progress;
pub mod ranking;
pub mod records;
pub mod service;

pub use progress::{evaluate_pass, progress_percentage, ProgressCalculator};
pub use ranking::{Contribution, MemberStanding, RankingService};
pub use records::RecordService;
pub use service::{ChallengeService, NewChallenge};
