pub mod challenges;
pub mod leaderboard;
pub mod profile;
pub mod results;
pub mod stats;
