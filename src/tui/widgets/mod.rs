pub mod dashboard;
pub mod lessons;
pub mod player;
