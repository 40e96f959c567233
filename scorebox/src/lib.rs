pub mod config;
pub mod match_manager;
pub mod mirror;
pub mod score_keeper;
pub mod store;
