pub mod side;

pub mod bundles;

pub mod ball;

pub mod innings;

pub mod match_state;

pub mod summary;

pub mod config;
