//! revdash: per-weekday revenue breakdown for one user, in the terminal

pub mod cli;
pub mod config;
pub mod gateway;
pub mod logging;
pub mod services;
pub mod tui;
pub mod types;
