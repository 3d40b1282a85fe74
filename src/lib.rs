pub mod analysis;
pub mod config;
pub mod data;
pub mod output;
pub mod report;
pub mod state;
pub mod ui;
