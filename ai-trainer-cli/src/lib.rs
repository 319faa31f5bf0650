// Library exports for the AI Trainer CLI
// This allows testing of internal modules

pub mod api;
pub mod audio;
pub mod commands;
pub mod config;
pub mod models;
pub mod storage;
pub mod ui;
pub mod workout;
