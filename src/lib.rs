pub mod commands;
pub mod correlation;
pub mod models;
pub mod sources;
