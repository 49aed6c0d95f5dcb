pub mod engine;
pub mod keys;
pub mod tokens;
