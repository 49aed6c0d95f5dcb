pub mod db;
pub mod links;
pub mod settings;
pub mod summary;
