pub mod commit;
pub mod issue;
pub mod modifications;
pub mod summary;
