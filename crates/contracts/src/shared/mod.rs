pub mod envelope;
pub mod error;
pub mod metadata;
pub mod path;
pub mod permissions;
pub mod query;
pub mod upload;
