// Re-export internals for use under showcase_server crate namespace
// Mainly for use in tests
pub mod apidocs;
pub mod error;
pub mod media;
pub mod options;
pub mod records;
pub mod sequence;
pub mod store;
