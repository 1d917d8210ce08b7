//! CLI command implementations.

pub mod docs;
pub mod init;
pub mod overlay;
pub mod version;
