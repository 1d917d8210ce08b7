//! Giltfile schema, loading and validation.
//!
//! A Giltfile is a YAML document listing the git repositories to overlay,
//! the version each one is pinned to, and where its contents land.

pub mod path;
pub mod schema;
pub mod validate;

pub use path::{expand_user, expand_user_with, PathError};
pub use schema::{
    load, parse, Command, ConfigError, Repositories, Repository, Source, DEFAULT_GILTFILE,
    DEFAULT_GILT_DIR, DEFAULT_GILT_FILE,
};
pub use validate::{validate, FieldError, ValidationError};
