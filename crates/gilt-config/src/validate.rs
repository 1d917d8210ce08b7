//! Giltfile validation.
//!
//! All violations are collected so a broken Giltfile is reported in one pass.

use std::fmt;
use std::path::Path;

use crate::schema::{Command, Repositories, Repository, Source};

/// A single failed rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Field path, e.g. `repositories[0].sources[1].dstDir`
    pub field: String,

    /// Rule description, e.g. `is required`
    pub rule: &'static str,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.rule)
    }
}

/// Every rule a configuration violated, one per line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", join(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

fn join(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

const REQUIRED: &str = "is required";
const EXACTLY_ONE_DST: &str = "exactly one of dstDir or sources must be set";
const EXACTLY_ONE_SOURCE_DST: &str = "exactly one of dstFile or dstDir must be set";
const NOT_DOT: &str = "must not be '.' or '..'";

/// Validate a whole overlay configuration.
pub fn validate(config: &Repositories) -> Result<(), ValidationError> {
    let mut errors = Vec::new();

    if config.gilt_file.as_os_str().is_empty() {
        errors.push(field_error("giltFile", REQUIRED));
    }
    if config.gilt_dir.as_os_str().is_empty() {
        errors.push(field_error("giltDir", REQUIRED));
    }
    if config.repositories.is_empty() {
        errors.push(field_error("repositories", REQUIRED));
    }

    for (i, repo) in config.repositories.iter().enumerate() {
        validate_repository(repo, &format!("repositories[{i}]"), &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { errors })
    }
}

fn validate_repository(repo: &Repository, prefix: &str, errors: &mut Vec<FieldError>) {
    if repo.git.is_empty() {
        errors.push(field_error(&format!("{prefix}.git"), REQUIRED));
    }
    if repo.version.is_empty() {
        errors.push(field_error(&format!("{prefix}.version"), REQUIRED));
    }

    if repo.dst_dir.is_some() == !repo.sources.is_empty() {
        errors.push(field_error(&format!("{prefix}.dstDir"), EXACTLY_ONE_DST));
    }
    if repo.dst_dir.as_deref().is_some_and(is_dot) {
        errors.push(field_error(&format!("{prefix}.dstDir"), NOT_DOT));
    }

    for (i, source) in repo.sources.iter().enumerate() {
        validate_source(source, &format!("{prefix}.sources[{i}]"), errors);
    }
    for (i, command) in repo.commands.iter().enumerate() {
        validate_command(command, &format!("{prefix}.commands[{i}]"), errors);
    }
}

fn validate_source(source: &Source, prefix: &str, errors: &mut Vec<FieldError>) {
    if source.src.is_empty() {
        errors.push(field_error(&format!("{prefix}.src"), REQUIRED));
    }
    if source.dst_file.is_some() == source.dst_dir.is_some() {
        errors.push(field_error(&format!("{prefix}.dstFile"), EXACTLY_ONE_SOURCE_DST));
    }
    if source.dst_dir.as_deref().is_some_and(is_dot) {
        errors.push(field_error(&format!("{prefix}.dstDir"), NOT_DOT));
    }
}

fn validate_command(command: &Command, prefix: &str, errors: &mut Vec<FieldError>) {
    if command.cmd.is_empty() {
        errors.push(field_error(&format!("{prefix}.cmd"), REQUIRED));
    }
}

fn is_dot(path: &Path) -> bool {
    path == Path::new(".") || path == Path::new("..")
}

fn field_error(field: &str, rule: &'static str) -> FieldError {
    FieldError {
        field: field.to_string(),
        rule,
    }
}
