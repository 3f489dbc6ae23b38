//! Staging file naming.
//!
//! A staging file is a sibling of its target, named
//! `.<tag>-<target file name>`. The tag is the owning transaction's id,
//! which keeps concurrent writers of the same target on distinct paths.
//! Tags never contain `-`, so the name splits back unambiguously.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Leading character of every staging file name.
pub const STAGING_PREFIX: char = '.';

/// Returns the staging path used to prepare new content for `target`.
#[must_use]
pub fn staging_path(target: &Path, tag: &str) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!("{STAGING_PREFIX}{tag}-{name}"))
}

/// Returns true if `name` is a staging (hidden) file name.
#[must_use]
pub fn is_staging_name(name: &OsStr) -> bool {
    name.to_str()
        .is_some_and(|n| n.starts_with(STAGING_PREFIX))
}

/// Returns true if `tag` has the shape of a transaction id: 32 hex digits.
#[must_use]
pub fn is_transaction_tag(tag: &str) -> bool {
    tag.len() == 32 && tag.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Returns true if `name` is a staging file written by a transaction, as
/// opposed to any other hidden file.
#[must_use]
pub fn is_transaction_staging_name(name: &str) -> bool {
    split_staging_name(name).is_some_and(|(tag, _)| is_transaction_tag(tag))
}

/// Splits a staging file name into `(tag, target file name)`.
///
/// Returns `None` if `name` is not a staging name produced by
/// [`staging_path`].
#[must_use]
pub fn split_staging_name(name: &str) -> Option<(&str, &str)> {
    let rest = name.strip_prefix(STAGING_PREFIX)?;
    let (tag, target) = rest.split_once('-')?;
    if tag.is_empty() || target.is_empty() {
        return None;
    }
    Some((tag, target))
}
