//! Path helpers for local paths and remote keys
//!
//! Remote keys always use `/` as separator. Local paths are converted to
//! absolute form before they are used for a transfer.

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Remove exactly one trailing `/` or `\` (or the platform separator).
///
/// The empty string is returned unchanged.
pub fn strip_trailing_separator(path: &str) -> &str {
    match path.chars().last() {
        Some(c) if c == '/' || c == '\\' || c == std::path::MAIN_SEPARATOR => {
            &path[..path.len() - c.len_utf8()]
        }
        _ => path,
    }
}

/// Join a leaf onto a remote prefix with a single `/`.
///
/// Returns `leaf` as-is when `base` is empty. Separators are not collapsed.
pub fn join_remote(base: &str, leaf: &str) -> String {
    if base.is_empty() {
        leaf.to_string()
    } else {
        format!("{base}/{leaf}")
    }
}

/// Last segment of a remote key, ignoring one trailing separator
pub fn remote_basename(key: &str) -> &str {
    let key = strip_trailing_separator(key);
    key.rsplit('/').next().unwrap_or(key)
}

/// Absolute form of a local path without resolving symlinks
pub fn absolute(path: impl AsRef<Path>) -> Result<PathBuf> {
    Ok(std::path::absolute(path.as_ref())?)
}

/// Final component of a local path as a string
pub fn local_basename(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| Error::InvalidPath(format!("'{}' has no file name", path.display())))
}

/// Compute the remote key of every file found under `local_root`.
///
/// Each key is `<basename(local_root)>/<relative path>` with `/` separators.
pub fn to_remote_keys<I, P>(local_root: &Path, local_files: I) -> Result<Vec<(PathBuf, String)>>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let base = local_basename(local_root)?;

    local_files
        .into_iter()
        .map(|file| {
            let file = file.as_ref();
            let relative = file.strip_prefix(local_root).map_err(|_| {
                Error::InvalidPath(format!(
                    "'{}' is not inside '{}'",
                    file.display(),
                    local_root.display()
                ))
            })?;

            let relative_key = relative
                .components()
                .filter_map(|c| match c {
                    Component::Normal(part) => Some(part.to_string_lossy().replace('\\', "/")),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("/");

            Ok((file.to_path_buf(), join_remote(&base, &relative_key)))
        })
        .collect()
}

/// Map a remote key onto a local path under `dest_dir`.
///
/// Keys containing `.` or `..` segments are rejected so a download can never
/// land outside `dest_dir`.
pub fn local_target(dest_dir: &Path, key: &str) -> Result<PathBuf> {
    let mut target = dest_dir.to_path_buf();
    for segment in key.split('/').filter(|s| !s.is_empty()) {
        if segment == "." || segment == ".." {
            return Err(Error::InvalidPath(format!(
                "Key '{key}' contains a relative segment"
            )));
        }
        target.push(segment);
    }
    Ok(target)
}
