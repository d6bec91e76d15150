//! Plain file access for partials and templates.
//!
//! [`load_partials`] feeds the build; the remaining functions back the
//! list/read/update/create tools and treat names as bare file names inside
//! one directory.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Partial name (file stem) to file content.
pub type PartialSet = BTreeMap<String, String>;

/// Load every regular file directly inside `dir` as a partial.
///
/// Files are read in lexicographic order of their file names, so when two
/// files share a stem (`intro.md`, `intro.txt`) the one sorting last wins.
/// Subdirectories are ignored.
pub fn load_partials(dir: &Path) -> Result<PartialSet> {
    let mut partials = PartialSet::new();

    for path in sorted_files(dir)? {
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            tracing::warn!("Skipping partial with non UTF-8 name: {}", path.display());
            continue;
        };
        let content = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        if partials.insert(name.to_string(), content).is_some() {
            tracing::debug!(partial = name, "Partial overridden by {}", path.display());
        }
    }

    Ok(partials)
}

/// File names of the regular files directly inside `dir`, sorted.
pub fn list_files(dir: &Path) -> Result<Vec<String>> {
    Ok(sorted_files(dir)?
        .into_iter()
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
        .collect())
}

pub fn read_file(dir: &Path, name: &str) -> Result<String> {
    let path = file_path(dir, name)?;
    std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))
}

/// Overwrite (or create) `name` inside `dir`.
pub fn write_file(dir: &Path, name: &str, content: &str) -> Result<()> {
    let path = file_path(dir, name)?;
    std::fs::write(&path, content).map_err(|e| Error::WriteFailed { path, source: e })
}

/// Create `name` inside `dir`, refusing to replace an existing file.
pub fn create_file(dir: &Path, name: &str, content: &str) -> Result<()> {
    let path = file_path(dir, name)?;
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::AlreadyExists => Error::AlreadyExists { path: path.clone() },
            _ => Error::WriteFailed {
                path: path.clone(),
                source: e,
            },
        })?;
    file.write_all(content.as_bytes())
        .map_err(|e| Error::WriteFailed { path, source: e })
}

/// Join a tool-supplied name onto `dir`, rejecting anything but a bare file name.
fn file_path(dir: &Path, name: &str) -> Result<PathBuf> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => {}
        _ => return Err(Error::InvalidName(name.to_string())),
    }
    if !dir.is_dir() {
        return Err(Error::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }
    Ok(dir.join(name))
}

fn sorted_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::DirectoryNotFound {
                path: dir.to_path_buf(),
            })
        }
        Err(e) => return Err(Error::io(dir, e)),
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
