//! Loading source nodes from the filesystem.

use crate::error::{Error, Result};
use crate::node::{DirNode, Node};
use std::fs;
use std::path::Path;
use tracing::debug;

impl Node {
    /// Load a file or directory tree from the filesystem.
    ///
    /// Directories are walked with `.gitignore` rules applied and hidden files
    /// included. Symlinks and special files are rejected.
    pub fn from_path(path: &Path) -> Result<Node> {
        if !path.exists() {
            return Err(Error::Io {
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("Path does not exist: {}", path.display()),
                ),
            });
        }

        let metadata = fs::symlink_metadata(path)?;
        if metadata.is_file() {
            return Ok(Node::file(fs::read(path)?));
        }
        if !metadata.is_dir() {
            return Err(Error::unsupported_entry(path, "not a file or directory"));
        }

        let mut root = DirNode::new();
        let mut files = 0usize;

        let walker = ignore::WalkBuilder::new(path)
            .hidden(false) // Include hidden files
            .git_ignore(true) // Respect .gitignore
            .parents(false)
            .follow_links(false)
            .build();

        for entry in walker {
            let entry = entry?;
            let entry_path = entry.path();
            if entry_path == path {
                continue;
            }

            let relative = relative_name(path, entry_path)?;
            let file_type = entry
                .file_type()
                .ok_or_else(|| Error::unsupported_entry(entry_path, "unknown file type"))?;

            if file_type.is_dir() {
                root.create_dir_path(&relative)?;
            } else if file_type.is_file() {
                root.insert_path(&relative, fs::read(entry_path)?)?;
                files += 1;
            } else if file_type.is_symlink() {
                return Err(Error::unsupported_entry(entry_path, "symlinks not supported"));
            } else {
                return Err(Error::unsupported_entry(entry_path, "not a file or directory"));
            }
        }

        debug!(path = %path.display(), files, "loaded directory tree");
        Ok(Node::Directory(root))
    }
}

/// Path of `entry` below `base`, as `/`-separated UTF-8 segments.
fn relative_name(base: &Path, entry: &Path) -> Result<String> {
    let relative = entry.strip_prefix(base).map_err(|_| {
        Error::invalid_name(format!(
            "{} is not below {}",
            entry.display(),
            base.display()
        ))
    })?;

    let mut segments = Vec::new();
    for component in relative.components() {
        let segment = component.as_os_str().to_str().ok_or_else(|| {
            Error::invalid_name(format!("Invalid filename: {}", entry.display()))
        })?;
        segments.push(segment);
    }
    Ok(segments.join("/"))
}
