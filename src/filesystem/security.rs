use std::io;
use std::path::{Component, Path, PathBuf};

use path_jail::Jail;

use crate::protocol::FileSystemError;

/// An absolute, canonical path known to lie inside the served root.
///
/// Only [`PathValidator`] can build one, so holding a `ResolvedPath` is proof
/// the confinement check already passed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedPath(PathBuf);

impl ResolvedPath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn file_name(&self) -> Option<String> {
        self.0
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
    }
}

/// Confines client-supplied paths to the served root
pub struct PathValidator {
    root: PathBuf,
    /// `None` when serving the filesystem root, which has nothing to escape to
    jail: Option<Jail>,
}

impl PathValidator {
    pub fn new(root: &Path) -> io::Result<Self> {
        let root = root.canonicalize()?;
        let jail = match root.parent() {
            Some(_) => Some(Jail::new(&root).map_err(|e| io::Error::other(e.to_string()))?),
            None => None,
        };
        Ok(Self { root, jail })
    }

    /// Canonical root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a logical path to a resolved path inside the root.
    ///
    /// Components are walked one at a time from the root. Symlinks are
    /// followed as they are met, so `..` after a link steps out of the link's
    /// target like the OS would. A `..` at the root is rejected before any
    /// filesystem access, and every followed link must stay under the root.
    pub fn resolve(&self, logical: &str) -> Result<ResolvedPath, FileSystemError> {
        let escape = || FileSystemError::PathEscape {
            attempted_path: logical.to_string(),
        };

        let mut current = self.root.clone();
        let mut is_dir = true;
        // Once a component is missing the rest is walked lexically, only to
        // report a later `..` escape as such.
        let mut missing = false;

        for component in Path::new(logical.trim_matches('/')).components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    if current == self.root {
                        return Err(escape());
                    }
                    if !is_dir {
                        missing = true;
                    }
                    current.pop();
                    is_dir = true;
                }
                Component::Normal(part) => {
                    current.push(part);
                    if missing || !is_dir {
                        missing = true;
                        continue;
                    }
                    match std::fs::symlink_metadata(&current) {
                        Ok(metadata) if metadata.file_type().is_symlink() => {
                            current = current
                                .canonicalize()
                                .map_err(|e| self.unresolvable(logical, e))?;
                            if !self.contains(&current) {
                                return Err(escape());
                            }
                            is_dir = current.is_dir();
                        }
                        Ok(metadata) => is_dir = metadata.is_dir(),
                        Err(e) if e.kind() == io::ErrorKind::NotFound => missing = true,
                        Err(e) => return Err(self.unresolvable(logical, e)),
                    }
                }
                Component::RootDir | Component::Prefix(_) => return Err(escape()),
            }
        }

        if missing {
            return Err(FileSystemError::NotFound {
                path: display_logical(logical),
            });
        }
        if !self.contains(&current) {
            return Err(escape());
        }

        Ok(ResolvedPath(current))
    }

    /// Resolve an entry found while scanning a resolved directory.
    ///
    /// Follows symlinks; a dangling, cyclic or escaping link is reported as a
    /// stat failure so the caller can skip it.
    pub fn confine(&self, path: &Path) -> Result<ResolvedPath, FileSystemError> {
        let canonical = path.canonicalize().map_err(|e| FileSystemError::StatFailure {
            path: self.relative(path),
            message: e.to_string(),
        })?;

        if !self.contains(&canonical) {
            return Err(FileSystemError::StatFailure {
                path: self.relative(path),
                message: "Symlink target is outside the served root".to_string(),
            });
        }

        Ok(ResolvedPath(canonical))
    }

    /// `/`-separated path relative to the root; empty for the root itself
    pub fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().to_string()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Strip the root prefix from a diagnostic before it reaches a client
    pub fn redact(&self, message: &str) -> String {
        if self.root.parent().is_none() {
            return message.to_string();
        }
        let root = self.root.display().to_string();
        message.replace(&format!("{}/", root), "").replace(&root, ".")
    }

    fn contains(&self, canonical: &Path) -> bool {
        canonical.starts_with(&self.root)
            && self
                .jail
                .as_ref()
                .map_or(true, |jail| jail.contains(canonical).is_ok())
    }

    fn unresolvable(&self, logical: &str, e: io::Error) -> FileSystemError {
        if e.kind() == io::ErrorKind::NotFound {
            FileSystemError::NotFound {
                path: display_logical(logical),
            }
        } else {
            tracing::debug!("Rejecting unresolvable path {:?}: {}", logical, e);
            FileSystemError::PathEscape {
                attempted_path: logical.to_string(),
            }
        }
    }
}

fn display_logical(logical: &str) -> String {
    logical.trim_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_redact_strips_root_prefix() {
        let temp = TempDir::new().unwrap();
        let validator = PathValidator::new(temp.path()).unwrap();
        let root = validator.root().display().to_string();

        let message = format!("cannot open {}/docs/a.docx", root);
        assert_eq!(validator.redact(&message), "cannot open docs/a.docx");
        assert_eq!(validator.redact(&format!("in {}", root)), "in .");
    }

    #[cfg(unix)]
    #[test]
    fn test_filesystem_root_is_a_valid_root() {
        let validator = PathValidator::new(Path::new("/")).unwrap();
        assert_eq!(validator.root(), Path::new("/"));
        assert_eq!(validator.resolve("").unwrap().as_path(), Path::new("/"));
        assert!(matches!(
            validator.resolve(".."),
            Err(FileSystemError::PathEscape { .. })
        ));
        assert_eq!(validator.redact("/usr/bin/pandoc: failed"), "/usr/bin/pandoc: failed");
    }
}
