//! Directory-backed workspaces.
//!
//! Content is addressed by `/`-separated names relative to the workspace
//! root. Names that would escape the root are rejected.

use std::path::{Component, Path, PathBuf};

use linkpack_common::error::{LinkpackError, Result};

/// Access to the content of a workspace.
pub trait Workspace {
    /// Lists every content name in lexicographic order.
    ///
    /// # Errors
    ///
    /// Returns an error if the workspace cannot be traversed.
    fn walk(&self) -> Result<Vec<String>>;

    /// Reads the bytes stored under `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be read.
    fn read(&self, name: &str) -> Result<Vec<u8>>;

    /// Stores `content` under `name`, replacing what was there.
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be written.
    fn write(&self, name: &str, content: &[u8]) -> Result<()>;
}

/// A workspace rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalWorkspace {
    root: PathBuf,
}

impl LocalWorkspace {
    /// Opens the workspace at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| LinkpackError::Io {
            path: root.clone(),
            source: e,
        })?;
        tracing::info!(path = %root.display(), "opened workspace");
        Ok(Self { root })
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the on-disk path for a content name.
    ///
    /// # Errors
    ///
    /// Returns `LinkpackError::Config` if the name is empty, absolute, or
    /// contains `..`.
    pub fn path(&self, name: &str) -> Result<PathBuf> {
        let relative = Path::new(name);
        let plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if name.is_empty() || !plain {
            return Err(LinkpackError::Config {
                message: format!("workspace name {name} escapes the workspace root"),
            });
        }
        Ok(self.root.join(relative))
    }
}

impl Workspace for LocalWorkspace {
    fn walk(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in walkdir::WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry.map_err(|e| LinkpackError::Io {
                path: e.path().map_or_else(|| self.root.clone(), Path::to_path_buf),
                source: e.into(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let Some(name) = relative
                .components()
                .map(|c| c.as_os_str().to_str())
                .collect::<Option<Vec<&str>>>()
            else {
                tracing::warn!(
                    path = %entry.path().display(),
                    "skipping file with non-UTF-8 name"
                );
                continue;
            };
            names.push(name.join("/"));
        }
        names.sort();
        tracing::debug!(root = %self.root.display(), files = names.len(), "walked workspace");
        Ok(names)
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.path(name)?;
        std::fs::read(&path).map_err(|e| LinkpackError::Io { path, source: e })
    }

    fn write(&self, name: &str, content: &[u8]) -> Result<()> {
        let path = self.path(name)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LinkpackError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        std::fs::write(&path, content).map_err(|e| LinkpackError::Io { path, source: e })?;
        tracing::debug!(name, bytes = content.len(), "wrote workspace content");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_missing_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("nested").join("out");
        let workspace = LocalWorkspace::open(&root).expect("open");
        assert!(root.is_dir());
        assert_eq!(workspace.root(), root);
    }

    #[test]
    fn walk_lists_files_sorted_with_forward_slashes() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("sub/deeper")).expect("mkdir");
        std::fs::write(dir.path().join("z.json"), b"{}").expect("write");
        std::fs::write(dir.path().join("sub/a.txt"), b"a").expect("write");
        std::fs::write(dir.path().join("sub/deeper/b.bin"), b"b").expect("write");

        let workspace = LocalWorkspace::open(dir.path()).expect("open");
        let names = workspace.walk().expect("walk");
        assert_eq!(names, vec!["sub/a.txt", "sub/deeper/b.bin", "z.json"]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn walk_skips_non_utf8_names() {
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("ok.json"), b"{}").expect("write");
        let bad = std::ffi::OsStr::from_bytes(b"bad\xffname.json");
        std::fs::write(dir.path().join(bad), b"{}").expect("write non-UTF-8 name");

        let workspace = LocalWorkspace::open(dir.path()).expect("open");
        let names = workspace.walk().expect("walk");
        assert_eq!(names, vec!["ok.json"]);
        for name in &names {
            let _ = workspace.read(name).expect("every walked name is readable");
        }
    }

    #[test]
    fn write_then_read_nested_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let workspace = LocalWorkspace::open(dir.path()).expect("open");
        workspace
            .write("deep/dir/file.json", b"{\"k\":1}")
            .expect("write");
        assert_eq!(
            workspace.read("deep/dir/file.json").expect("read"),
            b"{\"k\":1}"
        );
    }

    #[test]
    fn read_missing_name_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let workspace = LocalWorkspace::open(dir.path()).expect("open");
        let err = workspace.read("missing.json").expect_err("missing");
        assert!(matches!(err, LinkpackError::Io { .. }));
    }

    #[test]
    fn escaping_names_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let workspace = LocalWorkspace::open(dir.path()).expect("open");
        assert!(workspace.write("../outside.txt", b"x").is_err());
        assert!(workspace.path("/etc/passwd").is_err());
        assert!(workspace.path("").is_err());
        assert!(workspace.path("ok/name.txt").is_ok());
    }
}
