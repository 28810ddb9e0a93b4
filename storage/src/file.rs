use std::io;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// A regular file found under a [`LocalStorage`] root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// Path segments relative to the root.
    pub relative_path: Vec<String>,
    /// Full file system path.
    pub path: PathBuf,
    pub size: u64,
}

impl LocalFile {
    /// Relative path joined with `/`, independent of the host separator.
    pub fn key(&self) -> String {
        self.relative_path.join("/")
    }
}

/// Read-only view of the local source tree.
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List every regular file under the root, sorted by path.
    ///
    /// Symlinks are not followed. Any walk error (including an unreadable or
    /// missing root) is returned rather than skipped.
    pub fn list_files(&self) -> io::Result<Vec<LocalFile>> {
        let metadata = std::fs::metadata(&self.root)?;
        if !metadata.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a directory", self.root.display()),
            ));
        }

        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .max_open(100);

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                match e.into_io_error() {
                    Some(io_err) => io::Error::new(io_err.kind(), format!("{}: {}", path, io_err)),
                    None => io::Error::new(io::ErrorKind::Other, format!("{}: walk failed", path)),
                }
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let relative_path = relative_segments(&self.root, entry.path())?;
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);

            files.push(LocalFile {
                relative_path,
                path: entry.into_path(),
                size,
            });
        }

        Ok(files)
    }

    /// Read a listed file in full.
    pub fn read(&self, file: &LocalFile) -> io::Result<Vec<u8>> {
        std::fs::read(&file.path)
    }
}

fn relative_segments(root: &Path, path: &Path) -> io::Result<Vec<String>> {
    let relative = path.strip_prefix(root).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{} is outside {}", path.display(), root.display()),
        )
    })?;

    // a lossy conversion could map two distinct names onto one key
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s),
            _ => None,
        })
        .map(|segment| {
            segment.to_str().map(str::to_string).ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("{}: file name is not valid UTF-8", path.display()),
                )
            })
        })
        .collect()
}
