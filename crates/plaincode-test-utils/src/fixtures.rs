//! Test fixtures for creating reproducible project trees.
//!
//! Provides a builder for temporary project directories plus helpers to
//! edit them between tracking runs.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary test project with configurable file structure.
///
/// Creates a temporary directory that is automatically cleaned up
/// when the built project is dropped.
///
/// # Example
///
/// ```rust
/// use plaincode_test_utils::fixtures::TestProject;
///
/// let project = TestProject::new()
///     .with_file("a.txt", "hello")
///     .with_binary("logo.png", [0x89, b'P', b'N', b'G', 0])
///     .with_dir("empty")
///     .build();
///
/// assert!(project.path().join("a.txt").exists());
/// assert_eq!(project.tree(), vec!["a.txt", "logo.png"]);
/// ```
pub struct TestProject {
    /// The temporary directory backing this project.
    temp_dir: TempDir,
    /// Files to create (path relative to root -> bytes).
    files: BTreeMap<PathBuf, Vec<u8>>,
    /// Directories to create (paths relative to root).
    dirs: Vec<PathBuf>,
}

impl TestProject {
    /// Create a new test project builder.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
            files: BTreeMap::new(),
            dirs: Vec::new(),
        }
    }

    /// Add a text file. Parent directories are created automatically.
    pub fn with_file(mut self, path: impl AsRef<Path>, contents: impl Into<String>) -> Self {
        self.files
            .insert(path.as_ref().to_path_buf(), contents.into().into_bytes());
        self
    }

    /// Add a file with arbitrary bytes.
    pub fn with_binary(mut self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) -> Self {
        self.files
            .insert(path.as_ref().to_path_buf(), contents.into());
        self
    }

    /// Add an empty directory to the project.
    pub fn with_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.dirs.push(path.as_ref().to_path_buf());
        self
    }

    /// Add a .gitignore file.
    pub fn with_gitignore(self, contents: &str) -> Self {
        self.with_file(".gitignore", contents)
    }

    /// Add a .plaincodeignore file.
    pub fn with_ignore_file(self, contents: &str) -> Self {
        self.with_file(".plaincodeignore", contents)
    }

    /// Add a plaincode.json configuration file.
    pub fn with_config(self, config: &str) -> Self {
        self.with_file("plaincode.json", config)
    }

    /// Build the project, creating all files and directories.
    pub fn build(self) -> BuiltTestProject {
        let root = self.temp_dir.path();

        for dir in &self.dirs {
            let full_path = root.join(dir);
            fs::create_dir_all(&full_path).unwrap_or_else(|e| {
                panic!("Failed to create directory {}: {}", full_path.display(), e)
            });
        }

        for (path, contents) in &self.files {
            write_all(&root.join(path), contents);
        }

        BuiltTestProject {
            temp_dir: self.temp_dir,
        }
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// A built test project with files created on disk.
///
/// The temporary directory is automatically cleaned up when this is dropped.
pub struct BuiltTestProject {
    temp_dir: TempDir,
}

impl BuiltTestProject {
    /// Get the path to the project root.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Read a text file from the project.
    pub fn read_file(&self, path: impl AsRef<Path>) -> String {
        let full_path = self.path().join(path.as_ref());
        fs::read_to_string(&full_path)
            .unwrap_or_else(|e| panic!("Failed to read file {}: {}", full_path.display(), e))
    }

    /// Check if a file exists in the project.
    pub fn file_exists(&self, path: impl AsRef<Path>) -> bool {
        self.path().join(path.as_ref()).exists()
    }

    /// Write a text file (for modifying during tests).
    pub fn write_file(&self, path: impl AsRef<Path>, contents: impl AsRef<str>) {
        self.write_bytes(path, contents.as_ref().as_bytes());
    }

    /// Write a file with arbitrary bytes.
    pub fn write_bytes(&self, path: impl AsRef<Path>, contents: &[u8]) {
        write_all(&self.path().join(path.as_ref()), contents);
    }

    /// Append to a text file.
    pub fn append_file(&self, path: impl AsRef<Path>, contents: &str) {
        let mut current = self.read_file(path.as_ref());
        current.push_str(contents);
        self.write_file(path, current);
    }

    /// Delete a file from the project.
    pub fn delete_file(&self, path: impl AsRef<Path>) {
        let full_path = self.path().join(path.as_ref());
        fs::remove_file(&full_path)
            .unwrap_or_else(|e| panic!("Failed to delete file {}: {}", full_path.display(), e));
    }

    /// Delete a directory and everything in it.
    pub fn delete_dir(&self, path: impl AsRef<Path>) {
        let full_path = self.path().join(path.as_ref());
        fs::remove_dir_all(&full_path).unwrap_or_else(|e| {
            panic!("Failed to delete directory {}: {}", full_path.display(), e)
        });
    }

    /// Every file under the root as a sorted, `/`-separated relative path.
    pub fn tree(&self) -> Vec<String> {
        let mut files = Vec::new();
        collect_files(self.path(), self.path(), &mut files);
        files.sort();
        files
    }
}

fn write_all(full_path: &Path, contents: &[u8]) {
    if let Some(parent) = full_path.parent() {
        fs::create_dir_all(parent).unwrap_or_else(|e| {
            panic!(
                "Failed to create parent directory for {}: {}",
                full_path.display(),
                e
            )
        });
    }
    fs::write(full_path, contents)
        .unwrap_or_else(|e| panic!("Failed to write file {}: {}", full_path.display(), e));
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<String>) {
    let entries = fs::read_dir(dir)
        .unwrap_or_else(|e| panic!("Failed to read directory {}: {}", dir.display(), e));

    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            collect_files(root, &path, out);
        } else if let Ok(relative) = path.strip_prefix(root) {
            let parts: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            out.push(parts.join("/"));
        }
    }
}

/// Common test file contents.
pub mod content {
    /// A small Python module.
    pub const PYTHON_MAIN: &str = "def main():\n    print(\"Hello, world!\")\n\nif __name__ == \"__main__\":\n    main()\n";

    /// [`PYTHON_MAIN`] with the greeting changed.
    pub const PYTHON_MAIN_EDITED: &str = "def main():\n    print(\"Hello, plaincode!\")\n\nif __name__ == \"__main__\":\n    main()\n";

    /// Pseudocode as a user would write it.
    pub const PSEUDOCODE: &str = "function greet(name)\n    print \"hello \" + name\nend\n";

    /// Text with Windows line endings and no final newline.
    pub const CRLF_TEXT: &str = "first\r\nsecond\r\nthird";

    /// The first bytes of a PNG image.
    pub const PNG_HEADER: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
}
