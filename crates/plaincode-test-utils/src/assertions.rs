//! Assertion helpers with readable failure output.

use std::path::Path;

/// Assert that a file contains specific text.
///
/// # Example
///
/// ```rust
/// use plaincode_test_utils::assertions::assert_file_contains;
/// use std::fs;
/// use tempfile::TempDir;
///
/// let dir = TempDir::new().unwrap();
/// let path = dir.path().join("test.txt");
/// fs::write(&path, "Hello, world!").unwrap();
///
/// assert_file_contains(&path, "Hello");
/// ```
pub fn assert_file_contains(path: &Path, expected: &str) {
    let content = read(path);
    assert!(
        content.contains(expected),
        "File {} does not contain expected text.\nExpected to find: {}\nActual content:\n{}",
        path.display(),
        expected,
        content
    );
}

/// Assert that a file's content equals expected text exactly, showing a
/// line diff on mismatch.
pub fn assert_file_equals(path: &Path, expected: &str) {
    assert_strings_equal(&read(path), expected);
}

/// Assert that two strings are equal, with a line diff on failure.
///
/// Line terminators are part of the comparison, so `\r\n` against `\n`
/// or a missing final newline fails.
pub fn assert_strings_equal(actual: &str, expected: &str) {
    if actual != expected {
        let diff = similar::TextDiff::from_lines(expected, actual);
        let mut output = String::new();

        for change in diff.iter_all_changes() {
            let sign = match change.tag() {
                similar::ChangeTag::Delete => "-",
                similar::ChangeTag::Insert => "+",
                similar::ChangeTag::Equal => " ",
            };
            output.push_str(&format!("{}{:?}\n", sign, change.value()));
        }

        panic!("Strings are not equal.\nDiff (expected -> actual):\n{}", output);
    }
}

/// Assert that a directory tree contains no file with the given suffix.
pub fn assert_no_file_with_suffix(dir: &Path, suffix: &str) {
    let entries = std::fs::read_dir(dir)
        .unwrap_or_else(|e| panic!("Failed to read directory {}: {}", dir.display(), e));

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            assert_no_file_with_suffix(&path, suffix);
        } else {
            assert!(
                !path.to_string_lossy().ends_with(suffix),
                "Unexpected file {}",
                path.display()
            );
        }
    }
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read file {}: {}", path.display(), e))
}

/// Assert that a result is Ok and extract the value.
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
    ($expr:expr, $msg:literal) => {
        match $expr {
            Ok(value) => value,
            Err(e) => panic!("{}: {:?}", $msg, e),
        }
    };
}

/// Assert that a result is Err and extract the error.
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        match $expr {
            Ok(value) => panic!("Expected Err, got Ok: {:?}", value),
            Err(e) => e,
        }
    };
}

/// Assert that a string contains a substring.
#[macro_export]
macro_rules! assert_str_contains {
    ($haystack:expr, $needle:expr) => {
        if !$haystack.contains($needle) {
            panic!(
                "String does not contain expected substring.\nExpected to find: {}\nIn string:\n{}",
                $needle, $haystack
            );
        }
    };
}
