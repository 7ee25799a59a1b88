//! Custom assertion helpers for save-root tests.

use serde_json::Value;
use std::path::Path;

/// Assert that a file contains specific text.
pub fn assert_file_contains(path: &Path, expected: &str) {
    let content = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read file {}: {}", path.display(), e));

    assert!(
        content.contains(expected),
        "File {} does not contain expected text.\nExpected to find: {}\nActual content:\n{}",
        path.display(),
        expected,
        content
    );
}

/// Assert that a file parses as JSON equal to `expected`.
pub fn assert_json_file_eq(path: &Path, expected: &Value) {
    let content = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read file {}: {}", path.display(), e));
    let actual: Value = serde_json::from_str(&content).unwrap_or_else(|e| {
        panic!(
            "File {} is not valid JSON: {}\nContent:\n{}",
            path.display(),
            e,
            content
        )
    });

    assert_eq!(
        &actual,
        expected,
        "File {} does not hold the expected document",
        path.display()
    );
}

/// Assert that no interrupted-write leftovers (`*.tmp.*`) remain in `dir`.
pub fn assert_no_temp_files(dir: &Path) {
    let leftovers: Vec<String> = std::fs::read_dir(dir)
        .unwrap_or_else(|e| panic!("Failed to read directory {}: {}", dir.display(), e))
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .filter(|name| name.contains(".tmp."))
        .collect();

    assert!(
        leftovers.is_empty(),
        "Directory {} still holds temporary files: {:?}",
        dir.display(),
        leftovers
    );
}

/// Assert that an outcome succeeded and extract its data.
#[macro_export]
macro_rules! assert_success {
    ($outcome:expr) => {{
        let outcome = $outcome;
        if !outcome.success {
            panic!(
                "Expected success, got error {:?} at {:?}",
                outcome.error, outcome.context
            );
        }
        match outcome.data {
            Some(data) => data,
            None => panic!("Successful outcome carried no data"),
        }
    }};
}

/// Assert that an outcome failed and return its error message.
#[macro_export]
macro_rules! assert_failure {
    ($outcome:expr) => {{
        let outcome = $outcome;
        if outcome.success {
            panic!("Expected failure, got success with {:?}", outcome.data);
        }
        match outcome.error {
            Some(error) if !error.is_empty() => error,
            _ => panic!("Failed outcome carried no error message"),
        }
    }};
}
