//! Helpers shared by the unit tests.

use std::path::PathBuf;

/// Fresh, empty directory under the system temp dir, unique per test process.
pub(crate) fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("gl-sandbox-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
