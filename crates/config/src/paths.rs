//! Path utilities

use std::path::PathBuf;

/// Data directory (~/.finsight)
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .expect("could not locate home directory")
        .join(".finsight")
}

/// Settings file location
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}

/// Ensure directory exists
pub async fn ensure_dir(path: &PathBuf) -> std::io::Result<()> {
    tokio::fs::create_dir_all(path).await
}
