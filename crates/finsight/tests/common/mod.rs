//! Common test utilities for finsight integration tests
#![allow(dead_code)]

use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

/// Path to the finsight binary
pub fn bin_path() -> PathBuf {
    env!("CARGO_BIN_EXE_finsight").into()
}

/// Test environment with an isolated home directory
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub data_dir: PathBuf,
}

impl TestEnv {
    /// Create a new test environment
    pub fn new() -> anyhow::Result<Self> {
        let temp_dir = tempdir()?;
        let data_dir = temp_dir.path().join(".finsight");

        std::fs::create_dir_all(&data_dir)?;

        Ok(Self { temp_dir, data_dir })
    }

    /// Path to the config file inside the test home
    pub fn config_file(&self) -> PathBuf {
        self.data_dir.join("config.json")
    }

    /// Write a filing document into the test home and return its path
    pub fn filing_file(&self, name: &str, content: &str) -> anyhow::Result<PathBuf> {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Create a command with the environment pointed at the test home
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_finsight"));
        cmd.env("HOME", self.temp_dir.path());
        cmd.env_remove("FINSIGHT_API_KEY");
        cmd.env_remove("FINSIGHT_CAPABILITY_URL");
        cmd.env_remove("DOCINTEL_ENDPOINT");
        cmd.env_remove("DOCINTEL_API_KEY");
        cmd.env_remove("USER_PREFIX");
        cmd
    }

    /// Create a basic config file with an API key set
    pub fn create_config(&self) -> anyhow::Result<()> {
        let config = r#"{
  "backend": {
    "api_base": "http://127.0.0.1:9",
    "api_key": "test-api-key",
    "model": "gpt-4o"
  },
  "capability": {
    "base_url": "http://127.0.0.1:9"
  }
}"#;
        std::fs::write(self.config_file(), config)?;
        Ok(())
    }
}
