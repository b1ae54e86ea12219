//! Path resolution for configuration and call logs

use std::path::PathBuf;

/// Environment variable overriding the tagwise home directory
pub const HOME_ENV: &str = "TAGWISE_HOME";

/// Resolves standard tagwise file locations
#[derive(Debug, Clone)]
pub struct Paths {
    pub home: PathBuf,
}

impl Paths {
    /// Resolve from `TAGWISE_HOME`, falling back to `~/.tagwise`
    pub fn new() -> std::io::Result<Self> {
        if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self {
                home: PathBuf::from(dir),
            });
        }

        let home = dirs::home_dir().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "home directory not found")
        })?;

        Ok(Self {
            home: home.join(".tagwise"),
        })
    }

    /// Default config.json path
    pub fn config_file(&self) -> PathBuf {
        self.home.join("config.json")
    }

    /// Default calls.jsonl path
    pub fn call_log_file(&self) -> PathBuf {
        self.home.join("logs").join("calls.jsonl")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_paths_env_override() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var(HOME_ENV, dir.path());

        let paths = Paths::new().unwrap();
        assert_eq!(paths.home, dir.path());
        assert_eq!(paths.config_file(), dir.path().join("config.json"));

        std::env::remove_var(HOME_ENV);
    }

    #[test]
    #[serial]
    fn test_paths_default_home() {
        std::env::remove_var(HOME_ENV);
        let paths = Paths::new().unwrap();
        assert!(paths.home.ends_with(".tagwise"));
        assert!(paths.call_log_file().ends_with("logs/calls.jsonl"));
    }
}
