//! Default file locations.
//!
//! Relative to the working directory; the database path defaults the same
//! way inside the config file.

use std::path::PathBuf;

/// Default config file path (`./config.toml`).
pub fn default_config() -> PathBuf {
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_relative() {
        assert!(default_config().is_relative());
        assert_eq!(default_config(), PathBuf::from("config.toml"));
    }
}
