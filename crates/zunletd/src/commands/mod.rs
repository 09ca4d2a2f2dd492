pub mod node;
pub mod pods;

use std::path::Path;

use tracing::debug;
use zunlet_core::ZunletConfig;

/// Load `path` if it exists, otherwise start from defaults; then apply the
/// node name override and validate.
pub fn load_config(path: &Path, node_name: Option<&str>) -> anyhow::Result<ZunletConfig> {
    let mut config = if path.exists() {
        ZunletConfig::from_file(path)?
    } else {
        debug!(path = ?path, "no config file, using defaults");
        ZunletConfig::default()
    };

    if let Some(name) = node_name {
        config.node.name = name.to_string();
    }
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.toml"), None).unwrap();
        assert_eq!(config.node.name, "virtual-zun");
    }

    #[test]
    fn node_name_flag_wins_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zunlet.toml");
        std::fs::write(&path, "[node]\nname = \"from-file\"\n").unwrap();

        assert_eq!(load_config(&path, None).unwrap().node.name, "from-file");
        assert_eq!(load_config(&path, Some("from-flag")).unwrap().node.name, "from-flag");
    }

    #[test]
    fn empty_override_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(&dir.path().join("absent.toml"), Some("")).is_err());
    }
}
