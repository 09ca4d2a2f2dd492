//! Loading zunlet.toml from disk.

use std::io::Write;

use zunlet_core::ZunletConfig;

#[test]
fn loads_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[node]
name = "zun-west"

[capacity]
pods = "110"
"#
    )
    .unwrap();

    let config = ZunletConfig::from_file(file.path()).unwrap();
    assert_eq!(config.node.name, "zun-west");
    assert_eq!(config.capacity.pods().as_str(), "110");
    assert_eq!(config.capacity.cpu().as_str(), "20");
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = ZunletConfig::from_file(&dir.path().join("absent.toml"));
    assert!(result.is_err());
}

#[test]
fn empty_node_name_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[node]\nname = \"\"").unwrap();
    assert!(ZunletConfig::from_file(file.path()).is_err());
}
