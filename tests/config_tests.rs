use rixs_ops::config::{load_config_or_default, Config, ConfigFormat};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_default_config_is_valid() {
    assert!(Config::default().validate().is_ok());
}

#[test]
fn test_round_trip_json_and_toml() {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.alignment.idx0 = 3;
    config.alignment.scale = Some(vec![1.0, 1.5, 2.0]);
    config.manipulation.bin_width = 16;
    config.filter.low = Some(2.0);
    config.logging.global_level = "debug".to_string();

    for (name, format) in [
        ("config.json", ConfigFormat::Json),
        ("config.toml", ConfigFormat::Toml),
    ] {
        let path = dir.path().join(name);
        config.save_to_file(&path, format).unwrap();
        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded, config, "{}", name);
    }
}

#[test]
fn test_partial_toml_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("partial.toml");
    fs::write(
        &path,
        r#"
[alignment]
portion = 0.6
peakSearch = true

[integration]
binWidth = 4
"#,
    )
    .unwrap();

    let config = Config::load_from_file(&path).unwrap();
    assert_eq!(config.alignment.portion, 0.6);
    assert!(config.alignment.peak_search);
    assert_eq!(config.alignment.idx0, 0);
    assert_eq!(config.integration.bin_width, 4);
    assert_eq!(config.manipulation.bin_width, 8);
}

#[test]
fn test_validation_collects_every_problem() {
    let mut config = Config::default();
    config.alignment.portion = 1.5;
    config.manipulation.mode = "relaxed?".to_string();
    config.integration.sum_axis = 4;
    config.logging.global_level = "loud".to_string();

    let errors = config.validate().unwrap_err();
    assert_eq!(errors.len(), 4, "{:?}", errors);
}

#[test]
fn test_invalid_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ \"alignment\": { \"portion\": 2.0 } }").unwrap();
    let config = load_config_or_default(path.to_str());
    assert_eq!(config, Config::default());

    assert_eq!(load_config_or_default(Some("/nonexistent/rixs.toml")), Config::default());
    assert_eq!(load_config_or_default(None), Config::default());
}
