use ecomap::{
    config::{ConfigError, ConfigLoader, DashboardConfig, LatencyConfig},
    LayerKind,
};
use tempfile::tempdir;

#[test]
fn bundled_config_loads() {
    let loader = ConfigLoader::new(env!("CARGO_MANIFEST_DIR"));
    let config = loader
        .load("configs/dashboard.yaml")
        .expect("bundled config should load");
    assert_eq!(config.name, "ecomap");
    assert_eq!(config.seed, Some(20250701));
    assert_eq!(config.poll_interval(LayerKind::AirQuality).as_secs(), 30 * 60);
    assert!(!config.rainfall.follow_reference_time);
}

#[test]
fn written_config_reads_back() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("fast.yaml");
    let config = DashboardConfig {
        name: "fast".into(),
        seed: Some(3),
        utc_offset_minutes: 540,
        latency: LatencyConfig::none(),
        ..DashboardConfig::default()
    };
    config.to_yaml(&path).expect("write config");

    let loaded = ConfigLoader::new(dir.path())
        .load("fast.yaml")
        .expect("read config");
    assert_eq!(loaded, config);
    assert!(loaded.latency(LayerKind::Rainfall).is_zero());
}

#[test]
fn load_errors_name_the_file() {
    let dir = tempdir().expect("tempdir");
    let loader = ConfigLoader::new(dir.path());

    let missing = loader.load("nope.yaml").unwrap_err();
    assert!(matches!(missing, ConfigError::Read { .. }));
    assert!(missing.to_string().contains("nope.yaml"));

    std::fs::write(dir.path().join("broken.yaml"), "seed: [unclosed").expect("write");
    let broken = loader.load("broken.yaml").unwrap_err();
    assert!(matches!(broken, ConfigError::Parse { .. }));

    std::fs::write(dir.path().join("offset.yaml"), "utc_offset_minutes: 2000\n").expect("write");
    let invalid = loader.load("offset.yaml").unwrap_err();
    assert!(matches!(invalid, ConfigError::Validation(_)));
}

#[test]
fn huge_poll_interval_is_a_validation_error() {
    let dir = tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join("slow.yaml"),
        "polling:\n  weather_minutes: 18446744073709551615\n",
    )
    .expect("write");
    let err = ConfigLoader::new(dir.path()).load("slow.yaml").unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
    assert!(err.to_string().contains("weather"));
}
