use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use vtraffic_config::{json_schema, ConfigError, LogFormat, LogLevel, TrafficConfig};

#[test]
fn partial_document_fills_in_defaults() {
    let config = TrafficConfig::from_yaml(
        "link:\n  host: 192.168.1.20\n  legacy_traffic: true\npool:\n  total_aircraft: 30\n  step_length: 500ms\n  seed: 7\n",
    )
    .expect("document loads");

    assert_eq!(config.link.host, IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20)));
    assert_eq!(config.link.traffic_addr().port(), 49003);
    assert_eq!(config.link.link_port, 10747);
    assert_eq!(config.pool.total_aircraft, 30);
    assert_eq!(config.pool.vfr_aircraft, 5);
    assert_eq!(config.pool.step_length, Duration::from_millis(500));
    assert_eq!(config.pool.seed, Some(7));
    assert_eq!(config.data.scripts_dir, "vfrScripts");
    assert_eq!(config.logging.level, LogLevel::Info);
}

#[test]
fn plain_numbers_are_milliseconds() {
    let config = TrafficConfig::from_yaml("link:\n  read_timeout: 1500\n").expect("loads");
    assert_eq!(config.link.read_timeout, Duration::from_millis(1_500));
}

#[test]
fn yaml_round_trip_keeps_every_setting() {
    let mut config = TrafficConfig::default();
    config.pool.seed = Some(42);
    config.pool.range_nm = 75.5;
    config.link.min_position_interval = Duration::from_millis(250);
    config.logging.format = LogFormat::Json;
    config.logging.level = LogLevel::Debug;

    let text = config.to_yaml().expect("renders");
    assert!(text.contains("min_position_interval: 250ms"));
    assert_eq!(TrafficConfig::from_yaml(&text).expect("parses back"), config);
}

#[test]
fn unknown_fields_and_bad_values_are_rejected() {
    assert!(matches!(
        TrafficConfig::from_yaml("pool:\n  aircraft: 3\n"),
        Err(ConfigError::Document(_))
    ));
    assert!(matches!(
        TrafficConfig::from_yaml("link:\n  host: simulator.local\n"),
        Err(ConfigError::InvalidAddress {
            field: "link.host",
            ..
        })
    ));
    assert!(matches!(
        TrafficConfig::from_yaml("pool:\n  step_length: soon\n"),
        Err(ConfigError::Document(_))
    ));
    assert!(matches!(
        TrafficConfig::from_yaml("pool:\n  total_aircraft: 2\n  vfr_aircraft: 3\n"),
        Err(ConfigError::InvalidPool(_))
    ));
}

#[test]
fn load_reads_from_disk() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("vtraffic.yaml");
    fs::write(&path, "data:\n  dir: /opt/traffic\n").expect("write config");

    let config = TrafficConfig::load(&path).expect("loads");
    assert_eq!(config.data.dir, std::path::PathBuf::from("/opt/traffic"));
    assert_eq!(
        config.data.scripts_path(),
        std::path::PathBuf::from("/opt/traffic/vfrScripts")
    );

    let missing = TrafficConfig::load(dir.path().join("missing.yaml"));
    assert!(matches!(missing, Err(ConfigError::Read { .. })));
}

#[test]
fn schema_describes_every_section() {
    let schema = json_schema();
    let properties = schema
        .get("properties")
        .and_then(|value| value.as_object())
        .expect("schema has properties");
    for section in ["link", "pool", "data", "logging"] {
        assert!(properties.contains_key(section), "missing {section}");
    }
}
