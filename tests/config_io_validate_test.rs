use loadshare::config::{Config, LoadpointConfig, VehicleConfig};
use std::fs;

fn vehicle(title: &str, status: Option<&str>) -> VehicleConfig {
    VehicleConfig {
        title: title.to_string(),
        status: status.map(str::to_string),
    }
}

fn loadpoint(title: &str, vehicle: Option<&str>) -> LoadpointConfig {
    LoadpointConfig {
        title: title.to_string(),
        priority: 0,
        flexibility_w: 0.0,
        vehicle: vehicle.map(str::to_string),
    }
}

#[test]
fn save_and_load_yaml_roundtrip() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("config.yaml");

    let mut cfg = Config::default();
    cfg.site.timezone = "Europe/Berlin".to_string();
    cfg.logging.file = path.with_extension("log").to_string_lossy().to_string();
    cfg.vehicles.push(vehicle("van", Some("B")));
    cfg.loadpoints.push(LoadpointConfig {
        priority: 3,
        flexibility_w: 1400.0,
        ..loadpoint("garage", Some("van"))
    });

    cfg.save_to_file(&path).unwrap();
    let loaded = Config::from_file(&path).unwrap();

    assert_eq!(loaded.site.timezone, "Europe/Berlin");
    assert_eq!(loaded.logging.file, cfg.logging.file);
    assert_eq!(loaded.vehicles[0].status.as_deref(), Some("B"));
    assert_eq!(loaded.loadpoints[0].priority, 3);
    assert_eq!(loaded.loadpoints[0].vehicle.as_deref(), Some("van"));
    loaded.validate().unwrap();
    assert_eq!(loaded.timezone().unwrap(), chrono_tz::Europe::Berlin);
}

#[test]
fn optional_entity_fields_have_defaults() {
    let v: VehicleConfig = serde_yaml::from_str("title: car\n").unwrap();
    assert_eq!(v.status, None);

    let lp: LoadpointConfig = serde_yaml::from_str("title: garage\n").unwrap();
    assert_eq!(lp.priority, 0);
    assert_eq!(lp.flexibility_w, 0.0);
    assert_eq!(lp.vehicle, None);
}

#[test]
fn config_validation_errors() {
    let mut cfg = Config::default();
    assert!(cfg.validate().is_ok());

    cfg.site.title = "  ".to_string();
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.site.timezone = "Mars/Olympus".to_string();
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.site.cycle_interval_ms = 0;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.logging.level = "LOUD".to_string();
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.metrics.profile_days = 0;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.metrics.database.clear();
    assert!(cfg.validate().is_err());
    cfg.metrics.enabled = false;
    assert!(cfg.validate().is_ok());
}

#[test]
fn vehicle_and_loadpoint_validation() {
    let mut cfg = Config::default();
    cfg.vehicles = vec![vehicle("van", None), vehicle("van", None)];
    assert!(cfg.validate().is_err());

    cfg.vehicles = vec![vehicle("van", Some("Z"))];
    assert!(cfg.validate().is_err());

    cfg.vehicles = vec![vehicle("van", Some("c"))];
    assert!(cfg.validate().is_ok());

    cfg.loadpoints = vec![loadpoint("garage", None), loadpoint("garage", None)];
    assert!(cfg.validate().is_err());

    cfg.loadpoints = vec![loadpoint("garage", Some("truck"))];
    assert!(cfg.validate().is_err());

    cfg.loadpoints = vec![LoadpointConfig {
        flexibility_w: -1.0,
        ..loadpoint("garage", None)
    }];
    assert!(cfg.validate().is_err());

    cfg.loadpoints = vec![loadpoint("garage", Some("van"))];
    assert!(cfg.validate().is_ok());
}

#[test]
fn from_file_with_invalid_yaml_fails() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    fs::write(tmp.path(), b"bad: [unclosed").unwrap();
    let err = Config::from_file(tmp.path()).unwrap_err();
    let msg = format!("{}", err);
    assert!(msg.contains("Serialization error"));
}
