use std::sync::Mutex;

use tempfile::NamedTempFile;

use people_counter::config::CounterConfig;
use people_counter::Device;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "PEOPLED_CONFIG",
        "PEOPLED_MODEL",
        "PEOPLED_INPUT",
        "PEOPLED_DEVICE",
        "PEOPLED_MQTT_BROKER_ADDR",
        "PEOPLED_CONFIDENCE_THRESHOLD",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn defaults_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = CounterConfig::load().expect("load config");
    assert!(cfg.model.is_none());
    // No layer supplies an input by default; resolution is a startup error.
    assert!(cfg.input.is_none());
    assert!(cfg.require_input().is_err());
    assert_eq!(cfg.device, Device::Cpu);
    assert_eq!(cfg.confidence_threshold, 0.5);
    assert_eq!(cfg.window_capacity, 30);
    assert_eq!(cfg.tracking_threshold, 0.2);
    assert_eq!(cfg.mqtt.broker_addr, "127.0.0.1:3001");
    assert!(cfg.mqtt_enabled);

    let shape = cfg.model_shape();
    assert_eq!((shape.batch, shape.channels), (1, 3));
    assert_eq!((shape.width, shape.height), (544, 320));
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "model": "models/person-detection.onnx",
        "input": "videos/lobby.mp4",
        "device": "cpu",
        "confidence_threshold": 0.6,
        "target_fps": 12,
        "model_input": { "width": 300, "height": 300 },
        "smoothing": { "window_capacity": 20, "tracking_threshold": 0.25 },
        "mqtt": {
            "broker_addr": "broker.local:1883",
            "client_id": "lobby-counter",
            "enabled": true
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("PEOPLED_CONFIG", file.path());
    std::env::set_var("PEOPLED_INPUT", "stub://override");
    std::env::set_var("PEOPLED_MQTT_BROKER_ADDR", "10.0.0.5:1883");

    let cfg = CounterConfig::load().expect("load config");
    // File values survive where no env override exists.
    assert_eq!(
        cfg.model.as_deref(),
        Some(std::path::Path::new("models/person-detection.onnx"))
    );
    assert_eq!(cfg.confidence_threshold, 0.6);
    assert_eq!(cfg.target_fps, 12);
    assert_eq!(cfg.window_capacity, 20);
    assert_eq!(cfg.tracking_threshold, 0.25);
    assert_eq!(cfg.model_input_width, 300);
    assert_eq!(cfg.mqtt.client_id, "lobby-counter");
    // Env wins over the file.
    assert_eq!(cfg.require_input().unwrap(), "stub://override");
    assert_eq!(cfg.mqtt.broker_addr, "10.0.0.5:1883");

    clear_env();
}

#[test]
fn rejects_out_of_range_thresholds() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("PEOPLED_CONFIDENCE_THRESHOLD", "1.5");
    assert!(CounterConfig::load().is_err());

    std::env::set_var("PEOPLED_CONFIDENCE_THRESHOLD", "not-a-number");
    assert!(CounterConfig::load().is_err());

    clear_env();
}

#[test]
fn revalidation_rejects_out_of_range_overlays() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    // Values merged after load (the CLI path) must fail a re-validation.
    let mut cfg = CounterConfig::load().expect("load config");
    assert!(cfg.validate().is_ok());
    cfg.confidence_threshold = 1.5;
    assert!(cfg.validate().is_err());

    cfg.confidence_threshold = 0.5;
    cfg.tracking_threshold = 0.0;
    assert!(cfg.validate().is_err());
}

#[test]
fn rejects_unknown_devices() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("PEOPLED_DEVICE", "myriad");
    assert!(CounterConfig::load().is_err());

    clear_env();
}
