use std::time::{SystemTime, UNIX_EPOCH};

use tick_spectra::config::{parse_freq_ms, Config};
use tick_spectra::ShortInputPolicy;

fn temp_config(test_name: &str, body: &str) -> std::path::PathBuf {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be monotonic")
        .as_nanos();
    let path = std::env::temp_dir().join(format!("ts-{}-{}.toml", test_name, ts));
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn shipped_default_config_is_valid() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config/default.toml");
    let config = Config::load_from_path(&path).unwrap();
    let pipeline = config.pipeline.resolve().unwrap();
    assert_eq!(pipeline.freq_ms, 100);
    assert_eq!(pipeline.window_size, 256);
    assert_eq!(pipeline.n_fft_features, 10);
    assert!((pipeline.sample_rate - 10.0).abs() < f64::EPSILON);
    assert_eq!(pipeline.short_input, ShortInputPolicy::Pad);
}

#[test]
fn partial_config_falls_back_to_defaults() {
    let path = temp_config(
        "partial",
        r#"
[pipeline]
freq = "1s"
n_fft_features = 4
"#,
    );
    let config = Config::load_from_path(&path).unwrap();
    assert_eq!(config.binance.symbol, "BTCUSDT");
    let pipeline = config.pipeline.resolve().unwrap();
    assert_eq!(pipeline.freq_ms, 1_000);
    assert_eq!(pipeline.window_size, 256);
    assert!((pipeline.sample_rate - 1.0).abs() < f64::EPSILON);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn invalid_values_are_rejected_on_load() {
    for body in [
        "[pipeline]\nfreq = \"fast\"\n",
        "[pipeline]\nwindow_size = 0\n",
        "[pipeline]\nstep_size = 0\n",
        "[pipeline]\nn_fft_features = 0\n",
        "[pipeline]\nsample_rate = -1.0\n",
        "[pipeline]\nshort_input = \"truncate\"\n",
        "[binance]\nsymbol = \"  \"\n",
    ] {
        let path = temp_config("invalid", body);
        assert!(Config::load_from_path(&path).is_err(), "accepted: {}", body);
        let _ = std::fs::remove_file(&path);
    }
}

#[test]
fn missing_file_is_an_error() {
    let path = std::env::temp_dir().join("ts-definitely-missing-config.toml");
    let err = Config::load_from_path(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("failed to read"));
}

#[test]
fn frequency_strings() {
    assert_eq!(parse_freq_ms("100ms").unwrap(), 100);
    assert_eq!(parse_freq_ms("15s").unwrap(), 15_000);
    assert!(parse_freq_ms("-1s").is_err());
    assert!(parse_freq_ms("1.5s").is_err());
}
