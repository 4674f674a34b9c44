//! CLI integration tests for preset loading and table output.
//!
//! Tests cover:
//! - Loading preset files from disk (load_presets)
//! - Error mapping for missing and malformed files
//! - CSV table output (write_table)
//! - Text rendering of records and layers

mod common;

use common::*;
use stg_stddev::cli;
use stg_stddev::domain::error::PresetError;
use stg_stddev::domain::resolver::Resolver;
use stg_stddev::domain::schema::RecordKind;
use stg_stddev::domain::timeframe::Timeframe;

const VALID_INI: &str = r#"
[indicator.M30]
period = 18
ma_method = 2

[strategy.M30]
signal_open_level = 10

[preset.EURUSD.M30]
period = 2
max_spread = 10
signal_open_level = 36

[preset.GBPUSD.H1]
StdDev_Applied_Price = 4
"#;

#[test]
fn load_presets_from_file() {
    let file = write_temp_ini(VALID_INI);
    let registry = cli::load_presets(Some(file.path())).unwrap();
    assert_eq!(registry.timeframe_layer_count(), 2);
    // EURUSD/M30 splits into an indicator and a strategy layer.
    assert_eq!(registry.preset_layer_count(), 3);
    assert_eq!(registry.symbols(), vec!["EURUSD", "GBPUSD"]);

    let resolver = Resolver::new(&registry);
    let indi = resolver.indicator_params(Some("EURUSD"), Some(Timeframe::M30));
    assert_eq!(indi.period, 2);
    assert_eq!(indi.ma_method.code(), 2);
    let gbp = resolver.indicator_params(Some("GBPUSD"), Some(Timeframe::H1));
    assert_eq!(gbp.applied_price.code(), 4);
    assert_eq!(gbp.period, 14);
}

#[test]
fn load_presets_without_path_uses_builtin_catalog() {
    let registry = cli::load_presets(None).unwrap();
    assert_eq!(registry.timeframe_layer_count(), 8);
    assert_eq!(registry.symbols(), vec!["EURUSD"]);
}

#[test]
fn missing_file_is_config_parse_error() {
    let err = cli::load_presets(Some("/nonexistent/presets.ini".as_ref())).unwrap_err();
    assert!(matches!(err, PresetError::ConfigParse { ref file, .. } if file.contains("presets.ini")));
}

#[test]
fn invalid_value_in_file_is_schema_violation() {
    let file = write_temp_ini("[indicator.M5]\nperiod = -1\n");
    let err = cli::load_presets(Some(file.path())).unwrap_err();
    assert!(matches!(err, PresetError::SchemaViolation { .. }));
}

#[test]
fn write_table_emits_header_and_rows() {
    let registry = strategy_registry();
    let mut out = Vec::new();
    cli::write_table(
        &registry,
        RecordKind::Strategy,
        &["EURUSD".to_string(), "GBPUSD".to_string()],
        &[Timeframe::M30],
        &mut out,
    )
    .unwrap();

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("symbol,timeframe,layer,lot_size,"));
    assert!(lines[1].starts_with("EURUSD,M30,strategy/EURUSD/M30,"));
    assert!(lines[2].starts_with("GBPUSD,M30,strategy/M30,"));

    let header: Vec<&str> = lines[0].split(',').collect();
    let column = header.iter().position(|h| *h == "max_spread").unwrap();
    assert_eq!(lines[1].split(',').nth(column), Some("10"));
    assert_eq!(lines[2].split(',').nth(column), Some("0"));
}

#[test]
fn render_record_lists_every_field() {
    let registry = precedence_registry();
    let record = Resolver::new(&registry).resolve(RecordKind::Indicator, Some("EURUSD"), Some(Timeframe::M30));
    let text = cli::render_record(&record);
    assert!(text.contains("period = 2\n"));
    assert!(text.contains("ma_method = 2\n"));
    assert_eq!(text.lines().count(), RecordKind::Indicator.fields().count());
}

#[test]
fn render_layers_shows_parent_chain() {
    let registry = precedence_registry();
    let text = cli::render_layers(&registry);
    let preset = text
        .lines()
        .find(|line| line.starts_with("indicator/EURUSD/M30"))
        .unwrap();
    assert!(preset.contains("parent: indicator/M30"));
    assert!(preset.contains("overrides: period"));
}

#[test]
fn preset_sections_naming_same_timeframe_are_duplicates() {
    let file = write_temp_ini(
        "[preset.EURUSD.M30]\nperiod = 2\n\n[preset.eurusd.PERIOD_M30]\nmax_spread = 10\n",
    );
    let err = cli::load_presets(Some(file.path())).unwrap_err();
    assert!(matches!(err, PresetError::DuplicateKey { .. }));
}
