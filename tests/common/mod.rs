#![allow(dead_code)]

use std::io::Write;
use stg_stddev::domain::record::Overrides;
use stg_stddev::domain::registry::LayerRegistry;
use stg_stddev::domain::schema::{ParamField, RecordKind};
use stg_stddev::domain::timeframe::Timeframe;

pub fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// Default{period=14}, Timeframe(M30){period=18}, Preset(EURUSD, M30){period=2}.
pub fn precedence_registry() -> LayerRegistry {
    let mut registry = LayerRegistry::new();
    registry
        .register_timeframe_layer(
            RecordKind::Indicator,
            Timeframe::M30,
            Overrides::new(RecordKind::Indicator)
                .with(ParamField::Period, 18_i64)
                .unwrap()
                .with(ParamField::MaMethod, 2_i64)
                .unwrap(),
        )
        .unwrap();
    registry
        .register_preset_layer(
            "EURUSD",
            Timeframe::M30,
            Overrides::new(RecordKind::Indicator)
                .with(ParamField::Period, 2_i64)
                .unwrap(),
            RecordKind::Indicator,
        )
        .unwrap();
    registry
}

/// Timeframe(M30){signal_open_level=10}, Preset(EURUSD, M30){max_spread=10, signal_open_level=36}.
pub fn strategy_registry() -> LayerRegistry {
    let mut registry = LayerRegistry::new();
    registry
        .register_timeframe_layer(
            RecordKind::Strategy,
            Timeframe::M30,
            Overrides::new(RecordKind::Strategy)
                .with(ParamField::SignalOpenLevel, 10.0)
                .unwrap(),
        )
        .unwrap();
    registry
        .register_preset_layer(
            "EURUSD",
            Timeframe::M30,
            Overrides::new(RecordKind::Strategy)
                .with(ParamField::MaxSpread, 10.0)
                .unwrap()
                .with(ParamField::SignalOpenLevel, 36.0)
                .unwrap(),
            RecordKind::Strategy,
        )
        .unwrap();
    registry
}
