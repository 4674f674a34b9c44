//! Builds a layer registry from preset declarations in a config source.
//!
//! Section grammar:
//!
//! ```ini
//! [indicator.M30]          ; Timeframe layer of the indicator record
//! period = 18
//!
//! [strategy.M30]           ; Timeframe layer of the strategy record
//! signal_open_level = 10
//!
//! [preset.EURUSD.M30]      ; tuned preset, fields of either record
//! StdDev_Period = 2
//! max_spread = 10
//! ```
//!
//! Timeframe sections are registered before preset sections whatever their
//! order in the file.

use crate::domain::error::PresetError;
use crate::domain::record::Overrides;
use crate::domain::registry::LayerRegistry;
use crate::domain::schema::{FieldValue, ParamField, RecordKind};
use crate::domain::symbols::normalize_symbol;
use crate::domain::timeframe::Timeframe;
use crate::ports::config_port::ConfigPort;
use tracing::{debug, info};

enum Section {
    Timeframe {
        kind: RecordKind,
        timeframe: Timeframe,
    },
    Preset {
        symbol: String,
        timeframe: Timeframe,
    },
}

pub fn load_registry(config: &dyn ConfigPort) -> Result<LayerRegistry, PresetError> {
    let mut timeframe_sections = Vec::new();
    let mut preset_sections = Vec::new();

    for name in config.sections() {
        let keys = config.keys(&name);
        if name == "default" {
            if let Some(key) = keys.first() {
                return Err(PresetError::config_invalid(
                    &name,
                    key,
                    "key declared outside of a section",
                ));
            }
            continue;
        }
        match parse_section(&name)? {
            Section::Timeframe { kind, timeframe } => {
                timeframe_sections.push((name, kind, timeframe))
            }
            Section::Preset { symbol, timeframe } => {
                preset_sections.push((name, symbol, timeframe))
            }
        }
    }

    let mut registry = LayerRegistry::new();

    for (name, kind, timeframe) in timeframe_sections {
        let mut overrides = Overrides::new(kind);
        for (field, value) in read_fields(config, &name)? {
            overrides.set(field, value)?;
        }
        debug!("[{}] {} overrides", name, overrides.len());
        registry.register_timeframe_layer(kind, timeframe, overrides)?;
    }

    for (name, symbol, timeframe) in preset_sections {
        check_preset_identity(config, &name, &symbol, timeframe)?;
        let values = read_fields(config, &name)?;
        debug!("[{}] {} overrides", name, values.len());
        registry.register_preset_declaration(&symbol, timeframe, values)?;
    }

    info!(
        "loaded {} timeframe layers and {} preset layers",
        registry.timeframe_layer_count(),
        registry.preset_layer_count()
    );
    Ok(registry)
}

fn parse_section(name: &str) -> Result<Section, PresetError> {
    let parts: Vec<&str> = name.split('.').map(str::trim).collect();
    let timeframe = |value: &str| {
        value
            .parse::<Timeframe>()
            .map_err(|_| PresetError::config_invalid(name, "", format!("unknown timeframe '{}'", value)))
    };

    match parts.as_slice() {
        ["preset", symbol, tf] => Ok(Section::Preset {
            symbol: normalize_symbol(symbol).ok_or_else(|| {
                PresetError::config_invalid(name, "", "preset section without a symbol")
            })?,
            timeframe: timeframe(*tf)?,
        }),
        [kind, tf] => {
            let kind = kind
                .parse::<RecordKind>()
                .map_err(|_| PresetError::config_invalid(name, "", "unknown section"))?;
            Ok(Section::Timeframe {
                kind,
                timeframe: timeframe(*tf)?,
            })
        }
        _ => Err(PresetError::config_invalid(name, "", "unknown section")),
    }
}

/// Keys that identify a preset rather than override a field.
fn is_identity_key(key: &str) -> bool {
    matches!(key, "symbol" | "tf" | "timeframe")
}

fn check_preset_identity(
    config: &dyn ConfigPort,
    section: &str,
    symbol: &str,
    timeframe: Timeframe,
) -> Result<(), PresetError> {
    if let Some(declared) = config.get_string(section, "symbol") {
        let declared = declared.trim().trim_matches('"');
        if normalize_symbol(declared).as_deref() != Some(symbol) {
            return Err(PresetError::config_invalid(
                section,
                "symbol",
                format!("'{}' does not match section symbol {}", declared, symbol),
            ));
        }
    }
    for key in ["tf", "timeframe"] {
        if let Some(declared) = config.get_string(section, key) {
            let matches = declared
                .trim()
                .parse::<Timeframe>()
                .is_ok_and(|tf| tf == timeframe);
            if !matches {
                return Err(PresetError::config_invalid(
                    section,
                    key,
                    format!("'{}' does not match section timeframe {}", declared.trim(), timeframe),
                ));
            }
        }
    }
    Ok(())
}

fn read_fields(
    config: &dyn ConfigPort,
    section: &str,
) -> Result<Vec<(ParamField, FieldValue)>, PresetError> {
    let mut values = Vec::new();
    for key in config.keys(section) {
        if is_identity_key(&key) {
            continue;
        }
        let field = ParamField::from_key(&key)
            .ok_or_else(|| PresetError::config_invalid(section, &key, "unknown parameter"))?;
        let raw = config
            .get_string(section, &key)
            .ok_or_else(|| PresetError::config_invalid(section, &key, "missing value"))?;
        values.push((field, field.parse_value(&raw)?));
    }
    Ok(values)
}
