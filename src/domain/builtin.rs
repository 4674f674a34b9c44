//! Built-in StdDev preset catalog.
//!
//! Per-timeframe defaults and the tuned EURUSD sets the strategy ships with.

use crate::domain::error::PresetError;
use crate::domain::record::Overrides;
use crate::domain::registry::LayerRegistry;
use crate::domain::schema::{FieldValue, ParamField, RecordKind};
use crate::domain::timeframe::Timeframe;
use tracing::info;

type Values = &'static [(ParamField, FieldValue)];

use FieldValue::{Float, Int};
use ParamField::*;

const INDICATOR_TIMEFRAMES: &[(Timeframe, Values)] = &[
    (Timeframe::M1, &[(Shift, Int(0))]),
    (
        Timeframe::M5,
        &[(AppliedPrice, Int(0)), (MaMethod, Int(0)), (Period, Int(14)), (Shift, Int(0))],
    ),
    (
        Timeframe::M30,
        &[(AppliedPrice, Int(0)), (MaMethod, Int(2)), (Period, Int(18)), (Shift, Int(0))],
    ),
    (Timeframe::H8, &[(Shift, Int(0))]),
];

/// Strategy timeframe tables differ only in their open and stop levels.
const STRATEGY_TIMEFRAMES: &[(Timeframe, f64, f64)] = &[
    (Timeframe::M1, 0.0, 2.0),
    (Timeframe::M5, 0.0, 1.0),
    (Timeframe::M30, 10.0, 1.0),
    (Timeframe::H8, 0.0, 2.0),
];

const EURUSD_PRESETS: &[(Timeframe, Values)] = &[
    (
        Timeframe::M1,
        &[
            (Period, Int(32)),
            (AppliedPrice, Int(3)),
            (Shift, Int(0)),
            (TrailingStopMethod, Int(6)),
            (TrailingProfitMethod, Int(11)),
            (SignalOpenLevel, Float(36.0)),
            (SignalBaseMethod, Int(0)),
            (SignalOpenMethod, Int(0)),
            (SignalOpenMethod2, Int(0)),
            (SignalCloseLevel, Float(36.0)),
            (SignalCloseMethod, Int(0)),
            (SignalCloseMethod2, Int(0)),
            (MaxSpread, Float(2.0)),
        ],
    ),
    (
        Timeframe::M5,
        &[
            (Period, Int(2)),
            (AppliedPrice, Int(3)),
            (Shift, Int(0)),
            (TrailingStopMethod, Int(6)),
            (TrailingProfitMethod, Int(11)),
            (SignalOpenLevel, Float(36.0)),
            (SignalBaseMethod, Int(-61)),
            (SignalOpenMethod, Int(1)),
            (SignalOpenMethod2, Int(0)),
            (SignalCloseLevel, Float(36.0)),
            (SignalCloseMethod, Int(1)),
            (SignalCloseMethod2, Int(0)),
            (MaxSpread, Float(3.0)),
        ],
    ),
    (
        Timeframe::M15,
        &[
            (Period, Int(2)),
            (AppliedPrice, Int(3)),
            (Shift, Int(0)),
            (TrailingStopMethod, Int(6)),
            (TrailingProfitMethod, Int(11)),
            (SignalOpenLevel, Float(36.0)),
            (SignalBaseMethod, Int(-63)),
            (SignalOpenMethod, Int(389)),
            (SignalOpenMethod2, Int(0)),
            (SignalCloseLevel, Float(36.0)),
            (SignalCloseMethod, Int(1)),
            (SignalCloseMethod2, Int(0)),
            (MaxSpread, Float(4.0)),
        ],
    ),
    (
        Timeframe::H4,
        &[
            (Period, Int(2)),
            (AppliedPrice, Int(3)),
            (Shift, Int(0)),
            (SignalOpenMethod, Int(0)),
            (SignalOpenLevel, Float(36.0)),
            (SignalCloseMethod, Int(1)),
            (SignalCloseLevel, Float(36.0)),
            (PriceStopMethod, Int(0)),
            (PriceStopLevel, Float(0.0)),
            (MaxSpread, Float(10.0)),
        ],
    ),
];

fn overrides(kind: RecordKind, values: Values) -> Result<Overrides, PresetError> {
    values
        .iter()
        .try_fold(Overrides::new(kind), |acc, (field, value)| acc.with(*field, *value))
}

fn strategy_timeframe(open_level: f64, stop_level: f64) -> Result<Overrides, PresetError> {
    Overrides::new(RecordKind::Strategy)
        .with(LotSize, 0.0)?
        .with(SignalOpenMethod, 0_i64)?
        .with(SignalOpenFilter, 1_i64)?
        .with(SignalOpenLevel, open_level)?
        .with(SignalOpenBoost, 0_i64)?
        .with(SignalCloseMethod, 0_i64)?
        .with(SignalCloseLevel, 0.0)?
        .with(PriceStopMethod, 0_i64)?
        .with(PriceStopLevel, stop_level)?
        .with(TickFilterMethod, 1_i64)?
        .with(MaxSpread, 0.0)
}

/// Builds a registry holding the built-in catalog. Timeframe layers are
/// registered first so every preset chains onto its timeframe.
pub fn stddev_registry() -> Result<LayerRegistry, PresetError> {
    let mut registry = LayerRegistry::new();

    for (timeframe, values) in INDICATOR_TIMEFRAMES {
        registry.register_timeframe_layer(
            RecordKind::Indicator,
            *timeframe,
            overrides(RecordKind::Indicator, values)?,
        )?;
    }
    for (timeframe, open_level, stop_level) in STRATEGY_TIMEFRAMES {
        registry.register_timeframe_layer(
            RecordKind::Strategy,
            *timeframe,
            strategy_timeframe(*open_level, *stop_level)?,
        )?;
    }
    for (timeframe, values) in EURUSD_PRESETS {
        registry.register_preset_declaration("EURUSD", *timeframe, values.iter().copied())?;
    }

    info!(
        "built-in catalog: {} timeframe layers, {} preset layers",
        registry.timeframe_layer_count(),
        registry.preset_layer_count()
    );
    Ok(registry)
}
