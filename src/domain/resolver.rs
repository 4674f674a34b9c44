//! Parameter resolution.
//!
//! Folds a layer chain, least specific first, over the Default record of the
//! requested kind. A later layer's explicit value always wins; fields a layer
//! leaves unset keep the running value. The fold reads the registry only, so
//! any number of threads may resolve against the same registry at once.

use crate::domain::error::PresetError;
use crate::domain::record::{IndicatorParams, ParamRecord, StrategyParams};
use crate::domain::registry::LayerRegistry;
use crate::domain::schema::{default_record, RecordKind};
use crate::domain::timeframe::Timeframe;

#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    registry: &'a LayerRegistry,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a LayerRegistry) -> Self {
        Self { registry }
    }

    pub fn resolve(
        &self,
        kind: RecordKind,
        symbol: Option<&str>,
        timeframe: Option<Timeframe>,
    ) -> ParamRecord {
        let most_specific = self.registry.lookup(kind, symbol, timeframe);
        let mut record = default_record(kind);
        for layer in self.registry.chain(most_specific) {
            record.apply(&layer.overrides);
        }
        record
    }

    /// Resolves a record kind given by name (`indicator`, `stg`, ...).
    pub fn resolve_named(
        &self,
        kind: &str,
        symbol: Option<&str>,
        timeframe: Option<Timeframe>,
    ) -> Result<ParamRecord, PresetError> {
        let kind: RecordKind = kind.parse()?;
        Ok(self.resolve(kind, symbol, timeframe))
    }

    pub fn indicator_params(
        &self,
        symbol: Option<&str>,
        timeframe: Option<Timeframe>,
    ) -> IndicatorParams {
        IndicatorParams::read(&self.resolve(RecordKind::Indicator, symbol, timeframe))
    }

    pub fn strategy_params(
        &self,
        symbol: Option<&str>,
        timeframe: Option<Timeframe>,
    ) -> StrategyParams {
        StrategyParams::read(&self.resolve(RecordKind::Strategy, symbol, timeframe))
    }
}
