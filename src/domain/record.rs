//! Parameter records: complete, sparse (override sets) and typed.

use crate::domain::error::PresetError;
use crate::domain::schema::{AppliedPrice, FieldValue, MaMethod, ParamField, RecordKind};
use std::collections::BTreeMap;

/// A complete value set for one record kind, ordered by schema field order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamRecord {
    kind: RecordKind,
    values: BTreeMap<ParamField, FieldValue>,
}

impl ParamRecord {
    pub(crate) fn from_values(
        kind: RecordKind,
        values: impl IntoIterator<Item = (ParamField, FieldValue)>,
    ) -> Self {
        Self {
            kind,
            values: values.into_iter().collect(),
        }
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn get(&self, field: ParamField) -> Option<&FieldValue> {
        self.values.get(&field)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParamField, FieldValue)> + '_ {
        self.values.iter().map(|(field, value)| (*field, *value))
    }

    /// Writes every value of `overrides` over the current ones.
    pub(crate) fn apply(&mut self, overrides: &Overrides) {
        for (field, value) in overrides.iter() {
            self.values.insert(field, value);
        }
    }

    fn value(&self, field: ParamField) -> FieldValue {
        self.get(field)
            .copied()
            .unwrap_or_else(|| field.default_value())
    }

    fn int(&self, field: ParamField) -> i64 {
        match self.value(field) {
            FieldValue::Int(v) => v,
            _ => 0,
        }
    }

    fn int32(&self, field: ParamField) -> i32 {
        i32::try_from(self.int(field)).unwrap_or_default()
    }

    fn uint32(&self, field: ParamField) -> u32 {
        u32::try_from(self.int(field)).unwrap_or_default()
    }

    fn float(&self, field: ParamField) -> f64 {
        match self.value(field) {
            FieldValue::Float(v) => v,
            FieldValue::Int(v) => v as f64,
            _ => 0.0,
        }
    }
}

/// The sparse value set a layer overrides. Every value has been validated
/// against the schema when it was set.
#[derive(Debug, Clone, PartialEq)]
pub struct Overrides {
    kind: RecordKind,
    values: BTreeMap<ParamField, FieldValue>,
}

impl Overrides {
    pub fn new(kind: RecordKind) -> Self {
        Self {
            kind,
            values: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Sets one field, rejecting fields of the other kind and values outside
    /// the field's domain.
    pub fn set(&mut self, field: ParamField, value: impl Into<FieldValue>) -> Result<(), PresetError> {
        if field.kind() != self.kind {
            return Err(PresetError::WrongRecordKind {
                field: field.key().to_string(),
                expected: self.kind.name().to_string(),
            });
        }
        let value = field.validate(value.into())?;
        self.values.insert(field, value);
        Ok(())
    }

    /// Builder form of [`Overrides::set`].
    pub fn with(mut self, field: ParamField, value: impl Into<FieldValue>) -> Result<Self, PresetError> {
        self.set(field, value)?;
        Ok(self)
    }

    pub fn get(&self, field: ParamField) -> Option<&FieldValue> {
        self.values.get(&field)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = ParamField> + '_ {
        self.values.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParamField, FieldValue)> + '_ {
        self.values.iter().map(|(field, value)| (*field, *value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndicatorParams {
    pub period: u32,
    pub applied_price: AppliedPrice,
    pub ma_method: MaMethod,
    pub shift: u32,
}

impl IndicatorParams {
    /// Reads the typed view of a record already known to be an indicator record.
    pub(crate) fn read(record: &ParamRecord) -> Self {
        let applied_price = match record.value(ParamField::AppliedPrice) {
            FieldValue::AppliedPrice(p) => p,
            _ => AppliedPrice::Close,
        };
        let ma_method = match record.value(ParamField::MaMethod) {
            FieldValue::MaMethod(m) => m,
            _ => MaMethod::Sma,
        };
        Self {
            period: record.uint32(ParamField::Period),
            applied_price,
            ma_method,
            shift: record.uint32(ParamField::Shift),
        }
    }
}

impl TryFrom<&ParamRecord> for IndicatorParams {
    type Error = PresetError;

    fn try_from(record: &ParamRecord) -> Result<Self, Self::Error> {
        expect_kind(record, RecordKind::Indicator)?;
        Ok(Self::read(record))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StrategyParams {
    pub lot_size: f64,
    pub signal_open_method: i32,
    pub signal_open_filter: i32,
    pub signal_open_level: f64,
    pub signal_open_boost: i32,
    pub signal_close_method: i32,
    pub signal_close_level: f64,
    pub price_stop_method: i32,
    pub price_stop_level: f64,
    pub tick_filter_method: i32,
    pub max_spread: f64,
    pub signal_base_method: i32,
    pub signal_open_method2: i32,
    pub signal_close_method2: i32,
    pub trailing_stop_method: i32,
    pub trailing_profit_method: i32,
}

impl StrategyParams {
    pub(crate) fn read(record: &ParamRecord) -> Self {
        Self {
            lot_size: record.float(ParamField::LotSize),
            signal_open_method: record.int32(ParamField::SignalOpenMethod),
            signal_open_filter: record.int32(ParamField::SignalOpenFilter),
            signal_open_level: record.float(ParamField::SignalOpenLevel),
            signal_open_boost: record.int32(ParamField::SignalOpenBoost),
            signal_close_method: record.int32(ParamField::SignalCloseMethod),
            signal_close_level: record.float(ParamField::SignalCloseLevel),
            price_stop_method: record.int32(ParamField::PriceStopMethod),
            price_stop_level: record.float(ParamField::PriceStopLevel),
            tick_filter_method: record.int32(ParamField::TickFilterMethod),
            max_spread: record.float(ParamField::MaxSpread),
            signal_base_method: record.int32(ParamField::SignalBaseMethod),
            signal_open_method2: record.int32(ParamField::SignalOpenMethod2),
            signal_close_method2: record.int32(ParamField::SignalCloseMethod2),
            trailing_stop_method: record.int32(ParamField::TrailingStopMethod),
            trailing_profit_method: record.int32(ParamField::TrailingProfitMethod),
        }
    }
}

impl TryFrom<&ParamRecord> for StrategyParams {
    type Error = PresetError;

    fn try_from(record: &ParamRecord) -> Result<Self, Self::Error> {
        expect_kind(record, RecordKind::Strategy)?;
        Ok(Self::read(record))
    }
}

fn expect_kind(record: &ParamRecord, kind: RecordKind) -> Result<(), PresetError> {
    if record.kind() != kind {
        return Err(PresetError::WrongRecordKind {
            field: record.kind().defaults_name().to_string(),
            expected: kind.name().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::default_record;

    #[test]
    fn overrides_reject_other_kind() {
        let mut overrides = Overrides::new(RecordKind::Indicator);
        let err = overrides.set(ParamField::MaxSpread, 3.0).unwrap_err();
        assert!(matches!(
            err,
            PresetError::WrongRecordKind { ref field, ref expected }
                if field == "max_spread" && expected == "indicator"
        ));
        assert!(overrides.is_empty());
    }

    #[test]
    fn overrides_reject_out_of_domain_without_storing() {
        let mut overrides = Overrides::new(RecordKind::Indicator);
        assert!(overrides.set(ParamField::Period, 0_i64).is_err());
        assert_eq!(overrides.get(ParamField::Period), None);
    }

    #[test]
    fn overrides_normalise_values() {
        let overrides = Overrides::new(RecordKind::Indicator)
            .with(ParamField::MaMethod, 2_i64)
            .unwrap();
        assert_eq!(
            overrides.get(ParamField::MaMethod),
            Some(&FieldValue::MaMethod(MaMethod::Smma))
        );
    }

    #[test]
    fn apply_only_touches_overridden_fields() {
        let mut record = default_record(RecordKind::Indicator);
        let overrides = Overrides::new(RecordKind::Indicator)
            .with(ParamField::Period, 18_i64)
            .unwrap();
        record.apply(&overrides);
        assert_eq!(record.get(ParamField::Period), Some(&FieldValue::Int(18)));
        assert_eq!(
            record.get(ParamField::AppliedPrice),
            Some(&FieldValue::AppliedPrice(AppliedPrice::Close))
        );
        assert_eq!(record.len(), 4);
    }

    #[test]
    fn typed_indicator_params_from_defaults() {
        let params = IndicatorParams::try_from(&default_record(RecordKind::Indicator)).unwrap();
        assert_eq!(
            params,
            IndicatorParams {
                period: 14,
                applied_price: AppliedPrice::Close,
                ma_method: MaMethod::Sma,
                shift: 0,
            }
        );
    }

    #[test]
    fn typed_strategy_params_from_defaults() {
        let params = StrategyParams::try_from(&default_record(RecordKind::Strategy)).unwrap();
        assert_eq!(params.signal_open_filter, 1);
        assert_eq!(params.tick_filter_method, 1);
        assert_eq!(params.price_stop_level, 2.0);
        assert_eq!(params.max_spread, 0.0);
    }

    #[test]
    fn typed_conversion_checks_kind() {
        let err = StrategyParams::try_from(&default_record(RecordKind::Indicator)).unwrap_err();
        assert!(matches!(err, PresetError::WrongRecordKind { expected, .. } if expected == "strategy"));
    }
}
