//! Field schema for the StdDev parameter records.
//!
//! Declares the closed field set of each record kind, the domain every value
//! must satisfy and the family-wide default. Records built from the schema
//! are always complete, so layers only ever carry the fields they change.

use crate::domain::error::PresetError;
use crate::domain::record::ParamRecord;
use std::fmt;
use std::str::FromStr;

/// Upper bound shared by all integer domains.
const INT_MAX: i64 = i32::MAX as i64;

/// Signal method codes are signed bitmasks over ten conditions.
const METHOD_MIN: i64 = -1023;
const METHOD_MAX: i64 = 1023;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKind {
    Indicator,
    Strategy,
}

impl RecordKind {
    pub const ALL: [RecordKind; 2] = [RecordKind::Indicator, RecordKind::Strategy];

    pub fn name(self) -> &'static str {
        match self {
            RecordKind::Indicator => "indicator",
            RecordKind::Strategy => "strategy",
        }
    }

    /// Name of the family-wide base record.
    pub fn defaults_name(self) -> &'static str {
        match self {
            RecordKind::Indicator => "indi_stddev_defaults",
            RecordKind::Strategy => "stg_stddev_defaults",
        }
    }

    pub fn fields(self) -> impl Iterator<Item = ParamField> {
        ParamField::ALL
            .into_iter()
            .filter(move |field| field.kind() == self)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RecordKind {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "indicator" | "indi" => Ok(RecordKind::Indicator),
            "strategy" | "stg" => Ok(RecordKind::Strategy),
            _ => Err(PresetError::UnknownRecordKind {
                kind: s.to_string(),
            }),
        }
    }
}

/// Price series the indicator is computed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AppliedPrice {
    Close,
    Open,
    High,
    Low,
    Median,
    Typical,
    Weighted,
}

impl AppliedPrice {
    const ALL: [AppliedPrice; 7] = [
        AppliedPrice::Close,
        AppliedPrice::Open,
        AppliedPrice::High,
        AppliedPrice::Low,
        AppliedPrice::Median,
        AppliedPrice::Typical,
        AppliedPrice::Weighted,
    ];

    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.code() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            AppliedPrice::Close => "close",
            AppliedPrice::Open => "open",
            AppliedPrice::High => "high",
            AppliedPrice::Low => "low",
            AppliedPrice::Median => "median",
            AppliedPrice::Typical => "typical",
            AppliedPrice::Weighted => "weighted",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

/// Averaging method of the underlying moving average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MaMethod {
    Sma,
    Ema,
    Smma,
    Lwma,
}

impl MaMethod {
    const ALL: [MaMethod; 4] = [MaMethod::Sma, MaMethod::Ema, MaMethod::Smma, MaMethod::Lwma];

    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.code() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            MaMethod::Sma => "sma",
            MaMethod::Ema => "ema",
            MaMethod::Smma => "smma",
            MaMethod::Lwma => "lwma",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    AppliedPrice(AppliedPrice),
    MaMethod(MaMethod),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::AppliedPrice(p) => write!(f, "{}", p.code()),
            FieldValue::MaMethod(m) => write!(f, "{}", m.code()),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<AppliedPrice> for FieldValue {
    fn from(p: AppliedPrice) -> Self {
        FieldValue::AppliedPrice(p)
    }
}

impl From<MaMethod> for FieldValue {
    fn from(m: MaMethod) -> Self {
        FieldValue::MaMethod(m)
    }
}

/// Valid value set of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    PositiveInt,
    NonNegativeInt,
    IntRange { min: i64, max: i64 },
    FiniteFloat,
    NonNegativeFloat,
    AppliedPrice,
    MaMethod,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::PositiveInt => write!(f, "integer > 0"),
            Domain::NonNegativeInt => write!(f, "integer >= 0"),
            Domain::IntRange { min, max } => write!(f, "integer in {}..={}", min, max),
            Domain::FiniteFloat => write!(f, "finite number"),
            Domain::NonNegativeFloat => write!(f, "finite number >= 0"),
            Domain::AppliedPrice => write!(f, "applied price code 0..=6"),
            Domain::MaMethod => write!(f, "MA method code 0..=3"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamField {
    // Indicator
    Period,
    AppliedPrice,
    MaMethod,
    Shift,
    // Strategy
    LotSize,
    SignalOpenMethod,
    SignalOpenFilter,
    SignalOpenLevel,
    SignalOpenBoost,
    SignalCloseMethod,
    SignalCloseLevel,
    PriceStopMethod,
    PriceStopLevel,
    TickFilterMethod,
    MaxSpread,
    SignalBaseMethod,
    SignalOpenMethod2,
    SignalCloseMethod2,
    TrailingStopMethod,
    TrailingProfitMethod,
}

/// Alternate spellings accepted by `ParamField::from_key`, lower case.
const KEY_ALIASES: &[(&str, ParamField)] = &[
    ("ma_period", ParamField::Period),
    ("stddev_period", ParamField::Period),
    ("stddev_applied_price", ParamField::AppliedPrice),
    ("stddev_ma_method", ParamField::MaMethod),
    ("stddev_shift", ParamField::Shift),
    ("stddev_lotsize", ParamField::LotSize),
    ("stddev_signalopenmethod", ParamField::SignalOpenMethod),
    ("stddev_signalopenmethod1", ParamField::SignalOpenMethod),
    ("signal_open_method1", ParamField::SignalOpenMethod),
    ("stddev_signalopenmethod2", ParamField::SignalOpenMethod2),
    ("stddev_signalopenfilter", ParamField::SignalOpenFilter),
    ("stddev_signalopenlevel", ParamField::SignalOpenLevel),
    ("stddev_signalopenboost", ParamField::SignalOpenBoost),
    ("stddev_signalbasemethod", ParamField::SignalBaseMethod),
    ("stddev_signalclosemethod", ParamField::SignalCloseMethod),
    ("stddev_signalclosemethod1", ParamField::SignalCloseMethod),
    ("signal_close_method1", ParamField::SignalCloseMethod),
    ("stddev_signalclosemethod2", ParamField::SignalCloseMethod2),
    ("stddev_signalcloselevel", ParamField::SignalCloseLevel),
    ("stddev_pricelimitmethod", ParamField::PriceStopMethod),
    ("stddev_pricestopmethod", ParamField::PriceStopMethod),
    ("stddev_pricelimitlevel", ParamField::PriceStopLevel),
    ("stddev_pricestoplevel", ParamField::PriceStopLevel),
    ("stddev_tickfiltermethod", ParamField::TickFilterMethod),
    ("stddev_maxspread", ParamField::MaxSpread),
    ("stddev_trailingstopmethod", ParamField::TrailingStopMethod),
    ("stddev_trailingprofitmethod", ParamField::TrailingProfitMethod),
];

impl ParamField {
    pub const ALL: [ParamField; 20] = [
        ParamField::Period,
        ParamField::AppliedPrice,
        ParamField::MaMethod,
        ParamField::Shift,
        ParamField::LotSize,
        ParamField::SignalOpenMethod,
        ParamField::SignalOpenFilter,
        ParamField::SignalOpenLevel,
        ParamField::SignalOpenBoost,
        ParamField::SignalCloseMethod,
        ParamField::SignalCloseLevel,
        ParamField::PriceStopMethod,
        ParamField::PriceStopLevel,
        ParamField::TickFilterMethod,
        ParamField::MaxSpread,
        ParamField::SignalBaseMethod,
        ParamField::SignalOpenMethod2,
        ParamField::SignalCloseMethod2,
        ParamField::TrailingStopMethod,
        ParamField::TrailingProfitMethod,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ParamField::Period => "period",
            ParamField::AppliedPrice => "applied_price",
            ParamField::MaMethod => "ma_method",
            ParamField::Shift => "shift",
            ParamField::LotSize => "lot_size",
            ParamField::SignalOpenMethod => "signal_open_method",
            ParamField::SignalOpenFilter => "signal_open_filter",
            ParamField::SignalOpenLevel => "signal_open_level",
            ParamField::SignalOpenBoost => "signal_open_boost",
            ParamField::SignalCloseMethod => "signal_close_method",
            ParamField::SignalCloseLevel => "signal_close_level",
            ParamField::PriceStopMethod => "price_stop_method",
            ParamField::PriceStopLevel => "price_stop_level",
            ParamField::TickFilterMethod => "tick_filter_method",
            ParamField::MaxSpread => "max_spread",
            ParamField::SignalBaseMethod => "signal_base_method",
            ParamField::SignalOpenMethod2 => "signal_open_method2",
            ParamField::SignalCloseMethod2 => "signal_close_method2",
            ParamField::TrailingStopMethod => "trailing_stop_method",
            ParamField::TrailingProfitMethod => "trailing_profit_method",
        }
    }

    /// Looks up a field by canonical key or any known alias, ignoring case.
    pub fn from_key(key: &str) -> Option<ParamField> {
        let key = key.trim().to_lowercase();
        ParamField::ALL
            .into_iter()
            .find(|field| field.key() == key)
            .or_else(|| {
                KEY_ALIASES
                    .iter()
                    .find(|(alias, _)| *alias == key)
                    .map(|(_, field)| *field)
            })
    }

    pub fn kind(self) -> RecordKind {
        match self {
            ParamField::Period
            | ParamField::AppliedPrice
            | ParamField::MaMethod
            | ParamField::Shift => RecordKind::Indicator,
            _ => RecordKind::Strategy,
        }
    }

    pub fn domain(self) -> Domain {
        match self {
            ParamField::Period => Domain::PositiveInt,
            ParamField::AppliedPrice => Domain::AppliedPrice,
            ParamField::MaMethod => Domain::MaMethod,
            ParamField::Shift
            | ParamField::PriceStopMethod
            | ParamField::TickFilterMethod
            | ParamField::TrailingStopMethod
            | ParamField::TrailingProfitMethod => Domain::NonNegativeInt,
            ParamField::SignalOpenMethod
            | ParamField::SignalOpenFilter
            | ParamField::SignalOpenBoost
            | ParamField::SignalCloseMethod
            | ParamField::SignalBaseMethod
            | ParamField::SignalOpenMethod2
            | ParamField::SignalCloseMethod2 => Domain::IntRange {
                min: METHOD_MIN,
                max: METHOD_MAX,
            },
            ParamField::SignalOpenLevel | ParamField::SignalCloseLevel => Domain::FiniteFloat,
            ParamField::LotSize | ParamField::PriceStopLevel | ParamField::MaxSpread => {
                Domain::NonNegativeFloat
            }
        }
    }

    pub fn default_value(self) -> FieldValue {
        match self {
            ParamField::Period => FieldValue::Int(14),
            ParamField::AppliedPrice => FieldValue::AppliedPrice(AppliedPrice::Close),
            ParamField::MaMethod => FieldValue::MaMethod(MaMethod::Sma),
            ParamField::SignalOpenFilter | ParamField::TickFilterMethod => FieldValue::Int(1),
            ParamField::PriceStopLevel => FieldValue::Float(2.0),
            ParamField::LotSize
            | ParamField::SignalOpenLevel
            | ParamField::SignalCloseLevel
            | ParamField::MaxSpread => FieldValue::Float(0.0),
            _ => FieldValue::Int(0),
        }
    }

    /// Checks `value` against the field's domain and normalises it to the
    /// field's value type (integer literals are accepted for float fields,
    /// integer codes for enumerated fields).
    pub fn validate(self, value: FieldValue) -> Result<FieldValue, PresetError> {
        let domain = self.domain();
        let normalised = match (domain, value) {
            (Domain::PositiveInt, FieldValue::Int(v)) if v > 0 && v <= INT_MAX => Some(value),
            (Domain::NonNegativeInt, FieldValue::Int(v)) if (0..=INT_MAX).contains(&v) => {
                Some(value)
            }
            (Domain::IntRange { min, max }, FieldValue::Int(v)) if (min..=max).contains(&v) => {
                Some(value)
            }
            (Domain::FiniteFloat, FieldValue::Float(v)) if v.is_finite() => Some(value),
            (Domain::NonNegativeFloat, FieldValue::Float(v)) if v.is_finite() && v >= 0.0 => {
                Some(value)
            }
            (Domain::FiniteFloat | Domain::NonNegativeFloat, FieldValue::Int(v)) => {
                return self.validate(FieldValue::Float(v as f64));
            }
            (Domain::AppliedPrice, FieldValue::AppliedPrice(_)) => Some(value),
            (Domain::AppliedPrice, FieldValue::Int(code)) => {
                AppliedPrice::from_code(code).map(FieldValue::AppliedPrice)
            }
            (Domain::MaMethod, FieldValue::MaMethod(_)) => Some(value),
            (Domain::MaMethod, FieldValue::Int(code)) => {
                MaMethod::from_code(code).map(FieldValue::MaMethod)
            }
            _ => None,
        };

        normalised.ok_or_else(|| PresetError::SchemaViolation {
            field: self.key().to_string(),
            value: value.to_string(),
            domain: domain.to_string(),
        })
    }

    /// Parses the textual form of a value and validates it.
    pub fn parse_value(self, raw: &str) -> Result<FieldValue, PresetError> {
        let text = raw.trim().trim_matches('"').to_lowercase();
        let parsed = match self.domain() {
            Domain::PositiveInt | Domain::NonNegativeInt | Domain::IntRange { .. } => {
                text.parse::<i64>().ok().map(FieldValue::Int)
            }
            Domain::FiniteFloat | Domain::NonNegativeFloat => {
                text.parse::<f64>().ok().map(FieldValue::Float)
            }
            Domain::AppliedPrice => text
                .parse::<i64>()
                .ok()
                .map(FieldValue::Int)
                .or_else(|| AppliedPrice::from_name(&text).map(FieldValue::AppliedPrice)),
            Domain::MaMethod => text
                .parse::<i64>()
                .ok()
                .map(FieldValue::Int)
                .or_else(|| MaMethod::from_name(&text).map(FieldValue::MaMethod)),
        };

        match parsed {
            Some(value) => self.validate(value),
            None => Err(PresetError::SchemaViolation {
                field: self.key().to_string(),
                value: raw.trim().to_string(),
                domain: self.domain().to_string(),
            }),
        }
    }
}

impl fmt::Display for ParamField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Returns the fully populated base record of `kind`.
pub fn default_record(kind: RecordKind) -> ParamRecord {
    ParamRecord::from_values(
        kind,
        kind.fields().map(|field| (field, field.default_value())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_field_belongs_to_one_kind() {
        let indicator: Vec<_> = RecordKind::Indicator.fields().collect();
        let strategy: Vec<_> = RecordKind::Strategy.fields().collect();
        assert_eq!(indicator.len(), 4);
        assert_eq!(strategy.len(), 16);
        assert!(indicator.iter().all(|f| !strategy.contains(f)));
    }

    #[test]
    fn defaults_satisfy_their_domain() {
        for field in ParamField::ALL {
            let default = field.default_value();
            assert_eq!(field.validate(default).unwrap(), default, "{}", field);
        }
    }

    #[test]
    fn record_kind_parses_short_names() {
        assert_eq!("indi".parse::<RecordKind>().unwrap(), RecordKind::Indicator);
        assert_eq!("STG".parse::<RecordKind>().unwrap(), RecordKind::Strategy);
        let err = "oscillator".parse::<RecordKind>().unwrap_err();
        assert!(matches!(err, PresetError::UnknownRecordKind { kind } if kind == "oscillator"));
    }

    #[test]
    fn from_key_accepts_aliases() {
        assert_eq!(ParamField::from_key("ma_period"), Some(ParamField::Period));
        assert_eq!(ParamField::from_key("StdDev_Period"), Some(ParamField::Period));
        assert_eq!(
            ParamField::from_key("StdDev_SignalOpenMethod1"),
            Some(ParamField::SignalOpenMethod)
        );
        assert_eq!(
            ParamField::from_key("StdDev_PriceLimitLevel"),
            Some(ParamField::PriceStopLevel)
        );
        assert_eq!(ParamField::from_key("nope"), None);
    }

    #[test]
    fn canonical_keys_round_trip() {
        for field in ParamField::ALL {
            assert_eq!(ParamField::from_key(field.key()), Some(field));
        }
    }

    #[test]
    fn period_must_be_positive() {
        assert!(ParamField::Period.validate(FieldValue::Int(1)).is_ok());
        for bad in [0, -5] {
            let err = ParamField::Period.validate(FieldValue::Int(bad)).unwrap_err();
            assert!(matches!(
                err,
                PresetError::SchemaViolation { ref field, ref domain, .. }
                    if field == "period" && domain == "integer > 0"
            ));
        }
    }

    #[test]
    fn float_fields_accept_integer_literals() {
        assert_eq!(
            ParamField::SignalOpenLevel.validate(FieldValue::Int(10)).unwrap(),
            FieldValue::Float(10.0)
        );
    }

    #[test]
    fn float_fields_reject_nan_and_negatives_where_required() {
        assert!(ParamField::SignalOpenLevel.validate(FieldValue::Float(f64::NAN)).is_err());
        assert!(ParamField::SignalOpenLevel.validate(FieldValue::Float(-3.0)).is_ok());
        assert!(ParamField::MaxSpread.validate(FieldValue::Float(-1.0)).is_err());
    }

    #[test]
    fn int_fields_reject_floats() {
        assert!(ParamField::Shift.validate(FieldValue::Float(1.0)).is_err());
    }

    #[test]
    fn enum_codes_are_range_checked() {
        assert_eq!(
            ParamField::AppliedPrice.validate(FieldValue::Int(3)).unwrap(),
            FieldValue::AppliedPrice(AppliedPrice::Low)
        );
        assert!(ParamField::AppliedPrice.validate(FieldValue::Int(7)).is_err());
        assert!(ParamField::MaMethod.validate(FieldValue::Int(-1)).is_err());
    }

    #[test]
    fn method_codes_allow_negative_masks() {
        assert!(ParamField::SignalBaseMethod.validate(FieldValue::Int(-63)).is_ok());
        assert!(ParamField::SignalOpenMethod.validate(FieldValue::Int(389)).is_ok());
        assert!(ParamField::SignalOpenMethod.validate(FieldValue::Int(2048)).is_err());
        assert!(ParamField::TickFilterMethod.validate(FieldValue::Int(-1)).is_err());
    }

    #[test]
    fn parse_value_reads_text() {
        assert_eq!(
            ParamField::Period.parse_value(" 18 ").unwrap(),
            FieldValue::Int(18)
        );
        assert_eq!(
            ParamField::MaMethod.parse_value("lwma").unwrap(),
            FieldValue::MaMethod(MaMethod::Lwma)
        );
        assert_eq!(
            ParamField::SignalOpenLevel.parse_value("10.0").unwrap(),
            FieldValue::Float(10.0)
        );
        let err = ParamField::Period.parse_value("abc").unwrap_err();
        assert!(matches!(err, PresetError::SchemaViolation { value, .. } if value == "abc"));
    }

    #[test]
    fn default_record_is_complete() {
        let record = default_record(RecordKind::Strategy);
        assert_eq!(record.kind(), RecordKind::Strategy);
        assert_eq!(record.len(), 16);
        assert_eq!(
            record.get(ParamField::PriceStopLevel),
            Some(&FieldValue::Float(2.0))
        );
    }
}
