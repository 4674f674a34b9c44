//! Domain error types.

use crate::domain::symbols::SymbolListError;

/// Top-level error type for stg-stddev.
#[derive(Debug, thiserror::Error)]
pub enum PresetError {
    #[error("schema violation: {field} = {value} is outside {domain}")]
    SchemaViolation {
        field: String,
        value: String,
        domain: String,
    },

    #[error("field {field} does not belong to the {expected} record")]
    WrongRecordKind { field: String, expected: String },

    #[error("duplicate layer key: {key}")]
    DuplicateKey { key: String },

    #[error("unknown record kind: {kind}")]
    UnknownRecordKind { kind: String },

    #[error("unknown timeframe: {value}")]
    UnknownTimeframe { value: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    InvalidSymbolList(#[from] SymbolListError),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PresetError {
    pub(crate) fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        PresetError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&PresetError> for std::process::ExitCode {
    fn from(err: &PresetError) -> Self {
        let code: u8 = match err {
            PresetError::Io(_) | PresetError::Csv(_) => 1,
            PresetError::ConfigParse { .. } | PresetError::ConfigInvalid { .. } => 2,
            PresetError::SchemaViolation { .. }
            | PresetError::WrongRecordKind { .. }
            | PresetError::DuplicateKey { .. } => 3,
            PresetError::UnknownRecordKind { .. }
            | PresetError::UnknownTimeframe { .. }
            | PresetError::InvalidSymbolList(_) => 4,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_violation_names_field_value_and_domain() {
        let err = PresetError::SchemaViolation {
            field: "period".into(),
            value: "0".into(),
            domain: "integer > 0".into(),
        };
        assert_eq!(
            err.to_string(),
            "schema violation: period = 0 is outside integer > 0"
        );
    }

    #[test]
    fn config_invalid_helper_fills_fields() {
        let err = PresetError::config_invalid("strategy.m30", "bogus", "unknown parameter");
        assert!(matches!(
            err,
            PresetError::ConfigInvalid { ref section, ref key, .. }
                if section == "strategy.m30" && key == "bogus"
        ));
    }
}
