//! Layers: sparse overrides chained to a parent layer.

use crate::domain::record::Overrides;
use crate::domain::schema::RecordKind;
use crate::domain::timeframe::Timeframe;
use std::fmt;

/// Index of a layer inside its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub(crate) usize);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LayerKey {
    Default(RecordKind),
    Timeframe(RecordKind, Timeframe),
    Preset {
        kind: RecordKind,
        symbol: String,
        timeframe: Timeframe,
    },
}

impl LayerKey {
    pub fn kind(&self) -> RecordKind {
        match self {
            LayerKey::Default(kind) | LayerKey::Timeframe(kind, _) => *kind,
            LayerKey::Preset { kind, .. } => *kind,
        }
    }
}

impl fmt::Display for LayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerKey::Default(kind) => write!(f, "{}", kind.defaults_name()),
            LayerKey::Timeframe(kind, tf) => write!(f, "{}/{}", kind, tf),
            LayerKey::Preset {
                kind,
                symbol,
                timeframe,
            } => write!(f, "{}/{}/{}", kind, symbol, timeframe),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Layer {
    pub id: LayerId,
    pub key: LayerKey,
    pub parent: Option<LayerId>,
    pub overrides: Overrides,
}

impl Layer {
    pub fn kind(&self) -> RecordKind {
        self.key.kind()
    }

    pub fn is_default(&self) -> bool {
        self.parent.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_display() {
        assert_eq!(
            LayerKey::Default(RecordKind::Strategy).to_string(),
            "stg_stddev_defaults"
        );
        assert_eq!(
            LayerKey::Timeframe(RecordKind::Indicator, Timeframe::M30).to_string(),
            "indicator/M30"
        );
        let preset = LayerKey::Preset {
            kind: RecordKind::Strategy,
            symbol: "EURUSD".into(),
            timeframe: Timeframe::H4,
        };
        assert_eq!(preset.to_string(), "strategy/EURUSD/H4");
        assert_eq!(preset.kind(), RecordKind::Strategy);
    }
}
