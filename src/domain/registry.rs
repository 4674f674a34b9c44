//! Layer registry.
//!
//! Append-only store of every declared layer. It is populated once while the
//! preset catalog loads and is read-only afterwards, so a populated registry
//! can be shared between threads without locking. Each registration either
//! succeeds completely or leaves the registry untouched.

use crate::domain::error::PresetError;
use crate::domain::layer::{Layer, LayerId, LayerKey};
use crate::domain::record::Overrides;
use crate::domain::schema::{FieldValue, ParamField, RecordKind};
use crate::domain::symbols::{normalize_symbol, SymbolListError};
use crate::domain::timeframe::Timeframe;
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct LayerRegistry {
    layers: Vec<Layer>,
    timeframes: HashMap<(RecordKind, Timeframe), LayerId>,
    presets: HashMap<(RecordKind, String, Timeframe), LayerId>,
}

impl Default for LayerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerRegistry {
    /// Creates a registry holding only the two Default layers.
    pub fn new() -> Self {
        let layers = RecordKind::ALL
            .into_iter()
            .enumerate()
            .map(|(index, kind)| Layer {
                id: LayerId(index),
                key: LayerKey::Default(kind),
                parent: None,
                overrides: Overrides::new(kind),
            })
            .collect();

        Self {
            layers,
            timeframes: HashMap::new(),
            presets: HashMap::new(),
        }
    }

    pub fn default_layer(&self, kind: RecordKind) -> LayerId {
        match kind {
            RecordKind::Indicator => LayerId(0),
            RecordKind::Strategy => LayerId(1),
        }
    }

    pub fn register_timeframe_layer(
        &mut self,
        kind: RecordKind,
        timeframe: Timeframe,
        overrides: Overrides,
    ) -> Result<LayerId, PresetError> {
        check_overrides_kind(&overrides, kind)?;

        let key = (kind, timeframe);
        if self.timeframes.contains_key(&key) {
            return Err(PresetError::DuplicateKey {
                key: LayerKey::Timeframe(kind, timeframe).to_string(),
            });
        }

        let shadowed = self
            .presets
            .keys()
            .filter(|(k, _, tf)| *k == kind && *tf == timeframe)
            .count();
        if shadowed > 0 {
            warn!(
                "{}/{}: {} earlier preset(s) keep the default parent",
                kind, timeframe, shadowed
            );
        }

        let parent = self.default_layer(kind);
        let id = self.push(LayerKey::Timeframe(kind, timeframe), parent, overrides);
        self.timeframes.insert(key, id);
        Ok(id)
    }

    pub fn register_preset_layer(
        &mut self,
        symbol: &str,
        timeframe: Timeframe,
        overrides: Overrides,
        parent_kind: RecordKind,
    ) -> Result<LayerId, PresetError> {
        check_overrides_kind(&overrides, parent_kind)?;

        let symbol = normalize_symbol(symbol).ok_or(SymbolListError::EmptyToken)?;
        let key = (parent_kind, symbol.clone(), timeframe);
        if self.presets.contains_key(&key) {
            return Err(PresetError::DuplicateKey {
                key: LayerKey::Preset {
                    kind: parent_kind,
                    symbol,
                    timeframe,
                }
                .to_string(),
            });
        }

        let parent = self
            .timeframes
            .get(&(parent_kind, timeframe))
            .copied()
            .unwrap_or_else(|| self.default_layer(parent_kind));
        let id = self.push(
            LayerKey::Preset {
                kind: parent_kind,
                symbol,
                timeframe,
            },
            parent,
            overrides,
        );
        self.presets.insert(key, id);
        Ok(id)
    }

    /// Registers one tuned preset whose values may span both record kinds,
    /// producing one Preset layer per kind it touches. An empty declaration
    /// still registers an (empty) strategy preset. A (symbol, timeframe) takes
    /// a single declaration: any existing preset layer for it, of either kind,
    /// is a `DuplicateKey`. Every value and key is checked before the first
    /// layer is added.
    pub fn register_preset_declaration(
        &mut self,
        symbol: &str,
        timeframe: Timeframe,
        values: impl IntoIterator<Item = (ParamField, FieldValue)>,
    ) -> Result<Vec<LayerId>, PresetError> {
        let mut split: Vec<Overrides> = RecordKind::ALL.into_iter().map(Overrides::new).collect();
        for (field, value) in values {
            let slot = split
                .iter_mut()
                .find(|overrides| overrides.kind() == field.kind());
            if let Some(overrides) = slot {
                overrides.set(field, value)?;
            }
        }
        if split.iter().all(Overrides::is_empty) {
            split.retain(|overrides| overrides.kind() == RecordKind::Strategy);
        } else {
            split.retain(|overrides| !overrides.is_empty());
        }

        let symbol = normalize_symbol(symbol).ok_or(SymbolListError::EmptyToken)?;
        // One declaration per (symbol, timeframe), whichever kinds it touches.
        let existing = RecordKind::ALL
            .into_iter()
            .find(|kind| self.presets.contains_key(&(*kind, symbol.clone(), timeframe)));
        if let Some(kind) = existing {
            return Err(PresetError::DuplicateKey {
                key: LayerKey::Preset {
                    kind,
                    symbol,
                    timeframe,
                }
                .to_string(),
            });
        }

        split
            .into_iter()
            .map(|overrides| {
                let kind = overrides.kind();
                self.register_preset_layer(&symbol, timeframe, overrides, kind)
            })
            .collect()
    }

    /// Most specific layer for the request: Preset, then Timeframe, then
    /// Default. A preset needs both a symbol and a timeframe to match.
    pub fn lookup(
        &self,
        kind: RecordKind,
        symbol: Option<&str>,
        timeframe: Option<Timeframe>,
    ) -> LayerId {
        if let (Some(symbol), Some(tf)) = (symbol.and_then(normalize_symbol), timeframe) {
            if let Some(id) = self.presets.get(&(kind, symbol, tf)) {
                return *id;
            }
        }
        if let Some(tf) = timeframe {
            if let Some(id) = self.timeframes.get(&(kind, tf)) {
                return *id;
            }
        }
        self.default_layer(kind)
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(id.0)
    }

    /// Layers from the Default layer down to `id`, least specific first.
    pub fn chain(&self, id: LayerId) -> Vec<&Layer> {
        let mut chain = Vec::new();
        let mut next = self.layer(id);
        while let Some(layer) = next {
            chain.push(layer);
            next = layer.parent.and_then(|parent| self.layer(parent));
        }
        chain.reverse();
        chain
    }

    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn timeframe_layer_count(&self) -> usize {
        self.timeframes.len()
    }

    pub fn preset_layer_count(&self) -> usize {
        self.presets.len()
    }

    /// Symbols with at least one preset, sorted.
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self
            .presets
            .keys()
            .map(|(_, symbol, _)| symbol.clone())
            .collect();
        symbols.sort();
        symbols.dedup();
        symbols
    }

    fn push(&mut self, key: LayerKey, parent: LayerId, overrides: Overrides) -> LayerId {
        let id = LayerId(self.layers.len());
        debug!(
            "registered layer {} ({} overrides, parent {})",
            key,
            overrides.len(),
            self.layers[parent.0].key
        );
        self.layers.push(Layer {
            id,
            key,
            parent: Some(parent),
            overrides,
        });
        id
    }
}

fn check_overrides_kind(overrides: &Overrides, kind: RecordKind) -> Result<(), PresetError> {
    if overrides.kind() != kind {
        let field = overrides
            .fields()
            .next()
            .map(|f| f.key().to_string())
            .unwrap_or_else(|| format!("{} overrides", overrides.kind()));
        return Err(PresetError::WrongRecordKind {
            field,
            expected: kind.name().to_string(),
        });
    }
    Ok(())
}
