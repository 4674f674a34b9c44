//! Process-wide handle to the current registry.
//!
//! Readers take an `Arc` snapshot and resolve against it; a reload builds a
//! complete new registry and swaps it in whole. A snapshot never changes
//! under its reader.

use crate::domain::registry::LayerRegistry;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

#[derive(Debug)]
pub struct SharedRegistry {
    current: RwLock<Arc<LayerRegistry>>,
}

impl SharedRegistry {
    pub fn new(registry: LayerRegistry) -> Self {
        Self {
            current: RwLock::new(Arc::new(registry)),
        }
    }

    pub fn snapshot(&self) -> Arc<LayerRegistry> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Replaces the current registry, returning the one it replaced.
    pub fn publish(&self, registry: LayerRegistry) -> Arc<LayerRegistry> {
        let next = Arc::new(registry);
        info!("publishing preset registry with {} layers", next.len());
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::Overrides;
    use crate::domain::resolver::Resolver;
    use crate::domain::schema::{ParamField, RecordKind};
    use crate::domain::timeframe::Timeframe;
    use std::thread;

    fn registry_with_period(period: i64) -> LayerRegistry {
        let mut registry = LayerRegistry::new();
        registry
            .register_timeframe_layer(
                RecordKind::Indicator,
                Timeframe::H1,
                Overrides::new(RecordKind::Indicator)
                    .with(ParamField::Period, period)
                    .unwrap(),
            )
            .unwrap();
        registry
    }

    #[test]
    fn snapshot_survives_publish() {
        let shared = SharedRegistry::new(registry_with_period(10));
        let before = shared.snapshot();
        let replaced = shared.publish(registry_with_period(20));
        let after = shared.snapshot();

        assert!(Arc::ptr_eq(&before, &replaced));
        let old = Resolver::new(&before).indicator_params(None, Some(Timeframe::H1));
        let new = Resolver::new(&after).indicator_params(None, Some(Timeframe::H1));
        assert_eq!(old.period, 10);
        assert_eq!(new.period, 20);
    }

    #[test]
    fn concurrent_readers_see_identical_records() {
        let shared = Arc::new(SharedRegistry::new(registry_with_period(12)));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || {
                    let registry = shared.snapshot();
                    Resolver::new(&registry).indicator_params(Some("EURUSD"), Some(Timeframe::H1))
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap().period, 12);
        }
    }
}
