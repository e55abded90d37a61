//! Per-target guard registry.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::breaker::CircuitState;
use crate::guard::{CallGuard, CallGuardConfig};

/// Lazily creates and hands out one [`CallGuard`] per downstream target.
///
/// Every caller naming the same target shares the same breaker state.
pub struct GuardRegistry {
    config: CallGuardConfig,
    guards: RwLock<HashMap<String, Arc<CallGuard>>>,
}

impl GuardRegistry {
    /// Creates a registry applying the same configuration to every target.
    pub fn new(config: CallGuardConfig) -> Self {
        Self {
            config,
            guards: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the guard for the target, creating it on first use.
    pub fn guard(&self, target: &str) -> Arc<CallGuard> {
        if let Some(guard) = self.guards.read().unwrap().get(target) {
            return guard.clone();
        }

        let mut guards = self.guards.write().unwrap();
        guards
            .entry(target.to_string())
            .or_insert_with(|| Arc::new(CallGuard::new(target, self.config.clone())))
            .clone()
    }

    /// Snapshot of every known target's circuit state, sorted by target.
    pub async fn circuit_states(&self) -> Vec<(String, CircuitState)> {
        let guards: Vec<Arc<CallGuard>> =
            self.guards.read().unwrap().values().cloned().collect();

        let mut states = Vec::with_capacity(guards.len());
        for guard in guards {
            states.push((guard.target().to_string(), guard.circuit_state().await));
        }
        states.sort_by(|a, b| a.0.cmp(&b.0));
        states
    }
}

impl Default for GuardRegistry {
    fn default() -> Self {
        Self::new(CallGuardConfig::default())
    }
}
