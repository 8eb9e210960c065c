//! Capability schemas for the players Remotune supports out of the box.
//!
//! Each module declares one player's schema as static data. Registration
//! order is the order media keys fall back through when no preferred player
//! is running.

pub mod cog;
pub mod doppler;
pub mod music;
pub mod radiccio;
pub mod spotify;

use remotune_core::config::TargetsConfig;
use remotune_core::registry::{RegistryError, TargetRegistry};
use remotune_core::schema::Target;
use std::sync::Arc;

/// Every built-in target, in fallback order.
pub fn builtin_targets() -> Vec<Target> {
    vec![
        music::target(),
        spotify::target(),
        doppler::target(),
        radiccio::target(),
        cog::target(),
    ]
}

/// Registers the built-ins that `config` enables, preferred target first.
pub fn register_builtin(registry: &TargetRegistry, config: &TargetsConfig) -> Result<usize, RegistryError> {
    let mut targets = builtin_targets();
    if let Some(preferred) = config.preferred_id() {
        if let Some(index) = targets.iter().position(|target| target.id == preferred) {
            let target = targets.remove(index);
            targets.insert(0, target);
        }
    }

    for unknown in config
        .enabled
        .iter()
        .filter(|id| !targets.iter().any(|target| target.id.as_str() == id.as_str()))
    {
        tracing::warn!(target_id = %unknown, "enabled target is not a built-in; ignoring");
    }

    let mut registered = 0;
    for target in targets {
        if !config.is_enabled(&target.id) {
            tracing::debug!(target_id = %target.id, "target disabled by configuration");
            continue;
        }
        registry.register(target)?;
        registered += 1;
    }
    Ok(registered)
}

/// A fresh registry holding the enabled built-ins.
pub fn default_registry(config: &TargetsConfig) -> Result<Arc<TargetRegistry>, RegistryError> {
    let registry = TargetRegistry::new();
    register_builtin(&registry, config)?;
    Ok(Arc::new(registry))
}
