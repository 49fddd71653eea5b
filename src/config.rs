//! Registry configuration.
//!
//! Configuration is fixed when the registry is created. Values can come from
//! code, from `FERROUS_REGISTRY_*` environment variables, or (with the
//! `config` feature) from JSON.

use std::env;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};

/// Environment variable enabling cycle detection (`true`/`false`, `1`/`0`).
pub const ENV_DETECT_CYCLES: &str = "FERROUS_REGISTRY_DETECT_CYCLES";
/// Environment variable setting the nesting limit (`0` or empty means none).
pub const ENV_MAX_DEPTH: &str = "FERROUS_REGISTRY_MAX_DEPTH";
/// Environment variable choosing eager (`true`) or lazy exclusive builds.
pub const ENV_EAGER_EXCLUSIVE: &str = "FERROUS_REGISTRY_EAGER_EXCLUSIVE";

/// Behavior switches for a [`Registry`](crate::Registry).
///
/// The defaults reproduce the plain registry: exclusive bindings are built
/// during registration, and nested construction is not checked for cycles
/// or depth. A cyclic binding graph then recurses until the stack runs out.
///
/// # Examples
///
/// ```rust
/// use ferrous_registry::{Registry, RegistryConfig};
///
/// let config = RegistryConfig::default()
///     .with_cycle_detection(true)
///     .with_max_depth(64);
/// let registry = Registry::with_config(config);
/// assert!(registry.config().detect_cycles);
/// assert_eq!(registry.config().max_depth, Some(64));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct RegistryConfig {
    /// Report a type requested while it is still being built as
    /// [`RegistryError::Circular`] instead of recursing.
    pub detect_cycles: bool,
    /// Maximum nesting of constructions; `None` for unlimited. `Some(0)` is
    /// read as `None`, the same as a `0` in the environment.
    #[cfg_attr(feature = "config", serde(deserialize_with = "deserialize_max_depth"))]
    pub max_depth: Option<usize>,
    /// Build exclusive bindings at registration time. When `false` they are
    /// built on first retrieval.
    pub eager_exclusive: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            detect_cycles: false,
            max_depth: None,
            eager_exclusive: true,
        }
    }
}

impl RegistryConfig {
    pub fn with_cycle_detection(mut self, enabled: bool) -> Self {
        self.detect_cycles = enabled;
        self
    }

    /// Limits nested constructions to `depth`. `0` removes the limit.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = (depth > 0).then_some(depth);
        self
    }

    pub fn with_eager_exclusive(mut self, eager: bool) -> Self {
        self.eager_exclusive = eager;
        self
    }

    /// Whether retrieval needs to track the construction stack.
    #[inline]
    pub(crate) fn tracks_stack(&self) -> bool {
        self.detect_cycles || self.max_depth.is_some()
    }

    /// Defaults overridden by any `FERROUS_REGISTRY_*` variables that are set.
    ///
    /// ```rust
    /// use ferrous_registry::RegistryConfig;
    ///
    /// // With none of the variables set this is just the default.
    /// let config = RegistryConfig::from_env().unwrap();
    /// # let _ = config;
    /// ```
    pub fn from_env() -> RegistryResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> RegistryResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_DETECT_CYCLES) {
            config.detect_cycles = parse_flag(ENV_DETECT_CYCLES, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MAX_DEPTH) {
            let raw = raw.trim();
            config.max_depth = if raw.is_empty() {
                None
            } else {
                match raw.parse::<usize>() {
                    Ok(0) => None,
                    Ok(depth) => Some(depth),
                    Err(_) => {
                        return Err(RegistryError::InvalidConfig(format!(
                            "{} must be a non-negative integer, got {:?}",
                            ENV_MAX_DEPTH, raw
                        )))
                    }
                }
            };
        }
        if let Some(raw) = lookup(ENV_EAGER_EXCLUSIVE) {
            config.eager_exclusive = parse_flag(ENV_EAGER_EXCLUSIVE, &raw)?;
        }

        Ok(config)
    }

    /// Parses a JSON object; missing fields keep their defaults.
    ///
    /// ```rust
    /// use ferrous_registry::RegistryConfig;
    ///
    /// let config = RegistryConfig::from_json_str(r#"{ "detect_cycles": true }"#).unwrap();
    /// assert!(config.detect_cycles);
    /// assert!(config.eager_exclusive);
    /// ```
    #[cfg(feature = "config")]
    pub fn from_json_str(json: &str) -> RegistryResult<Self> {
        serde_json::from_str(json).map_err(|e| RegistryError::InvalidConfig(e.to_string()))
    }

    #[cfg(feature = "config")]
    pub fn to_json_string(&self) -> RegistryResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| RegistryError::InvalidConfig(e.to_string()))
    }
}

#[cfg(feature = "config")]
fn deserialize_max_depth<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<usize>::deserialize(deserializer)?.filter(|&depth| depth > 0))
}

fn parse_flag(name: &str, raw: &str) -> RegistryResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(RegistryError::InvalidConfig(format!(
            "{} must be a boolean, got {:?}",
            name, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn empty_lookup_gives_defaults() {
        let config = RegistryConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, RegistryConfig::default());
        assert!(!config.tracks_stack());
    }

    #[test]
    fn lookup_overrides_fields() {
        let config = RegistryConfig::from_lookup(lookup_from(&[
            (ENV_DETECT_CYCLES, "yes"),
            (ENV_MAX_DEPTH, "32"),
            (ENV_EAGER_EXCLUSIVE, "0"),
        ]))
        .unwrap();
        assert!(config.detect_cycles);
        assert_eq!(config.max_depth, Some(32));
        assert!(!config.eager_exclusive);
        assert!(config.tracks_stack());
    }

    #[test]
    fn zero_depth_means_unlimited() {
        let config = RegistryConfig::from_lookup(lookup_from(&[(ENV_MAX_DEPTH, "0")])).unwrap();
        assert_eq!(config.max_depth, None);
    }

    #[test]
    fn bad_values_are_rejected() {
        let err = RegistryConfig::from_lookup(lookup_from(&[(ENV_DETECT_CYCLES, "maybe")])).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidConfig(msg) if msg.contains(ENV_DETECT_CYCLES)));

        let err = RegistryConfig::from_lookup(lookup_from(&[(ENV_MAX_DEPTH, "-3")])).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidConfig(_)));
    }

    #[test]
    fn builder_zero_depth_means_unlimited() {
        let config = RegistryConfig::default().with_max_depth(0);
        assert_eq!(config.max_depth, None);
        assert!(!config.tracks_stack());
        assert_eq!(RegistryConfig::default().with_max_depth(4).max_depth, Some(4));
    }

    #[cfg(feature = "config")]
    #[test]
    fn json_zero_depth_means_unlimited() {
        let config = RegistryConfig::from_json_str(r#"{ "max_depth": 0 }"#).unwrap();
        assert_eq!(config.max_depth, None);
        let config = RegistryConfig::from_json_str(r#"{ "max_depth": null }"#).unwrap();
        assert_eq!(config.max_depth, None);
        let config = RegistryConfig::from_json_str(r#"{ "max_depth": 12 }"#).unwrap();
        assert_eq!(config.max_depth, Some(12));
    }

    #[cfg(feature = "config")]
    #[test]
    fn json_round_trip_keeps_fields() {
        let config = RegistryConfig::default().with_max_depth(8).with_eager_exclusive(false);
        let json = config.to_json_string().unwrap();
        assert_eq!(RegistryConfig::from_json_str(&json).unwrap(), config);
    }
}
