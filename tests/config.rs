use ferrous_registry::config::{ENV_DETECT_CYCLES, ENV_EAGER_EXCLUSIVE, ENV_MAX_DEPTH};
use ferrous_registry::{Policy, Registry, RegistryConfig, RegistryError, Resolver};
use serial_test::serial;

fn clear_env() {
    for name in [ENV_DETECT_CYCLES, ENV_MAX_DEPTH, ENV_EAGER_EXCLUSIVE] {
        std::env::remove_var(name);
    }
}

#[test]
#[serial]
fn test_from_env_defaults() {
    clear_env();
    assert_eq!(RegistryConfig::from_env().unwrap(), RegistryConfig::default());
}

#[test]
#[serial]
fn test_from_env_overrides() {
    clear_env();
    std::env::set_var(ENV_DETECT_CYCLES, "true");
    std::env::set_var(ENV_MAX_DEPTH, "32");
    std::env::set_var(ENV_EAGER_EXCLUSIVE, "off");

    let config = RegistryConfig::from_env().unwrap();
    clear_env();

    assert!(config.detect_cycles);
    assert_eq!(config.max_depth, Some(32));
    assert!(!config.eager_exclusive);

    let mut registry = Registry::with_config(config);
    registry.register_factory::<u8, _>(Policy::Exclusive, |_| 1);
    assert_eq!(registry.instance_count(), 0);
}

#[test]
#[serial]
fn test_from_env_rejects_garbage() {
    clear_env();
    std::env::set_var(ENV_MAX_DEPTH, "deep");
    let result = RegistryConfig::from_env();
    clear_env();

    assert!(matches!(result, Err(RegistryError::InvalidConfig(msg)) if msg.contains(ENV_MAX_DEPTH)));
}

#[test]
#[serial]
fn test_zero_depth_is_unlimited_from_every_source() {
    clear_env();
    std::env::set_var(ENV_MAX_DEPTH, "0");
    let from_env = RegistryConfig::from_env().unwrap();
    clear_env();
    assert_eq!(from_env.max_depth, None);

    let from_builder = RegistryConfig::default().with_max_depth(0);
    assert_eq!(from_builder, from_env);

    let direct = RegistryConfig {
        max_depth: Some(0),
        ..RegistryConfig::default()
    };
    for config in [from_env, from_builder, direct] {
        let mut registry = Registry::with_config(config);
        assert_eq!(registry.config().max_depth, None);
        registry.register_factory::<u8, _>(Policy::Exclusive, |_| 7);
        assert_eq!(registry.instance_count(), 1);
        assert_eq!(registry.retrieve::<u8>().map(|v| *v), Some(7));
    }
}

#[cfg(feature = "config")]
#[test]
fn test_json_zero_depth_builds() {
    let config = RegistryConfig::from_json_str(r#"{ "max_depth": 0 }"#).unwrap();
    assert_eq!(config.max_depth, None);

    let mut registry = Registry::with_config(config);
    registry.register_factory::<u8, _>(Policy::Exclusive, |_| 7);
    assert_eq!(registry.retrieve::<u8>().map(|v| *v), Some(7));
}

#[cfg(feature = "config")]
#[test]
fn test_json_round_trip() {
    let config = RegistryConfig::default().with_cycle_detection(true).with_max_depth(8);
    let json = config.to_json_string().unwrap();
    assert_eq!(RegistryConfig::from_json_str(&json).unwrap(), config);

    assert!(matches!(
        RegistryConfig::from_json_str("{ not json"),
        Err(RegistryError::InvalidConfig(_))
    ));
}
