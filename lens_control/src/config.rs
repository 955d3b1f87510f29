//! Configuration loading for the control core.
//!
//! Wraps the [`ConfigLoader`] blanket impl with validation so a returned
//! [`LensConfig`] is always usable by [`Controller::new`](crate::cycle::Controller::new).

use std::path::Path;

use lens_common::config::{ConfigError, ConfigLoader};
use lens_common::control::config::LensConfig;
use tracing::{debug, info};

/// Load and validate a controller configuration file.
pub fn load_config(path: &Path) -> Result<LensConfig, ConfigError> {
    let config = LensConfig::load(path).map_err(|e| match e {
        ConfigError::ParseError(msg) => {
            ConfigError::ParseError(format!("{}: {msg}", path.display()))
        }
        other => other,
    })?;
    config.validate()?;
    info!("Configuration loaded from {}", path.display());
    log_summary(&config);
    Ok(config)
}

/// Load and validate a controller configuration from TOML text.
pub fn load_config_from_str(content: &str) -> Result<LensConfig, ConfigError> {
    let config = LensConfig::from_toml(content)?;
    config.validate()?;
    log_summary(&config);
    Ok(config)
}

fn log_summary(config: &LensConfig) {
    debug!(
        max_target = config.focus.max_target,
        divider = config.focus.divider,
        period_us = config.sampler.period_us,
        status_lane = config.bus.status_lane,
        settle_ms = config.sequencer.settle_ms,
        policy = ?config.sequencer.settle_policy,
        "Configuration accepted"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use lens_common::control::config::SettlePolicy;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_document_is_all_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config, LensConfig::default());
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let config = load_config_from_str(
            r#"
[sequencer]
settle_ms = 250
settle_policy = "queue"
"#,
        )
        .unwrap();
        assert_eq!(config.sequencer.settle_ms, 250);
        assert_eq!(config.sequencer.settle_policy, SettlePolicy::Queue);
        assert_eq!(config.focus.divider, 100);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let result = load_config_from_str("[focus]\ndivider = 0\n");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn parse_errors_name_the_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[focus\nmax_target = 1").unwrap();
        let Err(ConfigError::ParseError(msg)) = load_config(file.path()) else {
            panic!("expected a parse error");
        };
        assert!(msg.contains(&file.path().display().to_string()));
    }

    #[test]
    fn shipped_config_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../config/lens.toml");
        let config = load_config(&path).unwrap();
        assert_eq!(config, LensConfig::default());
    }
}
