use anyhow::Context;
use scanboy_core::{ColorModePreference, EmulatorConfig};
use std::fs;
use std::path::Path;

/// Read the emulator configuration from a TOML file, or use the defaults if no file was given.
/// Keys missing from the file take their default values.
pub fn load_config(path: Option<&Path>) -> Result<EmulatorConfig, anyhow::Error> {
    let Some(path) = path else {
        return Ok(EmulatorConfig::default());
    };

    let config_str = fs::read_to_string(path)
        .with_context(|| format!("error reading TOML config file from '{}'", path.display()))?;
    parse_config(&config_str)
        .with_context(|| format!("error parsing emulator config from '{}'", path.display()))
}

fn parse_config(config_str: &str) -> Result<EmulatorConfig, anyhow::Error> {
    Ok(toml::from_str(config_str)?)
}

/// Apply command-line overrides on top of the file configuration.
pub fn apply_overrides(config: EmulatorConfig, force_monochrome: bool) -> EmulatorConfig {
    if force_monochrome {
        EmulatorConfig { color_mode: ColorModePreference::Monochrome, ..config }
    } else {
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        assert_eq!(EmulatorConfig::default(), parse_config("").unwrap());
    }

    #[test]
    fn partial_file() {
        let config = parse_config(
            r#"
            color_mode = "monochrome"
            auto_frame_skip = false
            max_frame_skip = 5
            "#,
        )
        .unwrap();

        assert_eq!(ColorModePreference::Monochrome, config.color_mode);
        assert!(!config.auto_frame_skip);
        assert_eq!(5, config.max_frame_skip);
        assert_eq!(EmulatorConfig::default().frame_ticks, config.frame_ticks);
    }

    #[test]
    fn invalid_values_are_errors() {
        assert!(parse_config("color_mode = \"sepia\"").is_err());
        assert!(parse_config("max_frame_skip = \"many\"").is_err());
    }

    #[test]
    fn monochrome_override() {
        let config = apply_overrides(EmulatorConfig::default(), true);
        assert_eq!(ColorModePreference::Monochrome, config.color_mode);

        let config = apply_overrides(EmulatorConfig::default(), false);
        assert_eq!(ColorModePreference::Auto, config.color_mode);
    }
}
