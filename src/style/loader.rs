//! Loading and writing style configuration files.
//!
//! JSON, YAML and TOML files are all read into a `serde_json::Value` first
//! and deep-merged over the defaults, so a file only needs the keys it
//! changes (`heading_colors: {2: "#FF0000"}` keeps the other five levels).

use super::StyleConfig;
use crate::error::{Error, Result, Warning};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Configuration file syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.json`
    Json,
    /// `.yaml` / `.yml`
    Yaml,
    /// `.toml`
    Toml,
}

impl ConfigFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(ConfigFormat::Json),
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "toml" => Ok(ConfigFormat::Toml),
            _ => Err(Error::Config(format!(
                "unsupported config format: {} (expected .json, .yaml, .yml or .toml)",
                path.display()
            ))),
        }
    }

    fn parse(self, text: &str) -> Result<Value> {
        let value = match self {
            ConfigFormat::Json => serde_json::from_str(text)?,
            ConfigFormat::Yaml => {
                let yaml: serde_yaml::Value = serde_yaml::from_str(text)?;
                serde_json::to_value(yaml)?
            }
            ConfigFormat::Toml => {
                let toml: toml::Value = toml::from_str(text)?;
                serde_json::to_value(toml)?
            }
        };
        Ok(value)
    }
}

/// Load a style configuration file, filling unset keys with defaults.
///
/// Unknown keys are logged and dropped; use
/// [`load_style_config_with_warnings`] to collect them.
pub fn load_style_config<P: AsRef<Path>>(path: P) -> Result<StyleConfig> {
    let (config, warnings) = load_style_config_with_warnings(path)?;
    for warning in &warnings {
        log::warn!("{}", warning);
    }
    Ok(config)
}

/// Load a style configuration file, returning a warning per ignored key.
pub fn load_style_config_with_warnings<P: AsRef<Path>>(
    path: P,
) -> Result<(StyleConfig, Vec<Warning>)> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path)?;
    let text = fs::read_to_string(path)?;
    let loaded = parse_style_config_with_warnings(&text, format)?;
    log::debug!("loaded style configuration from {}", path.display());
    Ok(loaded)
}

/// Parse configuration text in the given format.
pub fn parse_style_config(text: &str, format: ConfigFormat) -> Result<StyleConfig> {
    parse_style_config_with_warnings(text, format).map(|(config, _)| config)
}

/// Parse configuration text, returning a warning per ignored key.
pub fn parse_style_config_with_warnings(
    text: &str,
    format: ConfigFormat,
) -> Result<(StyleConfig, Vec<Warning>)> {
    let value = format.parse(text)?;
    match value {
        // An empty YAML document parses as null.
        Value::Null => Ok((StyleConfig::default(), Vec::new())),
        value => merge_overrides(&StyleConfig::default(), value),
    }
}

/// Check whether `key` names a [`StyleConfig`] field.
pub fn is_style_key(key: &str) -> bool {
    match serde_json::to_value(StyleConfig::default()) {
        Ok(Value::Object(fields)) => fields.contains_key(key),
        _ => false,
    }
}

/// Deep-merge a mapping of overrides over an existing configuration.
///
/// Each unknown top-level key is skipped and reported as a
/// [`Warning::ConfigFallback`]. A value of the wrong type is a
/// [`Error::Config`].
pub fn merge_overrides(base: &StyleConfig, overrides: Value) -> Result<(StyleConfig, Vec<Warning>)> {
    let Value::Object(overrides) = overrides else {
        return Err(Error::Config("configuration must be a mapping".into()));
    };

    let mut warnings = Vec::new();
    let mut merged = serde_json::to_value(base)?;
    if let Value::Object(ref mut fields) = merged {
        for (key, value) in overrides {
            match fields.get_mut(&key) {
                Some(slot) => deep_merge(slot, value),
                None => {
                    log::warn!("ignoring unknown style option: {}", key);
                    warnings.push(Warning::ConfigFallback {
                        field: key,
                        value: value_text(&value),
                    });
                }
            }
        }
    }

    let config = serde_json::from_value(merged).map_err(|e| Error::Config(e.to_string()))?;
    Ok((config, warnings))
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn deep_merge(target: &mut Value, value: Value) {
    match (target, value) {
        (Value::Object(target), Value::Object(value)) => {
            for (k, v) in value {
                match target.get_mut(&k) {
                    Some(slot) => deep_merge(slot, v),
                    None => {
                        target.insert(k, v);
                    }
                }
            }
        }
        (target, value) => *target = value,
    }
}

/// Render the default configuration in the given format.
pub fn sample_config(format: ConfigFormat) -> Result<String> {
    let value = serde_json::to_value(StyleConfig::default())?;
    let text = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(&value)?,
        ConfigFormat::Yaml => serde_yaml::to_string(&value)?,
        ConfigFormat::Toml => toml::to_string_pretty(&value)
            .map_err(|e| Error::Config(format!("TOML: {}", e)))?,
    };
    Ok(text)
}

/// Write the default configuration to a file, choosing the format by extension.
pub fn write_sample_config<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    let text = sample_config(ConfigFormat::from_path(path)?)?;
    fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::RgbColor;

    #[test]
    fn test_partial_yaml_override() {
        let yaml = "font_name: Arial\nheading_colors:\n  2: \"#FF0000\"\n";
        let config = parse_style_config(yaml, ConfigFormat::Yaml).unwrap();

        assert_eq!(config.font_name, "Arial");
        assert_eq!(config.heading_color(2), RgbColor(0xFF, 0, 0));
        // Other levels keep their defaults.
        assert_eq!(config.heading_color(1), RgbColor(0x2E, 0x75, 0xB6));
        assert_eq!(config.font_size, 11.0);
    }

    #[test]
    fn test_json_override() {
        let json = r#"{"code_font": "Fira Code", "heading_sizes": {"1": 20}}"#;
        let config = parse_style_config(json, ConfigFormat::Json).unwrap();
        assert_eq!(config.code_font, "Fira Code");
        assert_eq!(config.heading_size(1), 20.0);
        assert_eq!(config.heading_size(2), 14.0);
    }

    #[test]
    fn test_toml_override() {
        let toml = "use_builtin_styles = false\n\n[heading_colors]\n3 = \"#000000\"\n";
        let config = parse_style_config(toml, ConfigFormat::Toml).unwrap();
        assert!(!config.use_builtin_styles);
        assert_eq!(config.heading_color(3), RgbColor(0, 0, 0));
    }

    #[test]
    fn test_wrong_type_is_config_error() {
        let result = parse_style_config("font_size: large\n", ConfigFormat::Yaml);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_unknown_key_ignored() {
        let config = parse_style_config("{\"colour\": 1}", ConfigFormat::Json).unwrap();
        assert_eq!(config, StyleConfig::default());
    }

    #[test]
    fn test_unknown_key_warns() {
        let (config, warnings) =
            parse_style_config_with_warnings("font_name: Arial\ncolour: blue\n", ConfigFormat::Yaml)
                .unwrap();
        assert_eq!(config.font_name, "Arial");
        assert_eq!(
            warnings,
            vec![Warning::ConfigFallback {
                field: "colour".into(),
                value: "blue".into(),
            }]
        );
    }

    #[test]
    fn test_style_keys() {
        assert!(is_style_key("font_name"));
        assert!(is_style_key("custom_style_map"));
        assert!(!is_style_key("title"));
        assert!(!is_style_key("Note"));
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = parse_style_config("", ConfigFormat::Yaml).unwrap();
        assert_eq!(config, StyleConfig::default());
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("style.YML")).unwrap(),
            ConfigFormat::Yaml
        );
        assert!(ConfigFormat::from_path(Path::new("style.ini")).is_err());
    }

    #[test]
    fn test_sample_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["style.json", "style.yaml", "style.toml"] {
            let path = dir.path().join(name);
            write_sample_config(&path).unwrap();
            let loaded = load_style_config(&path).unwrap();
            assert_eq!(loaded, StyleConfig::default(), "{}", name);
        }
    }
}
