use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::AppError;
use crate::render::FontChoice;

/// Profile looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "papertrail.toml";

/// Business profile: the issuing business's own details, so they don't have
/// to be typed on every invoice.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub business: BusinessProfile,
    #[serde(default)]
    pub output: OutputConfig,
    pub fonts: Option<FontConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BusinessProfile {
    pub name: Option<String>,
    pub contact_person: Option<String>,
    pub phone_number: Option<String>,
    /// Logo file path or URL
    pub logo: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { dir: default_output_dir() }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FontConfig {
    pub regular: PathBuf,
    pub bold: PathBuf,
}

impl Config {
    /// Load an explicitly named profile (must exist) or the default one
    /// (skipped when absent).
    pub fn load(explicit: Option<&Path>) -> Result<Self, AppError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)
                } else {
                    debug!("no {} found, using built-in defaults", DEFAULT_CONFIG_FILE);
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::ConfigError(format!("{}: {}", path.display(), e)))?;
        let config = Self::parse(&content)
            .map_err(|e| AppError::ConfigError(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "loaded business profile");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn font_choice(&self) -> FontChoice {
        match &self.fonts {
            Some(fonts) => FontChoice::TrueType {
                regular: fonts.regular.clone(),
                bold: fonts.bold.clone(),
            },
            None => FontChoice::Builtin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_profile() {
        let config = Config::parse(
            r#"
            [business]
            name = "SUPER POWER"
            contact_person = "Siva"
            phone_number = "+918089786704"
            logo = "assets/logo.png"

            [output]
            dir = "invoices"

            [fonts]
            regular = "fonts/NotoSans-Regular.ttf"
            bold = "fonts/NotoSans-Bold.ttf"
            "#,
        )
        .unwrap();

        assert_eq!(config.business.name.as_deref(), Some("SUPER POWER"));
        assert_eq!(config.business.logo.as_deref(), Some("assets/logo.png"));
        assert_eq!(config.output.dir, PathBuf::from("invoices"));
        assert!(matches!(config.font_choice(), FontChoice::TrueType { .. }));
    }

    #[test]
    fn test_empty_profile_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert!(config.business.name.is_none());
        assert_eq!(config.output.dir, PathBuf::from("."));
        assert!(matches!(config.font_choice(), FontChoice::Builtin));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(Config::parse("[business]\nnmae = \"typo\"\n").is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let result = Config::load(Some(Path::new("no/such/papertrail.toml")));
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }
}
