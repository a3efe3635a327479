//! TOML configuration
//!
//! Every section is optional; command-line flags override file values.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use fichas_render::DashboardTheme;
use fichas_source::{DEFAULT_SPREADSHEET_ID, DEFAULT_URL_TEMPLATE};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub source: SourceSettings,
    /// username → password
    pub passwords: BTreeMap<String, String>,
    /// username → display name
    pub names: BTreeMap<String, String>,
    pub cookie: CookieSettings,
    pub display: DisplaySettings,
    pub theme: DashboardTheme,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceSettings {
    pub spreadsheet_id: String,
    pub url_template: String,
    /// Read `<csv_dir>/<slug>.csv` instead of fetching the spreadsheet
    pub csv_dir: Option<PathBuf>,
    /// Read one CSV file for every tab
    pub csv_file: Option<PathBuf>,
    pub cache: bool,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            spreadsheet_id: DEFAULT_SPREADSHEET_ID.to_string(),
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            csv_dir: None,
            csv_file: None,
            cache: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CookieSettings {
    pub name: String,
    pub key: String,
    pub expiry_days: u32,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            name: "fichas_atendimento".to_string(),
            key: String::new(),
            expiry_days: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplaySettings {
    pub title: String,
    pub footer: Option<String>,
    pub logo_url: Option<String>,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            title: "Fichas de Atendimento".to_string(),
            footer: None,
            logo_url: None,
        }
    }
}

impl Settings {
    /// Parse settings from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(text).context("Invalid configuration")?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a file, or defaults when no file is given.
    ///
    /// Relative source paths are resolved against the directory of the file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut settings = Self::from_toml_str(&text)
            .with_context(|| format!("Failed to load config file: {}", path.display()))?;

        if let Some(base) = path.parent() {
            settings.source.csv_dir = settings.source.csv_dir.map(|p| base.join(p));
            settings.source.csv_file = settings.source.csv_file.map(|p| base.join(p));
        }
        Ok(settings)
    }

    /// Reject configurations that cannot work
    pub fn validate(&self) -> Result<()> {
        if !self.passwords.is_empty() && self.cookie.key.trim().is_empty() {
            bail!("[cookie] key must be set when [passwords] are configured");
        }
        if self.cookie.expiry_days == 0 {
            bail!("[cookie] expiry_days must be at least 1");
        }
        if !self.source.url_template.contains("{gid}") {
            bail!("[source] url_template must contain {{gid}}");
        }
        if self.source.csv_dir.is_some() && self.source.csv_file.is_some() {
            bail!("[source] csv_dir and csv_file are mutually exclusive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_file_gives_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings.source.spreadsheet_id, DEFAULT_SPREADSHEET_ID);
        assert!(settings.source.cache);
        assert_eq!(settings.cookie.name, "fichas_atendimento");
        assert_eq!(settings.cookie.expiry_days, 30);
        assert_eq!(settings.display.title, "Fichas de Atendimento");
        assert!(settings.passwords.is_empty());
    }

    #[test]
    fn full_file_parses() {
        let settings = Settings::from_toml_str(
            r##"
[source]
csv_dir = "data"
cache = false

[passwords]
admin = "s3cret"
gabinete = "outra"

[names]
gabinete = "Gabinete do Vereador"

[cookie]
name = "fichas"
key = "chave"
expiry_days = 7

[display]
footer = "Câmara Municipal"

[theme]
brand_color = "#123456"
"##,
        )
        .unwrap();

        assert_eq!(settings.source.csv_dir, Some(PathBuf::from("data")));
        assert!(!settings.source.cache);
        assert_eq!(settings.passwords.len(), 2);
        assert_eq!(settings.names["gabinete"], "Gabinete do Vereador");
        assert_eq!(settings.cookie.expiry_days, 7);
        assert_eq!(settings.display.footer.as_deref(), Some("Câmara Municipal"));
        assert_eq!(settings.theme.brand_color, "#123456");
        assert_eq!(settings.theme.harmed_color, "#ff4d4d");
    }

    #[test]
    fn passwords_require_cookie_key() {
        let err = Settings::from_toml_str("[passwords]\nadmin = \"x\"\n").unwrap_err();
        assert!(err.to_string().contains("key must be set"));
    }

    #[test]
    fn url_template_needs_gid() {
        let err = Settings::from_toml_str("[source]\nurl_template = \"http://x/\"\n").unwrap_err();
        assert!(err.to_string().contains("{gid}"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Settings::from_toml_str("[source]\nspreadsheet = \"x\"\n").is_err());
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fichas.toml");
        std::fs::write(&path, "[source]\ncsv_dir = \"data\"\n").unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.source.csv_dir, Some(dir.path().join("data")));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = Settings::load(Some(Path::new("/nonexistent/fichas.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
