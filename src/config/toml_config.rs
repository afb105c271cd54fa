use crate::core::ConfigProvider;
use crate::domain::model::{TemplateKind, TemplateTarget};
use crate::utils::error::{InfoboxError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_API_ENDPOINT: &str = "https://en.wikipedia.org/w/api.php";
pub const DEFAULT_USER_AGENT: &str = concat!(
    "wiki-infoboxes/",
    env!("CARGO_PKG_VERSION"),
    " (chemical identifier harvester)"
);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default = "default_template_configs")]
    pub templates: Vec<TemplateConfig>,
    #[serde(skip)]
    targets: Vec<TemplateTarget>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Unset means no timeout: a stalled API blocks the run.
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_raw_folder")]
    pub raw_folder: String,
    #[serde(default = "default_parsed_folder")]
    pub parsed_folder: String,
    #[serde(default = "default_archive_folder")]
    pub archive_folder: String,
}

/// One `[[templates]]` entry; unset fields take the template's defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    pub kind: TemplateKind,
    pub title: Option<String>,
    pub raw_file: Option<String>,
    pub parsed_file: Option<String>,
}

impl TemplateConfig {
    pub fn to_target(&self) -> TemplateTarget {
        let defaults = TemplateTarget::with_defaults(self.kind);
        TemplateTarget {
            kind: self.kind,
            title: self.title.clone().unwrap_or(defaults.title),
            raw_file: self.raw_file.clone().unwrap_or(defaults.raw_file),
            parsed_file: self.parsed_file.clone().unwrap_or(defaults.parsed_file),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_API_ENDPOINT.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_raw_folder() -> String {
    "raw".to_string()
}

fn default_parsed_folder() -> String {
    "parsed".to_string()
}

fn default_archive_folder() -> String {
    "archived".to_string()
}

fn default_template_configs() -> Vec<TemplateConfig> {
    [TemplateKind::Drugbox, TemplateKind::Chembox]
        .into_iter()
        .map(|kind| TemplateConfig {
            kind,
            title: None,
            raw_file: None,
            parsed_file: None,
        })
        .collect()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            user_agent: default_user_agent(),
            timeout_seconds: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            raw_folder: default_raw_folder(),
            parsed_folder: default_parsed_folder(),
            archive_folder: default_archive_folder(),
        }
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        let mut config = Self {
            api: ApiConfig::default(),
            storage: StorageConfig::default(),
            templates: default_template_configs(),
            targets: Vec::new(),
        };
        config.resolve_targets();
        config
    }
}

impl HarvestConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(InfoboxError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        let mut config: Self =
            toml::from_str(&processed_content).map_err(|e| InfoboxError::ConfigError {
                message: format!("TOML parsing error: {}", e),
            })?;
        config.resolve_targets();
        Ok(config)
    }

    /// Replace `${VAR}` with the environment value; unknown variables stay as written.
    fn substitute_env_vars(content: &str) -> String {
        use once_cell::sync::Lazy;
        use regex::Regex;

        static ENV_VAR: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").expect("static regex"));

        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    fn resolve_targets(&mut self) {
        self.targets = self.templates.iter().map(TemplateConfig::to_target).collect();
    }

    /// Keep only the listed templates; an empty list keeps all of them.
    pub fn retain_templates(&mut self, kinds: &[TemplateKind]) {
        if kinds.is_empty() {
            return;
        }
        self.templates.retain(|t| kinds.contains(&t.kind));
        self.resolve_targets();
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("api.endpoint", &self.api.endpoint)?;
        validation::validate_non_empty_string("api.user_agent", &self.api.user_agent)?;
        if let Some(timeout) = self.api.timeout_seconds {
            validation::validate_range("api.timeout_seconds", timeout, 1, 86_400)?;
        }

        validation::validate_path("storage.data_dir", &self.storage.data_dir)?;
        validation::validate_non_empty_string("storage.raw_folder", &self.storage.raw_folder)?;
        validation::validate_non_empty_string(
            "storage.parsed_folder",
            &self.storage.parsed_folder,
        )?;
        validation::validate_non_empty_string(
            "storage.archive_folder",
            &self.storage.archive_folder,
        )?;
        if self.storage.raw_folder == self.storage.parsed_folder {
            return Err(InfoboxError::InvalidConfigValueError {
                field: "storage.parsed_folder".to_string(),
                value: self.storage.parsed_folder.clone(),
                reason: "Raw and parsed snapshots need separate folders".to_string(),
            });
        }

        if self.targets.is_empty() {
            return Err(InfoboxError::MissingConfigError {
                field: "templates".to_string(),
            });
        }

        let mut seen_files = HashSet::new();
        for target in &self.targets {
            validation::validate_non_empty_string("templates.title", &target.title)?;
            validation::validate_snapshot_file_name("templates.raw_file", &target.raw_file, &["json"])?;
            validation::validate_snapshot_file_name(
                "templates.parsed_file",
                &target.parsed_file,
                &["json"],
            )?;

            for file in [&target.raw_file, &target.parsed_file] {
                if !seen_files.insert(file.clone()) {
                    return Err(InfoboxError::InvalidConfigValueError {
                        field: "templates".to_string(),
                        value: file.clone(),
                        reason: "Snapshot file name used more than once".to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

impl ConfigProvider for HarvestConfig {
    fn api_endpoint(&self) -> &str {
        &self.api.endpoint
    }

    fn user_agent(&self) -> &str {
        &self.api.user_agent
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.api.timeout_seconds.map(Duration::from_secs)
    }

    fn data_dir(&self) -> &str {
        &self.storage.data_dir
    }

    fn raw_folder(&self) -> &str {
        &self.storage.raw_folder
    }

    fn parsed_folder(&self) -> &str {
        &self.storage.parsed_folder
    }

    fn archive_folder(&self) -> &str {
        &self.storage.archive_folder
    }

    fn templates(&self) -> &[TemplateTarget] {
        &self.targets
    }
}

impl Validate for HarvestConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_match_canonical_layout() {
        let config = HarvestConfig::default();

        assert_eq!(config.api_endpoint(), DEFAULT_API_ENDPOINT);
        assert!(config.request_timeout().is_none());
        assert_eq!(config.data_dir(), "data");
        assert_eq!(config.templates().len(), 2);
        assert_eq!(config.templates()[0].title, "Template:Infobox drug");
        assert_eq!(config.templates()[1].raw_file, "chembox_raw_html.json");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml_config() {
        let toml_content = r#"
[api]
timeout_seconds = 120

[storage]
data_dir = "./harvest"

[[templates]]
kind = "chembox"
parsed_file = "chembox.json"
"#;

        let config = HarvestConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.api_endpoint(), DEFAULT_API_ENDPOINT);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(120)));
        assert_eq!(config.data_dir(), "./harvest");
        assert_eq!(config.archive_folder(), "archived");
        assert_eq!(config.templates().len(), 1);
        assert_eq!(config.templates()[0].title, "Template:Chembox");
        assert_eq!(config.templates()[0].parsed_file, "chembox.json");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("WIKI_INFOBOXES_TEST_ENDPOINT", "https://test.wiki.org/w/api.php");

        let toml_content = r#"
[api]
endpoint = "${WIKI_INFOBOXES_TEST_ENDPOINT}"
"#;

        let config = HarvestConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.api.endpoint, "https://test.wiki.org/w/api.php");

        std::env::remove_var("WIKI_INFOBOXES_TEST_ENDPOINT");
    }

    #[test]
    fn test_config_validation() {
        let bad_endpoint = HarvestConfig::from_toml_str("[api]\nendpoint = \"invalid-url\"\n").unwrap();
        assert!(bad_endpoint.validate().is_err());

        let shared_file = HarvestConfig::from_toml_str(
            r#"
[[templates]]
kind = "chembox"
raw_file = "shared.json"

[[templates]]
kind = "drugbox"
raw_file = "shared.json"
"#,
        )
        .unwrap();
        assert!(shared_file.validate().is_err());

        let same_folders =
            HarvestConfig::from_toml_str("[storage]\nraw_folder = \"x\"\nparsed_folder = \"x\"\n")
                .unwrap();
        assert!(same_folders.validate().is_err());

        let no_timeout = HarvestConfig::from_toml_str("[api]\ntimeout_seconds = 0\n").unwrap();
        assert!(no_timeout.validate().is_err());
    }

    #[test]
    fn test_unknown_template_kind_is_rejected() {
        let result = HarvestConfig::from_toml_str("[[templates]]\nkind = \"taxobox\"\n");
        assert!(matches!(
            result,
            Err(InfoboxError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_malformed_toml_is_a_config_error() {
        let err = HarvestConfig::from_toml_str("[api\nendpoint = ").unwrap_err();

        assert!(matches!(
            err,
            InfoboxError::ConfigError { ref message } if message.starts_with("TOML parsing error")
        ));
        assert!(err.user_friendly_message().starts_with("Invalid configuration"));
    }

    #[test]
    fn test_retain_templates() {
        let mut config = HarvestConfig::default();
        config.retain_templates(&[TemplateKind::Chembox]);

        assert_eq!(config.templates().len(), 1);
        assert_eq!(config.templates()[0].kind, TemplateKind::Chembox);

        config.retain_templates(&[]);
        assert_eq!(config.templates().len(), 1);
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[storage]\ndata_dir = \"/var/lib/infoboxes\"\n")
            .unwrap();

        let config = HarvestConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.data_dir(), "/var/lib/infoboxes");
    }
}
