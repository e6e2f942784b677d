//! Configuration management and loading for caseport.

use anyhow::{Context, Result};
use caseport_attachments::default_workers;
use caseport_attributes::OptionMergePolicy;
use caseport_engine::{ExportOptions, FailurePolicy};
use caseport_ids::SourceId;
use caseport_logging::LoggingConfig;
use caseport_resolver::CallPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration format types supported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigFormat {
    Json,
    #[default]
    Yaml,
}

impl ConfigFormat {
    /// `.json` is JSON; anything else is YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => ConfigFormat::Json,
            Some("yaml") | Some("yml") => ConfigFormat::Yaml,
            _ => ConfigFormat::default(),
        }
    }
}

/// Main caseport configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseportConfig {
    /// Overrides the project name the source reports
    #[serde(default)]
    pub project_name: Option<String>,

    /// Output directory for the export
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Name of the synthetic root section
    #[serde(default = "default_section_name")]
    pub default_section_name: String,

    /// Parent id that marks a flat section as top level
    #[serde(default)]
    pub root_sentinel: Option<String>,

    #[serde(default)]
    pub call_policy: CallPolicy,

    #[serde(default)]
    pub option_merge: OptionMergePolicy,

    /// Give every item a value for every known attribute
    #[serde(default)]
    pub fill_all_attributes: bool,

    /// Parallel attachment downloads per item
    #[serde(default = "default_workers")]
    pub attachment_workers: usize,

    #[serde(default)]
    pub failure_policy: FailurePolicy,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./export")
}

fn default_section_name() -> String {
    "Imported".to_string()
}

impl Default for CaseportConfig {
    fn default() -> Self {
        Self {
            project_name: None,
            output_dir: default_output_dir(),
            default_section_name: default_section_name(),
            root_sentinel: None,
            call_policy: CallPolicy::default(),
            option_merge: OptionMergePolicy::default(),
            fill_all_attributes: false,
            attachment_workers: default_workers(),
            failure_policy: FailurePolicy::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl CaseportConfig {
    /// Engine options for this configuration. Zero workers means one.
    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            project_name: self.project_name.clone(),
            default_section_name: self.default_section_name.clone(),
            root_sentinel: self.root_sentinel.as_deref().map(SourceId::from),
            call_policy: self.call_policy,
            option_merge: self.option_merge,
            fill_all_attributes: self.fill_all_attributes,
            attachment_workers: self.attachment_workers.max(1),
            failure_policy: self.failure_policy,
        }
    }
}

/// Load configuration from a file
pub fn load_config<P: Into<PathBuf>>(path: P) -> Result<CaseportConfig> {
    let path = path.into();
    let contents = std::fs::read_to_string(&path).with_context(|| format!("read {path:?}"))?;

    match ConfigFormat::from_path(&path) {
        ConfigFormat::Json => serde_json::from_str(&contents)
            .with_context(|| format!("parse JSON config {path:?}")),
        ConfigFormat::Yaml => serde_yaml::from_str(&contents)
            .with_context(|| format!("parse YAML config {path:?}")),
    }
}

/// Save configuration to a file
pub fn save_config<P: Into<PathBuf>>(config: &CaseportConfig, path: P) -> Result<()> {
    let path = path.into();
    let contents = match ConfigFormat::from_path(&path) {
        ConfigFormat::Json => {
            serde_json::to_string_pretty(config).context("serialize JSON config")?
        }
        ConfigFormat::Yaml => serde_yaml::to_string(config).context("serialize YAML config")?,
    };

    std::fs::write(&path, contents).with_context(|| format!("write {path:?}"))?;
    Ok(())
}
