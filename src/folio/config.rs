use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

include!(concat!(env!("OUT_DIR"), "/folio_env_allowlist.rs"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolioRegistryConfig {
    pub file: String,
    #[serde(default = "default_lock_enabled")]
    pub lock: bool,
}

fn default_lock_enabled() -> bool {
    true
}

impl Default for FolioRegistryConfig {
    fn default() -> Self {
        Self {
            file: "projects.json".to_string(),
            lock: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolioSiteConfig {
    pub default_image: String,
    pub template: String,
}

impl Default for FolioSiteConfig {
    fn default() -> Self {
        Self {
            default_image: "p_default.jpg".to_string(),
            template: "template-index.html".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolioLoggingConfig {
    pub format: String,
    pub filter: String,
}

impl Default for FolioLoggingConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            filter: "folio=info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FolioConfig {
    pub registry: FolioRegistryConfig,
    pub site: FolioSiteConfig,
    pub logging: FolioLoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialFolioConfig {
    registry: Option<FolioRegistryConfig>,
    site: Option<FolioSiteConfig>,
    logging: Option<FolioLoggingConfig>,
}

fn env_or_bool(var: &str, fallback: bool) -> bool {
    match env::var(var) {
        Ok(v) => match v.trim() {
            "1" | "true" | "TRUE" | "yes" | "on" => true,
            "0" | "false" | "FALSE" | "no" | "off" => false,
            _ => fallback,
        },
        Err(_) => fallback,
    }
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn is_plain_file_name(value: &str) -> bool {
    !value.is_empty() && !value.contains(['/', '\\']) && value != "." && value != ".."
}

fn validate(cfg: &FolioConfig) -> Result<()> {
    if !is_plain_file_name(&cfg.registry.file) {
        return Err(anyhow!(
            "invalid registry file `{}`: must be a file name inside the site root",
            cfg.registry.file
        ));
    }
    if !is_plain_file_name(&cfg.site.default_image) {
        return Err(anyhow!(
            "invalid default image `{}`: must be a file name inside imgs/",
            cfg.site.default_image
        ));
    }
    if cfg.site.template.trim().is_empty() {
        return Err(anyhow!("invalid page template: cannot be empty"));
    }
    if cfg.logging.format != "text" && cfg.logging.format != "json" {
        return Err(anyhow!("invalid log format: use `text` or `json`"));
    }
    Ok(())
}

fn resolve_config_path(site_root: &Path) -> PathBuf {
    if let Ok(custom) = env::var("FOLIO_CONFIG_PATH") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    site_root.join(".folio.toml")
}

fn merge_file_config(base: &mut FolioConfig, site_root: &Path) -> Result<()> {
    let path = resolve_config_path(site_root);
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(&path)?;
    let parsed: PartialFolioConfig = toml::from_str(&raw)
        .map_err(|err| anyhow!("failed to parse folio config {}: {err}", path.display()))?;
    if let Some(registry) = parsed.registry {
        base.registry = registry;
    }
    if let Some(site) = parsed.site {
        base.site = site;
    }
    if let Some(logging) = parsed.logging {
        base.logging = logging;
    }
    Ok(())
}

pub fn load_config(site_root: &Path) -> Result<FolioConfig> {
    let mut cfg = FolioConfig::default();
    merge_file_config(&mut cfg, site_root)?;

    cfg.registry.file = env_or_string("FOLIO_REGISTRY_FILE", &cfg.registry.file);
    cfg.registry.lock = env_or_bool("FOLIO_REGISTRY_LOCK", cfg.registry.lock);
    cfg.site.default_image = env_or_string("FOLIO_DEFAULT_IMAGE", &cfg.site.default_image);
    cfg.site.template = env_or_string("FOLIO_TEMPLATE", &cfg.site.template);
    cfg.logging.format = env_or_string("FOLIO_LOG_FORMAT", &cfg.logging.format);
    cfg.logging.filter = env_or_string("FOLIO_LOG", &cfg.logging.filter);

    validate(&cfg)?;
    Ok(cfg)
}

/// `FOLIO_*` variables set in the environment that the binary never reads.
pub fn unrecognized_env_keys() -> Vec<String> {
    let mut out: Vec<String> = env::vars_os()
        .filter_map(|(key, _)| key.into_string().ok())
        .filter(|key| key.starts_with("FOLIO_"))
        .filter(|key| !GENERATED_FOLIO_ENV_ALLOWLIST.contains(&key.as_str()))
        .collect();
    out.sort();
    out
}
