use crate::folio::config::FolioConfig;
use crate::folio::model::IMAGES_DIR;
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct FolioPaths {
    pub site_root: PathBuf,
    pub registry_file: PathBuf,
    pub lock_file: PathBuf,
    pub images_dir: PathBuf,
    pub default_image: PathBuf,
    pub template_file: PathBuf,
    pub logs_dir: PathBuf,
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

/// Site root from the command line, then `FOLIO_ROOT`, then the cwd.
pub fn resolve_site_root(cli_root: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(root) = cli_root {
        return Ok(root);
    }
    let cwd = env::current_dir().context("current directory could not be resolved")?;
    Ok(env_or_default_path("FOLIO_ROOT", cwd))
}

pub fn resolve_paths(site_root: PathBuf, cfg: &FolioConfig) -> FolioPaths {
    let registry_file = site_root.join(&cfg.registry.file);
    let lock_file = site_root.join(format!("{}.lock", cfg.registry.file));
    let images_dir = site_root.join(IMAGES_DIR);
    let default_image = images_dir.join(&cfg.site.default_image);
    let template_file = site_root.join(&cfg.site.template);
    let logs_dir = env_or_default_path("FOLIO_LOGS_DIR", site_root.join(".folio/logs"));

    FolioPaths {
        site_root,
        registry_file,
        lock_file,
        images_dir,
        default_image,
        template_file,
        logs_dir,
    }
}

#[cfg(test)]
impl FolioPaths {
    pub fn for_tests(site_root: &std::path::Path) -> Self {
        resolve_paths(site_root.to_path_buf(), &FolioConfig::default())
    }
}
