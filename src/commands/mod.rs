pub mod add;
pub mod archive;
pub mod id;
pub mod remove;
pub mod restore;
pub mod verify;

use anyhow::Result;
use serde::Serialize;

use crate::folio::config::FolioConfig;
use crate::folio::paths::FolioPaths;
use crate::folio::scaffold::SiteScaffolder;
use crate::folio::service::{Change, RegistryService};

#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub ok: bool,
    pub details: Vec<String>,
    pub issues: Vec<String>,
}

impl CommandReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ok: true,
            details: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn detail(&mut self, text: impl Into<String>) {
        self.details.push(text.into());
    }

    pub fn issue(&mut self, text: impl Into<String>) {
        self.ok = false;
        self.issues.push(text.into());
    }

    pub fn change(&mut self, change: &Change) {
        self.detail(format!("id={}", change.id));
        self.detail(format!("prev_id={}", change.prev_id));
        self.detail(format!("next_id={}", change.next_id));
        for page in &change.patched {
            self.detail(format!("patched={}", page.display()));
        }
    }
}

/// Resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub paths: FolioPaths,
    pub config: FolioConfig,
}

impl CommandContext {
    pub fn open_service(&self) -> Result<RegistryService<SiteScaffolder>> {
        let scaffolder = SiteScaffolder::new(self.paths.clone());
        Ok(RegistryService::open(
            self.paths.clone(),
            &self.config,
            scaffolder,
        )?)
    }
}
