use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const ID_PREFIX: &str = "p_";
pub const ID_WIDTH: usize = 3;
pub const IMAGES_DIR: &str = "imgs";
pub const VIDEOS_DIR: &str = "vids";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Active,
    Archived,
}

impl ProjectStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }
}

// Fields are declared in key order so the serialized record matches a
// sorted-key dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub brief: String,
    #[serde(rename = "demo-url")]
    pub demo_url: String,
    #[serde(rename = "docs-url")]
    pub docs_url: String,
    #[serde(rename = "gif-url")]
    pub gif_url: String,
    pub id: String,
    pub name: String,
    #[serde(rename = "next-id")]
    pub next_id: String,
    #[serde(rename = "pic-url")]
    pub pic_url: String,
    #[serde(rename = "prev-id")]
    pub prev_id: String,
    pub status: ProjectStatus,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "vid-url")]
    pub vid_url: String,
}

impl ProjectRecord {
    /// Build a fresh active record for the project directory `dir_name`.
    ///
    /// Links point at the record itself until it is spliced into the ring.
    pub fn new(id: &str, dir_name: &str, brief: &str) -> Self {
        Self {
            brief: brief.to_string(),
            demo_url: format!("/{dir_name}/"),
            docs_url: format!("/{dir_name}/docs/"),
            gif_url: format!("{IMAGES_DIR}/{id}.gif"),
            id: id.to_string(),
            name: display_name(dir_name),
            next_id: id.to_string(),
            pic_url: format!("{IMAGES_DIR}/{id}.jpg"),
            prev_id: id.to_string(),
            status: ProjectStatus::Active,
            tags: Vec::new(),
            vid_url: format!("{VIDEOS_DIR}/{id}.mp4"),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ProjectStatus::Active
    }

    /// Site-relative directory of the published page, e.g. `snake-game/`.
    pub fn site_dir(&self) -> &str {
        self.demo_url.trim_start_matches('/')
    }

    /// The key `lookup` compares against, normalized like the query.
    pub fn url_key(&self) -> String {
        lookup_key(&self.demo_url)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    /// Highest id ever issued, kept once that record has been removed.
    #[serde(
        rename = "last-id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_id: Option<String>,
    pub projects: BTreeMap<String, ProjectRecord>,
}

impl Registry {
    pub fn get(&self, id: &str) -> Option<&ProjectRecord> {
        self.projects.get(id)
    }

    pub fn active_count(&self) -> usize {
        self.projects.values().filter(|p| p.is_active()).count()
    }
}

/// Folder names and demo urls compare without slashes, dots or case.
pub fn lookup_key(value: &str) -> String {
    value.replace(['/', '.'], "").to_lowercase()
}

pub fn parse_id_suffix(id: &str) -> Option<u32> {
    let digits = id.strip_prefix(ID_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

pub fn format_id(suffix: u32) -> String {
    format!("{ID_PREFIX}{suffix:0width$}", width = ID_WIDTH)
}

/// `snake-game` becomes `Snake game`.
pub fn display_name(dir_name: &str) -> String {
    let trimmed = dir_name.trim();
    let mut chars = trimmed.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    let caps: String = first.to_uppercase().chain(chars).collect();
    caps.replace(['-', '_'], " ")
}
