//! Navigation cards on published project pages.
//!
//! Each page carries a "previous project" and a "next project" card. A card is
//! three marker lines found by their `id` attribute (`next-title`, `next-url`,
//! `next-img`, and the same for `prev`). Patching regenerates those lines and
//! leaves every other byte of the page alone.

use crate::error::{RegistryError, RegistryResult};
use crate::folio::model::{IMAGES_DIR, ProjectRecord, Registry};
use crate::folio::ordering::Direction;
use crate::folio::util::write_atomic;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Title,
    Link,
    Image,
}

impl Slot {
    pub const ALL: [Slot; 3] = [Slot::Title, Slot::Link, Slot::Image];

    fn suffix(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Link => "url",
            Self::Image => "img",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    pub direction: Direction,
    pub slot: Slot,
}

impl Marker {
    pub fn attribute_id(self) -> String {
        format!("{}-{}", self.direction.as_str(), self.slot.suffix())
    }

    fn selector(self) -> String {
        format!("id=\"{}\"", self.attribute_id())
    }

    fn render(self, neighbor: &ProjectRecord, fallback_image: &str) -> String {
        let id = self.attribute_id();
        match self.slot {
            Slot::Title => format!("<h5 id=\"{id}\">{}</h5>", escape_text(&neighbor.name)),
            Slot::Link => format!(
                "<a id=\"{id}\" href=\"../{}\" class=\"project-demo\">",
                escape_attr(neighbor.site_dir())
            ),
            Slot::Image => format!(
                "<img id=\"{id}\" src=\"../{}\" onerror=\"this.onerror=null; this.src='../{}'\">",
                escape_attr(&neighbor.pic_url),
                escape_attr(fallback_image)
            ),
        }
    }
}

fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;").replace('\'', "&#39;")
}

fn split_line_ending(line: &[u8]) -> (&[u8], &[u8]) {
    for ending in [b"\r\n".as_slice(), b"\n".as_slice()] {
        if let Some(body) = line.strip_suffix(ending) {
            return (body, ending);
        }
    }
    (line, b"")
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

/// Rewrite the `direction` card of `content` to show `neighbor`.
///
/// Returns the new content and the number of marker lines rewritten. A
/// rewritten line keeps its indentation and line ending; other lines are
/// copied byte for byte, whatever their encoding.
pub fn rewrite_markers(
    content: &[u8],
    direction: Direction,
    neighbor: &ProjectRecord,
    fallback_image: &str,
) -> (Vec<u8>, usize) {
    let markers: Vec<(Marker, String)> = Slot::ALL
        .iter()
        .map(|&slot| {
            let marker = Marker { direction, slot };
            (marker, marker.selector())
        })
        .collect();

    let mut out = Vec::with_capacity(content.len());
    let mut rewritten = 0usize;
    for line in content.split_inclusive(|&b| b == b'\n') {
        let Some((marker, _)) = markers.iter().find(|(_, sel)| contains(line, sel.as_bytes()))
        else {
            out.extend_from_slice(line);
            continue;
        };
        let (body, ending) = split_line_ending(line);
        let indent_len = body.iter().take_while(|b| matches!(b, b' ' | b'\t')).count();
        out.extend_from_slice(&body[..indent_len]);
        out.extend_from_slice(marker.render(neighbor, fallback_image).as_bytes());
        out.extend_from_slice(ending);
        rewritten += 1;
    }
    (out, rewritten)
}

#[derive(Debug)]
struct StagedPage {
    original: Vec<u8>,
    rewritten: Vec<u8>,
}

/// Collects page rewrites in memory; nothing touches disk before `commit`.
#[derive(Debug)]
pub struct NavigationPatcher {
    site_root: PathBuf,
    fallback_image: String,
    staged: BTreeMap<PathBuf, StagedPage>,
}

impl NavigationPatcher {
    pub fn new(site_root: impl Into<PathBuf>, default_image: &str) -> Self {
        Self {
            site_root: site_root.into(),
            fallback_image: format!("{IMAGES_DIR}/{default_image}"),
            staged: BTreeMap::new(),
        }
    }

    pub fn page_path(site_root: &Path, record: &ProjectRecord) -> PathBuf {
        site_root.join(record.site_dir()).join("index.html")
    }

    /// Point the `role` card on `target_id`'s page at `new_neighbor_id`.
    pub fn patch_neighbor_reference(
        &mut self,
        registry: &Registry,
        target_id: &str,
        role: Direction,
        new_neighbor_id: &str,
    ) -> RegistryResult<()> {
        let target = registry
            .get(target_id)
            .ok_or_else(|| RegistryError::broken(target_id, "patch target is not in the registry"))?;
        let neighbor = registry.get(new_neighbor_id).ok_or_else(|| {
            RegistryError::broken(new_neighbor_id, "patch neighbor is not in the registry")
        })?;
        let path = Self::page_path(&self.site_root, target);

        let current = match self.staged.get(&path) {
            Some(page) => page.rewritten.clone(),
            None => read_page(target_id, &path)?,
        };
        let (rewritten, count) =
            rewrite_markers(&current, role, neighbor, &self.fallback_image);
        if count == 0 {
            tracing::warn!(
                page = %path.display(),
                role = role.as_str(),
                "no navigation markers found"
            );
        }
        tracing::debug!(
            target = target_id,
            role = role.as_str(),
            neighbor = new_neighbor_id,
            markers = count,
            "staged navigation patch"
        );

        match self.staged.get_mut(&path) {
            Some(page) => page.rewritten = rewritten,
            None => {
                self.staged.insert(
                    path,
                    StagedPage {
                        original: current,
                        rewritten,
                    },
                );
            }
        }
        Ok(())
    }

    pub fn staged_paths(&self) -> Vec<PathBuf> {
        self.staged.keys().cloned().collect()
    }

    /// Replace every staged page. If a replacement fails, pages already
    /// replaced are put back before the error is returned.
    pub fn commit(self) -> RegistryResult<CommittedPatches> {
        let mut committed = CommittedPatches::default();
        for (path, page) in self.staged {
            if page.rewritten == page.original {
                continue;
            }
            if let Err(err) = write_atomic(&path, &page.rewritten) {
                committed.revert_quietly();
                return Err(err);
            }
            tracing::info!(page = %path.display(), "updated navigation");
            committed.written.push((path, page.original));
        }
        Ok(committed)
    }
}

fn read_page(id: &str, path: &Path) -> RegistryResult<Vec<u8>> {
    match fs::read(path) {
        Ok(raw) => Ok(raw),
        Err(err) if err.kind() == ErrorKind::NotFound => Err(RegistryError::ArtifactNotFound {
            id: id.to_string(),
            path: path.to_path_buf(),
        }),
        Err(err) => Err(RegistryError::io("failed to read", path, err)),
    }
}

/// Pages replaced by a commit, with their previous content.
#[derive(Debug, Default)]
pub struct CommittedPatches {
    written: Vec<(PathBuf, Vec<u8>)>,
}

impl CommittedPatches {
    pub fn paths(&self) -> Vec<PathBuf> {
        self.written.iter().map(|(path, _)| path.clone()).collect()
    }

    pub fn revert(self) -> RegistryResult<()> {
        for (path, original) in self.written.iter().rev() {
            write_atomic(path, original)?;
            tracing::info!(page = %path.display(), "reverted navigation");
        }
        Ok(())
    }

    pub(crate) fn revert_quietly(self) {
        if let Err(err) = self.revert() {
            tracing::error!(code = err.code().as_str(), "revert of navigation pages failed: {err}");
        }
    }
}
