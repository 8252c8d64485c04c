//! Registry operations as single logical steps.
//!
//! A service lives for one invocation: it holds the registry lock, the loaded
//! registry and the scaffolder. Every operation mutates a copy, stages all
//! page patches, commits them, saves, and only then adopts the copy. A failed
//! save reverts the committed pages, so the registry and the published pages
//! never disagree because of an error path.

use crate::error::{RegistryError, RegistryResult};
use crate::folio::audit;
use crate::folio::config::FolioConfig;
use crate::folio::model::{ProjectRecord, ProjectStatus, Registry, lookup_key};
use crate::folio::navigation::NavigationPatcher;
use crate::folio::ordering::{self, Direction};
use crate::folio::paths::FolioPaths;
use crate::folio::scaffold::{ScaffoldRequest, Scaffolder};
use crate::folio::store::{RegistryLock, RegistryStore};
use std::fs;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Granted,
    Declined,
}

/// Ring position of a record after an operation and the pages rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub id: String,
    pub prev_id: String,
    pub next_id: String,
    pub patched: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Applied(Change),
    Unchanged { id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    Declined {
        id: String,
    },
    Removed {
        id: String,
        archived: Option<Change>,
        deleted: Vec<PathBuf>,
    },
}

pub struct RegistryService<S: Scaffolder> {
    paths: FolioPaths,
    store: RegistryStore,
    registry: Registry,
    scaffolder: S,
    default_image: String,
    _lock: Option<RegistryLock>,
}

impl<S: Scaffolder> RegistryService<S> {
    pub fn open(paths: FolioPaths, cfg: &FolioConfig, scaffolder: S) -> RegistryResult<Self> {
        let store = RegistryStore::new(&paths.registry_file, &paths.lock_file);
        let lock = if cfg.registry.lock {
            Some(store.lock()?)
        } else {
            None
        };
        let registry = store.load()?;
        tracing::debug!(
            registry = %store.path().display(),
            locked = lock.is_some(),
            "opened registry"
        );
        Ok(Self {
            paths,
            store,
            registry,
            scaffolder,
            default_image: cfg.site.default_image.clone(),
            _lock: lock,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn paths(&self) -> &FolioPaths {
        &self.paths
    }

    /// Resolve a project folder name (`snake-game`, `./snake-game/`) to its id.
    pub fn lookup(&self, name: &str) -> RegistryResult<String> {
        let key = lookup_key(name);
        if key.is_empty() {
            return Err(RegistryError::NotFound(name.to_string()));
        }
        self.registry
            .projects
            .values()
            .find(|record| record.url_key() == key)
            .map(|record| record.id.clone())
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    pub fn verify(&self) -> Vec<String> {
        ordering::verify(&self.registry)
    }

    pub fn add(&mut self, name: &str, description: &str) -> RegistryResult<Change> {
        validate_name(name)?;
        if self.paths.site_root.join(name).exists() || self.lookup(name).is_ok() {
            return Err(RegistryError::DuplicateName(name.to_string()));
        }

        let mut next = self.registry.clone();
        let id = ordering::next_id(&next)?;
        next.projects
            .insert(id.clone(), ProjectRecord::new(&id, name, description));
        let head = ordering::lowest_active_id(&next)?;
        ordering::splice_in(&mut next, &id, &head)?;
        let (prev_id, next_id) = links(&next, &id)?;
        if let Ok(newest) = ordering::highest_active_id(&self.registry)
            && newest != next_id
        {
            tracing::debug!(%newest, %next_id, "ring order differs from id order");
        }

        let scaffolded = self.scaffolder.scaffold(&ScaffoldRequest {
            dir_name: name.to_string(),
            description: description.to_string(),
            id: id.clone(),
        })?;

        let patched = self
            .stage_add(&next, &id, &prev_id, &next_id)
            .and_then(|patcher| self.commit_and_save(&next, patcher));
        let patched = match patched {
            Ok(patched) => patched,
            Err(err) => {
                if let Err(discard_err) = self.scaffolder.discard(&scaffolded) {
                    tracing::error!("discarding scaffold of {name} failed: {discard_err}");
                }
                return Err(err);
            }
        };

        self.registry = next;
        tracing::info!(%id, name, prev = %prev_id, next = %next_id, "added project");
        self.audit("add", &id, ProjectStatus::Active, &format!("added {name}"));
        Ok(Change {
            id,
            prev_id,
            next_id,
            patched,
        })
    }

    fn stage_add(
        &self,
        next: &Registry,
        id: &str,
        prev_id: &str,
        next_id: &str,
    ) -> RegistryResult<NavigationPatcher> {
        let mut patcher = self.patcher();
        if prev_id != id {
            patcher.patch_neighbor_reference(next, prev_id, Direction::Next, id)?;
            patcher.patch_neighbor_reference(next, next_id, Direction::Prev, id)?;
        }
        let record = next
            .get(id)
            .ok_or_else(|| RegistryError::broken(id, "new record vanished"))?;
        if NavigationPatcher::page_path(&self.paths.site_root, record).is_file() {
            patcher.patch_neighbor_reference(next, id, Direction::Prev, prev_id)?;
            patcher.patch_neighbor_reference(next, id, Direction::Next, next_id)?;
        }
        Ok(patcher)
    }

    pub fn archive(&mut self, name: &str) -> RegistryResult<Outcome> {
        let id = self.lookup(name)?;
        if self.status_of(&id)? == ProjectStatus::Archived {
            tracing::info!(%id, name, "project is already archived");
            return Ok(Outcome::Unchanged { id });
        }

        let mut next = self.registry.clone();
        let prev_id = ordering::prev_active(&next, &id)?;
        let next_id = ordering::next_active(&next, &id)?;
        {
            let record = record_mut(&mut next, &id)?;
            if record.prev_id != prev_id || record.next_id != next_id {
                tracing::warn!(
                    %id,
                    stored_prev = %record.prev_id,
                    stored_next = %record.next_id,
                    "active project linked to archived neighbors; relinking"
                );
                record.prev_id = prev_id.clone();
                record.next_id = next_id.clone();
            }
        }
        ordering::splice_out(&mut next, &id)?;
        record_mut(&mut next, &id)?.status = ProjectStatus::Archived;

        let mut patcher = self.patcher();
        if prev_id != id {
            patcher.patch_neighbor_reference(&next, &prev_id, Direction::Next, &next_id)?;
            patcher.patch_neighbor_reference(&next, &next_id, Direction::Prev, &prev_id)?;
        }
        let patched = self.commit_and_save(&next, patcher)?;

        self.registry = next;
        tracing::info!(%id, name, prev = %prev_id, next = %next_id, "archived project");
        self.audit("archive", &id, ProjectStatus::Archived, &format!("archived {name}"));
        Ok(Outcome::Applied(Change {
            id,
            prev_id,
            next_id,
            patched,
        }))
    }

    pub fn restore(&mut self, name: &str) -> RegistryResult<Outcome> {
        let id = self.lookup(name)?;
        if self.status_of(&id)? == ProjectStatus::Active {
            tracing::info!(%id, name, "project is already active");
            return Ok(Outcome::Unchanged { id });
        }

        let mut next = self.registry.clone();
        if next.active_count() == 0 {
            ordering::splice_in(&mut next, &id, &id)?;
        } else {
            let prev_id = match ordering::find_active(&next, &id, Direction::Prev)? {
                Some(prev_id) => prev_id,
                None => {
                    let head = ordering::lowest_active_id(&next)?;
                    tracing::warn!(
                        %id,
                        %head,
                        "stale links reach no active project; restoring after the head"
                    );
                    head
                }
            };
            ordering::splice_in(&mut next, &id, &prev_id)?;
            let (_, next_id) = links(&next, &id)?;
            if let Ok(Some(walked)) = ordering::find_active(&self.registry, &id, Direction::Next)
                && walked != next_id
            {
                tracing::warn!(
                    %id,
                    %walked,
                    ring = %next_id,
                    "stale links disagree with the ring; following the ring"
                );
            }
        }
        record_mut(&mut next, &id)?.status = ProjectStatus::Active;
        let (prev_id, next_id) = links(&next, &id)?;

        let mut patcher = self.patcher();
        patcher.patch_neighbor_reference(&next, &prev_id, Direction::Next, &id)?;
        patcher.patch_neighbor_reference(&next, &id, Direction::Next, &next_id)?;
        patcher.patch_neighbor_reference(&next, &next_id, Direction::Prev, &id)?;
        patcher.patch_neighbor_reference(&next, &id, Direction::Prev, &prev_id)?;
        let patched = self.commit_and_save(&next, patcher)?;

        self.registry = next;
        tracing::info!(%id, name, prev = %prev_id, next = %next_id, "restored project");
        self.audit("restore", &id, ProjectStatus::Active, &format!("restored {name}"));
        Ok(Outcome::Applied(Change {
            id,
            prev_id,
            next_id,
            patched,
        }))
    }

    pub fn remove(&mut self, name: &str, confirmation: Confirmation) -> RegistryResult<Removal> {
        let id = self.lookup(name)?;
        if confirmation == Confirmation::Declined {
            tracing::info!(%id, name, "deletion aborted");
            return Ok(Removal::Declined { id });
        }

        let archived = match self.archive(name)? {
            Outcome::Applied(change) => Some(change),
            Outcome::Unchanged { .. } => None,
        };

        let record = self
            .registry
            .get(&id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        let deleted = self.delete_side_files(&record)?;

        let mut next = self.registry.clone();
        let reserved = ordering::next_id(&next)?;
        ordering::detach(&mut next, &id)?;
        next.projects.remove(&id);
        if ordering::next_id(&next)? != reserved {
            next.last_id = Some(id.clone());
        }
        self.store.save(&next)?;

        self.registry = next;
        tracing::info!(%id, name, files = deleted.len(), "removed project");
        self.audit("remove", &id, ProjectStatus::Archived, &format!("removed {name}"));
        Ok(Removal::Removed {
            id,
            archived,
            deleted,
        })
    }

    fn delete_side_files(&self, record: &ProjectRecord) -> RegistryResult<Vec<PathBuf>> {
        let mut deleted = Vec::new();
        let root = &self.paths.site_root;

        let dir = record.site_dir().trim_end_matches('/');
        if is_contained(dir) {
            let dir = root.join(dir);
            if dir.is_dir() {
                fs::remove_dir_all(&dir)
                    .map_err(|err| RegistryError::io("failed to delete", &dir, err))?;
                tracing::info!(dir = %dir.display(), "deleted project directory");
                deleted.push(dir);
            }
        }

        for media in [&record.pic_url, &record.gif_url, &record.vid_url] {
            if !is_contained(media) {
                tracing::warn!(%media, "skipping media path outside the site");
                continue;
            }
            let path = root.join(media);
            if path.is_file() {
                fs::remove_file(&path)
                    .map_err(|err| RegistryError::io("failed to delete", &path, err))?;
                tracing::info!(file = %path.display(), "deleted media");
                deleted.push(path);
            }
        }
        Ok(deleted)
    }

    fn patcher(&self) -> NavigationPatcher {
        NavigationPatcher::new(&self.paths.site_root, &self.default_image)
    }

    fn commit_and_save(
        &self,
        next: &Registry,
        patcher: NavigationPatcher,
    ) -> RegistryResult<Vec<PathBuf>> {
        tracing::debug!(pages = patcher.staged_paths().len(), "committing navigation patches");
        let committed = patcher.commit()?;
        if let Err(err) = self.store.save(next) {
            committed.revert_quietly();
            return Err(err);
        }
        Ok(committed.paths())
    }

    fn status_of(&self, id: &str) -> RegistryResult<ProjectStatus> {
        self.registry
            .get(id)
            .map(|record| record.status)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    fn audit(&self, operation: &str, id: &str, status: ProjectStatus, message: &str) {
        if let Err(err) = audit::append_event(&self.paths, operation, id, status.as_str(), message)
        {
            tracing::warn!("audit log append failed: {err:#}");
        }
    }
}

fn validate_name(name: &str) -> RegistryResult<()> {
    let invalid = |reason| Err(RegistryError::InvalidName(name.to_string(), reason));
    if name.trim().is_empty() {
        return invalid("name is empty");
    }
    if name.contains(['/', '\\']) {
        return invalid("name must be a single folder name");
    }
    if name.starts_with('.') {
        return invalid("name must not start with a dot");
    }
    Ok(())
}

fn is_contained(relative: &str) -> bool {
    !relative.is_empty()
        && Path::new(relative)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

fn links(registry: &Registry, id: &str) -> RegistryResult<(String, String)> {
    registry
        .get(id)
        .map(|record| (record.prev_id.clone(), record.next_id.clone()))
        .ok_or_else(|| RegistryError::broken(id, "record is missing from the registry"))
}

fn record_mut<'a>(registry: &'a mut Registry, id: &str) -> RegistryResult<&'a mut ProjectRecord> {
    registry
        .projects
        .get_mut(id)
        .ok_or_else(|| RegistryError::broken(id, "record is missing from the registry"))
}
