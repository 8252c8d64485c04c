use crate::error::{RegistryError, RegistryResult};
use crate::folio::paths::FolioPaths;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ScaffoldRequest {
    pub dir_name: String,
    pub description: String,
    pub id: String,
}

/// Paths a scaffold run created, so a failed add can take them back.
#[derive(Debug, Clone, Default)]
pub struct Scaffolded {
    pub created: Vec<PathBuf>,
}

/// Creates the initial file set of a new project. Runs once per add and is
/// not retried.
pub trait Scaffolder {
    fn scaffold(&self, request: &ScaffoldRequest) -> RegistryResult<Scaffolded>;
    fn discard(&self, scaffolded: &Scaffolded) -> RegistryResult<()>;
}

/// Project directory, a verbatim copy of the page template and the image
/// placeholder. Filling in the template's own placeholders is left to the
/// site tooling.
#[derive(Debug, Clone)]
pub struct SiteScaffolder {
    paths: FolioPaths,
}

impl SiteScaffolder {
    pub fn new(paths: FolioPaths) -> Self {
        Self { paths }
    }

    fn fail(request: &ScaffoldRequest, reason: impl Into<String>) -> RegistryError {
        RegistryError::Scaffold {
            name: request.dir_name.clone(),
            reason: reason.into(),
        }
    }
}

impl Scaffolder for SiteScaffolder {
    fn scaffold(&self, request: &ScaffoldRequest) -> RegistryResult<Scaffolded> {
        let mut out = Scaffolded::default();
        let dir = self.paths.site_root.join(&request.dir_name);
        fs::create_dir(&dir)
            .map_err(|err| Self::fail(request, format!("{}: {err}", dir.display())))?;
        out.created.push(dir.clone());
        tracing::info!(dir = %dir.display(), brief = %request.description, "created project directory");

        if self.paths.template_file.is_file() {
            let page = dir.join("index.html");
            if let Err(err) = fs::copy(&self.paths.template_file, &page) {
                let _ = self.discard(&out);
                return Err(Self::fail(request, format!("{}: {err}", page.display())));
            }
            tracing::info!(page = %page.display(), "created page from template");
        } else {
            tracing::warn!(
                template = %self.paths.template_file.display(),
                "page template missing; project has no published page yet"
            );
        }

        if !self.paths.images_dir.is_dir() {
            tracing::warn!(
                dir = %self.paths.images_dir.display(),
                "images folder is missing; no placeholder image created"
            );
            return Ok(out);
        }
        let image = self.paths.images_dir.join(format!("{}.jpg", request.id));
        if image.exists() {
            tracing::warn!(image = %image.display(), "image for this id already exists");
            return Ok(out);
        }
        if !self.paths.default_image.is_file() {
            tracing::warn!(
                image = %self.paths.default_image.display(),
                "default image missing; no placeholder image created"
            );
            return Ok(out);
        }
        if let Err(err) = fs::copy(&self.paths.default_image, &image) {
            let _ = self.discard(&out);
            return Err(Self::fail(request, format!("{}: {err}", image.display())));
        }
        tracing::info!(image = %image.display(), "created placeholder image");
        out.created.push(image);
        Ok(out)
    }

    fn discard(&self, scaffolded: &Scaffolded) -> RegistryResult<()> {
        for path in scaffolded.created.iter().rev() {
            let result = if path.is_dir() {
                fs::remove_dir_all(path)
            } else if path.exists() {
                fs::remove_file(path)
            } else {
                continue;
            };
            result.map_err(|err| RegistryError::io("failed to remove", path, err))?;
            tracing::info!(path = %path.display(), "removed scaffold");
        }
        Ok(())
    }
}
