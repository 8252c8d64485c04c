use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("project `{0}` already exists")]
    DuplicateName(String),
    #[error("invalid project name `{0}`: {1}")]
    InvalidName(String, &'static str),
    #[error("there is no project with the url `{0}` in the registry")]
    NotFound(String),
    #[error("registry has no active project")]
    EmptyRegistry,
    #[error("broken project chain at `{id}`: {reason}")]
    BrokenChain { id: String, reason: String },
    #[error("published page for `{id}` not found at {}", path.display())]
    ArtifactNotFound { id: String, path: PathBuf },
    #[error("registry document {} is corrupt: {reason}", path.display())]
    CorruptFormat { path: PathBuf, reason: String },
    #[error("registry {} is locked by another invocation", path.display())]
    Locked { path: PathBuf },
    #[error("scaffolding `{name}` failed: {reason}")]
    Scaffold { name: String, reason: String },
    #[error("{action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RegistryError {
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    pub fn broken(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::BrokenChain {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> RegistryErrorCode {
        match self {
            Self::DuplicateName(_) => RegistryErrorCode::E001DuplicateName,
            Self::InvalidName(..) => RegistryErrorCode::E002InvalidName,
            Self::NotFound(_) => RegistryErrorCode::E003NotFound,
            Self::EmptyRegistry => RegistryErrorCode::E004EmptyRegistry,
            Self::BrokenChain { .. } => RegistryErrorCode::E005BrokenChain,
            Self::ArtifactNotFound { .. } => RegistryErrorCode::E006ArtifactNotFound,
            Self::CorruptFormat { .. } => RegistryErrorCode::E007CorruptFormat,
            Self::Locked { .. } => RegistryErrorCode::E008Locked,
            Self::Scaffold { .. } => RegistryErrorCode::E009Scaffold,
            Self::Io { .. } => RegistryErrorCode::E010Io,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryErrorCode {
    E001DuplicateName,
    E002InvalidName,
    E003NotFound,
    E004EmptyRegistry,
    E005BrokenChain,
    E006ArtifactNotFound,
    E007CorruptFormat,
    E008Locked,
    E009Scaffold,
    E010Io,
}

impl RegistryErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::E001DuplicateName => "E001_DUPLICATE_NAME",
            Self::E002InvalidName => "E002_INVALID_NAME",
            Self::E003NotFound => "E003_NOT_FOUND",
            Self::E004EmptyRegistry => "E004_EMPTY_REGISTRY",
            Self::E005BrokenChain => "E005_BROKEN_CHAIN",
            Self::E006ArtifactNotFound => "E006_ARTIFACT_NOT_FOUND",
            Self::E007CorruptFormat => "E007_CORRUPT_FORMAT",
            Self::E008Locked => "E008_LOCKED",
            Self::E009Scaffold => "E009_SCAFFOLD",
            Self::E010Io => "E010_IO",
        }
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;
