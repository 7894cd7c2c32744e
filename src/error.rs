use std::path::{Path, PathBuf};

use crate::pipeline::Stage;

/// Errors raised while building or reconstructing frame projects.
#[derive(Debug, thiserror::Error)]
pub enum PrepError {
    /// Filesystem error on a specific path
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error talking to the reconstruction database
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The source sparse reconstruction could not be read
    #[error("sparse model error: {0}")]
    Sparse(String),

    /// A camera record cannot be serialised
    #[error("invalid camera record {id}: {reason}")]
    InvalidRecord { id: u32, reason: String },

    /// A registered image is not present in the frame's input folder
    #[error("image {0} is not present in the input folder")]
    MissingImage(PathBuf),

    /// The external tool could not be started
    #[error("failed to launch {program}: {source}")]
    ToolLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// An external stage returned a non-zero status
    #[error("frame {frame:04}: {stage} exited with status {code}")]
    StageFailed { frame: u32, stage: Stage, code: i32 },

    /// Invalid image search pattern
    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Invalid configuration file
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    /// Empty or inverted frame range
    #[error("invalid frame range [{start}, {end})")]
    InvalidRange { start: u32, end: u32 },
}

impl PrepError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        PrepError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Process exit code for this error.
    ///
    /// A failed external stage propagates its own status, everything else is `1`.
    pub fn exit_code(&self) -> i32 {
        match self {
            PrepError::StageFailed { code, .. } => *code,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, PrepError>;

/// Attaches the offending path to a raw io result.
pub(crate) trait IoContext<T> {
    fn with_path(self, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn with_path(self, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|e| PrepError::io(path, e))
    }
}
