//! Per-frame project layout and its destructive reset.

use std::path::{Path, PathBuf};

use crate::error::{IoContext, Result};

/// Directories removed on every reset.
pub const STALE_DIRS: [&str; 7] = [
    "manual",
    "images",
    "distorted",
    "input",
    "sparse",
    "stereo",
    "tmp",
];

/// Files removed on every reset: database sidecars and scripts left by the undistorter.
pub const STALE_FILES: [&str; 4] = [
    "input.db-shm",
    "input.db-wal",
    "run-colmap-geometric.sh",
    "run-colmap-photometric.sh",
];

/// Paths of one frame project, `<root>/frames/<offset:04>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    pub root: PathBuf,
    pub offset: u32,
}

impl ProjectLayout {
    pub fn new(data_root: impl AsRef<Path>, offset: u32) -> ProjectLayout {
        ProjectLayout {
            root: data_root
                .as_ref()
                .join("frames")
                .join(format!("{:04}", offset)),
            offset,
        }
    }

    pub fn frame_dir(&self) -> &Path {
        &self.root
    }
    pub fn manual_dir(&self) -> PathBuf {
        self.root.join("manual")
    }
    pub fn input_dir(&self) -> PathBuf {
        self.root.join("input")
    }
    pub fn distorted_sparse_dir(&self) -> PathBuf {
        self.root.join("distorted").join("sparse")
    }
    pub fn tmp_dir(&self) -> PathBuf {
        self.root.join("tmp")
    }
    pub fn sparse_dir(&self) -> PathBuf {
        self.root.join("sparse")
    }
    pub fn sparse_model_dir(&self) -> PathBuf {
        self.sparse_dir().join("0")
    }
    pub fn database_path(&self) -> PathBuf {
        self.root.join("input.db")
    }

    /// Removes every output of a previous run, then recreates `manual/`.
    ///
    /// Only this frame's directory is touched. Rerunning after a failure is safe.
    pub fn reset(&self) -> Result<()> {
        for dir in STALE_DIRS {
            let p = self.root.join(dir);
            if p.exists() {
                log::trace!("removing {}", p.display());
                std::fs::remove_dir_all(&p).with_path(&p)?;
            }
        }
        for file in STALE_FILES {
            let p = self.root.join(file);
            if p.exists() {
                log::trace!("removing {}", p.display());
                std::fs::remove_file(&p).with_path(&p)?;
            }
        }
        let manual = self.manual_dir();
        std::fs::create_dir_all(&manual).with_path(&manual)?;
        Ok(())
    }
}
