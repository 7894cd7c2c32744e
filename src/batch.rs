//! Two-pass processing of a frame range: build every project, then reconstruct every project.

use std::ops::Range;
use std::path::{Path, PathBuf};

use indicatif::ProgressBar;

use crate::error::{PrepError, Result};
use crate::io::PrepConfig;
use crate::pipeline::{ReconstructionTool, reconstruct_frame};
use crate::scaffold::ProjectLayout;
use crate::sparse::load_camera_records;
use crate::writer::write_frame_project;

/// Half-open frame range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRange {
    pub start: u32,
    pub end: u32,
}

impl FrameRange {
    pub fn new(start: u32, end: u32) -> Result<FrameRange> {
        if start >= end {
            return Err(PrepError::InvalidRange { start, end });
        }
        Ok(FrameRange { start, end })
    }

    pub fn offsets(&self) -> Range<u32> {
        self.start..self.end
    }

    /// Number of frames; never zero.
    pub fn frame_count(&self) -> usize {
        (self.end - self.start) as usize
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub frames_prepared: usize,
    pub frames_reconstructed: usize,
}

pub struct Batch {
    pub data_root: PathBuf,
    pub cameras_path: PathBuf,
    pub range: FrameRange,
    pub config: PrepConfig,
}

impl Batch {
    pub fn new(
        data_root: impl AsRef<Path>,
        cameras_path: impl AsRef<Path>,
        range: FrameRange,
        config: PrepConfig,
    ) -> Batch {
        Batch {
            data_root: data_root.as_ref().to_path_buf(),
            cameras_path: cameras_path.as_ref().to_path_buf(),
            range,
            config,
        }
    }

    pub fn layout(&self, offset: u32) -> ProjectLayout {
        ProjectLayout::new(&self.data_root, offset)
    }

    /// Reads the source cameras, resets the frame project and writes it.
    ///
    /// The sparse model is read before anything on disk is touched.
    pub fn prepare_frame(&self, offset: u32) -> Result<ProjectLayout> {
        let records = load_camera_records(&self.cameras_path)?;
        let layout = self.layout(offset);
        layout.reset()?;
        write_frame_project(&layout, &records, self.config.camera_model)?;
        Ok(layout)
    }

    /// First pass. Stops at the first frame that fails.
    pub fn prepare_all(&self) -> Result<usize> {
        log::info!(
            "preparing frames [{}, {}) under {}",
            self.range.start,
            self.range.end,
            self.data_root.display()
        );
        let pb = ProgressBar::new(self.range.frame_count() as u64);
        for offset in self.range.offsets() {
            self.prepare_frame(offset)?;
            pb.inc(1);
        }
        pb.finish();
        Ok(self.range.frame_count())
    }

    /// Second pass. The first failing frame aborts the remaining ones.
    pub fn reconstruct_all<T: ReconstructionTool>(&self, tool: &mut T) -> Result<usize> {
        for offset in self.range.offsets() {
            reconstruct_frame(&self.layout(offset), tool, &self.config.image_extension)?;
        }
        Ok(self.range.frame_count())
    }

    pub fn run<T: ReconstructionTool>(&self, tool: &mut T) -> Result<BatchSummary> {
        let frames_prepared = self.prepare_all()?;
        let frames_reconstructed = self.reconstruct_all(tool)?;
        Ok(BatchSummary {
            frames_prepared,
            frames_reconstructed,
        })
    }
}
