//! Per-frame reconstruction driver.
//!
//! A frame moves through a fixed sequence of states; the first external stage
//! returning a non-zero status ends the frame in [`PipelineState::Failed`].

pub mod staging;
pub mod tool;

use std::fmt;

use crate::error::{IoContext, PrepError, Result};
use crate::scaffold::ProjectLayout;

pub use staging::{check_staged_images, stage_images};
pub use tool::{ColmapCli, ReconstructionTool};

/// External stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extract,
    Match,
    Triangulate,
    Undistort,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Extract => "feature extraction",
            Stage::Match => "exhaustive matching",
            Stage::Triangulate => "point triangulation",
            Stage::Undistort => "image undistortion",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Extracting,
    Matching,
    Triangulating,
    Undistorting,
    Cleaning,
    Reorganizing,
    Done,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }
}

/// Reconstruction of one prepared frame project.
pub struct FrameReconstruction<'a, T: ReconstructionTool> {
    layout: &'a ProjectLayout,
    tool: &'a mut T,
    state: PipelineState,
}

impl<'a, T: ReconstructionTool> FrameReconstruction<'a, T> {
    /// Stages the frame images and creates the working directories.
    ///
    /// The database and `manual/` files must already be written.
    pub fn prepare(layout: &'a ProjectLayout, tool: &'a mut T, image_ext: &str) -> Result<Self> {
        stage_images(layout, image_ext)?;
        check_staged_images(layout)?;
        for dir in [layout.tmp_dir(), layout.distorted_sparse_dir()] {
            std::fs::create_dir_all(&dir).with_path(&dir)?;
        }
        Ok(FrameReconstruction {
            layout,
            tool,
            state: PipelineState::Extracting,
        })
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    fn check(&mut self, stage: Stage, code: i32) -> Result<()> {
        if code == 0 {
            return Ok(());
        }
        self.state = PipelineState::Failed;
        Err(PrepError::StageFailed {
            frame: self.layout.offset,
            stage,
            code,
        })
    }

    /// Runs the action of the current state and moves to the next one.
    pub fn step(&mut self) -> Result<PipelineState> {
        let l = self.layout;
        if !self.state.is_terminal() {
            log::info!("frame {:04}: {:?}", l.offset, self.state);
        }
        let next = match self.state {
            PipelineState::Extracting => {
                let code = self
                    .tool
                    .extract_features(&l.database_path(), &l.input_dir());
                self.run_stage(Stage::Extract, code)?;
                PipelineState::Matching
            }
            PipelineState::Matching => {
                let code = self.tool.match_features(&l.database_path());
                self.run_stage(Stage::Match, code)?;
                PipelineState::Triangulating
            }
            PipelineState::Triangulating => {
                let code = self.tool.triangulate(
                    &l.database_path(),
                    &l.input_dir(),
                    &l.manual_dir(),
                    &l.distorted_sparse_dir(),
                );
                self.run_stage(Stage::Triangulate, code)?;
                PipelineState::Undistorting
            }
            PipelineState::Undistorting => {
                let code =
                    self.tool
                        .undistort(&l.input_dir(), &l.distorted_sparse_dir(), l.frame_dir());
                self.run_stage(Stage::Undistort, code)?;
                PipelineState::Cleaning
            }
            PipelineState::Cleaning => {
                let input = l.input_dir();
                self.guard(std::fs::remove_dir_all(&input).with_path(&input))?;
                PipelineState::Reorganizing
            }
            PipelineState::Reorganizing => {
                self.guard(reorganize_sparse(l))?;
                PipelineState::Done
            }
            terminal => terminal,
        };
        log::debug!("frame {:04}: {:?} -> {:?}", l.offset, self.state, next);
        self.state = next;
        Ok(next)
    }

    fn run_stage(&mut self, stage: Stage, code: Result<i32>) -> Result<()> {
        let code = self.guard(code)?;
        self.check(stage, code)
    }

    fn guard<V>(&mut self, r: Result<V>) -> Result<V> {
        if r.is_err() {
            self.state = PipelineState::Failed;
        }
        r
    }

    /// Steps until the frame is done or a stage fails.
    pub fn run(mut self) -> Result<()> {
        while !self.state.is_terminal() {
            self.step()?;
        }
        Ok(())
    }
}

/// Moves everything the undistorter left in `sparse/` into `sparse/0/`.
pub fn reorganize_sparse(layout: &ProjectLayout) -> Result<()> {
    let sparse = layout.sparse_dir();
    let entries = std::fs::read_dir(&sparse)
        .with_path(&sparse)?
        .collect::<std::io::Result<Vec<_>>>()
        .with_path(&sparse)?;
    let target = layout.sparse_model_dir();
    std::fs::create_dir_all(&target).with_path(&target)?;
    for entry in entries {
        if entry.file_name() == "0" {
            continue;
        }
        let dst = target.join(entry.file_name());
        std::fs::rename(entry.path(), &dst).with_path(&dst)?;
    }
    Ok(())
}

/// Stages and reconstructs one frame project.
pub fn reconstruct_frame<T: ReconstructionTool>(
    layout: &ProjectLayout,
    tool: &mut T,
    image_ext: &str,
) -> Result<()> {
    log::info!("frame {:04}: reconstructing {}", layout.offset, layout.frame_dir().display());
    FrameReconstruction::prepare(layout, tool, image_ext)?.run()
}
