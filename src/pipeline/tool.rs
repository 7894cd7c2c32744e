use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{PrepError, Result};

/// The external reconstruction capabilities a frame needs.
///
/// Each call blocks until the stage finishes and returns its exit status;
/// `Err` is reserved for stages that could not be started at all.
pub trait ReconstructionTool {
    fn extract_features(&mut self, database: &Path, image_dir: &Path) -> Result<i32>;

    fn match_features(&mut self, database: &Path) -> Result<i32>;

    /// Triangulates points against the fixed poses in `manual_dir`.
    fn triangulate(
        &mut self,
        database: &Path,
        image_dir: &Path,
        manual_dir: &Path,
        output_dir: &Path,
    ) -> Result<i32>;

    fn undistort(&mut self, image_dir: &Path, sparse_dir: &Path, output_dir: &Path)
    -> Result<i32>;
}

/// Runs the stages through the `colmap` command line.
#[derive(Debug, Clone)]
pub struct ColmapCli {
    pub program: PathBuf,
    pub ba_global_function_tolerance: f64,
}

impl ColmapCli {
    pub fn new(program: impl Into<PathBuf>, ba_global_function_tolerance: f64) -> ColmapCli {
        ColmapCli {
            program: program.into(),
            ba_global_function_tolerance,
        }
    }

    fn command(&self, subcommand: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(subcommand);
        cmd
    }

    fn status(&self, mut cmd: Command) -> Result<i32> {
        log::debug!("running {:?}", cmd);
        let status = cmd.status().map_err(|source| PrepError::ToolLaunch {
            program: self.program.display().to_string(),
            source,
        })?;
        // killed by a signal
        Ok(status.code().unwrap_or(1))
    }
}

impl ReconstructionTool for ColmapCli {
    fn extract_features(&mut self, database: &Path, image_dir: &Path) -> Result<i32> {
        let mut cmd = self.command("feature_extractor");
        cmd.arg("--database_path")
            .arg(database)
            .arg("--image_path")
            .arg(image_dir);
        self.status(cmd)
    }

    fn match_features(&mut self, database: &Path) -> Result<i32> {
        let mut cmd = self.command("exhaustive_matcher");
        cmd.arg("--database_path").arg(database);
        self.status(cmd)
    }

    fn triangulate(
        &mut self,
        database: &Path,
        image_dir: &Path,
        manual_dir: &Path,
        output_dir: &Path,
    ) -> Result<i32> {
        let mut cmd = self.command("point_triangulator");
        cmd.arg("--database_path")
            .arg(database)
            .arg("--image_path")
            .arg(image_dir)
            .arg("--output_path")
            .arg(output_dir)
            .arg("--input_path")
            .arg(manual_dir)
            .arg(format!(
                "--Mapper.ba_global_function_tolerance={}",
                self.ba_global_function_tolerance
            ));
        self.status(cmd)
    }

    fn undistort(
        &mut self,
        image_dir: &Path,
        sparse_dir: &Path,
        output_dir: &Path,
    ) -> Result<i32> {
        let mut cmd = self.command("image_undistorter");
        cmd.arg("--image_path")
            .arg(image_dir)
            .arg("--input_path")
            .arg(sparse_dir)
            .arg("--output_path")
            .arg(output_dir)
            .arg("--output_type")
            .arg("COLMAP");
        self.status(cmd)
    }
}
