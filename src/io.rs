use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::camera_model::OutputCameraModel;
use crate::error::{IoContext, Result};

/// Serializes an object to a JSON file.
pub fn object_to_json<T: Serialize>(output_path: impl AsRef<Path>, object: &T) -> Result<()> {
    let j = serde_json::to_string_pretty(object)?;
    std::fs::write(output_path.as_ref(), j).with_path(output_path)
}

/// Deserializes an object from a JSON file.
pub fn object_from_json<T: DeserializeOwned>(file_path: impl AsRef<Path>) -> Result<T> {
    let contents = std::fs::read_to_string(file_path.as_ref()).with_path(file_path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Settings shared by every frame of a run. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepConfig {
    /// `colmap` executable
    pub colmap: PathBuf,
    /// Passed to the triangulator as `--Mapper.ba_global_function_tolerance`.
    pub ba_global_function_tolerance: f64,
    pub camera_model: OutputCameraModel,
    /// Extension of the frame images copied into `input/`.
    pub image_extension: String,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            colmap: PathBuf::from("colmap"),
            ba_global_function_tolerance: 1e-6,
            camera_model: OutputCameraModel::Pinhole,
            image_extension: "png".to_string(),
        }
    }
}

/// Summary written next to the frames after a run.
#[derive(Debug, Serialize, Deserialize)]
pub struct PrepReport {
    pub timestamp: String,
    pub start_frame: u32,
    pub end_frame: u32,
    pub camera_model: OutputCameraModel,
    pub frames_prepared: usize,
    pub frames_reconstructed: usize,
}

/// Local time in RFC 3339, UTC when the local offset is unknown.
pub fn timestamp_now() -> String {
    let now = time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc());
    now.format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}

pub fn write_report(output_path: impl AsRef<Path>, report: &PrepReport) -> Result<()> {
    object_to_json(output_path, report)
}
