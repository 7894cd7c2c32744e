//! Reader for an existing sparse reconstruction (`sparse/0` of a COLMAP project).
//!
//! Produces the normalised [`CameraRecord`] set the frame projects are built from.

pub mod binary;
pub mod text;

use std::collections::HashMap;
use std::path::Path;

use nalgebra as na;

use crate::camera_model::CameraModelId;
use crate::error::{PrepError, Result};
use crate::types::CameraRecord;

pub use binary::{read_cameras_bin, read_images_bin};
pub use text::{read_cameras_txt, read_images_txt};

/// A camera entry of the source model.
#[derive(Debug, Clone)]
pub struct SparseCamera {
    pub camera_id: u32,
    pub model: CameraModelId,
    pub width: u64,
    pub height: u64,
    pub params: Vec<f64>,
}

/// An image entry of the source model.
#[derive(Debug, Clone)]
pub struct SparseImage {
    pub image_id: u32,
    pub camera_id: u32,
    pub name: String,
    /// qw, qx, qy, qz
    pub qvec: [f64; 4],
    pub tvec: [f64; 3],
}

/// Loads the camera records of `<cameras_path>/sparse/0`.
///
/// The binary files are preferred; the text pair is used when they cannot be read.
pub fn load_camera_records(cameras_path: impl AsRef<Path>) -> Result<Vec<CameraRecord>> {
    let sparse_dir = cameras_path.as_ref().join("sparse").join("0");

    let binary = read_images_bin(sparse_dir.join("images.bin")).and_then(|images| {
        read_cameras_bin(sparse_dir.join("cameras.bin")).map(|cameras| (images, cameras))
    });
    let (images, cameras) = match binary {
        Ok(v) => v,
        Err(e) => {
            log::debug!("binary sparse model unavailable ({}), reading text files", e);
            let images = read_images_txt(sparse_dir.join("images.txt"))?;
            let cameras = read_cameras_txt(sparse_dir.join("cameras.txt"))?;
            (images, cameras)
        }
    };
    to_camera_records(&images, &cameras)
}

/// Joins images with their cameras, sorted by image id.
pub fn to_camera_records(
    images: &[SparseImage],
    cameras: &[SparseCamera],
) -> Result<Vec<CameraRecord>> {
    let by_id: HashMap<u32, &SparseCamera> = cameras.iter().map(|c| (c.camera_id, c)).collect();

    let mut records = images
        .iter()
        .map(|image| -> Result<CameraRecord> {
            let camera = by_id.get(&image.camera_id).ok_or_else(|| {
                PrepError::Sparse(format!(
                    "image {} references unknown camera {}",
                    image.image_id, image.camera_id
                ))
            })?;
            let (fx, fy, cx, cy) = camera
                .model
                .focal_and_principal(&camera.params)
                .ok_or_else(|| {
                    PrepError::Sparse(format!(
                        "camera {} has {} parameters for {}",
                        camera.camera_id,
                        camera.params.len(),
                        camera.model.name()
                    ))
                })?;
            let [qw, qx, qy, qz] = image.qvec;
            Ok(CameraRecord {
                id: image.image_id,
                filename: image.name.clone(),
                width: camera.width,
                height: camera.height,
                fx,
                fy,
                cx,
                cy,
                intrinsics: camera.params.clone(),
                rotation: na::Quaternion::new(qw, qx, qy, qz),
                translation: na::Vector3::from(image.tvec),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    records.sort_by_key(|r| r.id);
    Ok(records)
}
