use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::Path,
};

use super::{SparseCamera, SparseImage};
use crate::camera_model::CameraModelId;
use crate::error::{IoContext, PrepError, Result};

fn read_u64<R: Read>(r: &mut R) -> std::io::Result<u64> {
    let mut b = [0u8; 8];
    r.read_exact(&mut b)?;
    Ok(u64::from_le_bytes(b))
}

fn read_i32<R: Read>(r: &mut R) -> std::io::Result<i32> {
    let mut b = [0u8; 4];
    r.read_exact(&mut b)?;
    Ok(i32::from_le_bytes(b))
}

fn read_f64<R: Read>(r: &mut R) -> std::io::Result<f64> {
    let mut b = [0u8; 8];
    r.read_exact(&mut b)?;
    Ok(f64::from_le_bytes(b))
}

fn read_id<R: Read>(r: &mut R, what: &str) -> Result<u32> {
    let id = read_i32(r).map_err(|e| PrepError::Sparse(format!("{}: {}", what, e)))?;
    u32::try_from(id).map_err(|_| PrepError::Sparse(format!("negative {} {}", what, id)))
}

fn truncated(path: &Path) -> impl Fn(std::io::Error) -> PrepError + '_ {
    move |e| PrepError::Sparse(format!("{} is truncated: {}", path.display(), e))
}

/// Reads `cameras.bin`.
///
/// Layout (little-endian): `u64` count, then per camera `i32` id, `i32` model,
/// `u64` width, `u64` height and the model's `f64` parameters.
pub fn read_cameras_bin(path: impl AsRef<Path>) -> Result<Vec<SparseCamera>> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path).with_path(path)?);
    let eof = truncated(path);

    let num_cameras = read_u64(&mut reader).map_err(&eof)?;
    let mut cameras = Vec::new();
    for _ in 0..num_cameras {
        let camera_id = read_id(&mut reader, "camera id")?;
        let raw_model = read_i32(&mut reader).map_err(&eof)?;
        let model = CameraModelId::from_id(raw_model)
            .ok_or_else(|| PrepError::Sparse(format!("unknown camera model id {}", raw_model)))?;
        let width = read_u64(&mut reader).map_err(&eof)?;
        let height = read_u64(&mut reader).map_err(&eof)?;
        let params = (0..model.num_params())
            .map(|_| read_f64(&mut reader))
            .collect::<std::io::Result<Vec<_>>>()
            .map_err(&eof)?;
        cameras.push(SparseCamera {
            camera_id,
            model,
            width,
            height,
            params,
        });
    }
    Ok(cameras)
}

/// Reads `images.bin`, skipping the 2-D observations.
pub fn read_images_bin(path: impl AsRef<Path>) -> Result<Vec<SparseImage>> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path).with_path(path)?);
    let eof = truncated(path);

    let num_images = read_u64(&mut reader).map_err(&eof)?;
    let mut images = Vec::new();
    for _ in 0..num_images {
        let image_id = read_id(&mut reader, "image id")?;
        let mut qvec = [0.0; 4];
        for q in qvec.iter_mut() {
            *q = read_f64(&mut reader).map_err(&eof)?;
        }
        let mut tvec = [0.0; 3];
        for t in tvec.iter_mut() {
            *t = read_f64(&mut reader).map_err(&eof)?;
        }
        let camera_id = read_id(&mut reader, "camera id")?;

        let mut name = Vec::new();
        reader.read_until(0, &mut name).map_err(&eof)?;
        if name.pop() != Some(0) {
            return Err(PrepError::Sparse(format!(
                "{}: unterminated image name",
                path.display()
            )));
        }
        let name = String::from_utf8(name)
            .map_err(|e| PrepError::Sparse(format!("image name is not utf-8: {}", e)))?;

        // x, y, point3D id per observation
        let num_points2d = read_u64(&mut reader).map_err(&eof)?;
        let skip = num_points2d
            .checked_mul(24)
            .ok_or_else(|| PrepError::Sparse("observation count overflow".to_string()))?;
        let skipped = std::io::copy(&mut (&mut reader).take(skip), &mut std::io::sink())
            .map_err(&eof)?;
        if skipped != skip {
            return Err(PrepError::Sparse(format!(
                "{}: truncated observations for image {}",
                path.display(),
                image_id
            )));
        }

        images.push(SparseImage {
            image_id,
            camera_id,
            name,
            qvec,
            tvec,
        });
    }
    Ok(images)
}
