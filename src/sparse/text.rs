use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use super::{SparseCamera, SparseImage};
use crate::camera_model::CameraModelId;
use crate::error::{IoContext, PrepError, Result};

fn parse_part<T: std::str::FromStr>(s: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    s.parse::<T>()
        .map_err(|e| PrepError::Sparse(format!("{}: {}", s, e)))
}

fn read_data_lines(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).with_path(path)?;
    let lines = BufReader::new(file)
        .lines()
        .collect::<std::io::Result<Vec<_>>>()
        .with_path(path)?;
    Ok(lines
        .into_iter()
        .filter(|l| !l.trim_start().starts_with('#'))
        .collect())
}

/// Reads `cameras.txt`.
pub fn read_cameras_txt(path: impl AsRef<Path>) -> Result<Vec<SparseCamera>> {
    read_data_lines(path.as_ref())?
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| parse_camera_line(l))
        .collect()
}

/// Reads `images.txt`, where every image spans two lines (pose, then 2-D points).
///
/// Blank lines between blocks are skipped; the last points line may be missing.
pub fn read_images_txt(path: impl AsRef<Path>) -> Result<Vec<SparseImage>> {
    let lines = read_data_lines(path.as_ref())?;
    let mut lines = lines.iter();
    let mut images = Vec::new();
    while let Some(pose) = lines.next() {
        if pose.trim().is_empty() {
            continue;
        }
        images.push(parse_image_line(pose)?);
        // points line, unused
        lines.next();
    }
    Ok(images)
}

/// CAMERA_ID, MODEL, WIDTH, HEIGHT, PARAMS[]
fn parse_camera_line(line: &str) -> Result<SparseCamera> {
    let parts = line.split_whitespace().collect::<Vec<_>>();
    if parts.len() < 5 {
        return Err(PrepError::Sparse(format!(
            "Invalid number of parts: {}",
            parts.len()
        )));
    }
    let model = CameraModelId::from_name(parts[1])
        .ok_or_else(|| PrepError::Sparse(format!("Invalid camera model: {}", parts[1])))?;
    let params = parts[4..]
        .iter()
        .map(|s| parse_part(s))
        .collect::<Result<Vec<f64>>>()?;
    if params.len() != model.num_params() {
        return Err(PrepError::Sparse(format!(
            "{} expects {} parameters, got {}",
            model.name(),
            model.num_params(),
            params.len()
        )));
    }
    Ok(SparseCamera {
        camera_id: parse_part(parts[0])?,
        model,
        width: parse_part(parts[2])?,
        height: parse_part(parts[3])?,
        params,
    })
}

/// IMAGE_ID, QW, QX, QY, QZ, TX, TY, TZ, CAMERA_ID, NAME
fn parse_image_line(line: &str) -> Result<SparseImage> {
    let parts = line.split_whitespace().collect::<Vec<_>>();
    if parts.len() < 10 {
        return Err(PrepError::Sparse(format!(
            "Invalid number of parts: {}",
            parts.len()
        )));
    }
    let mut qvec = [0.0; 4];
    for (q, s) in qvec.iter_mut().zip(&parts[1..5]) {
        *q = parse_part(s)?;
    }
    let mut tvec = [0.0; 3];
    for (t, s) in tvec.iter_mut().zip(&parts[5..8]) {
        *t = parse_part(s)?;
    }
    Ok(SparseImage {
        image_id: parse_part(parts[0])?,
        camera_id: parse_part(parts[8])?,
        name: parts[9..].join(" "),
        qvec,
        tvec,
    })
}
