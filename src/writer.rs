//! Writes a frame's camera records as `manual/*.txt` and `input.db`.
//!
//! Both outputs are generated from the same record slice in one call and are
//! never patched on their own.

use std::collections::HashSet;
use std::path::Path;

use crate::camera_model::OutputCameraModel;
use crate::database::{NewImage, ReconstructionDatabase};
use crate::error::{IoContext, PrepError, Result};
use crate::scaffold::ProjectLayout;
use crate::types::CameraRecord;

/// Parameters written for `record` under `model`.
pub fn model_params(record: &CameraRecord, model: OutputCameraModel) -> Vec<f64> {
    match model {
        OutputCameraModel::Pinhole => record.pinhole_params().to_vec(),
        OutputCameraModel::OpenCv => {
            let n = model.model_id().num_params();
            if record.intrinsics.len() == n {
                record.intrinsics.clone()
            } else {
                let mut p = record.pinhole_params().to_vec();
                p.resize(n, 0.0);
                p
            }
        }
    }
}

/// `images.txt` block: pose line followed by an empty observation line.
pub fn image_line(record: &CameraRecord) -> String {
    let [qw, qx, qy, qz] = record.qvec();
    let [tx, ty, tz] = record.tvec();
    format!(
        "{} {} {} {} {} {} {} {} {} {}\n\n",
        record.id, qw, qx, qy, qz, tx, ty, tz, record.id, record.filename
    )
}

pub fn camera_line(record: &CameraRecord, model: OutputCameraModel) -> String {
    let params = model_params(record, model)
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "{} {} {} {} {}\n",
        record.id,
        model.model_id().name(),
        record.width,
        record.height,
        params
    )
}

/// Rejects the whole set if any record cannot be written.
pub fn validate_records(records: &[CameraRecord]) -> Result<()> {
    let mut ids = HashSet::new();
    let mut names = HashSet::new();
    for r in records {
        r.validate().map_err(|reason| PrepError::InvalidRecord { id: r.id, reason })?;
        if r.id >= i32::MAX as u32 {
            return Err(PrepError::InvalidRecord {
                id: r.id,
                reason: "id does not fit the database".to_string(),
            });
        }
        if !ids.insert(r.id) {
            return Err(PrepError::InvalidRecord {
                id: r.id,
                reason: "duplicate id".to_string(),
            });
        }
        if !names.insert(r.filename.as_str()) {
            return Err(PrepError::InvalidRecord {
                id: r.id,
                reason: format!("duplicate filename {}", r.filename),
            });
        }
    }
    Ok(())
}

fn fill_database(
    db: &mut ReconstructionDatabase,
    records: &[CameraRecord],
    model: OutputCameraModel,
) -> Result<()> {
    for r in records {
        let image = NewImage {
            image_id: r.id,
            name: &r.filename,
            prior_q: r.qvec(),
            prior_t: r.tvec(),
        };
        let camera_id = db.add_camera_with_image(
            model.model_id(),
            r.width,
            r.height,
            &model_params(r, model),
            &image,
        )?;
        log::trace!("image {} {} -> camera {}", r.id, r.filename, camera_id);
    }
    Ok(())
}

/// Removes a half-filled database. A failed removal is logged, the insert
/// error stays the one reported.
pub fn discard_partial_database(db_path: &Path) -> bool {
    match std::fs::remove_file(db_path) {
        Ok(()) => true,
        Err(e) => {
            log::warn!(
                "could not remove partial database {}: {}",
                db_path.display(),
                e
            );
            false
        }
    }
}

/// Writes `manual/images.txt`, `manual/cameras.txt`, an empty
/// `manual/points3D.txt` and a fresh `input.db` for one frame.
///
/// `manual/` must exist, see [`ProjectLayout::reset`].
pub fn write_frame_project(
    layout: &ProjectLayout,
    records: &[CameraRecord],
    model: OutputCameraModel,
) -> Result<()> {
    validate_records(records)?;

    let mut images_txt = String::new();
    let mut cameras_txt = String::new();
    for r in records {
        images_txt += &image_line(r);
        cameras_txt += &camera_line(r, model);
    }

    let db_path = layout.database_path();
    let mut db = ReconstructionDatabase::create(&db_path)?;
    if let Err(e) = fill_database(&mut db, records, model) {
        drop(db);
        discard_partial_database(&db_path);
        return Err(e);
    }
    db.close()?;

    let manual = layout.manual_dir();
    for (name, contents) in [
        ("images.txt", images_txt.as_str()),
        ("cameras.txt", cameras_txt.as_str()),
        ("points3D.txt", ""),
    ] {
        let p = manual.join(name);
        std::fs::write(&p, contents).with_path(&p)?;
    }
    log::info!(
        "frame {:04}: wrote {} cameras to {}",
        layout.offset,
        records.len(),
        db_path.display()
    );
    Ok(())
}
