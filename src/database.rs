//! The COLMAP SQLite database (`input.db`) of a frame project.

use std::path::Path;

use rusqlite::types::Type;
use rusqlite::{params, Connection};

use crate::camera_model::CameraModelId;
use crate::error::{IoContext, PrepError, Result};

const CREATE_TABLES: &str = "
CREATE TABLE IF NOT EXISTS cameras (
    camera_id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    model INTEGER NOT NULL,
    width INTEGER NOT NULL,
    height INTEGER NOT NULL,
    params BLOB,
    prior_focal_length INTEGER NOT NULL);
CREATE TABLE IF NOT EXISTS images (
    image_id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    name TEXT NOT NULL UNIQUE,
    camera_id INTEGER NOT NULL,
    prior_qw REAL,
    prior_qx REAL,
    prior_qy REAL,
    prior_qz REAL,
    prior_tx REAL,
    prior_ty REAL,
    prior_tz REAL,
    CONSTRAINT image_id_check CHECK(image_id >= 0 and image_id < 2147483647),
    FOREIGN KEY(camera_id) REFERENCES cameras(camera_id));
CREATE TABLE IF NOT EXISTS keypoints (
    image_id INTEGER PRIMARY KEY NOT NULL,
    rows INTEGER NOT NULL,
    cols INTEGER NOT NULL,
    data BLOB,
    FOREIGN KEY(image_id) REFERENCES images(image_id) ON DELETE CASCADE);
CREATE TABLE IF NOT EXISTS descriptors (
    image_id INTEGER PRIMARY KEY NOT NULL,
    rows INTEGER NOT NULL,
    cols INTEGER NOT NULL,
    data BLOB,
    FOREIGN KEY(image_id) REFERENCES images(image_id) ON DELETE CASCADE);
CREATE TABLE IF NOT EXISTS matches (
    pair_id INTEGER PRIMARY KEY NOT NULL,
    rows INTEGER NOT NULL,
    cols INTEGER NOT NULL,
    data BLOB);
CREATE TABLE IF NOT EXISTS two_view_geometries (
    pair_id INTEGER PRIMARY KEY NOT NULL,
    rows INTEGER NOT NULL,
    cols INTEGER NOT NULL,
    data BLOB,
    config INTEGER NOT NULL,
    F BLOB,
    E BLOB,
    H BLOB,
    qvec BLOB,
    tvec BLOB);
CREATE UNIQUE INDEX IF NOT EXISTS index_name ON images(name);
";

/// A row of the `cameras` table.
#[derive(Debug, Clone, PartialEq)]
pub struct DbCamera {
    pub camera_id: u32,
    pub model: CameraModelId,
    pub width: u64,
    pub height: u64,
    pub params: Vec<f64>,
}

/// A row of the `images` table.
#[derive(Debug, Clone, PartialEq)]
pub struct DbImage {
    pub image_id: u32,
    pub name: String,
    pub camera_id: u32,
    pub prior_q: [f64; 4],
    pub prior_t: [f64; 3],
}

/// An image to insert; its camera is created alongside it.
#[derive(Debug, Clone, PartialEq)]
pub struct NewImage<'a> {
    pub image_id: u32,
    pub name: &'a str,
    pub prior_q: [f64; 4],
    pub prior_t: [f64; 3],
}

/// Camera parameters are stored as packed little-endian f64.
fn params_to_blob(params: &[f64]) -> Vec<u8> {
    params.iter().flat_map(|p| p.to_le_bytes()).collect()
}

fn blob_to_params(blob: &[u8]) -> Vec<f64> {
    blob.chunks_exact(8)
        .map(|c| {
            let mut b = [0u8; 8];
            b.copy_from_slice(c);
            f64::from_le_bytes(b)
        })
        .collect()
}

pub struct ReconstructionDatabase {
    conn: Connection,
}

impl ReconstructionDatabase {
    /// Creates a fresh database, removing any file already at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            std::fs::remove_file(path).with_path(path)?;
        }
        let db = Self::open(path)?;
        db.conn.execute_batch(CREATE_TABLES)?;
        Ok(db)
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(ReconstructionDatabase { conn })
    }

    /// Inserts one camera and its image in a single committed transaction.
    ///
    /// The image keeps the caller's id; the camera id is assigned by the database.
    /// Returns the camera id.
    pub fn add_camera_with_image(
        &mut self,
        model: CameraModelId,
        width: u64,
        height: u64,
        params: &[f64],
        image: &NewImage,
    ) -> Result<u32> {
        let transaction = self.conn.transaction()?;
        transaction.execute(
            "INSERT INTO cameras VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                Option::<i64>::None,
                model as i32,
                width as i64,
                height as i64,
                params_to_blob(params),
                false,
            ],
        )?;
        let camera_id = u32::try_from(transaction.last_insert_rowid())
            .map_err(|_| PrepError::InvalidRecord {
                id: image.image_id,
                reason: "camera id out of range".to_string(),
            })?;
        let [qw, qx, qy, qz] = image.prior_q;
        let [tx, ty, tz] = image.prior_t;
        transaction.execute(
            "INSERT INTO images VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                image.image_id,
                image.name,
                camera_id,
                qw,
                qx,
                qy,
                qz,
                tx,
                ty,
                tz
            ],
        )?;
        transaction.commit()?;
        Ok(camera_id)
    }

    pub fn cameras(&self) -> Result<Vec<DbCamera>> {
        let mut stmt = self
            .conn
            .prepare("SELECT camera_id, model, width, height, params FROM cameras ORDER BY camera_id")?;
        let rows = stmt.query_map([], |row| {
            let model_id = row.get::<_, i32>(1)?;
            let model = CameraModelId::from_id(model_id).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    1,
                    Type::Integer,
                    format!("unknown camera model id {}", model_id).into(),
                )
            })?;
            Ok(DbCamera {
                camera_id: row.get(0)?,
                model,
                width: row.get::<_, i64>(2)? as u64,
                height: row.get::<_, i64>(3)? as u64,
                params: blob_to_params(&row.get::<_, Vec<u8>>(4)?),
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn images(&self) -> Result<Vec<DbImage>> {
        let mut stmt = self.conn.prepare(
            "SELECT image_id, name, camera_id, prior_qw, prior_qx, prior_qy, prior_qz,
                    prior_tx, prior_ty, prior_tz
             FROM images ORDER BY image_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(DbImage {
                image_id: row.get(0)?,
                name: row.get(1)?,
                camera_id: row.get(2)?,
                prior_q: [row.get(3)?, row.get(4)?, row.get(5)?, row.get(6)?],
                prior_t: [row.get(7)?, row.get(8)?, row.get(9)?],
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Closes the connection, reporting errors from the final flush.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| PrepError::Database(e))
    }
}
