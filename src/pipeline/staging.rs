use glob::glob;

use crate::database::ReconstructionDatabase;
use crate::error::{IoContext, PrepError, Result};
use crate::scaffold::ProjectLayout;

/// Copies `<frame>/*.<ext>` into `<frame>/input/`, keeping files already there.
///
/// Returns the number of copied images.
pub fn stage_images(layout: &ProjectLayout, ext: &str) -> Result<usize> {
    let input = layout.input_dir();
    std::fs::create_dir_all(&input).with_path(&input)?;

    let pattern = format!(
        "{}/*.{}",
        glob::Pattern::escape(&layout.frame_dir().to_string_lossy()),
        ext
    );
    let mut sources = Vec::new();
    for entry in glob(&pattern)? {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            PrepError::io(path, e.into_error())
        })?;
        if path.is_file() {
            sources.push(path);
        }
    }
    sources.sort();

    let mut copied = 0;
    for source in sources {
        let Some(name) = source.file_name() else {
            continue;
        };
        let target = input.join(name);
        if target.exists() {
            log::warn!("{} already exists, skipping", target.display());
            continue;
        }
        std::fs::copy(&source, &target).with_path(&target)?;
        copied += 1;
    }
    log::debug!("frame {:04}: staged {} images", layout.offset, copied);
    Ok(copied)
}

/// Every image registered in the database must be present in `input/`.
pub fn check_staged_images(layout: &ProjectLayout) -> Result<()> {
    let db_path = layout.database_path();
    if !db_path.is_file() {
        return Err(PrepError::io(
            &db_path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "database not written"),
        ));
    }
    let db = ReconstructionDatabase::open(&db_path)?;
    let input = layout.input_dir();
    for image in db.images()? {
        let p = input.join(&image.name);
        if !p.is_file() {
            return Err(PrepError::MissingImage(p));
        }
    }
    db.close()
}
