mod common;

use approx::assert_relative_eq;
use colmap_frame_prep::PrepError;
use colmap_frame_prep::camera_model::{CameraModelId, OutputCameraModel};
use colmap_frame_prep::database::ReconstructionDatabase;
use colmap_frame_prep::scaffold::ProjectLayout;
use colmap_frame_prep::sparse::{read_cameras_txt, read_images_txt};
use colmap_frame_prep::writer::{
    camera_line, discard_partial_database, image_line, write_frame_project,
};
use common::{record, rig};

fn prepared_layout(root: &std::path::Path, offset: u32) -> ProjectLayout {
    let layout = ProjectLayout::new(root, offset);
    layout.reset().unwrap();
    layout
}

#[test]
fn test_single_camera_lines() {
    let r = record(1, "cam01.png");
    assert_eq!(
        camera_line(&r, OutputCameraModel::Pinhole),
        "1 PINHOLE 1920 1080 1600 1600 960 540\n"
    );
    assert_eq!(image_line(&r), "1 1 0 0 0 0 0 0 1 cam01.png\n\n");
}

#[test]
fn test_single_camera_files() {
    let dir = tempfile::tempdir().unwrap();
    let layout = prepared_layout(dir.path(), 0);
    write_frame_project(&layout, &[record(1, "cam01.png")], OutputCameraModel::Pinhole).unwrap();

    let manual = layout.manual_dir();
    assert_eq!(
        std::fs::read_to_string(manual.join("cameras.txt")).unwrap(),
        "1 PINHOLE 1920 1080 1600 1600 960 540\n"
    );
    assert_eq!(
        std::fs::read_to_string(manual.join("images.txt")).unwrap(),
        "1 1 0 0 0 0 0 0 1 cam01.png\n\n"
    );
    assert_eq!(std::fs::read_to_string(manual.join("points3D.txt")).unwrap(), "");
}

#[test]
fn test_database_matches_text_files() {
    let dir = tempfile::tempdir().unwrap();
    let layout = prepared_layout(dir.path(), 3);
    let records = rig(5);
    write_frame_project(&layout, &records, OutputCameraModel::Pinhole).unwrap();

    let db = ReconstructionDatabase::open(layout.database_path()).unwrap();
    let cameras = db.cameras().unwrap();
    let images = db.images().unwrap();
    let camera_lines = read_cameras_txt(layout.manual_dir().join("cameras.txt")).unwrap();

    assert_eq!(cameras.len(), records.len());
    assert_eq!(camera_lines.len(), records.len());
    assert_eq!(images.len(), records.len());

    for (image, r) in images.iter().zip(&records) {
        // explicit ids, not auto-assigned
        assert_eq!(image.image_id, r.id);
        assert_eq!(image.name, r.filename);
        assert_eq!(image.prior_q, r.qvec());
        assert_eq!(image.prior_t, r.tvec());
        let camera = cameras
            .iter()
            .find(|c| c.camera_id == image.camera_id)
            .expect("image references a missing camera");
        assert_eq!(camera.model, CameraModelId::Pinhole);
        assert_eq!((camera.width, camera.height), (r.width, r.height));
        assert_eq!(camera.params, r.pinhole_params().to_vec());
    }
}

#[test]
fn test_text_files_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let layout = prepared_layout(dir.path(), 0);
    let records = rig(4);
    write_frame_project(&layout, &records, OutputCameraModel::Pinhole).unwrap();

    let images = read_images_txt(layout.manual_dir().join("images.txt")).unwrap();
    let cameras = read_cameras_txt(layout.manual_dir().join("cameras.txt")).unwrap();
    assert_eq!(images.len(), records.len());

    for ((image, camera), r) in images.iter().zip(&cameras).zip(&records) {
        assert_eq!(image.image_id, r.id);
        assert_eq!(image.camera_id, r.id);
        assert_eq!(camera.camera_id, r.id);
        assert_eq!(image.name, r.filename);
        for (a, b) in image.qvec.iter().zip(r.qvec()) {
            assert_relative_eq!(*a, b, epsilon = 1e-12);
        }
        for (a, b) in image.tvec.iter().zip(r.tvec()) {
            assert_relative_eq!(*a, b, epsilon = 1e-12);
        }
        for (a, b) in camera.params.iter().zip(r.pinhole_params()) {
            assert_relative_eq!(*a, b, epsilon = 1e-12);
        }
    }
}

#[test]
fn test_rewrite_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let records = rig(3);

    let layout = prepared_layout(dir.path(), 7);
    write_frame_project(&layout, &records, OutputCameraModel::Pinhole).unwrap();
    let manual = layout.manual_dir();
    let first: Vec<Vec<u8>> = ["images.txt", "cameras.txt", "points3D.txt"]
        .iter()
        .map(|f| std::fs::read(manual.join(f)).unwrap())
        .collect();
    let first_images = ReconstructionDatabase::open(layout.database_path())
        .unwrap()
        .images()
        .unwrap();

    let layout = prepared_layout(dir.path(), 7);
    write_frame_project(&layout, &records, OutputCameraModel::Pinhole).unwrap();
    let second: Vec<Vec<u8>> = ["images.txt", "cameras.txt", "points3D.txt"]
        .iter()
        .map(|f| std::fs::read(manual.join(f)).unwrap())
        .collect();
    let db = ReconstructionDatabase::open(layout.database_path()).unwrap();

    assert_eq!(first, second);
    assert_eq!(db.images().unwrap(), first_images);
    assert_eq!(db.cameras().unwrap().len(), records.len());
}

#[test]
fn test_invalid_record_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let layout = prepared_layout(dir.path(), 0);
    let mut records = rig(3);
    records[2].fy = f64::NAN;

    let err = write_frame_project(&layout, &records, OutputCameraModel::Pinhole).unwrap_err();
    assert!(matches!(err, PrepError::InvalidRecord { id: 3, .. }));
    assert!(!layout.database_path().exists());
    assert!(!layout.manual_dir().join("images.txt").exists());
    assert!(!layout.manual_dir().join("cameras.txt").exists());
}

#[test]
fn test_rejects_bad_filenames_and_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let layout = prepared_layout(dir.path(), 0);

    let empty = vec![record(1, "")];
    assert!(write_frame_project(&layout, &empty, OutputCameraModel::Pinhole).is_err());

    let dup_id = vec![record(1, "a.png"), record(1, "b.png")];
    assert!(matches!(
        write_frame_project(&layout, &dup_id, OutputCameraModel::Pinhole),
        Err(PrepError::InvalidRecord { id: 1, .. })
    ));

    let dup_name = vec![record(1, "a.png"), record(2, "a.png")];
    assert!(matches!(
        write_frame_project(&layout, &dup_name, OutputCameraModel::Pinhole),
        Err(PrepError::InvalidRecord { id: 2, .. })
    ));
    assert!(!layout.database_path().exists());
}

#[test]
fn test_off_center_principal_point_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let layout = prepared_layout(dir.path(), 0);
    let mut r = record(1, "cam01.png");
    r.cx = 100.0;
    r.cy = 1000.0;
    write_frame_project(&layout, &[r], OutputCameraModel::Pinhole).unwrap();
}

#[test]
fn test_opencv_model_keeps_distortion() {
    let mut r = record(4, "cam04.png");
    r.intrinsics = vec![1600.0, 1590.0, 960.0, 540.0, 0.1, -0.05, 0.001, 0.002];
    assert_eq!(
        camera_line(&r, OutputCameraModel::OpenCv),
        "4 OPENCV 1920 1080 1600 1590 960 540 0.1 -0.05 0.001 0.002\n"
    );

    // a pinhole-only source gets zero distortion
    let p = record(5, "cam05.png");
    assert_eq!(
        camera_line(&p, OutputCameraModel::OpenCv),
        "5 OPENCV 1920 1080 1600 1600 960 540 0 0 0 0\n"
    );

    let dir = tempfile::tempdir().unwrap();
    let layout = prepared_layout(dir.path(), 0);
    write_frame_project(&layout, &[r.clone()], OutputCameraModel::OpenCv).unwrap();
    let db = ReconstructionDatabase::open(layout.database_path()).unwrap();
    let cameras = db.cameras().unwrap();
    assert_eq!(cameras[0].model, CameraModelId::OpenCV);
    assert_eq!(cameras[0].params, r.intrinsics);
}

#[test]
fn test_discard_partial_database() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("input.db");
    std::fs::write(&db, "partial").unwrap();
    assert!(discard_partial_database(&db));
    assert!(!db.exists());

    // already gone: reported, not raised
    assert!(!discard_partial_database(&db));
    // a directory cannot be removed as a file
    let blocked = dir.path().join("blocked.db");
    std::fs::create_dir(&blocked).unwrap();
    assert!(!discard_partial_database(&blocked));
    assert!(blocked.is_dir());
}
