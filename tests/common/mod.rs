#![allow(dead_code)]

use colmap_frame_prep::pipeline::{ReconstructionTool, Stage};
use colmap_frame_prep::types::CameraRecord;
use nalgebra as na;
use std::path::{Path, PathBuf};

pub fn record(id: u32, filename: &str) -> CameraRecord {
    CameraRecord {
        id,
        filename: filename.to_string(),
        width: 1920,
        height: 1080,
        fx: 1600.0,
        fy: 1600.0,
        cx: 960.0,
        cy: 540.0,
        intrinsics: vec![1600.0, 960.0, 540.0],
        rotation: na::Quaternion::new(1.0, 0.0, 0.0, 0.0),
        translation: na::Vector3::zeros(),
    }
}

pub fn rig(n: u32) -> Vec<CameraRecord> {
    (1..=n)
        .map(|i| {
            let mut r = record(i, &format!("cam{:02}.png", i));
            r.fx = 1500.0 + i as f64 * 10.5;
            r.fy = 1501.25 + i as f64;
            r.cx = 955.5 + i as f64 * 0.125;
            r.cy = 541.75;
            r.rotation = na::Quaternion::new(0.9, 0.1 * i as f64, -0.2, 0.3);
            r.translation = na::Vector3::new(i as f64 * 0.37, -1.5, 2.0 / 3.0);
            r
        })
        .collect()
}

/// Writes the same empty png placeholder for every record into `dir`.
pub fn touch_images(dir: &Path, records: &[CameraRecord]) {
    std::fs::create_dir_all(dir).unwrap();
    for r in records {
        std::fs::write(dir.join(&r.filename), b"png").unwrap();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub frame: String,
    pub stage: Stage,
}

/// Records every stage call and imitates the undistorter's output layout.
#[derive(Default)]
pub struct FakeTool {
    pub calls: Vec<Call>,
    /// (frame, stage, status) forced on the matching call
    pub fail: Option<(String, Stage, i32)>,
    /// paths checked on every call
    pub watch: Vec<PathBuf>,
    pub watch_ok: Vec<bool>,
}

impl FakeTool {
    pub fn failing(frame: &str, stage: Stage, code: i32) -> FakeTool {
        FakeTool {
            fail: Some((frame.to_string(), stage, code)),
            ..Default::default()
        }
    }

    fn record(&mut self, frame_dir: &Path, stage: Stage) -> i32 {
        let frame = frame_dir
            .file_name()
            .unwrap()
            .to_string_lossy()
            .to_string();
        self.watch_ok.push(self.watch.iter().all(|p| p.exists()));
        self.calls.push(Call {
            frame: frame.clone(),
            stage,
        });
        match &self.fail {
            Some((f, s, code)) if *f == frame && *s == stage => *code,
            _ => 0,
        }
    }

    pub fn stages(&self) -> Vec<Stage> {
        self.calls.iter().map(|c| c.stage).collect()
    }

    pub fn frames(&self) -> Vec<String> {
        let mut frames: Vec<String> = Vec::new();
        for c in &self.calls {
            if frames.last() != Some(&c.frame) {
                frames.push(c.frame.clone());
            }
        }
        frames
    }
}

impl ReconstructionTool for FakeTool {
    fn extract_features(
        &mut self,
        database: &Path,
        _image_dir: &Path,
    ) -> colmap_frame_prep::Result<i32> {
        Ok(self.record(database.parent().unwrap(), Stage::Extract))
    }

    fn match_features(&mut self, database: &Path) -> colmap_frame_prep::Result<i32> {
        Ok(self.record(database.parent().unwrap(), Stage::Match))
    }

    fn triangulate(
        &mut self,
        database: &Path,
        _image_dir: &Path,
        manual_dir: &Path,
        output_dir: &Path,
    ) -> colmap_frame_prep::Result<i32> {
        assert!(manual_dir.join("images.txt").is_file());
        assert!(output_dir.is_dir());
        Ok(self.record(database.parent().unwrap(), Stage::Triangulate))
    }

    fn undistort(
        &mut self,
        image_dir: &Path,
        _sparse_dir: &Path,
        output_dir: &Path,
    ) -> colmap_frame_prep::Result<i32> {
        let code = self.record(output_dir, Stage::Undistort);
        if code == 0 {
            let sparse = output_dir.join("sparse");
            std::fs::create_dir_all(&sparse).unwrap();
            for f in ["cameras.bin", "images.bin", "points3D.bin"] {
                std::fs::write(sparse.join(f), b"model").unwrap();
            }
            let images = output_dir.join("images");
            std::fs::create_dir_all(&images).unwrap();
            for entry in std::fs::read_dir(image_dir).unwrap() {
                let entry = entry.unwrap();
                std::fs::copy(entry.path(), images.join(entry.file_name())).unwrap();
            }
        }
        Ok(code)
    }
}
