use serde::{Deserialize, Serialize};

/// COLMAP camera model ids, as stored in `cameras.bin` and the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraModelId {
    SimplePinhole = 0,
    Pinhole = 1,
    SimpleRadial = 2,
    Radial = 3,
    OpenCV = 4,
    OpenCVFisheye = 5,
    FullOpenCV = 6,
    FOV = 7,
    SimpleRadialFisheye = 8,
    RadialFisheye = 9,
    ThinPrismFisheye = 10,
}

impl CameraModelId {
    pub const ALL: [CameraModelId; 11] = [
        CameraModelId::SimplePinhole,
        CameraModelId::Pinhole,
        CameraModelId::SimpleRadial,
        CameraModelId::Radial,
        CameraModelId::OpenCV,
        CameraModelId::OpenCVFisheye,
        CameraModelId::FullOpenCV,
        CameraModelId::FOV,
        CameraModelId::SimpleRadialFisheye,
        CameraModelId::RadialFisheye,
        CameraModelId::ThinPrismFisheye,
    ];

    pub fn from_id(id: i32) -> Option<CameraModelId> {
        Self::ALL.iter().copied().find(|m| *m as i32 == id)
    }

    pub fn from_name(name: &str) -> Option<CameraModelId> {
        Self::ALL.iter().copied().find(|m| m.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            CameraModelId::SimplePinhole => "SIMPLE_PINHOLE",
            CameraModelId::Pinhole => "PINHOLE",
            CameraModelId::SimpleRadial => "SIMPLE_RADIAL",
            CameraModelId::Radial => "RADIAL",
            CameraModelId::OpenCV => "OPENCV",
            CameraModelId::OpenCVFisheye => "OPENCV_FISHEYE",
            CameraModelId::FullOpenCV => "FULL_OPENCV",
            CameraModelId::FOV => "FOV",
            CameraModelId::SimpleRadialFisheye => "SIMPLE_RADIAL_FISHEYE",
            CameraModelId::RadialFisheye => "RADIAL_FISHEYE",
            CameraModelId::ThinPrismFisheye => "THIN_PRISM_FISHEYE",
        }
    }

    pub fn num_params(&self) -> usize {
        match self {
            CameraModelId::SimplePinhole => 3,
            CameraModelId::Pinhole => 4,
            CameraModelId::SimpleRadial => 4,
            CameraModelId::Radial => 5,
            CameraModelId::OpenCV => 8,
            CameraModelId::OpenCVFisheye => 8,
            CameraModelId::FullOpenCV => 12,
            CameraModelId::FOV => 5,
            CameraModelId::SimpleRadialFisheye => 4,
            CameraModelId::RadialFisheye => 5,
            CameraModelId::ThinPrismFisheye => 12,
        }
    }

    /// Models sharing one focal length between both axes.
    pub fn has_single_focal(&self) -> bool {
        matches!(
            self,
            CameraModelId::SimplePinhole
                | CameraModelId::SimpleRadial
                | CameraModelId::Radial
                | CameraModelId::SimpleRadialFisheye
                | CameraModelId::RadialFisheye
        )
    }

    /// Extracts `(fx, fy, cx, cy)` from a parameter vector of this model.
    pub fn focal_and_principal(&self, params: &[f64]) -> Option<(f64, f64, f64, f64)> {
        if params.len() != self.num_params() {
            return None;
        }
        if self.has_single_focal() {
            Some((params[0], params[0], params[1], params[2]))
        } else {
            Some((params[0], params[1], params[2], params[3]))
        }
    }
}

/// Camera model written to the frame projects.
///
/// Only `Pinhole` is used by default; `OpenCv` keeps the source distortion
/// terms and can be selected from the JSON config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputCameraModel {
    #[default]
    Pinhole,
    OpenCv,
}

impl OutputCameraModel {
    pub fn model_id(&self) -> CameraModelId {
        match self {
            OutputCameraModel::Pinhole => CameraModelId::Pinhole,
            OutputCameraModel::OpenCv => CameraModelId::OpenCV,
        }
    }
}
