use nalgebra as na;

/// One camera of a frame: prior pose and intrinsics, normalised to a pinhole view.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraRecord {
    pub id: u32,
    pub filename: String,
    pub width: u64,
    pub height: u64,
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
    /// Full parameter vector of the source camera model.
    pub intrinsics: Vec<f64>,
    /// World-to-camera rotation, stored as given (not renormalised).
    pub rotation: na::Quaternion<f64>,
    pub translation: na::Vector3<f64>,
}

impl CameraRecord {
    /// Rotation as `[qw, qx, qy, qz]`.
    pub fn qvec(&self) -> [f64; 4] {
        [
            self.rotation.w,
            self.rotation.i,
            self.rotation.j,
            self.rotation.k,
        ]
    }

    pub fn tvec(&self) -> [f64; 3] {
        [self.translation.x, self.translation.y, self.translation.z]
    }

    /// Pinhole parameters `[fx, fy, cx, cy]`.
    pub fn pinhole_params(&self) -> [f64; 4] {
        [self.fx, self.fy, self.cx, self.cy]
    }

    /// Checks the record can be written to both the database and the text files.
    ///
    /// The principal point is deliberately not required to be near the image centre.
    pub fn validate(&self) -> Result<(), String> {
        let name = self.filename.trim();
        if name.is_empty() {
            return Err("empty filename".to_string());
        }
        if name != self.filename || self.filename.contains(['\n', '\r']) {
            return Err(format!("filename {:?} has surrounding whitespace", self.filename));
        }
        if self.width == 0 || self.height == 0 {
            return Err(format!("zero image size {}x{}", self.width, self.height));
        }
        let named = [
            ("fx", self.fx),
            ("fy", self.fy),
            ("cx", self.cx),
            ("cy", self.cy),
        ];
        if let Some((n, v)) = named.iter().find(|(_, v)| !v.is_finite()) {
            return Err(format!("{} is not finite ({})", n, v));
        }
        if self.intrinsics.iter().any(|v| !v.is_finite()) {
            return Err("intrinsic parameters are not finite".to_string());
        }
        if self.qvec().iter().chain(self.tvec().iter()).any(|v| !v.is_finite()) {
            return Err("pose is not finite".to_string());
        }
        Ok(())
    }
}
