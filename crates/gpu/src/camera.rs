use foundation::GeoCoordinate;
use foundation::math::{CameraRelative, Vec3, mercator_from_geo, mercator_m_per_px};

/// Vertical field of view shared with the 2D map projection (~36.87°).
pub const MAP_FOV_Y_RAD: f64 = 0.643_501_108_793_284_4;

/// Column-major 4x4 matrix, ready for upload.
pub type Mat4 = [[f32; 4]; 4];

/// Perspective camera in world space (mercator meters, z up).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera3D {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_rad: f64,
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
    /// Map zoom the camera was derived from; pixel-sized models scale with it.
    pub zoom: f64,
}

/// The slice of a 2D map view a 3D camera is derived from.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MapCameraView {
    pub center: GeoCoordinate,
    pub zoom: f64,
    pub pitch_deg: f64,
    pub bearing_deg: f64,
    pub viewport_px: (u32, u32),
}

impl Camera3D {
    pub fn look_at(position: Vec3, target: Vec3, fov_y_rad: f64, near: f64, far: f64) -> Self {
        Self {
            position,
            target,
            up: Vec3::new(0.0, 0.0, 1.0),
            fov_y_rad,
            aspect: 1.0,
            near,
            far,
            zoom: 0.0,
        }
    }

    /// Camera that sees exactly what the 2D map shows: looking at the map
    /// center, tilted by `pitch`, rotated by `bearing`, and far enough back
    /// that one CSS pixel at the center covers `mercator_m_per_px(zoom)`.
    pub fn from_map_view(view: MapCameraView) -> Self {
        let (w, h) = view.viewport_px;
        let height_px = f64::from(h.max(1));
        let aspect = (f64::from(w.max(1)) / height_px).max(1e-6);

        let center = mercator_from_geo(view.center);
        let target = Vec3::new(center.x, center.y, 0.0);

        let distance_px = 0.5 * height_px / (0.5 * MAP_FOV_Y_RAD).tan();
        let distance = distance_px * mercator_m_per_px(view.zoom);

        let pitch = view.pitch_deg.to_radians();
        let bearing = view.bearing_deg.to_radians();
        // Horizontal direction the camera faces (clockwise from north).
        let forward = Vec3::new(bearing.sin(), bearing.cos(), 0.0);

        let position = target - forward.scale(distance * pitch.sin())
            + Vec3::new(0.0, 0.0, distance * pitch.cos());
        // At zero pitch the view axis is vertical; "up" on screen is forward.
        let up = if pitch.abs() < 1e-9 {
            forward
        } else {
            Vec3::new(0.0, 0.0, 1.0)
        };

        let near = (distance * 0.01).max(0.01);
        let far = (distance * 100.0).max(near + 1.0);

        Self {
            position,
            target,
            up,
            fov_y_rad: MAP_FOV_Y_RAD,
            aspect,
            near,
            far,
            zoom: view.zoom,
        }
    }

    pub fn distance(&self) -> f64 {
        (self.position - self.target).length()
    }

    /// Origin for camera-relative draw positions.
    pub fn relative(&self) -> CameraRelative {
        CameraRelative::new(self.target)
    }

    /// View-projection with the camera target as origin, so positions must
    /// be expressed through [`Camera3D::relative`].
    pub fn view_proj(&self) -> Mat4 {
        let eye = self.position - self.target;
        let view = mat4_look_at_rh(eye, Vec3::ZERO, self.up);
        let proj = mat4_perspective_rh_z0(self.fov_y_rad, self.aspect, self.near, self.far);
        mat4_mul(proj, view)
    }
}

fn mat4_mul(a: Mat4, b: Mat4) -> Mat4 {
    let mut c = [[0.0f32; 4]; 4];
    for col in 0..4 {
        for row in 0..4 {
            c[col][row] = a[0][row] * b[col][0]
                + a[1][row] * b[col][1]
                + a[2][row] * b[col][2]
                + a[3][row] * b[col][3];
        }
    }
    c
}

fn mat4_perspective_rh_z0(fov_y_rad: f64, aspect: f64, near: f64, far: f64) -> Mat4 {
    let f = 1.0 / (0.5 * fov_y_rad).tan();
    let m00 = (f / aspect) as f32;
    let m11 = f as f32;
    let m22 = (far / (near - far)) as f32;
    let m23 = ((near * far) / (near - far)) as f32;

    // RH, depth range [0, 1].
    [
        [m00, 0.0, 0.0, 0.0],
        [0.0, m11, 0.0, 0.0],
        [0.0, 0.0, m22, -1.0],
        [0.0, 0.0, m23, 0.0],
    ]
}

fn mat4_look_at_rh(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    let f = (target - eye).normalize();
    let s = f.cross(up).normalize();
    let u = s.cross(f);

    let ex = -s.dot(eye);
    let ey = -u.dot(eye);
    let ez = f.dot(eye);

    [
        [s.x as f32, u.x as f32, (-f.x) as f32, 0.0],
        [s.y as f32, u.y as f32, (-f.y) as f32, 0.0],
        [s.z as f32, u.z as f32, (-f.z) as f32, 0.0],
        [ex as f32, ey as f32, ez as f32, 1.0],
    ]
}

#[cfg(test)]
mod tests {
    use super::{Camera3D, MapCameraView};
    use foundation::GeoCoordinate;
    use foundation::math::{mercator_from_geo, mercator_m_per_px};

    fn view(pitch_deg: f64, bearing_deg: f64) -> MapCameraView {
        MapCameraView {
            center: GeoCoordinate::new(90.4125, 23.8103).unwrap(),
            zoom: 18.0,
            pitch_deg,
            bearing_deg,
            viewport_px: (500, 500),
        }
    }

    #[test]
    fn camera_targets_the_map_center() {
        let camera = Camera3D::from_map_view(view(60.0, 0.0));
        let center = mercator_from_geo(view(0.0, 0.0).center);
        assert_eq!(camera.target.x, center.x);
        assert_eq!(camera.target.y, center.y);
        assert_eq!(camera.zoom, 18.0);
        assert_eq!(camera.aspect, 1.0);
    }

    #[test]
    fn top_down_distance_matches_pixel_scale() {
        let camera = Camera3D::from_map_view(view(0.0, 0.0));
        // Half the viewport height spans half the fov.
        let half_height_m = 250.0 * mercator_m_per_px(18.0);
        let expected = half_height_m / (0.5 * camera.fov_y_rad).tan();
        assert!((camera.distance() - expected).abs() < 1e-6);
        assert!((camera.position.x - camera.target.x).abs() < 1e-9);
    }

    #[test]
    fn pitched_camera_sits_behind_the_bearing() {
        let north = Camera3D::from_map_view(view(60.0, 0.0));
        assert!(north.position.y < north.target.y);
        assert!(north.position.z > 0.0);

        let east = Camera3D::from_map_view(view(60.0, 90.0));
        assert!(east.position.x < east.target.x);
        assert!((east.distance() - north.distance()).abs() < 1e-6);
    }

    #[test]
    fn view_proj_is_finite() {
        for (pitch, bearing) in [(0.0, 0.0), (60.0, 45.0), (85.0, 300.0)] {
            let m = Camera3D::from_map_view(view(pitch, bearing)).view_proj();
            assert!(m.iter().flatten().all(|v| v.is_finite()));
        }
    }
}
