//! Perspective camera and screen-space picking rays.

use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::CameraConfig;

/// Output surface size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }

    /// Converts a pixel coordinate (origin top-left) to normalized device
    /// coordinates in `[-1, 1]`, y up.
    pub fn to_ndc(&self, px: f32, py: f32) -> Vec2 {
        Vec2::new(
            (px / self.width) * 2.0 - 1.0,
            -(py / self.height) * 2.0 + 1.0,
        )
    }
}

/// A half-line in world space with a unit direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickRay {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl PickRay {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    pub viewport: Viewport,
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default(), Viewport::default())
    }
}

impl Camera {
    pub fn from_config(config: &CameraConfig, viewport: Viewport) -> Self {
        Self {
            position: Vec3::from_array(config.position),
            target: Vec3::from_array(config.look_at),
            up: Vec3::Y,
            fov_y: config.fov_y,
            near: config.near,
            far: config.far,
            viewport,
        }
    }

    pub fn look_at(&mut self, position: Vec3, target: Vec3) {
        self.position = position;
        self.target = target;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(
            self.fov_y.to_radians(),
            self.viewport.aspect(),
            self.near,
            self.far,
        )
    }

    /// Unprojects an NDC point into a world-space ray from the camera.
    pub fn ray_from_ndc(&self, ndc: Vec2) -> PickRay {
        let inverse = (self.projection_matrix() * self.view_matrix()).inverse();
        let point = inverse.project_point3(Vec3::new(ndc.x, ndc.y, 0.5));
        PickRay::new(self.position, point - self.position)
    }
}
