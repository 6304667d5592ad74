//! Render-side scene: visual objects, their materials, and the renderer seam.
//!
//! The core never draws. It keeps a [`SceneGraph`] of [`Visual`]s whose
//! transforms mirror the physics world, and hands the graph to a
//! [`Renderer`] once per frame.

use std::collections::BTreeMap;

use glam::Vec3;
use rapier3d::na::{Point3, Vector3};
use rapier3d::parry::query::{Ray, RayCast};
use rapier3d::parry::shape::{Ball, Cuboid};
use serde::{Deserialize, Serialize};

use crate::camera::{Camera, PickRay};
use crate::transform::{EulerAngles, Pose, to_na_vector};

/// Handle to a visual in a [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VisualHandle(pub u32);

/// RGBA color representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Builds an opaque color from a `0xRRGGBB` literal.
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_hex(hex: u32) -> Self {
        Self::rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    pub const fn to_hex(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// `#rrggbb` form, as used by status text.
    pub fn to_css(self) -> String {
        format!("#{:06x}", self.to_hex())
    }

    pub const BLACK: Color = Color::rgb(0, 0, 0);
}

/// Surface appearance of a visual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Material {
    pub color: Color,
    /// Added glow; black when the object is not highlighted.
    pub emissive: Color,
}

impl Material {
    pub const fn solid(color: Color) -> Self {
        Self {
            color,
            emissive: Color::BLACK,
        }
    }
}

/// Renderable geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VisualShape {
    Box { half_extents: Vec3 },
    Sphere { radius: f32 },
}

/// A renderable object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visual {
    pub shape: VisualShape,
    pub position: Vec3,
    pub rotation: EulerAngles,
    pub material: Material,
}

impl Visual {
    pub fn new(shape: VisualShape, position: Vec3, material: Material) -> Self {
        Self {
            shape,
            position,
            rotation: EulerAngles::ZERO,
            material,
        }
    }

    pub fn pose(&self) -> Pose {
        Pose::from_euler(self.position, self.rotation)
    }

    /// Distance along `ray` to this object's surface, if it is hit within
    /// `max_distance`.
    pub fn cast_ray(&self, ray: &PickRay, max_distance: f32) -> Option<f32> {
        let isometry = self.pose().to_isometry();
        let parry_ray = Ray::new(
            Point3::new(ray.origin.x, ray.origin.y, ray.origin.z),
            to_na_vector(ray.direction),
        );
        match self.shape {
            VisualShape::Box { half_extents } => Cuboid::new(Vector3::new(
                half_extents.x,
                half_extents.y,
                half_extents.z,
            ))
            .cast_ray(&isometry, &parry_ray, max_distance, true),
            VisualShape::Sphere { radius } => {
                Ball::new(radius).cast_ray(&isometry, &parry_ray, max_distance, true)
            }
        }
    }
}

/// The set of visuals currently shown.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    visuals: BTreeMap<VisualHandle, Visual>,
    next_id: u32,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_to_scene(&mut self, visual: Visual) -> VisualHandle {
        let handle = VisualHandle(self.next_id);
        self.next_id += 1;
        self.visuals.insert(handle, visual);
        handle
    }

    pub fn remove_from_scene(&mut self, handle: VisualHandle) -> Option<Visual> {
        self.visuals.remove(&handle)
    }

    pub fn get(&self, handle: VisualHandle) -> Option<&Visual> {
        self.visuals.get(&handle)
    }

    pub fn get_mut(&mut self, handle: VisualHandle) -> Option<&mut Visual> {
        self.visuals.get_mut(&handle)
    }

    pub fn contains(&self, handle: VisualHandle) -> bool {
        self.visuals.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.visuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visuals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VisualHandle, &Visual)> {
        self.visuals.iter().map(|(handle, visual)| (*handle, visual))
    }

    pub fn clear(&mut self) {
        self.visuals.clear();
    }
}

/// Presentation layer seam.
pub trait Renderer {
    fn render(&mut self, scene: &SceneGraph, camera: &Camera);

    /// Frees any presentation resources. Called once when the scene stops.
    fn release(&mut self);
}

/// Renderer that only counts frames. Used by the runner and tests.
#[derive(Debug, Clone, Default)]
pub struct HeadlessRenderer {
    pub frames: u64,
    pub last_visual_count: usize,
    pub released: bool,
}

impl Renderer for HeadlessRenderer {
    fn render(&mut self, scene: &SceneGraph, _camera: &Camera) {
        self.frames += 1;
        self.last_visual_count = scene.len();
    }

    fn release(&mut self) {
        tracing::debug!("[scene] headless renderer released after {} frames", self.frames);
        self.released = true;
    }
}
