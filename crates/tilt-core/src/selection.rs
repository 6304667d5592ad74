//! Pointer picking over the level's interactive platforms.

use glam::Vec2;

use crate::camera::{Camera, PickRay};
use crate::entity::PhysicsEntity;
use crate::scene::{Color, SceneGraph};

/// Emissive tint applied to the selected entity.
pub const HIGHLIGHT_EMISSIVE: Color = Color::from_hex(0x222222);

/// Rays stop testing past this distance.
const MAX_PICK_DISTANCE: f32 = 1000.0;

/// Holds the pickable entities and which one, if any, is selected.
#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    selectable: Vec<PhysicsEntity>,
    selected: Option<usize>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entity for picking. Registering twice has no effect.
    pub fn add_selectable(&mut self, entity: PhysicsEntity) {
        if !self.selectable.contains(&entity) {
            self.selectable.push(entity);
        }
    }

    pub fn selectable(&self) -> &[PhysicsEntity] {
        &self.selectable
    }

    /// Index into [`selectable`](Self::selectable) of the current selection.
    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected(&self) -> Option<&PhysicsEntity> {
        self.selected.and_then(|i| self.selectable.get(i))
    }

    /// Nearest registered entity hit by `ray`, with its distance.
    pub fn pick(&self, ray: &PickRay, scene: &SceneGraph) -> Option<(usize, f32)> {
        self.selectable
            .iter()
            .enumerate()
            .filter_map(|(index, entity)| {
                let visual = scene.get(entity.visual)?;
                visual
                    .cast_ray(ray, MAX_PICK_DISTANCE)
                    .map(|toi| (index, toi))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Selects whatever `ray` hits first, or clears the selection on a miss.
    /// Returns `true` if the selection changed.
    pub fn select_with_ray(&mut self, ray: &PickRay, scene: &mut SceneGraph) -> bool {
        let hit = self.pick(ray, scene).map(|(index, _)| index);
        tracing::debug!("[selection] pick ray {:?} -> {hit:?}", ray.direction);
        self.set_selected(hit, scene)
    }

    /// Handles a pointer press at `ndc` seen through `camera`.
    pub fn on_pointer_down(&mut self, ndc: Vec2, camera: &Camera, scene: &mut SceneGraph) -> bool {
        let ray = camera.ray_from_ndc(ndc);
        self.select_with_ray(&ray, scene)
    }

    fn set_selected(&mut self, index: Option<usize>, scene: &mut SceneGraph) -> bool {
        if index == self.selected {
            return false;
        }
        self.set_highlight(self.selected, Color::BLACK, scene);
        self.set_highlight(index, HIGHLIGHT_EMISSIVE, scene);
        self.selected = index;
        true
    }

    fn set_highlight(&self, index: Option<usize>, emissive: Color, scene: &mut SceneGraph) {
        let Some(entity) = index.and_then(|i| self.selectable.get(i)) else {
            return;
        };
        if let Some(visual) = scene.get_mut(entity.visual) {
            visual.material.emissive = emissive;
        }
    }

    /// Drops every registered entity and the selection with them.
    pub fn clear(&mut self, scene: &mut SceneGraph) {
        self.set_selected(None, scene);
        self.selectable.clear();
    }
}
