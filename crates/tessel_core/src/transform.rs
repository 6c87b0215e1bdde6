//! World transforms
//!
//! Stored in the same dense table type as every other component. The
//! render layer only reads them through [`TransformProvider`].

use crate::ecs::{ComponentTable, Entity, TableRow};
use glam::Vec2;

/// Scale / rotation / translation in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Srt {
    pub position: Vec2,
    /// Radians, counter-clockwise.
    pub rotation: f32,
    pub scale: Vec2,
}

impl Default for Srt {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
        }
    }
}

/// Transform component.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform {
    entity: Entity,
    pub world: Srt,
}

impl Transform {
    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn set_position(&mut self, x: f32, y: f32) -> &mut Self {
        self.world.position = Vec2::new(x, y);
        self
    }

    pub fn move_by(&mut self, dx: f32, dy: f32) -> &mut Self {
        self.world.position += Vec2::new(dx, dy);
        self
    }

    pub fn set_rotation(&mut self, radians: f32) -> &mut Self {
        self.world.rotation = radians;
        self
    }

    pub fn set_scale(&mut self, sx: f32, sy: f32) -> &mut Self {
        self.world.scale = Vec2::new(sx, sy);
        self
    }
}

impl TableRow for Transform {
    fn entity(&self) -> Entity {
        self.entity
    }

    fn with_entity(entity: Entity) -> Self {
        Self {
            entity,
            world: Srt::default(),
        }
    }
}

pub type TransformTable = ComponentTable<Transform>;

/// Read access to resolved world transforms.
pub trait TransformProvider {
    fn transform(&self, entity: Entity) -> Option<&Transform>;
}

impl TransformProvider for ComponentTable<Transform> {
    fn transform(&self, entity: Entity) -> Option<&Transform> {
        self.comp(entity)
    }
}
