//! Sprite store: the component table specialized to draw attributes.

use crate::sprite::{Size, Sprite};
use crate::vertex::WHITE;
use glam::Vec2;
use tessel_core::ecs::{ComponentTable, Entity, TableError, TableRow};

/// Draw attributes of one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteComp {
    entity: Entity,
    sprite: Option<Sprite>,
    scale: f32,
    color: u32,
    width: f32,
    height: f32,
    gravity: Vec2,
    z_order: i16,
    batch_id: u16,
    batch_overridden: bool,
}

impl Default for SpriteComp {
    fn default() -> Self {
        Self {
            entity: Entity::NULL,
            sprite: None,
            scale: 1.0,
            color: 0,
            width: 0.0,
            height: 0.0,
            gravity: Vec2::ZERO,
            z_order: 0,
            batch_id: 0,
            batch_overridden: false,
        }
    }
}

impl TableRow for SpriteComp {
    fn entity(&self) -> Entity {
        self.entity
    }

    fn with_entity(entity: Entity) -> Self {
        Self {
            entity,
            color: WHITE,
            gravity: Vec2::new(0.5, 0.5),
            ..Self::default()
        }
    }
}

impl SpriteComp {
    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn sprite(&self) -> Option<&Sprite> {
        self.sprite.as_ref()
    }

    /// Assign the visual reference.
    ///
    /// Width and height are taken from the sprite when still unset, and
    /// the batch key follows the sprite's texture unless it was set with
    /// [`set_batch_id`](Self::set_batch_id).
    pub fn set_sprite(&mut self, sprite: impl Into<Sprite>) -> &mut Self {
        let sprite = sprite.into();
        if self.width == 0.0 || self.height == 0.0 {
            let Size { width, height } = sprite.size();
            self.width = width;
            self.height = height;
        }
        if !self.batch_overridden {
            self.batch_id = sprite.tex().raw();
        }
        self.sprite = Some(sprite);
        self
    }

    pub fn batch_id(&self) -> u16 {
        self.batch_id
    }

    pub fn set_batch_id(&mut self, batch_id: u16) -> &mut Self {
        self.batch_id = batch_id;
        self.batch_overridden = true;
        self
    }

    pub fn z_order(&self) -> i16 {
        self.z_order
    }

    pub fn set_z_order(&mut self, z_order: i16) -> &mut Self {
        self.z_order = z_order;
        self
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn set_size(&mut self, width: f32, height: f32) -> &mut Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    /// Anchor inside the unit square; (0.5, 0.5) is the center.
    pub fn set_gravity(&mut self, x: f32, y: f32) -> &mut Self {
        self.gravity = Vec2::new(x, y);
        self
    }

    pub fn color(&self) -> u32 {
        self.color
    }

    pub fn set_color(&mut self, rgba: u32) -> &mut Self {
        self.color = rgba;
        self
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f32) -> &mut Self {
        self.scale = scale;
        self
    }
}

/// Sprite records for every entity that has one.
#[derive(Default)]
pub struct SpriteTable {
    rows: ComponentTable<SpriteComp>,
}

impl SpriteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_step(step: usize) -> Self {
        Self {
            rows: ComponentTable::with_step(step),
        }
    }

    pub fn new_comp(&mut self, entity: Entity) -> &mut SpriteComp {
        self.rows.new_comp(entity)
    }

    /// Create (or fetch) the record and configure it in one call.
    pub fn new_comp_x(
        &mut self,
        entity: Entity,
        sprite: impl Into<Sprite>,
        z_order: i16,
    ) -> &mut SpriteComp {
        let comp = self.rows.new_comp(entity);
        comp.set_sprite(sprite).set_z_order(z_order);
        comp
    }

    pub fn comp(&self, entity: Entity) -> Option<&SpriteComp> {
        self.rows.comp(entity)
    }

    pub fn comp_mut(&mut self, entity: Entity) -> Option<&mut SpriteComp> {
        self.rows.comp_mut(entity)
    }

    pub fn alive(&self, entity: Entity) -> bool {
        self.rows.alive(entity)
    }

    pub fn delete(&mut self, entity: Entity) -> bool {
        self.rows.delete(entity)
    }

    pub fn destroy(&mut self) {
        self.rows.destroy();
    }

    pub fn size(&self) -> (usize, usize) {
        self.rows.size()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SpriteComp> {
        self.rows.iter()
    }

    /// Live records, densely packed.
    pub fn as_slice(&self) -> &[SpriteComp] {
        self.rows.as_slice()
    }

    pub fn check_invariants(&self) -> Result<(), TableError> {
        self.rows.check_invariants()
    }
}
