//! Texture atlases
//!
//! An atlas is one texture plus an ordered list of named sub-regions.
//! Items can be looked up by name or by insertion index (grid atlases
//! are usually addressed by index).

use crate::sprite::{SubTexture, Texture};
use std::collections::HashMap;

pub struct Atlas {
    name: String,
    texture: Texture,
    items: Vec<SubTexture>,
    names: HashMap<String, usize>,
}

impl Atlas {
    pub fn new(name: impl Into<String>, texture: Texture, capacity: usize) -> Self {
        Self {
            name: name.into(),
            texture,
            items: Vec::with_capacity(capacity),
            names: HashMap::with_capacity(capacity),
        }
    }

    /// Atlas of `rows × cols` equal cells, numbered row-major from the top-left.
    pub fn indexed(
        name: impl Into<String>,
        texture: Texture,
        cell_width: f32,
        cell_height: f32,
        rows: usize,
        cols: usize,
    ) -> Self {
        let mut atlas = Self::new(name, texture, rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                atlas.add_item(
                    col as f32 * cell_width,
                    row as f32 * cell_height,
                    cell_width,
                    cell_height,
                    "",
                );
            }
        }
        atlas
    }

    /// Append a pixel rectangle. An empty `name` leaves the item index-only.
    /// Returns the item's index.
    pub fn add_item(&mut self, x: f32, y: f32, w: f32, h: f32, name: &str) -> usize {
        let index = self.items.len();
        self.items.push(SubTexture::new(&self.texture, x, y, w, h));
        if !name.is_empty() {
            if let Some(previous) = self.names.insert(name.to_string(), index) {
                tracing::warn!(atlas = %self.name, name, previous, index, "duplicate atlas item name");
            }
        }
        index
    }

    pub fn get(&self, name: &str) -> Option<SubTexture> {
        self.names.get(name).map(|&i| self.items[i])
    }

    pub fn get_by_index(&self, index: usize) -> Option<SubTexture> {
        self.items.get(index).copied()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn texture(&self) -> Texture {
        self.texture
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubTexture> {
        self.items.iter()
    }
}
