//! Visual references: what a sprite draws.
//!
//! A [`Sprite`] is either a whole texture or a rectangle inside a shared
//! atlas texture. Both expose the same three things to the draw pass: the
//! texture handle to bind, the UV region, and a nominal size in pixels.

use crate::backend::{Handle, TextureInfo};

/// UV bounds (`x1,y1` = min corner, `x2,y2` = max corner) in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Region {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Region {
    /// The whole texture.
    pub const FULL: Region = Region {
        x1: 0.0,
        y1: 0.0,
        x2: 1.0,
        y2: 1.0,
    };
}

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// A whole texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Texture {
    id: Handle,
    size: Size,
}

impl Texture {
    pub fn new(id: Handle, width: f32, height: f32) -> Self {
        Self {
            id,
            size: Size::new(width, height),
        }
    }

    pub fn from_info(id: Handle, info: TextureInfo) -> Self {
        Self::new(id, info.width as f32, info.height as f32)
    }

    pub fn id(&self) -> Handle {
        self.id
    }

    pub fn size(&self) -> Size {
        self.size
    }
}

/// A pixel rectangle inside a parent texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubTexture {
    id: Handle,
    parent: Size,
    min: [f32; 2],
    max: [f32; 2],
}

impl SubTexture {
    /// `x, y, w, h` are pixels inside `parent`.
    pub fn new(parent: &Texture, x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            id: parent.id(),
            parent: parent.size(),
            min: [x, y],
            max: [x + w, y + h],
        }
    }

    pub fn id(&self) -> Handle {
        self.id
    }

    /// Min corner in pixels.
    pub fn min(&self) -> [f32; 2] {
        self.min
    }

    /// Max corner in pixels.
    pub fn max(&self) -> [f32; 2] {
        self.max
    }

    pub fn parent_size(&self) -> Size {
        self.parent
    }

    pub fn size(&self) -> Size {
        Size::new(self.max[0] - self.min[0], self.max[1] - self.min[1])
    }

    /// Pixel bounds normalized by the parent texture's dimensions.
    pub fn region(&self) -> Region {
        let Size { width, height } = self.parent;
        Region {
            x1: self.min[0] / width,
            y1: self.min[1] / height,
            x2: self.max[0] / width,
            y2: self.max[1] / height,
        }
    }
}

/// Anything a sprite record can display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sprite {
    Texture(Texture),
    SubTexture(SubTexture),
}

impl Sprite {
    /// Texture to bind when drawing.
    pub fn tex(&self) -> Handle {
        match self {
            Sprite::Texture(t) => t.id(),
            Sprite::SubTexture(s) => s.id(),
        }
    }

    pub fn region(&self) -> Region {
        match self {
            Sprite::Texture(_) => Region::FULL,
            Sprite::SubTexture(s) => s.region(),
        }
    }

    pub fn size(&self) -> Size {
        match self {
            Sprite::Texture(t) => t.size(),
            Sprite::SubTexture(s) => s.size(),
        }
    }
}

impl From<Texture> for Sprite {
    fn from(texture: Texture) -> Self {
        Sprite::Texture(texture)
    }
}

impl From<SubTexture> for Sprite {
    fn from(sub: SubTexture) -> Self {
        Sprite::SubTexture(sub)
    }
}
