//! Ref-counted texture cache
//!
//! Textures are keyed by the name they were loaded under (usually the
//! file path). Every successful `load*` call takes a reference; `unload`
//! drops one and frees the backend texture, along with any atlas built
//! over it, when the last reference goes.

use crate::descriptor::AtlasDescriptor;
use crate::error::{AssetError, Result};
use image::RgbaImage;
use std::collections::HashMap;
use std::path::Path;
use tessel_render::backend::TextureInfo;
use tessel_render::{Atlas, Handle, ResourceBackend, Sprite, Texture};

struct Entry {
    handle: Handle,
    info: TextureInfo,
    refs: usize,
    atlas: Option<Atlas>,
}

impl Entry {
    fn texture(&self) -> Texture {
        Texture::from_info(self.handle, self.info)
    }
}

#[derive(Default)]
pub struct TextureManager {
    textures: HashMap<String, Entry>,
}

impl TextureManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `file` and upload it, or take another reference if it is
    /// already loaded.
    pub fn load(&mut self, backend: &mut impl ResourceBackend, file: &str) -> Result<Handle> {
        if let Some(handle) = self.retain(file) {
            return Ok(handle);
        }
        let image = decode(file)?;
        self.insert(backend, file, &image)
    }

    /// Upload already-decoded pixels under `key`.
    pub fn load_image(
        &mut self,
        backend: &mut impl ResourceBackend,
        key: &str,
        image: &RgbaImage,
    ) -> Result<Handle> {
        if let Some(handle) = self.retain(key) {
            return Ok(handle);
        }
        self.insert(backend, key, image)
    }

    /// Load `file` and attach the atlas described by the JSON at `descriptor`.
    pub fn load_atlas(
        &mut self,
        backend: &mut impl ResourceBackend,
        file: &str,
        descriptor: impl AsRef<Path>,
    ) -> Result<Handle> {
        let desc = AtlasDescriptor::load(descriptor)?;
        let handle = self.load(backend, file)?;
        self.attach(backend, file, |texture| {
            desc.validate(texture.size().width as u32, texture.size().height as u32)?;
            Ok(desc.build(file, texture))
        })?;
        Ok(handle)
    }

    /// In-memory counterpart of [`load_atlas`](Self::load_atlas).
    pub fn load_image_atlas(
        &mut self,
        backend: &mut impl ResourceBackend,
        key: &str,
        image: &RgbaImage,
        desc: &AtlasDescriptor,
    ) -> Result<Handle> {
        let handle = self.load_image(backend, key, image)?;
        self.attach(backend, key, |texture| {
            desc.validate(image.width(), image.height())?;
            Ok(desc.build(key, texture))
        })?;
        Ok(handle)
    }

    /// Load `file` as a grid of `rows × cols` cells of `w × h` pixels.
    pub fn load_atlas_indexed(
        &mut self,
        backend: &mut impl ResourceBackend,
        file: &str,
        w: u32,
        h: u32,
        rows: u32,
        cols: u32,
    ) -> Result<Handle> {
        let handle = self.load(backend, file)?;
        self.attach(backend, file, |texture| {
            let size = texture.size();
            let grid = crate::PixelRect {
                x: 0,
                y: 0,
                w: w.saturating_mul(cols),
                h: h.saturating_mul(rows),
            };
            if w == 0 || h == 0 || grid.w > size.width as u32 || grid.h > size.height as u32 {
                return Err(AssetError::InvalidRegion {
                    name: format!("{rows}x{cols} grid"),
                    rect: grid,
                    width: size.width as u32,
                    height: size.height as u32,
                });
            }
            Ok(Atlas::indexed(
                file,
                texture,
                w as f32,
                h as f32,
                rows as usize,
                cols as usize,
            ))
        })?;
        Ok(handle)
    }

    /// The whole texture as a sprite.
    pub fn get(&self, file: &str) -> Option<Sprite> {
        self.textures.get(file).map(|e| Sprite::Texture(e.texture()))
    }

    pub fn get_raw(&self, file: &str) -> Option<(Handle, TextureInfo)> {
        self.textures.get(file).map(|e| (e.handle, e.info))
    }

    pub fn atlas(&self, file: &str) -> Option<&Atlas> {
        self.textures.get(file)?.atlas.as_ref()
    }

    pub fn refs(&self, file: &str) -> usize {
        self.textures.get(file).map_or(0, |e| e.refs)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Drop one reference. Returns true when the texture was freed.
    pub fn unload(&mut self, backend: &mut impl ResourceBackend, file: &str) -> Result<bool> {
        let entry = self
            .textures
            .get_mut(file)
            .ok_or_else(|| AssetError::UnknownTexture(file.to_string()))?;
        entry.refs -= 1;
        if entry.refs > 0 {
            return Ok(false);
        }

        if let Some(entry) = self.textures.remove(file) {
            backend.destroy(entry.handle);
            tracing::info!(file, handle = entry.handle.raw(), "texture unloaded");
        }
        Ok(true)
    }

    /// Free every texture regardless of references.
    pub fn clear(&mut self, backend: &mut impl ResourceBackend) {
        for (file, entry) in self.textures.drain() {
            backend.destroy(entry.handle);
            tracing::debug!(file = %file, "texture released");
        }
    }

    fn retain(&mut self, key: &str) -> Option<Handle> {
        let entry = self.textures.get_mut(key)?;
        entry.refs += 1;
        Some(entry.handle)
    }

    fn insert(
        &mut self,
        backend: &mut impl ResourceBackend,
        key: &str,
        image: &RgbaImage,
    ) -> Result<Handle> {
        let (width, height) = image.dimensions();
        let handle = backend
            .alloc_texture(width, height, image.as_raw())
            .inspect_err(|e| tracing::warn!(key, error = %e, "texture allocation failed"))?;
        self.textures.insert(
            key.to_string(),
            Entry {
                handle,
                info: TextureInfo { width, height },
                refs: 1,
                atlas: None,
            },
        );
        tracing::info!(key, width, height, handle = handle.raw(), "texture loaded");
        Ok(handle)
    }

    /// Build and store an atlas for an already-loaded texture. A failure
    /// gives back the reference the caller just took.
    fn attach<B, F>(&mut self, backend: &mut B, key: &str, build: F) -> Result<()>
    where
        B: ResourceBackend,
        F: FnOnce(Texture) -> Result<Atlas>,
    {
        let Some(entry) = self.textures.get_mut(key) else {
            return Err(AssetError::UnknownTexture(key.to_string()));
        };
        if entry.atlas.is_some() {
            return Ok(());
        }
        match build(entry.texture()) {
            Ok(atlas) => {
                tracing::debug!(key, items = atlas.len(), "atlas attached");
                entry.atlas = Some(atlas);
                Ok(())
            }
            Err(e) => {
                self.unload(backend, key)?;
                Err(e)
            }
        }
    }
}

fn decode(file: &str) -> Result<RgbaImage> {
    let image = image::open(file).map_err(|source| match source {
        image::ImageError::IoError(source) => AssetError::Io {
            path: file.into(),
            source,
        },
        source => AssetError::Image {
            path: file.into(),
            source,
        },
    })?;
    Ok(image.to_rgba8())
}
