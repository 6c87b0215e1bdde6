// feature.rs - Sprite draw pass
//
// Joins every live sprite record with its world transform, orders the
// records by a composite (z-order, batch key) sort key and drives a
// BatchRender through one begin/draw*/end run per batch key.

use crate::batch::{BatchObject, BatchRender};
use crate::settings::RenderSettings;
use crate::sprite::Sprite;
use crate::sprite_table::{SpriteComp, SpriteTable};
use crate::vertex::PosTexColorVertex;
use glam::Vec2;
use tessel_core::math::srt_affine;
use tessel_core::transform::{Srt, TransformProvider};
use tessel_metrics::DrawStats;

/// Added to the signed z-order so `i16::MIN` maps to 0.
pub const Z_BIAS: i32 = 0x8000;

/// Composite sort key.
///
/// Bits 31..16 hold the biased z-order, bits 15..0 the batch key, so a
/// plain ascending sort orders by paint priority first and groups equal
/// batch keys within one priority.
pub fn sort_key(z_order: i16, batch_id: u16) -> u32 {
    let z = (i32::from(z_order) + Z_BIAS) as u32;
    (z << 16) | u32::from(batch_id)
}

/// Batch key half of a [`sort_key`].
pub fn batch_of(key: u32) -> u16 {
    (key & 0xFFFF) as u16
}

#[derive(Debug, Clone, Copy)]
struct DrawRecord {
    key: u32,
    slot: usize,
    world: Srt,
}

/// One sprite paired with its resolved transform for the current frame.
pub struct SpriteBatchObject<'a> {
    pub comp: &'a SpriteComp,
    pub visual: &'a Sprite,
    pub world: Srt,
}

impl BatchObject for SpriteBatchObject<'_> {
    fn fill(&self, out: &mut [PosTexColorVertex]) {
        let size = self.comp.size();
        let (w, h) = (size.width, size.height);
        let origin = Vec2::new(w, h) * self.comp.gravity();
        let model = srt_affine(
            self.world.position,
            self.world.rotation,
            self.world.scale * self.comp.scale(),
            origin,
        );

        let r = self.visual.region();
        let color = self.comp.color();
        // bottom-left, bottom-right, top-right, top-left
        let corners = [
            (0.0, 0.0, r.x1, r.y2),
            (w, 0.0, r.x2, r.y2),
            (w, h, r.x2, r.y1),
            (0.0, h, r.x1, r.y1),
        ];
        for (v, (x, y, u, t)) in out.iter_mut().zip(corners) {
            let p = model.transform_point2(Vec2::new(x, y));
            *v = PosTexColorVertex::new(p.x, p.y, u, t, color);
        }
    }
}

/// The per-frame sprite draw pass.
pub struct SpriteRenderFeature {
    records: Vec<DrawRecord>,
    stats: DrawStats,
}

impl SpriteRenderFeature {
    pub fn new(stats_history: usize) -> Self {
        Self {
            records: Vec::new(),
            stats: DrawStats::new(stats_history),
        }
    }

    pub fn from_settings(settings: &RenderSettings) -> Self {
        Self::new(settings.stats_history)
    }

    pub fn stats(&self) -> &DrawStats {
        &self.stats
    }

    /// Draw every live sprite. Returns the renderer's batch count.
    ///
    /// Records without a visual reference or without a resolvable
    /// transform are skipped.
    pub fn draw<P, R>(&mut self, sprites: &SpriteTable, transforms: &P, renderer: &mut R) -> usize
    where
        P: TransformProvider + ?Sized,
        R: BatchRender + ?Sized,
    {
        self.records.clear();
        let mut skipped = 0;

        for (slot, comp) in sprites.iter().enumerate() {
            if comp.sprite().is_none() {
                tracing::trace!(index = comp.entity().index(), "sprite has no visual; skipped");
                skipped += 1;
                continue;
            }
            let Some(transform) = transforms.transform(comp.entity()) else {
                tracing::trace!(index = comp.entity().index(), "sprite has no transform; skipped");
                skipped += 1;
                continue;
            };
            self.records.push(DrawRecord {
                key: sort_key(comp.z_order(), comp.batch_id()),
                slot,
                world: transform.world,
            });
        }
        if skipped > 0 {
            tracing::warn!(skipped, "sprites skipped this frame");
        }

        self.records.sort_unstable_by_key(|r| r.key);

        let rows = sprites.as_slice();
        let mut current: Option<u16> = None;
        let mut drawn = 0;
        for record in &self.records {
            let comp = &rows[record.slot];
            let Some(visual) = comp.sprite() else {
                continue;
            };

            let batch = batch_of(record.key);
            if current != Some(batch) {
                if current.is_some() {
                    renderer.end();
                }
                renderer.begin(visual.tex());
                current = Some(batch);
            }
            renderer.draw(&SpriteBatchObject {
                comp,
                visual,
                world: record.world,
            });
            drawn += 1;
        }
        if current.is_some() {
            renderer.end();
        }

        let batches = renderer.flush();
        tracing::debug!(batches, drawn, skipped, "sprite pass");
        self.stats.record_frame(batches, drawn, skipped);
        batches
    }
}

impl Default for SpriteRenderFeature {
    fn default() -> Self {
        Self::from_settings(&RenderSettings::default())
    }
}
