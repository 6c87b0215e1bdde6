//! Tessel Runtime
//!
//! Headless demo: builds a small sprite scene, runs it for a fixed number
//! of frames and reports how many batches each frame needed.
//!
//! Usage: `tessel [settings.json]`

use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};
use tessel_asset::{AtlasDescriptor, TextureManager};
use tessel_core::ecs::{Entity, EntityRegistry};
use tessel_core::transform::TransformTable;
use tessel_metrics::FrameTimer;
use tessel_render::{
    pack_rgba, BatchRenderer, HeadlessBackend, RenderSettings, SpriteRenderFeature, SpriteTable,
};
use tracing_subscriber::EnvFilter;

const DEMO_FRAMES: usize = 120;
const TILE_COLUMNS: usize = 16;
const TILE_ROWS: usize = 12;
const ACTORS: usize = 24;

const SHEET: &str = "demo/tiles";
const SHEET_DESC: &str = r#"{
    "grass": { "x": 0,  "y": 0,  "w": 16, "h": 16 },
    "dirt":  { "x": 16, "y": 0,  "w": 16, "h": 16 },
    "water": { "x": 0,  "y": 16, "w": 16, "h": 16 },
    "stone": { "x": 16, "y": 16, "w": 16, "h": 16 }
}"#;
const ACTOR: &str = "demo/actor";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("Tessel v{}", tessel_core::VERSION);

    let settings = match std::env::args().nth(1) {
        Some(path) => RenderSettings::load(&path)
            .with_context(|| format!("loading render settings from {path}"))?,
        None => RenderSettings::default(),
    };

    let mut backend = HeadlessBackend::new();
    let mut textures = TextureManager::new();

    let desc = AtlasDescriptor::from_json_str(SHEET_DESC)?;
    textures.load_image_atlas(&mut backend, SHEET, &solid_quadrants(32), &desc)?;
    textures.load_image(&mut backend, ACTOR, &RgbaImage::from_pixel(8, 8, Rgba([255, 0, 0, 255])))?;

    let mut registry = EntityRegistry::new();
    let mut transforms = TransformTable::with_step(settings.table_growth_step);
    let mut sprites = SpriteTable::with_step(settings.table_growth_step);

    let atlas = textures
        .atlas(SHEET)
        .context("tile atlas was not attached")?;
    for row in 0..TILE_ROWS {
        for col in 0..TILE_COLUMNS {
            let e = registry.create();
            transforms
                .new_comp(e)
                .set_position(col as f32 * 16.0, row as f32 * 16.0);
            let kind = (row * 7 + col * 3) % atlas.len();
            if let Some(tile) = atlas.get_by_index(kind) {
                sprites.new_comp_x(e, tile, -10).set_gravity(0.0, 0.0);
            }
        }
    }

    let actor = textures.get(ACTOR).context("actor texture was not loaded")?;
    let actors: Vec<Entity> = (0..ACTORS)
        .map(|i| {
            let e = registry.create();
            transforms.new_comp(e).set_position(i as f32 * 10.0, 96.0);
            sprites
                .new_comp_x(e, actor, (i % 3) as i16)
                .set_color(pack_rgba(255, (i * 10) as u8, 0, 255));
            e
        })
        .collect();

    tracing::info!(
        entities = registry.len(),
        sprites = sprites.len(),
        resources = backend.live_resources(),
        "scene built"
    );

    let mut renderer = BatchRenderer::from_settings(&settings);
    renderer.setup(&mut backend)?;
    let mut pass = SpriteRenderFeature::from_settings(&settings);
    let mut timer = FrameTimer::new(settings.stats_history);

    for frame in 0..DEMO_FRAMES {
        timer.begin();

        let t = frame as f32 / 60.0;
        for (i, &e) in actors.iter().enumerate() {
            if let Some(xf) = transforms.comp_mut(e) {
                xf.move_by(1.0, (t + i as f32).sin()).set_rotation(t);
            }
        }
        // Halfway through, retire every other actor.
        if frame == DEMO_FRAMES / 2 {
            for &e in actors.iter().step_by(2) {
                sprites.delete(e);
                transforms.delete(e);
                registry.destroy(e);
            }
        }

        pass.draw(&sprites, &transforms, &mut renderer);
        renderer.upload(&mut backend)?;

        timer.end();
    }

    let stats = pass.stats();
    tracing::info!(
        frames = stats.frames(),
        last_batches = stats.last_batches(),
        avg_batches = stats.average_batches(),
        peak_batches = stats.peak_batches(),
        sprites_drawn = stats.sprites_drawn(),
        frame_ms = timer.frame_time_ms(),
        worst_ms = timer.worst_frame_ms(),
        "demo finished"
    );

    renderer.release(&mut backend);
    textures.clear(&mut backend);
    if backend.live_resources() != 0 {
        tracing::warn!(leaked = backend.live_resources(), "backend resources still live");
    }

    Ok(())
}

/// Four solid-colored quadrants, one per atlas region.
fn solid_quadrants(size: u32) -> RgbaImage {
    let half = size / 2;
    RgbaImage::from_fn(size, size, |x, y| match (x < half, y < half) {
        (true, true) => Rgba([60, 160, 60, 255]),
        (false, true) => Rgba([120, 80, 40, 255]),
        (true, false) => Rgba([40, 80, 200, 255]),
        (false, false) => Rgba([128, 128, 128, 255]),
    })
}
