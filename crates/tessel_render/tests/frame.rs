//! Full frames through the concrete batch renderer and headless backend.

use tessel_core::ecs::EntityRegistry;
use tessel_core::transform::TransformTable;
use tessel_render::{
    Atlas, BatchRenderer, HeadlessBackend, Mesh, RenderSettings, ResourceBackend,
    SpriteRenderFeature, SpriteTable, Texture,
};

#[test]
fn atlas_and_texture_sprites_batch_and_upload() {
    let settings = RenderSettings::from_json_str(r#"{ "max_batch_vertices": 16 }"#).unwrap();
    let mut backend = HeadlessBackend::new();

    let sheet_id = backend.alloc_texture(64, 64, &[0; 64 * 64 * 4]).unwrap();
    let hero_id = backend.alloc_texture(8, 8, &[0; 8 * 8 * 4]).unwrap();
    let sheet = Texture::from_info(sheet_id, backend.texture(sheet_id).unwrap());
    let hero = Texture::from_info(hero_id, backend.texture(hero_id).unwrap());
    let tiles = Atlas::indexed("tiles", sheet, 16.0, 16.0, 4, 4);

    let mut registry = EntityRegistry::new();
    let mut transforms = TransformTable::with_step(settings.table_growth_step);
    let mut sprites = SpriteTable::with_step(settings.table_growth_step);

    // Ten background tiles, then the hero on top.
    for i in 0..10 {
        let e = registry.create();
        transforms.new_comp(e).set_position(i as f32 * 16.0, 0.0);
        let tile = tiles.get_by_index(i % tiles.len()).unwrap();
        sprites.new_comp_x(e, tile, -1);
    }
    let player = registry.create();
    transforms.new_comp(player).set_position(40.0, 8.0);
    sprites.new_comp_x(player, hero, 10);

    let mut renderer = BatchRenderer::from_settings(&settings);
    renderer.setup(&mut backend).unwrap();
    let mut pass = SpriteRenderFeature::from_settings(&settings);

    // 10 tiles at 4 quads per command -> 3 commands, plus the hero.
    let batches = pass.draw(&sprites, &transforms, &mut renderer);
    assert_eq!(batches, 4);
    let frame = renderer.last_frame();
    assert!(frame[..3].iter().all(|c| c.texture == sheet_id));
    assert_eq!(frame[3].texture, hero_id);
    assert_eq!(renderer.last_vertices().len(), 44);

    let written = renderer.upload(&mut backend).unwrap();
    assert_eq!(written, 44 * 20);

    // Deleting the hero leaves only the tiles.
    assert!(sprites.delete(player));
    assert_eq!(pass.draw(&sprites, &transforms, &mut renderer), 3);
    assert_eq!(sprites.check_invariants(), Ok(()));

    renderer.release(&mut backend);
    assert!(backend.destroy(sheet_id));
    assert!(backend.destroy(hero_id));
    assert_eq!(backend.live_resources(), 0);
}

#[test]
fn mesh_lifecycle_on_headless_backend() {
    let mut backend = HeadlessBackend::new();
    let tex = backend.alloc_texture(2, 2, &[255; 16]).unwrap();

    let mut quad = Mesh::new_quad(&backend, tex).unwrap();
    quad.setup(&mut backend).unwrap();
    assert!(!quad.index_buffer.is_valid(), "plain quad has no index buffer");
    quad.update(&mut backend).unwrap();

    assert_eq!(quad.delete(&mut backend), 2);
    assert_eq!(quad.delete(&mut backend), 0);
    assert_eq!(backend.live_resources(), 0);
}
