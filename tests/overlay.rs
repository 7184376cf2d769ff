mod common;

use common::{game_camera, light, software_device};
use hopper::game::Game;
use hopper::gpu::DeviceCommand;
use hopper::io::config::Config;
use hopper::physics::{BodyHandle, BodyTransform};
use hopper::scene::{
    BlockGlyphs, Drawable, FrameContext, GlyphRasterizer, Programs, TextRenderer,
};
use nalgebra::{Vector2, Vector3};
use std::collections::HashMap;

#[test]
fn score_text_uploads_one_quad_per_character() {
    let (software, device) = software_device(800, 600);
    let programs = Programs::new(&device).unwrap();
    let light = light(&device, &programs);
    let camera = game_camera();
    let bodies: HashMap<BodyHandle, BodyTransform> = HashMap::new();

    let mut text = TextRenderer::new(
        &device,
        "Score: 0",
        &BlockGlyphs,
        64.0,
        Vector3::new(1.0, 0.0, 0.0),
        programs.text.handle(),
        (800.0, 600.0),
    )
    .unwrap();
    text.set_position(Vector2::new(320.0, 500.0));
    text.set_text("Score: 5");

    software.borrow_mut().enable_trace();
    text.draw(&FrameContext {
        camera: &camera,
        light: &light,
        bodies: &bodies,
    })
    .unwrap();
    let trace = software.borrow_mut().take_trace();

    let uploads = trace
        .iter()
        .filter(|c| matches!(c, DeviceCommand::WriteBuffer { .. }))
        .count();
    let draws: Vec<usize> = trace
        .iter()
        .filter_map(|c| match c {
            DeviceCommand::DrawArrays { count } => Some(*count),
            _ => None,
        })
        .collect();
    assert_eq!(uploads, 8);
    assert_eq!(draws, vec![6; 8]);

    let quads = text.layout();
    let order: String = quads.iter().map(|q| q.ch).collect();
    assert_eq!(order, "Score: 5");
    assert_eq!(quads[0].pen_x, 320.0);
    for pair in quads.windows(2) {
        let advance = BlockGlyphs.rasterize(pair[0].ch, 64.0).advance;
        assert_eq!(pair[1].pen_x - pair[0].pen_x, advance, "after {:?}", pair[0].ch);
    }

    // Blending on for the text, then the previous state restored.
    assert_eq!(trace.first(), Some(&DeviceCommand::SetBlending(true)));
    assert_eq!(trace.last(), Some(&DeviceCommand::SetBlending(false)));
}

#[test]
fn scene_draws_text_after_every_mesh() {
    let (software, device) = software_device(80, 60);
    let game = Game::new(&device, &Config::default(), &BlockGlyphs).unwrap();

    software.borrow_mut().enable_trace();
    game.render().unwrap();
    let trace = software.borrow_mut().take_trace();

    let last_mesh = trace
        .iter()
        .rposition(|c| matches!(c, DeviceCommand::DrawElements { .. }))
        .unwrap();
    let first_text = trace
        .iter()
        .position(|c| matches!(c, DeviceCommand::DrawArrays { .. }))
        .unwrap();
    assert!(last_mesh < first_text);
    assert!(matches!(trace.first(), Some(DeviceCommand::Clear(_))));

    let mesh_draws = trace
        .iter()
        .filter(|c| matches!(c, DeviceCommand::DrawElements { .. }))
        .count();
    assert_eq!(mesh_draws, 3, "hero, ground and enemy; the light stays hidden");
}

#[test]
fn characters_outside_the_atlas_are_skipped() {
    let (software, device) = software_device(80, 60);
    let mut game = Game::new(&device, &Config::default(), &BlockGlyphs).unwrap();
    let text = game.scene_mut().overlay_mut(0).unwrap();
    text.set_text("Score: 5 é");

    let order: String = text.layout().iter().map(|q| q.ch).collect();
    assert_eq!(order, "Score: 5 ");

    software.borrow_mut().enable_trace();
    game.render().unwrap();
    let trace = software.borrow_mut().take_trace();
    let glyph_draws = trace
        .iter()
        .filter(|c| matches!(c, DeviceCommand::DrawArrays { .. }))
        .count();
    assert_eq!(glyph_draws, 9);
}

#[test]
fn rendered_frame_shows_the_hero_at_the_center() {
    let (software, device) = software_device(80, 60);
    let game = Game::new(&device, &Config::default(), &BlockGlyphs).unwrap();
    game.render().unwrap();

    let device = software.borrow();
    let mut lit = 0.0;
    for y in 27..33 {
        for x in 37..43 {
            lit += device.pixel(x, y).map(|c| c.sum()).unwrap_or(0.0);
        }
    }
    assert!(lit > 0.0);
}
