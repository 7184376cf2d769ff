mod common;

use common::software_device;
use hopper::app::run_headless;
use hopper::game::Game;
use hopper::io::config::Config;
use hopper::scene::BlockGlyphs;
use hopper::ui::input::{Autopilot, InputScript};
use std::fs;

const DT: f32 = 1.0 / 60.0;

#[test]
fn autopilot_clears_the_enemy_and_scores() {
    let (_software, device) = software_device(80, 60);
    let mut game = Game::new(&device, &Config::default(), &BlockGlyphs).unwrap();
    let pilot = Autopilot::default();

    let mut peak = 0.0f32;
    for _ in 0..300 {
        if let Some(input) = pilot.decide(&game) {
            game.handle_input(input).unwrap();
        }
        game.update(DT).unwrap();
        peak = peak.max(game.hero_position().unwrap().y);
        assert!(!game.state().game_over, "hero was hit");
    }
    assert_eq!(game.state().score, 2);
    assert!(peak > 3.0, "hero never cleared the enemy (peak {})", peak);
    assert_eq!(game.scene().overlays()[0].text(), "Score: 2");
}

#[test]
fn headless_run_writes_captured_frames() {
    let dir = std::env::temp_dir().join(format!("hopper-frames-{}", std::process::id()));
    let mut config = Config::default();
    config.render.width = 64;
    config.render.height = 48;
    config.render.frames = 5;
    config.render.capture_every = 2;
    config.render.output_dir = dir.clone();

    let summary = run_headless(&config, &InputScript::default()).unwrap();
    assert_eq!(summary.frames, 5);
    assert_eq!(summary.saved, 3);
    assert!(!summary.quit_early);
    for frame in [0, 2, 4] {
        assert!(dir.join(format!("frame_{:05}.png", frame)).exists());
    }
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn escape_in_the_script_stops_the_run() {
    let dir = std::env::temp_dir().join(format!("hopper-quit-{}", std::process::id()));
    let mut config = Config::default();
    config.render.width = 32;
    config.render.height = 24;
    config.render.frames = 50;
    config.render.capture_every = 0;
    config.render.output_dir = dir.clone();

    let script: InputScript = "3:escape".parse().unwrap();
    let summary = run_headless(&config, &script).unwrap();
    assert!(summary.quit_early);
    assert_eq!(summary.frames, 3);
    assert_eq!(summary.saved, 0);
    let _ = fs::remove_dir_all(&dir);
}
