use crate::error::GameError;
use crate::game::{Game, GameState};
use crate::gpu::device::SharedDevice;
use crate::gpu::software::SoftwareDevice;
use crate::io::config::Config;
use crate::io::image::{frame_path, save_frame};
use crate::scene::glyph::{BlockGlyphs, FontdueRasterizer, GlyphRasterizer};
use crate::ui::input::{Autopilot, GameInput, InputScript};
use log::{debug, info, warn};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::time::Instant;

/// What a headless run did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub frames: usize,
    pub saved: usize,
    pub quit_early: bool,
    pub state: GameState,
}

/// Loads the configured font, or the built-in block glyphs if there is none.
pub fn load_glyphs(font: Option<&Path>) -> Box<dyn GlyphRasterizer> {
    match font.map(FontdueRasterizer::load) {
        Some(Ok(font)) => Box::new(font),
        Some(Err(e)) => {
            warn!("{}, falling back to block glyphs", e);
            Box::new(BlockGlyphs)
        }
        None => {
            debug!("No font configured, using block glyphs");
            Box::new(BlockGlyphs)
        }
    }
}

/// Every `capture_every`-th frame, plus the last one.
fn should_capture(frame: usize, total: usize, every: usize) -> bool {
    frame + 1 == total || (every > 0 && frame % every == 0)
}

/// Runs the game for `config.render.frames` fixed steps, rendering each one
/// and saving the captured frames as PNG.
pub fn run_headless(config: &Config, script: &InputScript) -> Result<RunSummary, GameError> {
    let render = &config.render;
    info!(
        "Starting headless run ({}x{}, {} frames)...",
        render.width, render.height, render.frames
    );
    let start_time = Instant::now();

    let software = Rc::new(RefCell::new(SoftwareDevice::new(
        render.width,
        render.height,
        render.samples,
    )));
    software.borrow_mut().set_cull_mode(render.cull_mode());
    let device: SharedDevice = software.clone();

    let glyphs = load_glyphs(config.game.font.as_deref());
    let mut game = Game::new(&device, config, glyphs.as_ref())?;
    let autopilot = config.game.autopilot.then(Autopilot::default);

    let mut summary = RunSummary {
        frames: 0,
        saved: 0,
        quit_early: false,
        state: game.state(),
    };

    'frames: for frame in 0..render.frames {
        let mut inputs: Vec<GameInput> = script.inputs_at(frame).to_vec();
        if let Some(input) = autopilot.as_ref().and_then(|pilot| pilot.decide(&game)) {
            inputs.push(input);
        }
        for input in inputs {
            if game.handle_input(input)?.is_break() {
                info!("Quit requested at frame {}", frame);
                summary.quit_early = true;
                break 'frames;
            }
        }

        game.update(config.game.time_step)?;
        game.render()?;
        summary.frames += 1;

        if should_capture(frame, render.frames, render.capture_every) {
            let path = frame_path(&render.output_dir, frame);
            if save_frame(&software.borrow().snapshot(), &path) {
                summary.saved += 1;
            }
        }
    }

    summary.state = game.state();
    info!(
        "Rendered {} frames in {:.2?}, saved {}, final score {}",
        summary.frames,
        start_time.elapsed(),
        summary.saved,
        summary.state.score
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_every_nth_and_the_last_frame() {
        let captured: Vec<usize> = (0..10).filter(|&f| should_capture(f, 10, 4)).collect();
        assert_eq!(captured, vec![0, 4, 8, 9]);
        let only_last: Vec<usize> = (0..10).filter(|&f| should_capture(f, 10, 0)).collect();
        assert_eq!(only_last, vec![9]);
    }

    #[test]
    fn missing_font_falls_back_to_block_glyphs() {
        let glyphs = load_glyphs(Some(Path::new("no/such/font.ttf")));
        assert!(glyphs.rasterize('A', 16.0).width > 0);
    }
}
