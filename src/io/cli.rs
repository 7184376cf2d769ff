use crate::error::AssetError;
use crate::io::config::Config;
use crate::ui::input::InputScript;
use clap::Parser;
use log::info;
use std::path::PathBuf;

/// Command line. Flags override the matching config entries.
#[derive(Parser, Debug)]
#[command(name = "hopper")]
#[command(about = "Jump-the-obstacle game rendered headless to PNG frames")]
pub struct Cli {
    /// TOML config file; defaults are used when omitted.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of frames to simulate.
    #[arg(short, long)]
    pub frames: Option<usize>,

    /// Directory the PNG frames are written to.
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Let the built-in player jump over the enemy.
    #[arg(long)]
    pub autopilot: bool,

    /// Scripted key presses, e.g. "40:w,200:enter".
    #[arg(long, value_name = "SCRIPT")]
    pub script: Option<InputScript>,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config, AssetError> {
        let mut config = match &self.config {
            Some(path) => {
                info!("Loading config '{}'", path.display());
                Config::load(path)?
            }
            None => {
                info!("No config file given, using defaults");
                Config::default()
            }
        };
        self.apply(&mut config);
        Ok(config)
    }

    pub fn apply(&self, config: &mut Config) {
        if let Some(frames) = self.frames {
            config.render.frames = frames;
        }
        if let Some(output) = &self.output {
            config.render.output_dir = output.clone();
        }
        if self.autopilot {
            config.game.autopilot = true;
        }
    }

    pub fn script(&self) -> InputScript {
        self.script.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::input::GameInput;

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "hopper",
            "--frames",
            "12",
            "-o",
            "out",
            "--autopilot",
            "--script",
            "3:w",
        ])
        .unwrap();
        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config.render.frames, 12);
        assert_eq!(config.render.output_dir, PathBuf::from("out"));
        assert!(config.game.autopilot);
        assert_eq!(cli.script().inputs_at(3), &[GameInput::Jump]);
    }

    #[test]
    fn absent_flags_keep_config_values() {
        let cli = Cli::try_parse_from(["hopper"]).unwrap();
        let mut config = Config::default();
        config.render.frames = 7;
        cli.apply(&mut config);
        assert_eq!(config.render.frames, 7);
        assert!(!config.game.autopilot);
        assert!(cli.script().is_empty());
    }

    #[test]
    fn bad_script_is_a_usage_error() {
        assert!(Cli::try_parse_from(["hopper", "--script", "soon:w"]).is_err());
    }
}
