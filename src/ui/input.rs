use crate::game::Game;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Enemy distance (ahead of the hero, along x) at which the autopilot jumps.
/// At the default speed and impulse this puts the apex over the enemy.
const AUTOPILOT_TRIGGER: f32 = 12.0;

/// Player actions the game understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameInput {
    Jump,
    Restart,
    Quit,
}

impl GameInput {
    /// Keyboard mapping: Up/W jump, Enter restarts, Escape quits.
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "up" | "w" => Some(Self::Jump),
            "enter" | "return" => Some(Self::Restart),
            "escape" | "esc" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Plays the game: jumps when the enemy gets close, restarts after a loss.
#[derive(Debug, Clone, Copy)]
pub struct Autopilot {
    pub trigger_distance: f32,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self {
            trigger_distance: AUTOPILOT_TRIGGER,
        }
    }
}

impl Autopilot {
    pub fn decide(&self, game: &Game) -> Option<GameInput> {
        let state = game.state();
        if state.game_over {
            return Some(GameInput::Restart);
        }
        if !state.grounded {
            return None;
        }
        let hero = game.hero_position().ok()?;
        let enemy = game.enemy_position().ok()?;
        let ahead = enemy.x - hero.x;
        (ahead > 0.0 && ahead <= self.trigger_distance).then_some(GameInput::Jump)
    }
}

/// Key presses pinned to frame numbers, e.g. `"40:w, 200:enter, 299:escape"`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputScript {
    events: BTreeMap<usize, Vec<GameInput>>,
}

impl InputScript {
    /// Inputs scheduled for `frame`, in the order they were written.
    pub fn inputs_at(&self, frame: usize) -> &[GameInput] {
        self.events.get(&frame).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl FromStr for InputScript {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut events: BTreeMap<usize, Vec<GameInput>> = BTreeMap::new();
        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (frame, key) = entry
                .split_once(':')
                .ok_or_else(|| format!("expected <frame>:<key>, got '{}'", entry))?;
            let frame: usize = frame
                .trim()
                .parse()
                .map_err(|_| format!("bad frame number in '{}'", entry))?;
            let input =
                GameInput::from_key(key).ok_or_else(|| format!("unknown key in '{}'", entry))?;
            events.entry(frame).or_default().push(input);
        }
        Ok(Self { events })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_game_inputs() {
        assert_eq!(GameInput::from_key("W"), Some(GameInput::Jump));
        assert_eq!(GameInput::from_key("up"), Some(GameInput::Jump));
        assert_eq!(GameInput::from_key("Enter"), Some(GameInput::Restart));
        assert_eq!(GameInput::from_key("escape"), Some(GameInput::Quit));
        assert_eq!(GameInput::from_key("space"), None);
    }

    #[test]
    fn script_groups_inputs_by_frame() {
        let script: InputScript = "40:w, 200:enter, 40:esc".parse().unwrap();
        assert_eq!(script.inputs_at(40), &[GameInput::Jump, GameInput::Quit]);
        assert_eq!(script.inputs_at(200), &[GameInput::Restart]);
        assert!(script.inputs_at(41).is_empty());
    }

    #[test]
    fn malformed_script_entries_are_rejected() {
        assert!("40".parse::<InputScript>().is_err());
        assert!("x:w".parse::<InputScript>().is_err());
        assert!("10:space".parse::<InputScript>().is_err());
        assert!("".parse::<InputScript>().unwrap().is_empty());
    }
}
