//! Browser bindings
//!
//! The page owns the canvas, the audio graph, and the animation loop. It
//! forwards `KeyboardEvent.code` strings here and receives each frame's
//! intents as JSON.

use wasm_bindgen::prelude::*;

use crate::game::Game;
use crate::persistence::{LocalStorage, Storage};
use crate::platform::{Key, KeyTracker};
use crate::settings::Settings;
use crate::tuning::Tuning;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"logger already initialised".into());
    }
    log::info!("Shai-Hulud wasm module loaded");
}

#[wasm_bindgen]
pub struct WebGame {
    game: Game,
    keys: KeyTracker,
}

#[wasm_bindgen]
impl WebGame {
    /// `tuning_json` may be empty for the built-in balance
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64, tuning_json: &str) -> Result<WebGame, JsValue> {
        let tuning = if tuning_json.trim().is_empty() {
            Tuning::default()
        } else {
            Tuning::from_json(tuning_json).map_err(|e| JsValue::from_str(&e.to_string()))?
        };
        let storage = LocalStorage;
        let settings = Settings::load(&storage as &dyn Storage);
        let game = Game::new(seed, tuning, settings, Box::new(storage))
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self {
            game,
            keys: KeyTracker::new(),
        })
    }

    pub fn key_down(&mut self, code: &str) {
        self.keys.key_down(Key::from_code(code));
    }

    pub fn key_up(&mut self, code: &str) {
        self.keys.key_up(Key::from_code(code));
    }

    /// Tab hidden or window blurred
    pub fn release_keys(&mut self) {
        self.keys.release_all();
    }

    /// Run one frame; returns the `FrameOutput` serialized as JSON
    pub fn frame(&mut self, dt: f32) -> Result<String, JsValue> {
        let input = self.keys.snapshot();
        let out = self
            .game
            .frame(&input, dt)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        serde_json::to_string(&out).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn score(&self) -> u64 {
        self.game.session().score
    }

    pub fn is_muted(&self) -> bool {
        self.game.is_muted()
    }
}
