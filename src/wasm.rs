//! WebAssembly bindings for Tank Replay.
//!
//! Wraps a [`PlaybackController`] over a [`MemoryBoard`]. The page drives time
//! with `advance(ms)` from its animation frame callback and redraws from
//! `getBoard()`.

use wasm_bindgen::prelude::*;

use crate::{
    board::MemoryBoard,
    playback::PlaybackController,
    schema::{PlaybackConfig, ReplaySetup},
};

/// Initialize WASM module with panic hook and logging.
#[wasm_bindgen(start)]
pub fn init() {
    // Set panic hook for better error messages in browser
    console_error_panic_hook::set_once();

    wasm_logger::init(wasm_logger::Config::default());
}

/// WebAssembly wrapper for replay playback.
#[wasm_bindgen]
pub struct WasmReplay {
    setup: ReplaySetup,
    player: PlaybackController<MemoryBoard>,
}

#[wasm_bindgen]
impl WasmReplay {
    /// Set up playback from a replay and an optional playback config.
    ///
    /// # Arguments
    /// * `setup_json` - JSON string containing the replay (settings, result, flow)
    /// * `config_json` - JSON string containing PlaybackConfig; defaults when omitted
    #[wasm_bindgen(constructor)]
    pub fn new(setup_json: &str, config_json: Option<String>) -> Result<WasmReplay, JsValue> {
        let setup = ReplaySetup::from_json(setup_json)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let config = match config_json {
            Some(json) => {
                PlaybackConfig::from_json(&json).map_err(|e| JsValue::from_str(&e.to_string()))?
            }
            None => PlaybackConfig::default(),
        };

        let board = MemoryBoard::new(
            config.board.width,
            config.board.height,
            setup.flow.player_count(),
        );
        let player = PlaybackController::new(setup.flow.clone(), config, board)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        Ok(WasmReplay { setup, player })
    }

    #[wasm_bindgen(js_name = togglePause)]
    pub fn toggle_pause(&mut self) {
        self.player.toggle_pause();
    }

    #[wasm_bindgen]
    pub fn play(&mut self) {
        self.player.play();
    }

    #[wasm_bindgen]
    pub fn pause(&mut self) {
        self.player.pause();
    }

    #[wasm_bindgen(js_name = stepForward)]
    pub fn step_forward(&mut self) {
        self.player.step_forward();
    }

    #[wasm_bindgen(js_name = stepBackward)]
    pub fn step_backward(&mut self) {
        self.player.step_backward();
    }

    #[wasm_bindgen(js_name = stepForward10)]
    pub fn step_forward_10(&mut self) {
        self.player.step_forward_10();
    }

    #[wasm_bindgen(js_name = stepBackward10)]
    pub fn step_backward_10(&mut self) {
        self.player.step_backward_10();
    }

    #[wasm_bindgen(js_name = jumpToStart)]
    pub fn jump_to_start(&mut self) {
        self.player.jump_to_start();
    }

    #[wasm_bindgen]
    pub fn seek(&mut self, tick: usize) {
        self.player.seek(tick);
    }

    /// Let `elapsed_ms` of playback time pass. Returns the number of tasks run.
    #[wasm_bindgen]
    pub fn advance(&mut self, elapsed_ms: u32) -> usize {
        self.player.advance(u64::from(elapsed_ms))
    }

    /// Get the board (tokens, cell tones, health and tick texts) as a JS object.
    #[wasm_bindgen(js_name = getBoard)]
    pub fn get_board(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.player.board())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {e}")))
    }

    #[wasm_bindgen(js_name = isPaused)]
    pub fn is_paused(&self) -> bool {
        self.player.session().is_paused()
    }

    #[wasm_bindgen(js_name = isFinished)]
    pub fn is_finished(&self) -> bool {
        self.player.session().is_finished()
    }

    /// Current tick counter text.
    #[wasm_bindgen(js_name = currentTick)]
    pub fn current_tick(&self) -> String {
        self.player.current_tick_text()
    }

    /// Last tick label text (`T - 1`).
    #[wasm_bindgen(js_name = tickCount)]
    pub fn tick_count(&self) -> String {
        self.player.tick_count_text()
    }

    /// Match result line, e.g. "player 2 won".
    #[wasm_bindgen(js_name = resultText)]
    pub fn result_text(&self) -> String {
        self.setup.result.to_string()
    }

    #[wasm_bindgen(js_name = explanationText)]
    pub fn explanation_text(&self) -> Option<String> {
        self.setup.explanation_text().map(str::to_owned)
    }
}
