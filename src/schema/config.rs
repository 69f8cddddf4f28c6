//! Configuration types for replay playback.

use serde::{Deserialize, Serialize};

/// Top-level playback configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Board geometry.
    pub board: BoardConfig,
    /// Animation timing constants.
    pub timing: TimingConfig,
    /// Start playing automatically after `timing.initial_delay`.
    pub autoplay: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            board: BoardConfig::default(),
            timing: TimingConfig::default(),
            autoplay: true,
        }
    }
}

/// Board geometry shared with the simulation that produced the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Board width in cells.
    pub width: usize,
    /// Board height in cells.
    pub height: usize,
    /// Half-width of the square an area strike covers around its origin.
    pub strike_radius: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
            strike_radius: 1,
        }
    }
}

/// Animation timing constants, all in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Delay before autoplay starts after setup.
    pub initial_delay: u64,
    /// Delay between tick start and the turn visual. May be zero.
    pub turn_delay: u64,
    /// Duration of a turn visual.
    pub turn_duration: u64,
    /// Duration of a one-cell translation.
    pub move_duration: u64,
    /// Extra pause appended to every tick.
    pub next_tick_delay: u64,
    /// Delay before a launched missile becomes visible.
    pub missile_show_delay: u64,
    /// How long a hit tone stays on its cell.
    pub hit_color_duration: u64,
    /// How long a changed health value stays emphasized.
    pub health_zoom_duration: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            initial_delay: 1000,
            turn_delay: 100,
            turn_duration: 200,
            move_duration: 1000,
            next_tick_delay: 0,
            missile_show_delay: 200,
            hit_color_duration: 200,
            health_zoom_duration: 250,
        }
    }
}

impl TimingConfig {
    /// Fixed cadence between a tick's completion and the next tick's start.
    #[inline]
    pub fn time_between_ticks(&self) -> u64 {
        self.turn_duration + self.turn_delay + self.move_duration + self.next_tick_delay
    }

    /// Window in which turns and translations finish; crash and health visuals start after it.
    #[inline]
    pub fn movement_window(&self) -> u64 {
        self.time_between_ticks() - self.next_tick_delay
    }

    /// How long pre-hit tones (and crash highlights) stay before resolving.
    ///
    /// Saturates at zero; [`PlaybackConfig::validate`] rejects timings where it would underflow.
    #[inline]
    pub fn indication_duration(&self) -> u64 {
        self.movement_window()
            .saturating_sub(self.hit_color_duration + self.missile_show_delay)
    }

    /// Offset at which a turned token starts translating.
    #[inline]
    pub fn translation_after_turn(&self) -> u64 {
        self.turn_delay + self.turn_duration
    }
    /// Latest offset any effect of a tick can land at, or `None` if the
    /// timeline does not fit in `u64` milliseconds.
    ///
    /// Crash highlights end at most one window after the movement window; health
    /// emphasis relaxes `health_zoom_duration` after it.
    pub fn checked_horizon(&self) -> Option<u64> {
        let cadence = self
            .turn_duration
            .checked_add(self.turn_delay)?
            .checked_add(self.move_duration)?
            .checked_add(self.next_tick_delay)?;
        let window = cadence - self.next_tick_delay;
        self.hit_color_duration.checked_add(self.missile_show_delay)?;
        let crash_end = window.checked_mul(2)?;
        let relax = window.checked_add(self.health_zoom_duration)?;
        Some(cadence.max(crash_end).max(relax))
    }
}

impl PlaybackConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.board.width == 0 || self.board.height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if self.board.strike_radius >= self.board.width.max(self.board.height) {
            return Err(ConfigError::InvalidStrikeRadius(self.board.strike_radius));
        }
        let t = &self.timing;
        if t.checked_horizon().is_none() {
            return Err(ConfigError::TimingOverflow);
        }
        if t.hit_color_duration + t.missile_show_delay > t.movement_window() {
            return Err(ConfigError::NegativeIndicationWindow {
                window: t.movement_window(),
                strike: t.hit_color_duration + t.missile_show_delay,
            });
        }
        if t.move_duration == 0 {
            return Err(ConfigError::ZeroMoveDuration);
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: PlaybackConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Board dimensions (width, height) must be non-zero")]
    InvalidDimensions,
    #[error("Strike radius {0} exceeds the board")]
    InvalidStrikeRadius(usize),
    #[error(
        "Missile show delay plus hit color duration ({strike}ms) exceeds the movement window ({window}ms)"
    )]
    NegativeIndicationWindow { window: u64, strike: u64 },
    #[error("Timing values overflow the millisecond clock")]
    TimingOverflow,
    #[error("Move duration must be positive")]
    ZeroMoveDuration,
    #[error("Board is {actual:?} but the config expects {expected:?}")]
    BoardMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeline() {
        let timing = TimingConfig::default();
        assert_eq!(timing.time_between_ticks(), 1300);
        assert_eq!(timing.movement_window(), 1300);
        assert_eq!(timing.indication_duration(), 900);
        assert_eq!(timing.translation_after_turn(), 300);
        assert!(PlaybackConfig::default().validate().is_ok());
    }

    #[test]
    fn test_next_tick_delay_stretches_cadence_only() {
        let timing = TimingConfig {
            next_tick_delay: 500,
            ..Default::default()
        };
        assert_eq!(timing.time_between_ticks(), 1800);
        assert_eq!(timing.movement_window(), 1300);
        assert_eq!(timing.indication_duration(), 900);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            PlaybackConfig::from_json(r#"{"timing": {"move_duration": 400}, "autoplay": false}"#)
                .unwrap();
        assert_eq!(config.timing.move_duration, 400);
        assert_eq!(config.timing.turn_duration, 200);
        assert_eq!(config.board, BoardConfig::default());
        assert!(!config.autoplay);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = PlaybackConfig::default();
        config.board.width = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDimensions)
        ));

        let mut config = PlaybackConfig::default();
        config.timing.missile_show_delay = 1200;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NegativeIndicationWindow { .. })
        ));

        let mut config = PlaybackConfig::default();
        config.board.strike_radius = 50;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidStrikeRadius(50))
        ));

        assert!(matches!(
            PlaybackConfig::from_json("{"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_validate_rejects_overflowing_timings() {
        let huge = u64::MAX;
        for json in [
            format!(r#"{{"timing": {{"move_duration": {huge}}}}}"#),
            format!(r#"{{"timing": {{"turn_delay": {huge}, "turn_duration": 1}}}}"#),
            format!(r#"{{"timing": {{"next_tick_delay": {huge}}}}}"#),
            format!(r#"{{"timing": {{"health_zoom_duration": {huge}}}}}"#),
            format!(r#"{{"timing": {{"hit_color_duration": {huge}, "missile_show_delay": 1}}}}"#),
            format!(r#"{{"timing": {{"move_duration": {}}}}}"#, huge / 2),
        ] {
            assert!(
                matches!(
                    PlaybackConfig::from_json(&json),
                    Err(ConfigError::TimingOverflow)
                ),
                "{json}"
            );
        }

        assert_eq!(TimingConfig::default().checked_horizon(), Some(2600));
    }
}
