use crate::alignment::DEFAULT_PLACEHOLDER;
use crate::error::{LyricError, Result};
use crate::highlight::DEFAULT_WRAP_WIDTH;
use crate::rescale::{validate_factor, DEFAULT_SPEED_FACTOR};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub speed_factor: f64,
    /// Aligner token standing for a heard-but-untranscribed word.
    pub placeholder: String,
    pub wrap_width: usize,
    pub color_offset: usize,
    /// Length of the sped-up audio clip handed to the speed changer.
    pub clip_duration_ms: u64,
}

impl PipelineConfig {
    pub const SPEED_FACTOR_ENV: &'static str = "LYRIC_CLIP_SPEED_FACTOR";
    pub const DEFAULT_CLIP_DURATION_MS: u64 = 31_000;

    /// Apply the speed factor override from the environment, if set.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(raw) = std::env::var(Self::SPEED_FACTOR_ENV) {
            let factor: f64 = raw
                .trim()
                .parse()
                .map_err(|_| LyricError::UnparsableSpeedFactor(raw.clone()))?;
            self.speed_factor = factor;
        }
        self.validate()
    }

    pub fn validate(self) -> Result<Self> {
        validate_factor(self.speed_factor)?;
        Ok(self)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            speed_factor: DEFAULT_SPEED_FACTOR,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            wrap_width: DEFAULT_WRAP_WIDTH,
            color_offset: 0,
            clip_duration_ms: Self::DEFAULT_CLIP_DURATION_MS,
        }
    }
}
