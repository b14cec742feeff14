//! Configuration for the activity heat-map.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Upper bound accepted for `retention_duration`.
const MAX_RETENTION_DAYS: i64 = 365;

/// Main configuration for a heat-map view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pixel width of the drawing surface
    pub width: f64,

    /// Pixel height of the drawing surface
    pub height: f64,

    /// Space reserved around the plot for the axes
    pub margin: Margin,

    /// Trailing window of events kept alive
    #[serde(with = "duration_serde")]
    pub retention_duration: Duration,

    /// Cadence of the ingestion loop
    #[serde(with = "duration_serde")]
    pub ingest_period: Duration,

    /// Spacing of time-axis ticks, in minutes
    pub time_tick_minutes: u32,

    /// Number of intervals on the intensity axis (5 gives 0%, 20%, ... 100%)
    pub intensity_ticks: u32,

    /// Time zone used for clock-time tick labels
    pub timezone: Tz,

    /// Fill gradient keyed to the intensity axis
    pub gradient: GradientConfig,

    /// Optional hard cap on retained events
    pub max_events: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 400.0,
            margin: Margin::default(),
            retention_duration: Duration::from_secs(30 * 60),
            ingest_period: Duration::from_secs(5),
            time_tick_minutes: 5,
            intensity_ticks: 5,
            timezone: Tz::UTC,
            gradient: GradientConfig::default(),
            max_events: None,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults if it is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("activity-heatmap")
            .join("config.json")
    }

    /// Check that the configuration describes a drawable, bounded view.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.width.is_finite() && self.width > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "width must be positive, got {}",
                self.width
            )));
        }
        if !(self.height.is_finite() && self.height > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "height must be positive, got {}",
                self.height
            )));
        }
        if !self.margin.is_valid() {
            return Err(ConfigError::Invalid(
                "margins must be finite and non-negative".to_string(),
            ));
        }

        let area = self.drawing_area();
        if area.width() <= 0.0 || area.height() <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "margins leave no drawing area in a {}x{} surface",
                self.width, self.height
            )));
        }

        if self.retention_duration.is_zero() {
            return Err(ConfigError::Invalid(
                "retention_duration must be non-zero".to_string(),
            ));
        }
        if self.retention_duration.as_secs() > (MAX_RETENTION_DAYS as u64) * 86_400 {
            return Err(ConfigError::Invalid(format!(
                "retention_duration must not exceed {MAX_RETENTION_DAYS} days"
            )));
        }
        if self.ingest_period.is_zero() {
            return Err(ConfigError::Invalid(
                "ingest_period must be non-zero".to_string(),
            ));
        }
        if self.time_tick_minutes == 0 {
            return Err(ConfigError::Invalid(
                "time_tick_minutes must be non-zero".to_string(),
            ));
        }
        if self.intensity_ticks == 0 {
            return Err(ConfigError::Invalid(
                "intensity_ticks must be non-zero".to_string(),
            ));
        }
        if self.max_events == Some(0) {
            return Err(ConfigError::Invalid(
                "max_events must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Retention window as a chrono duration.
    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.retention_duration)
            .unwrap_or_else(|_| chrono::Duration::days(MAX_RETENTION_DAYS))
    }

    /// The inner pixel rectangle left after subtracting the margins.
    pub fn drawing_area(&self) -> DrawingArea {
        DrawingArea {
            left: self.margin.left,
            top: self.margin.top,
            right: self.width - self.margin.right,
            bottom: self.height - self.margin.bottom,
        }
    }
}

/// Fixed margins around the plot area, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margin {
    fn default() -> Self {
        Self {
            top: 20.0,
            right: 30.0,
            bottom: 30.0,
            left: 40.0,
        }
    }
}

impl Margin {
    fn is_valid(&self) -> bool {
        [self.top, self.right, self.bottom, self.left]
            .iter()
            .all(|m| m.is_finite() && *m >= 0.0)
    }
}

/// Pixel rectangle the plot is drawn into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawingArea {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl DrawingArea {
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// One color stop of the fill gradient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    /// CSS color, e.g. "#ef4444"
    pub color: String,
    /// Fill opacity in [0, 1]
    pub opacity: f64,
}

impl ColorStop {
    pub fn new(color: impl Into<String>, opacity: f64) -> Self {
        Self {
            color: color.into(),
            opacity,
        }
    }
}

/// The three-stop gradient mapping intensity to color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientConfig {
    /// Intensity 0
    pub low: ColorStop,
    /// Intensity 0.5
    pub mid: ColorStop,
    /// Intensity 1
    pub high: ColorStop,
}

impl Default for GradientConfig {
    fn default() -> Self {
        Self {
            low: ColorStop::new("#3b82f6", 0.2),
            mid: ColorStop::new("#f59e0b", 0.5),
            high: ColorStop::new("#ef4444", 0.8),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialize error: {0}")]
    Serialize(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Serde support for Duration.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
