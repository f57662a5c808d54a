use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Largest padding accepted between packed sprites.
pub const MAX_PADDING: u32 = 10;

/// MaxRects placement heuristics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MaxRectsHeuristic {
    BestAreaFit,
    BestShortSideFit,
    BestLongSideFit,
    BottomLeft,
    ContactPoint,
}

impl FromStr for MaxRectsHeuristic {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "baf" | "bestareafit" => Ok(Self::BestAreaFit),
            "bssf" | "bestshortsidefit" => Ok(Self::BestShortSideFit),
            "blsf" | "bestlongsidefit" => Ok(Self::BestLongSideFit),
            "bl" | "bottomleft" => Ok(Self::BottomLeft),
            "cp" | "contactpoint" => Ok(Self::ContactPoint),
            _ => Err(()),
        }
    }
}

/// Texture sampling mode stored alongside the atlas. Not used by packing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    Point,
    #[default]
    Bilinear,
    Trilinear,
}

impl FromStr for FilterMode {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "point" | "nearest" => Ok(Self::Point),
            "bilinear" | "linear" => Ok(Self::Bilinear),
            "trilinear" => Ok(Self::Trilinear),
            _ => Err(()),
        }
    }
}

/// Settings that travel with an atlas across rebuilds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AtlasSettings {
    /// Pixels reserved between packed sprites (0..=10).
    #[serde(default = "default_padding")]
    pub padding: u32,
    /// Scale factor for consumers; packing ignores it.
    #[serde(default = "default_pixels_per_unit")]
    pub pixels_per_unit: f32,
    #[serde(default)]
    pub filter_mode: FilterMode,
    /// Keep the bin square while growing.
    #[serde(default)]
    pub force_square: bool,
}

impl Default for AtlasSettings {
    fn default() -> Self {
        Self {
            padding: default_padding(),
            pixels_per_unit: default_pixels_per_unit(),
            filter_mode: FilterMode::default(),
            force_square: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebuildConfig {
    /// Settings written into the rebuilt atlas.
    #[serde(flatten)]
    pub settings: AtlasSettings,
    /// Hard ceiling for the bin width and height.
    #[serde(default = "default_max_size")]
    pub max_size: u32,
    #[serde(default = "default_heuristic")]
    pub heuristic: MaxRectsHeuristic,
    /// Start growing from the previous atlas size instead of the minimal guess.
    #[serde(default)]
    pub reuse_size_hint: bool,
}

impl Default for RebuildConfig {
    fn default() -> Self {
        Self {
            settings: AtlasSettings::default(),
            max_size: default_max_size(),
            heuristic: default_heuristic(),
            reuse_size_hint: false,
        }
    }
}

impl RebuildConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if:
    /// - `max_size` is zero
    /// - padding is above [`MAX_PADDING`] or leaves no usable space
    /// - pixels-per-unit is not a positive finite number
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::AtlasError;

        if self.max_size == 0 {
            return Err(AtlasError::InvalidDimensions {
                width: self.max_size,
                height: self.max_size,
            });
        }

        let padding = self.settings.padding;
        if padding > MAX_PADDING {
            return Err(AtlasError::InvalidConfig(format!(
                "padding ({}) must be within 0..={}",
                padding, MAX_PADDING
            )));
        }
        if padding >= self.max_size {
            return Err(AtlasError::InvalidConfig(format!(
                "padding ({}) leaves no usable space in a {}px bin",
                padding, self.max_size
            )));
        }

        let ppu = self.settings.pixels_per_unit;
        if !ppu.is_finite() || ppu <= 0.0 {
            return Err(AtlasError::InvalidConfig(format!(
                "pixels_per_unit ({}) must be a positive number",
                ppu
            )));
        }

        Ok(())
    }

    /// Create a fluent builder for `RebuildConfig`.
    pub fn builder() -> RebuildConfigBuilder {
        RebuildConfigBuilder::new()
    }
}

fn default_padding() -> u32 {
    2
}
fn default_pixels_per_unit() -> f32 {
    100.0
}
fn default_max_size() -> u32 {
    2048
}
fn default_heuristic() -> MaxRectsHeuristic {
    MaxRectsHeuristic::BestAreaFit
}

/// Builder for `RebuildConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct RebuildConfigBuilder {
    cfg: RebuildConfig,
}

impl RebuildConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: RebuildConfig::default(),
        }
    }
    /// Start from the settings of an existing atlas.
    pub fn settings(mut self, v: AtlasSettings) -> Self {
        self.cfg.settings = v;
        self
    }
    pub fn padding(mut self, v: u32) -> Self {
        self.cfg.settings.padding = v;
        self
    }
    pub fn pixels_per_unit(mut self, v: f32) -> Self {
        self.cfg.settings.pixels_per_unit = v;
        self
    }
    pub fn filter_mode(mut self, v: FilterMode) -> Self {
        self.cfg.settings.filter_mode = v;
        self
    }
    pub fn force_square(mut self, v: bool) -> Self {
        self.cfg.settings.force_square = v;
        self
    }
    pub fn max_size(mut self, v: u32) -> Self {
        self.cfg.max_size = v;
        self
    }
    pub fn heuristic(mut self, v: MaxRectsHeuristic) -> Self {
        self.cfg.heuristic = v;
        self
    }
    pub fn reuse_size_hint(mut self, v: bool) -> Self {
        self.cfg.reuse_size_hint = v;
        self
    }
    pub fn build(self) -> RebuildConfig {
        self.cfg
    }
}
