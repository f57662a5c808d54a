use crate::config::AtlasSettings;
use crate::pixel::PixelBuffer;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle (pixels). `x,y` is the bottom-left corner; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Inclusive right edge coordinate (`x + w - 1`).
    pub fn right(&self) -> u32 {
        self.x + self.w.saturating_sub(1)
    }
    /// Inclusive top edge coordinate (`y + h - 1`).
    pub fn top(&self) -> u32 {
        self.y + self.h.saturating_sub(1)
    }
    pub fn area(&self) -> u64 {
        u64::from(self.w) * u64::from(self.h)
    }
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
    /// Returns true if `r` is fully inside `self` (inclusive edges).
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.top() <= self.top()
    }
    /// Separating-axis test; rectangles that merely touch do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        !(self.x >= other.x + other.w
            || other.x >= self.x + self.w
            || self.y >= other.y + other.h
            || other.y >= self.y + self.h)
    }
}

/// Where the pivot sits relative to the sprite rectangle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpriteAlignment {
    #[default]
    Center,
    TopLeft,
    TopCenter,
    TopRight,
    LeftCenter,
    RightCenter,
    BottomLeft,
    BottomCenter,
    BottomRight,
    Custom,
}

/// Non-geometric sprite data carried forward verbatim across rebuilds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SpriteMeta {
    /// 9-slice border in pixels: left, bottom, right, top.
    #[serde(default)]
    pub border: [u32; 4],
    /// Normalized pivot; only meaningful with [`SpriteAlignment::Custom`].
    #[serde(default = "default_pivot")]
    pub pivot: (f32, f32),
    #[serde(default)]
    pub alignment: SpriteAlignment,
}

impl Default for SpriteMeta {
    fn default() -> Self {
        Self {
            border: [0; 4],
            pivot: default_pivot(),
            alignment: SpriteAlignment::default(),
        }
    }
}

fn default_pivot() -> (f32, f32) {
    (0.5, 0.5)
}

/// One named sub-rectangle of an atlas.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpriteRecord {
    pub name: String,
    /// Stable identifier; matched before `name` when both sides carry one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    pub rect: Rect,
    #[serde(default)]
    pub meta: SpriteMeta,
}

impl SpriteRecord {
    pub fn new(name: impl Into<String>, rect: Rect) -> Self {
        Self {
            name: name.into(),
            guid: None,
            rect,
            meta: SpriteMeta::default(),
        }
    }

    pub fn with_guid(mut self, guid: impl Into<String>) -> Self {
        self.guid = Some(guid.into());
        self
    }

    pub fn with_meta(mut self, meta: SpriteMeta) -> Self {
        self.meta = meta;
        self
    }

    /// Non-empty guid, if any.
    pub fn guid(&self) -> Option<&str> {
        self.guid.as_deref().filter(|g| !g.is_empty())
    }
}

/// Composited bitmap plus its sprite table.
#[derive(Debug, Clone, Default)]
pub struct Atlas {
    texture: PixelBuffer,
    pub sprites: Vec<SpriteRecord>,
    pub settings: AtlasSettings,
}

impl Atlas {
    /// Empty atlas (no bitmap, no sprites).
    pub fn new(settings: AtlasSettings) -> Self {
        Self {
            texture: PixelBuffer::empty(),
            sprites: Vec::new(),
            settings,
        }
    }

    pub fn with_texture(
        texture: PixelBuffer,
        sprites: Vec<SpriteRecord>,
        settings: AtlasSettings,
    ) -> Self {
        Self {
            texture,
            sprites,
            settings,
        }
    }

    pub fn texture(&self) -> &PixelBuffer {
        &self.texture
    }

    /// Install a new backing bitmap, returning the previous one.
    pub fn replace_texture(&mut self, texture: PixelBuffer) -> PixelBuffer {
        std::mem::replace(&mut self.texture, texture)
    }

    pub fn width(&self) -> u32 {
        self.texture.width()
    }

    pub fn height(&self) -> u32 {
        self.texture.height()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    pub fn sprite(&self, name: &str) -> Option<&SpriteRecord> {
        self.sprites.iter().find(|s| s.name == name)
    }

    /// Computes packing statistics for this atlas.
    pub fn stats(&self) -> AtlasStats {
        let total_area = self.texture.area();
        let used_area: u64 = self.sprites.iter().map(|s| s.rect.area()).sum();
        let occupancy = if total_area > 0 {
            used_area as f64 / total_area as f64
        } else {
            0.0
        };
        AtlasStats {
            num_sprites: self.sprites.len(),
            width: self.texture.width(),
            height: self.texture.height(),
            total_area,
            used_area,
            occupancy,
        }
    }
}

/// Statistics about atlas packing efficiency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AtlasStats {
    pub num_sprites: usize,
    pub width: u32,
    pub height: u32,
    /// `width * height` of the bitmap.
    pub total_area: u64,
    /// Sum of sprite rectangle areas.
    pub used_area: u64,
    /// used_area / total_area (0.0 to 1.0). Higher is better.
    pub occupancy: f64,
}

impl AtlasStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Sprites: {}, Size: {}x{}, Occupancy: {:.2}%, Used Area: {} px², Wasted: {} px²",
            self.num_sprites,
            self.width,
            self.height,
            self.occupancy * 100.0,
            self.used_area,
            self.wasted_area(),
        )
    }

    /// Returns wasted space in pixels.
    pub fn wasted_area(&self) -> u64 {
        self.total_area.saturating_sub(self.used_area)
    }
}
