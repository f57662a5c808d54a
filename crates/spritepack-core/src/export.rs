use crate::config::AtlasSettings;
use crate::error::{AtlasError, Result};
use crate::model::{Atlas, SpriteRecord};
use crate::pixel::PixelBuffer;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Current sprite table schema.
pub const SCHEMA_VERSION: &str = "1";

/// Persisted form of an atlas without its pixels.
///
/// Sprite rectangles use a bottom-left origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpriteTable {
    /// String to allow non-integer versions like "1.0"; current: "1".
    pub schema_version: String,
    pub app: String,
    pub version: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub settings: AtlasSettings,
    #[serde(default)]
    pub sprites: Vec<SpriteRecord>,
}

impl SpriteTable {
    pub fn from_atlas(atlas: &Atlas) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.into(),
            app: "spritepack".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            width: atlas.width(),
            height: atlas.height(),
            settings: atlas.settings,
            sprites: atlas.sprites.clone(),
        }
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Joins the table with its bitmap. The bitmap must match the recorded size.
    pub fn into_atlas(self, texture: PixelBuffer) -> Result<Atlas> {
        if texture.dimensions() != (self.width, self.height) {
            return Err(AtlasError::InvalidDimensions {
                width: texture.width(),
                height: texture.height(),
            });
        }
        Ok(Atlas::with_texture(texture, self.sprites, self.settings))
    }
}

/// Flatten sprites keyed by name.
/// Shape: `{ frames: { name: { frame, border, pivot, alignment } }, meta }`,
/// close to the TexturePacker JSON hash most engine importers accept.
/// Frame `y` is converted to a top-left origin.
pub fn to_json_hash(atlas: &Atlas) -> Value {
    let h = atlas.height();
    let mut frames = serde_json::Map::new();
    for s in &atlas.sprites {
        let r = s.rect;
        let top = h.saturating_sub(r.y + r.h);
        frames.insert(
            s.name.clone(),
            json!({
                "frame": {"x": r.x, "y": top, "w": r.w, "h": r.h},
                "rotated": false,
                "trimmed": false,
                "sourceSize": {"w": r.w, "h": r.h},
                "border": s.meta.border,
                "pivot": {"x": s.meta.pivot.0, "y": s.meta.pivot.1},
                "alignment": s.meta.alignment,
            }),
        );
    }
    json!({
        "frames": frames,
        "meta": {
            "app": "spritepack",
            "version": env!("CARGO_PKG_VERSION"),
            "format": "RGBA8888",
            "size": {"w": atlas.width(), "h": h},
            "scale": 1.0,
            "pixelsPerUnit": atlas.settings.pixels_per_unit,
            "filterMode": atlas.settings.filter_mode,
            "padding": atlas.settings.padding,
        }
    })
}
