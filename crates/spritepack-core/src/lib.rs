//! Core library for incremental sprite atlas rebuilds.
//!
//! - Packing: MaxRects free-list packer (BAF/BSSF/BLSF/BL/CP) plus a batch driver that grows the bin until everything fits
//! - Extraction: crop a sprite's pixels back out of an atlas bitmap
//! - Rebuild: `AtlasRebuilder` diffs an existing atlas against requested sprites, keeps the untouched ones and repacks
//! - Data model is serde-serializable; the sprite table is persisted as JSON by the host.
//!
//! Quick example:
//! ```ignore
//! use spritepack_core::prelude::*;
//! # fn main() -> anyhow::Result<()> {
//! let cfg = RebuildConfig::builder().padding(2).max_size(1024).build();
//! let rebuilder = AtlasRebuilder::new(cfg)?;
//! let sources = vec![
//!   SourceSprite::new("hero", PixelBuffer::new(64, 64)),
//!   SourceSprite::new("coin", PixelBuffer::new(16, 16)),
//! ];
//! let out = rebuilder.rebuild(None, sources)?;
//! println!("{}", out.outcome.atlas().stats().summary());
//! # Ok(()) }
//! ```

pub mod compositing;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod model;
pub mod packer;
pub mod pixel;
pub mod rebuild;

pub use config::*;
pub use error::*;
pub use export::*;
pub use extract::extract_region;
pub use model::*;
pub use packer::*;
pub use pixel::PixelBuffer;
pub use rebuild::*;

/// Convenience prelude for common types and functions.
/// Importing `spritepack_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{AtlasSettings, FilterMode, MaxRectsHeuristic, RebuildConfig};
    pub use crate::export::SpriteTable;
    pub use crate::extract::extract_region;
    pub use crate::model::{Atlas, AtlasStats, Rect, SpriteAlignment, SpriteMeta, SpriteRecord};
    pub use crate::packer::batch::{BatchConfig, BatchLayout, pack_batch};
    pub use crate::packer::maxrects::MaxRectsPacker;
    pub use crate::packer::{Packer, Placement};
    pub use crate::pixel::PixelBuffer;
    pub use crate::rebuild::{
        AtlasRebuilder, RebuildOutcome, RebuildOutput, RebuildPhase, RebuildReport, SourceSprite,
    };
}
