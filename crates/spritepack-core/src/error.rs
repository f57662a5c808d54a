use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Sprite table error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Pixel buffer {width}x{height} expects {expected} bytes, got {actual}")]
    InvalidBuffer {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    /// The selected sprites can't fit into the atlas, even at `max_size`.
    #[error("the selected sprites can't fit into the atlas ({count} sprites, last tried {width}x{height}, max {max_size})")]
    PackingInfeasible {
        count: usize,
        width: u32,
        height: u32,
        max_size: u32,
    },
    #[error("Placement #{index} is inconsistent: requested {requested_w}x{requested_h}, placed {placed_w}x{placed_h}")]
    Inconsistent {
        index: usize,
        requested_w: u32,
        requested_h: u32,
        placed_w: u32,
        placed_h: u32,
    },
}

pub type Result<T> = std::result::Result<T, AtlasError>;
