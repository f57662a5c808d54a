use crate::model::Rect;
use crate::pixel::PixelBuffer;

/// Crops `region` out of `source` into a standalone buffer.
///
/// The region origin is clamped into the source, and the size to what is
/// left of the source from there. Sampling is clamped to the inclusive box
/// `[x, min(x + w, width - 1)] x [y, min(y + h, height - 1)]`, so edge pixels
/// repeat instead of reading out of bounds. Rows keep the bottom-up order of
/// the source.
///
/// Returns `None` when the clamped region is empty; callers treat that as
/// "nothing to extract", not as a failure.
pub fn extract_region(source: &PixelBuffer, region: Rect) -> Option<PixelBuffer> {
    if source.is_empty() {
        return None;
    }
    let (sw, sh) = source.dimensions();

    let xmin = region.x.min(sw - 1);
    let ymin = region.y.min(sh - 1);
    let xmax = xmin.saturating_add(region.w).min(sw - 1);
    let ymax = ymin.saturating_add(region.h).min(sh - 1);

    let width = region.w.min(sw - xmin);
    let height = region.h.min(sh - ymin);
    if width == 0 || height == 0 {
        return None;
    }

    Some(PixelBuffer::from_fn(width, height, |x, y| {
        let sx = (xmin + x).clamp(xmin, xmax);
        let sy = (ymin + y).clamp(ymin, ymax);
        source.pixel(sx, sy).unwrap_or([0, 0, 0, 0])
    }))
}
