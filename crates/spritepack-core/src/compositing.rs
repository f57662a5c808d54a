use crate::pixel::{CHANNELS, PixelBuffer};

/// Copy all of `src` into `canvas` with its bottom-left corner at `(dx, dy)`.
///
/// Rows and columns falling outside `canvas` are clipped. Returns the number
/// of pixels written.
pub fn blit(src: &PixelBuffer, canvas: &mut PixelBuffer, dx: u32, dy: u32) -> u64 {
    let (cw, ch) = canvas.dimensions();
    if src.is_empty() || dx >= cw || dy >= ch {
        return 0;
    }
    let cols = src.width().min(cw - dx) as usize;
    let rows = src.height().min(ch - dy);
    let dst_start = dx as usize * CHANNELS;
    let span = cols * CHANNELS;

    for yy in 0..rows {
        let line = &src.row(yy)[..span];
        canvas.row_mut(dy + yy)[dst_start..dst_start + span].copy_from_slice(line);
    }
    cols as u64 * u64::from(rows)
}

