//! Atlas-level batch packing: sort, place with padding, grow the bin and
//! restart until everything fits or `max_size` is exhausted.

use super::{Packer, Placement, maxrects::MaxRectsPacker};
use crate::config::{MaxRectsHeuristic, RebuildConfig};
use crate::error::{AtlasError, Result};
use crate::model::Rect;
use tracing::{debug, instrument, trace};

/// Parameters of one batch pack.
#[derive(Debug, Clone, Copy)]
pub struct BatchConfig {
    /// Gap reserved to the right of and above every rectangle.
    pub padding: u32,
    pub max_size: u32,
    pub force_square: bool,
    pub heuristic: MaxRectsHeuristic,
    /// Bin size to start from when it is at least the minimal guess.
    pub size_hint: Option<(u32, u32)>,
}

impl From<&RebuildConfig> for BatchConfig {
    fn from(cfg: &RebuildConfig) -> Self {
        Self {
            padding: cfg.settings.padding,
            max_size: cfg.max_size,
            force_square: cfg.settings.force_square,
            heuristic: cfg.heuristic,
            size_hint: None,
        }
    }
}

/// Result of a successful batch pack.
#[derive(Debug, Clone)]
pub struct BatchLayout {
    /// Final bin width.
    pub width: u32,
    /// Final bin height.
    pub height: u32,
    /// One entry per input, in input order. `None` for skipped inputs.
    pub rects: Vec<Option<Rect>>,
    /// Number of bin sizes tried.
    pub attempts: u32,
}

/// Packs `sizes` into the smallest bin the growing policy reaches.
///
/// `None` and zero-sized entries are skipped but keep their slot in the output.
/// Fails with [`AtlasError::PackingInfeasible`] when the set does not fit at `max_size`.
#[instrument(skip_all, fields(count = sizes.len()))]
pub fn pack_batch(sizes: &[Option<(u32, u32)>], cfg: &BatchConfig) -> Result<BatchLayout> {
    // largest first; sort_by is stable so equal areas keep input order
    let mut order: Vec<usize> = (0..sizes.len())
        .filter(|&i| matches!(sizes[i], Some((w, h)) if w > 0 && h > 0))
        .collect();
    order.sort_by(|&a, &b| area_of(sizes[b]).cmp(&area_of(sizes[a])));

    if order.is_empty() {
        return Ok(BatchLayout {
            width: 0,
            height: 0,
            rects: vec![None; sizes.len()],
            attempts: 0,
        });
    }

    let infeasible = |width: u32, height: u32| AtlasError::PackingInfeasible {
        count: order.len(),
        width,
        height,
        max_size: cfg.max_size,
    };

    let (mut w, mut h) = initial_size(sizes, &order, cfg).ok_or_else(|| infeasible(0, 0))?;
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        trace!(w, h, attempts, "trying bin size");
        if let Some(rects) = try_pack(sizes, &order, w, h, cfg)? {
            debug!(w, h, attempts, placed = order.len(), "batch packed");
            return Ok(BatchLayout {
                width: w,
                height: h,
                rects,
                attempts,
            });
        }
        match grow(w, h, cfg.max_size, cfg.force_square) {
            Some((nw, nh)) => {
                debug!(from_w = w, from_h = h, to_w = nw, to_h = nh, "batch did not fit, growing");
                w = nw;
                h = nh;
            }
            None => return Err(infeasible(w, h)),
        }
    }
}

fn area_of(size: Option<(u32, u32)>) -> u64 {
    size.map_or(0, |(w, h)| u64::from(w) * u64::from(h))
}

/// Smallest power-of-two bin holding the largest candidate whose area covers the total.
fn initial_size(
    sizes: &[Option<(u32, u32)>],
    order: &[usize],
    cfg: &BatchConfig,
) -> Option<(u32, u32)> {
    let mut max_w = 0u32;
    let mut max_h = 0u32;
    let mut total = 0u64;
    for &i in order {
        if let Some((sw, sh)) = sizes[i] {
            max_w = max_w.max(sw);
            max_h = max_h.max(sh);
            total += u64::from(sw) * u64::from(sh);
        }
    }
    if max_w > cfg.max_size || max_h > cfg.max_size {
        return None;
    }

    let mut w = next_pow2(max_w).min(cfg.max_size);
    let mut h = next_pow2(max_h).min(cfg.max_size);
    if cfg.force_square {
        w = w.max(h);
        h = w;
    }
    while u64::from(w) * u64::from(h) < total {
        (w, h) = grow(w, h, cfg.max_size, cfg.force_square)?;
    }

    if let Some((hw, hh)) = cfg.size_hint {
        let fits = hw >= w && hh >= h && hw <= cfg.max_size && hh <= cfg.max_size;
        if fits && (!cfg.force_square || hw == hh) {
            return Some((hw, hh));
        }
    }
    Some((w, h))
}

/// Next bin size: double the smaller side (width on ties), clamped to `max`.
fn grow(w: u32, h: u32, max: u32, square: bool) -> Option<(u32, u32)> {
    let step = |v: u32| v.saturating_mul(2).max(1).min(max);
    if square {
        let side = w.max(h);
        return (side < max).then(|| (step(side), step(side)));
    }
    if w <= h && w < max {
        Some((step(w), h))
    } else if h < max {
        Some((w, step(h)))
    } else if w < max {
        Some((step(w), h))
    } else {
        None
    }
}

/// One pass at a fixed bin size. `Ok(None)` means some candidate did not fit.
fn try_pack(
    sizes: &[Option<(u32, u32)>],
    order: &[usize],
    w: u32,
    h: u32,
    cfg: &BatchConfig,
) -> Result<Option<Vec<Option<Rect>>>> {
    let mut packer = MaxRectsPacker::new(w, h, false);
    let mut rects: Vec<Option<Rect>> = vec![None; sizes.len()];
    for &idx in order {
        let Some((sw, sh)) = sizes[idx] else { continue };
        let Some((placement, pad_x, pad_y)) = find_padded(&packer, sw, sh, cfg) else {
            return Ok(None);
        };
        packer.place(&placement);

        let placed = placement.rect;
        if placed.w.checked_sub(pad_x) != Some(sw) || placed.h.checked_sub(pad_y) != Some(sh) {
            return Err(AtlasError::Inconsistent {
                index: idx,
                requested_w: sw,
                requested_h: sh,
                placed_w: placed.w.saturating_sub(pad_x),
                placed_h: placed.h.saturating_sub(pad_y),
            });
        }
        rects[idx] = Some(Rect::new(placed.x, placed.y, sw, sh));
    }
    Ok(Some(rects))
}

/// Try full padding, then drop it on one axis, then on both.
///
/// Padding on an axis may only be dropped when the placement ends on the bin's
/// far edge along that axis, where nothing can follow it.
fn find_padded(
    packer: &MaxRectsPacker,
    sw: u32,
    sh: u32,
    cfg: &BatchConfig,
) -> Option<(Placement, u32, u32)> {
    let p = cfg.padding;
    let (bin_w, bin_h) = packer.bin_size();
    let variants = if p == 0 {
        vec![(0, 0)]
    } else {
        vec![(p, p), (0, p), (p, 0), (0, 0)]
    };
    for (px, py) in variants {
        let Some(placement) = packer.find_position(sw + px, sh + py, cfg.heuristic) else {
            continue;
        };
        let r = placement.rect;
        let x_ok = px == p || r.x + r.w == bin_w;
        let y_ok = py == p || r.y + r.h == bin_h;
        if x_ok && y_ok {
            return Some((placement, px, py));
        }
    }
    None
}

fn next_pow2(mut v: u32) -> u32 {
    if v <= 1 {
        return 1;
    }
    v -= 1;
    v |= v >> 1;
    v |= v >> 2;
    v |= v >> 4;
    v |= v >> 8;
    v |= v >> 16;
    v.saturating_add(1)
}
