use super::{Packer, Placement};
use crate::config::MaxRectsHeuristic;
use crate::model::Rect;

/// MaxRects free-list packer over a single fixed-size bin.
///
/// `free` holds maximal empty rectangles (they may overlap each other),
/// `used` holds committed placements. Together they always cover the bin.
pub struct MaxRectsPacker {
    bin: Rect,
    allow_rotation: bool,
    free: Vec<Rect>,
    used: Vec<Rect>,
}

impl MaxRectsPacker {
    pub fn new(bin_width: u32, bin_height: u32, allow_rotation: bool) -> Self {
        let bin = Rect::new(0, 0, bin_width, bin_height);
        let free = if bin.is_empty() { Vec::new() } else { vec![bin] };
        Self {
            bin,
            allow_rotation,
            free,
            used: Vec::new(),
        }
    }

    pub fn bin_size(&self) -> (u32, u32) {
        (self.bin.w, self.bin.h)
    }

    pub fn free_rects(&self) -> &[Rect] {
        &self.free
    }

    pub fn used_rects(&self) -> &[Rect] {
        &self.used
    }

    pub fn free_list_len(&self) -> usize {
        self.free.len()
    }

    /// Fraction of the bin covered by placements.
    pub fn occupancy(&self) -> f64 {
        let bin_area = self.bin.area();
        if bin_area == 0 {
            return 0.0;
        }
        let used: u64 = self.used.iter().map(Rect::area).sum();
        used as f64 / bin_area as f64
    }

    fn split_free_node(fr: &Rect, node: &Rect, out: &mut Vec<Rect>) {
        let fr_x2 = fr.x + fr.w;
        let fr_y2 = fr.y + fr.h;
        let n_x2 = node.x + node.w;
        let n_y2 = node.y + node.h;

        // left
        if node.x > fr.x {
            out.push(Rect::new(fr.x, fr.y, node.x - fr.x, fr.h));
        }
        // right
        if n_x2 < fr_x2 {
            out.push(Rect::new(n_x2, fr.y, fr_x2 - n_x2, fr.h));
        }
        // below
        if node.y > fr.y {
            out.push(Rect::new(fr.x, fr.y, fr.w, node.y - fr.y));
        }
        // above
        if n_y2 < fr_y2 {
            out.push(Rect::new(fr.x, n_y2, fr.w, fr_y2 - n_y2));
        }
    }

    /// Drops every free rectangle contained in another one.
    ///
    /// Marks first, compacts after, so the list is never shrunk while being scanned.
    /// Of two identical rectangles the later one goes.
    fn prune_free_list(&mut self) {
        let n = self.free.len();
        let mut keep = vec![true; n];
        for i in 0..n {
            let a = self.free[i];
            for j in 0..n {
                if i == j || !keep[j] {
                    continue;
                }
                let b = self.free[j];
                if b.contains(&a) && (a != b || j < i) {
                    keep[i] = false;
                    break;
                }
            }
        }
        let mut flags = keep.into_iter();
        self.free.retain(|_| flags.next().unwrap_or(true));
    }

    fn score(&self, fr: &Rect, w: u32, h: u32, heuristic: MaxRectsHeuristic) -> (i64, i64) {
        let leftover_h = i64::from(fr.w) - i64::from(w);
        let leftover_v = i64::from(fr.h) - i64::from(h);
        let short_fit = leftover_h.min(leftover_v);
        let long_fit = leftover_h.max(leftover_v);
        let area_fit = fr.area() as i64 - (u64::from(w) * u64::from(h)) as i64;
        match heuristic {
            MaxRectsHeuristic::BestAreaFit => (area_fit, short_fit),
            MaxRectsHeuristic::BestShortSideFit => (short_fit, long_fit),
            MaxRectsHeuristic::BestLongSideFit => (long_fit, short_fit),
            MaxRectsHeuristic::BottomLeft => (i64::from(fr.y) + i64::from(h), i64::from(fr.x)),
            MaxRectsHeuristic::ContactPoint => {
                // maximize contact score: use negative for minimization
                let contact = self.contact_point_score(&Rect::new(fr.x, fr.y, w, h));
                (-(contact as i64), area_fit)
            }
        }
    }

    fn contact_point_score(&self, node: &Rect) -> u64 {
        let mut score = 0u64;
        // contact with bin edges
        if node.x == self.bin.x || node.x + node.w == self.bin.x + self.bin.w {
            score += u64::from(node.h);
        }
        if node.y == self.bin.y || node.y + node.h == self.bin.y + self.bin.h {
            score += u64::from(node.w);
        }

        // contact with used rectangles
        for u in &self.used {
            // left/right edges
            if node.x == u.x + u.w || u.x == node.x + node.w {
                score += u64::from(overlap_1d(node.y, node.y + node.h, u.y, u.y + u.h));
            }
            // top/bottom edges
            if node.y == u.y + u.h || u.y == node.y + node.h {
                score += u64::from(overlap_1d(node.x, node.x + node.w, u.x, u.x + u.w));
            }
        }
        score
    }
}

fn overlap_1d(a1: u32, a2: u32, b1: u32, b2: u32) -> u32 {
    let start = a1.max(b1);
    let end = a2.min(b2);
    end.saturating_sub(start)
}

impl Packer for MaxRectsPacker {
    fn find_position(&self, w: u32, h: u32, heuristic: MaxRectsHeuristic) -> Option<Placement> {
        if w == 0 || h == 0 {
            return None;
        }
        let mut best: Option<((i64, i64), Placement)> = None;
        let mut consider = |score: (i64, i64), rect: Rect, rotated: bool| {
            let better = match &best {
                None => true,
                // tie-break: lower top edge, then smaller x
                Some((s, p)) => {
                    (score, rect.y + rect.h, rect.x) < (*s, p.rect.y + p.rect.h, p.rect.x)
                }
            };
            if better {
                best = Some((score, Placement { rect, rotated }));
            }
        };

        for fr in &self.free {
            if fr.w >= w && fr.h >= h {
                consider(self.score(fr, w, h, heuristic), Rect::new(fr.x, fr.y, w, h), false);
            }
            if self.allow_rotation && w != h && fr.w >= h && fr.h >= w {
                consider(self.score(fr, h, w, heuristic), Rect::new(fr.x, fr.y, h, w), true);
            }
        }
        best.map(|(_, p)| p)
    }

    fn place(&mut self, placement: &Placement) {
        let node = placement.rect;
        let mut next: Vec<Rect> = Vec::with_capacity(self.free.len() + 4);
        for fr in &self.free {
            if fr.intersects(&node) {
                Self::split_free_node(fr, &node, &mut next);
            } else {
                next.push(*fr);
            }
        }
        self.free = next;
        self.prune_free_list();
        self.used.push(node);
    }
}
