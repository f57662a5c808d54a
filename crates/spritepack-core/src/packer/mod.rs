use crate::config::MaxRectsHeuristic;
use crate::model::Rect;

pub mod batch;
pub mod maxrects;

/// A packer places rectangles into a fixed-size bin.
///
/// Implementations must ensure no overlaps and stay inside the bin.
/// `find_position` only scores; `place` commits a position it returned.
pub trait Packer {
    fn find_position(&self, w: u32, h: u32, heuristic: MaxRectsHeuristic) -> Option<Placement>;
    fn place(&mut self, placement: &Placement);

    /// Score and commit in one step. Returns `None` if the rectangle does not fit.
    fn insert(&mut self, w: u32, h: u32, heuristic: MaxRectsHeuristic) -> Option<Placement> {
        let placement = self.find_position(w, h, heuristic)?;
        self.place(&placement);
        Some(placement)
    }
}

/// A position in the bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Occupied rectangle (post-rotation width/height).
    pub rect: Rect,
    /// True if the request was rotated 90° to fit.
    pub rotated: bool,
}
