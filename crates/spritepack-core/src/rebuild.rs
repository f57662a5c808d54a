//! Incremental atlas rebuilds.
//!
//! A rebuild reconciles the sprite table of an existing atlas with a new list
//! of requested sprites, re-extracts the pixels of sprites that were not
//! requested, packs everything again and composites a fresh bitmap:
//!
//! `Idle -> Diffing -> Extracting -> Packing -> Compositing -> Done`,
//! or `Packing -> Aborted` when the sprites do not fit.
//!
//! The existing atlas is only borrowed; a failed rebuild leaves it untouched.

use crate::compositing::blit;
use crate::config::{AtlasSettings, RebuildConfig};
use crate::error::Result;
use crate::extract::extract_region;
use crate::model::{Atlas, SpriteMeta, SpriteRecord};
use crate::packer::batch::{BatchConfig, pack_batch};
use crate::pixel::PixelBuffer;
use std::collections::HashSet;
use tracing::{debug, instrument, warn};

/// A requested sprite: identity plus its newly supplied bitmap.
#[derive(Debug, Clone)]
pub struct SourceSprite {
    pub name: String,
    pub guid: Option<String>,
    /// `None` when the host could not provide a bitmap; the entry is skipped.
    pub image: Option<PixelBuffer>,
}

impl SourceSprite {
    pub fn new(name: impl Into<String>, image: PixelBuffer) -> Self {
        Self {
            name: name.into(),
            guid: None,
            image: Some(image),
        }
    }

    pub fn with_guid(mut self, guid: impl Into<String>) -> Self {
        self.guid = Some(guid.into());
        self
    }

    fn guid(&self) -> Option<&str> {
        self.guid.as_deref().filter(|g| !g.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildPhase {
    Idle,
    Diffing,
    Extracting,
    Packing,
    Compositing,
    Done,
    Aborted,
}

impl RebuildPhase {
    fn can_enter(self, next: RebuildPhase) -> bool {
        use RebuildPhase::*;
        matches!(
            (self, next),
            (Idle, Diffing)
                | (Diffing, Extracting)
                | (Extracting, Packing)
                | (Extracting, Done)
                | (Packing, Compositing)
                | (Packing, Aborted)
                | (Compositing, Done)
        )
    }
}

/// What happened to each sprite during a rebuild.
#[derive(Debug, Clone, Default)]
pub struct RebuildReport {
    /// Phases visited, in order, starting with `Idle`.
    pub phases: Vec<RebuildPhase>,
    /// Existing sprites replaced by a requested bitmap (metadata inherited).
    pub replaced: Vec<String>,
    /// Existing sprites not requested, carried over with their old pixels.
    pub preserved: Vec<String>,
    /// Requested sprites with no existing counterpart.
    pub added: Vec<String>,
    /// Sprites that ended up absent from the result.
    pub dropped: Vec<String>,
    /// Identity collisions and other recoverable oddities.
    pub warnings: Vec<String>,
    /// Bin sizes tried by the batch packer.
    pub attempts: u32,
}

impl RebuildReport {
    pub fn final_phase(&self) -> RebuildPhase {
        self.phases.last().copied().unwrap_or(RebuildPhase::Idle)
    }

    fn enter(&mut self, next: RebuildPhase) {
        let current = self.final_phase();
        debug_assert!(current.can_enter(next), "{current:?} -> {next:?}");
        debug!(from = ?current, to = ?next, "rebuild phase");
        self.phases.push(next);
    }
}

#[derive(Debug)]
pub enum RebuildOutcome {
    /// The new atlas, ready to be persisted.
    Success(Atlas),
    /// Nothing left to pack: empty atlas with default settings; the host should
    /// remove the stored bitmap.
    Deleted(Atlas),
}

impl RebuildOutcome {
    pub fn atlas(&self) -> &Atlas {
        match self {
            Self::Success(a) | Self::Deleted(a) => a,
        }
    }

    pub fn into_atlas(self) -> Atlas {
        match self {
            Self::Success(a) | Self::Deleted(a) => a,
        }
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted(_))
    }
}

#[derive(Debug)]
pub struct RebuildOutput {
    pub outcome: RebuildOutcome,
    pub report: RebuildReport,
}

/// Where a candidate came from; decides which report list it lands in.
enum Origin {
    Added,
    /// Replaces the existing record of that name.
    Replaced(String),
    Preserved,
}

/// Sprite entering the packer: final identity, metadata and pixels.
struct Candidate {
    name: String,
    guid: Option<String>,
    meta: SpriteMeta,
    pixels: PixelBuffer,
    origin: Origin,
}

impl Candidate {
    fn guid(&self) -> Option<&str> {
        self.guid.as_deref().filter(|g| !g.is_empty())
    }
}

/// Runs rebuilds with one configuration. Holds no state between calls.
#[derive(Debug, Clone)]
pub struct AtlasRebuilder {
    config: RebuildConfig,
}

impl AtlasRebuilder {
    pub fn new(config: RebuildConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RebuildConfig {
        &self.config
    }

    /// Rebuilds `existing` (or a fresh atlas) so that it contains `sources`
    /// plus every existing sprite the sources do not replace.
    ///
    /// Fails with [`crate::AtlasError::PackingInfeasible`] when the result
    /// does not fit into `max_size`; nothing is modified in that case.
    #[instrument(
        skip_all,
        fields(sources = sources.len(), existing = existing.map_or(0, |a| a.sprites.len()))
    )]
    pub fn rebuild(
        &self,
        existing: Option<&Atlas>,
        sources: Vec<SourceSprite>,
    ) -> Result<RebuildOutput> {
        let mut report = RebuildReport {
            phases: vec![RebuildPhase::Idle],
            ..Default::default()
        };

        report.enter(RebuildPhase::Diffing);
        let mut incoming = collect_incoming(sources, &mut report);
        let leftovers = match existing {
            Some(atlas) => diff(atlas, &mut incoming),
            None => Vec::new(),
        };

        report.enter(RebuildPhase::Extracting);
        let mut preserved = Vec::with_capacity(leftovers.len());
        if let Some(atlas) = existing {
            for rec in leftovers {
                match extract_region(atlas.texture(), rec.rect) {
                    Some(pixels) => {
                        preserved.push(Candidate {
                            name: rec.name.clone(),
                            guid: rec.guid.clone(),
                            meta: rec.meta,
                            pixels,
                            origin: Origin::Preserved,
                        });
                    }
                    None => {
                        debug!(
                            name = %rec.name,
                            rect = ?rec.rect,
                            "degenerate region, dropping sprite"
                        );
                        report.dropped.push(rec.name.clone());
                    }
                }
            }
        }

        let candidates = dedupe(incoming.into_iter().chain(preserved), &mut report);
        for cand in &candidates {
            match &cand.origin {
                Origin::Added => report.added.push(cand.name.clone()),
                Origin::Replaced(old) => report.replaced.push(old.clone()),
                Origin::Preserved => report.preserved.push(cand.name.clone()),
            }
        }
        if candidates.is_empty() {
            report.enter(RebuildPhase::Done);
            debug!("no sprites left, atlas deleted");
            return Ok(RebuildOutput {
                outcome: RebuildOutcome::Deleted(Atlas::new(AtlasSettings::default())),
                report,
            });
        }

        report.enter(RebuildPhase::Packing);
        let sizes: Vec<Option<(u32, u32)>> = candidates
            .iter()
            .map(|c| Some(c.pixels.dimensions()))
            .collect();
        let mut batch_cfg = BatchConfig::from(&self.config);
        if self.config.reuse_size_hint {
            batch_cfg.size_hint = existing
                .filter(|a| !a.texture().is_empty())
                .map(|a| a.texture().dimensions());
        }
        let layout = match pack_batch(&sizes, &batch_cfg) {
            Ok(layout) => layout,
            Err(e) => {
                report.enter(RebuildPhase::Aborted);
                warn!(error = %e, sprites = candidates.len(), "rebuild aborted");
                return Err(e);
            }
        };
        report.attempts = layout.attempts;

        report.enter(RebuildPhase::Compositing);
        let mut canvas = PixelBuffer::new(layout.width, layout.height);
        let mut sprites = Vec::with_capacity(candidates.len());
        for (cand, rect) in candidates.into_iter().zip(layout.rects) {
            let Some(rect) = rect else {
                report.dropped.push(cand.name);
                continue;
            };
            blit(&cand.pixels, &mut canvas, rect.x, rect.y);
            // cand.pixels is released at the end of this iteration
            sprites.push(SpriteRecord {
                name: cand.name,
                guid: cand.guid,
                rect,
                meta: cand.meta,
            });
        }

        let mut atlas = Atlas::new(self.config.settings);
        atlas.replace_texture(canvas);
        atlas.sprites = sprites;
        report.enter(RebuildPhase::Done);
        debug!(
            width = atlas.width(),
            height = atlas.height(),
            sprites = atlas.sprites.len(),
            "rebuild done"
        );
        Ok(RebuildOutput {
            outcome: RebuildOutcome::Success(atlas),
            report,
        })
    }
}

/// Turns requested sprites into candidates, skipping those without pixels.
fn collect_incoming(sources: Vec<SourceSprite>, report: &mut RebuildReport) -> Vec<Candidate> {
    let mut out = Vec::with_capacity(sources.len());
    for src in sources {
        let guid = src.guid().map(str::to_owned);
        match src.image {
            Some(pixels) if !pixels.is_empty() => out.push(Candidate {
                name: src.name,
                guid,
                meta: SpriteMeta::default(),
                pixels,
                origin: Origin::Added,
            }),
            _ => {
                debug!(name = %src.name, "requested sprite has no pixels, skipping");
                report.dropped.push(src.name);
            }
        }
    }
    out
}

/// Matches existing records against incoming candidates.
///
/// Guids are matched across all records before any name is, so a name match
/// never takes a candidate another record owns by guid. Names never match
/// when both sides carry different guids. A match hands the record's metadata
/// (and guid, if the candidate has none) to the candidate. Unmatched records
/// are returned for extraction.
fn diff<'a>(atlas: &'a Atlas, incoming: &mut [Candidate]) -> Vec<&'a SpriteRecord> {
    let mut matched: Vec<Option<usize>> = vec![None; atlas.sprites.len()];
    let mut claimed = vec![false; incoming.len()];

    for (ri, rec) in atlas.sprites.iter().enumerate() {
        let Some(g) = rec.guid() else { continue };
        let hit = (0..incoming.len()).find(|&i| !claimed[i] && incoming[i].guid() == Some(g));
        if let Some(i) = hit {
            claimed[i] = true;
            matched[ri] = Some(i);
        }
    }
    for (ri, rec) in atlas.sprites.iter().enumerate() {
        if matched[ri].is_some() {
            continue;
        }
        let hit = (0..incoming.len()).find(|&i| {
            let cand = &incoming[i];
            let guid_conflict = matches!((rec.guid(), cand.guid()), (Some(a), Some(b)) if a != b);
            !claimed[i] && !guid_conflict && cand.name == rec.name
        });
        if let Some(i) = hit {
            claimed[i] = true;
            matched[ri] = Some(i);
        }
    }

    let mut leftovers = Vec::new();
    for (rec, hit) in atlas.sprites.iter().zip(matched) {
        match hit {
            Some(i) => {
                let cand = &mut incoming[i];
                cand.meta = rec.meta;
                if cand.guid.is_none() {
                    cand.guid = rec.guid().map(str::to_owned);
                }
                cand.origin = Origin::Replaced(rec.name.clone());
            }
            None => leftovers.push(rec),
        }
    }
    leftovers
}

/// Keeps the first candidate for every name; the rest are dropped with a warning.
fn dedupe(
    candidates: impl Iterator<Item = Candidate>,
    report: &mut RebuildReport,
) -> Vec<Candidate> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    for cand in candidates {
        if seen.insert(cand.name.clone()) {
            out.push(cand);
        } else {
            warn!(name = %cand.name, "duplicate sprite name, keeping the first one");
            report
                .warnings
                .push(format!("duplicate sprite name '{}': keeping the first entry", cand.name));
            report.dropped.push(cand.name);
        }
    }
    out
}
