use spritepack_core::error::AtlasError;
use spritepack_core::prelude::*;

const RED: [u8; 4] = [255, 0, 0, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];
const YELLOW: [u8; 4] = [255, 255, 0, 255];

fn solid(w: u32, h: u32, c: [u8; 4]) -> PixelBuffer {
    PixelBuffer::from_fn(w, h, |_, _| c)
}

fn rebuilder() -> AtlasRebuilder {
    AtlasRebuilder::new(RebuildConfig::builder().padding(2).max_size(256).build()).unwrap()
}

fn pixels_of(atlas: &Atlas, name: &str) -> PixelBuffer {
    let rec = atlas.sprite(name).unwrap_or_else(|| panic!("missing sprite {name}"));
    extract_region(atlas.texture(), rec.rect).unwrap()
}

fn is_solid(buf: &PixelBuffer, c: [u8; 4]) -> bool {
    buf.as_raw().chunks_exact(4).all(|p| p == c)
}

fn abc_atlas() -> Atlas {
    let out = rebuilder()
        .rebuild(
            None,
            vec![
                SourceSprite::new("a", solid(16, 16, RED)),
                SourceSprite::new("b", solid(8, 8, GREEN)),
                SourceSprite::new("c", solid(12, 6, BLUE)),
            ],
        )
        .unwrap();
    let mut atlas = out.outcome.into_atlas();
    for (i, s) in atlas.sprites.iter_mut().enumerate() {
        s.meta.border = [i as u32 + 1; 4];
        s.meta.alignment = SpriteAlignment::BottomLeft;
    }
    atlas
}

#[test]
fn fresh_rebuild_packs_every_source() {
    let out = rebuilder()
        .rebuild(
            None,
            vec![
                SourceSprite::new("a", solid(16, 16, RED)),
                SourceSprite::new("b", solid(8, 8, GREEN)),
            ],
        )
        .unwrap();
    assert_eq!(
        out.report.phases,
        vec![
            RebuildPhase::Idle,
            RebuildPhase::Diffing,
            RebuildPhase::Extracting,
            RebuildPhase::Packing,
            RebuildPhase::Compositing,
            RebuildPhase::Done,
        ]
    );
    assert_eq!(out.report.added, vec!["a", "b"]);
    let atlas = out.outcome.atlas();
    assert!(is_solid(&pixels_of(atlas, "a"), RED));
    assert!(is_solid(&pixels_of(atlas, "b"), GREEN));
    assert_eq!(atlas.settings.padding, 2);
}

#[test]
fn untouched_sprites_keep_pixels_and_metadata() {
    let existing = abc_atlas();
    let meta_a = existing.sprite("a").unwrap().meta;
    let meta_b = existing.sprite("b").unwrap().meta;
    let meta_c = existing.sprite("c").unwrap().meta;

    let out = rebuilder()
        .rebuild(Some(&existing), vec![SourceSprite::new("b", solid(10, 10, YELLOW))])
        .unwrap();
    assert_eq!(out.report.replaced, vec!["b"]);
    assert!(out.report.preserved.contains(&"a".to_string()));
    assert!(out.report.preserved.contains(&"c".to_string()));
    assert!(out.report.added.is_empty());

    let atlas = out.outcome.atlas();
    assert_eq!(atlas.sprites.len(), 3);
    assert!(is_solid(&pixels_of(atlas, "a"), RED));
    assert!(is_solid(&pixels_of(atlas, "c"), BLUE));
    let b = pixels_of(atlas, "b");
    assert_eq!(b.dimensions(), (10, 10));
    assert!(is_solid(&b, YELLOW));

    assert_eq!(atlas.sprite("a").unwrap().meta, meta_a);
    assert_eq!(atlas.sprite("b").unwrap().meta, meta_b);
    assert_eq!(atlas.sprite("c").unwrap().meta, meta_c);
}

#[test]
fn failed_rebuild_leaves_existing_atlas_untouched() {
    let existing = abc_atlas();
    let before_sprites = existing.sprites.clone();
    let before_texture = existing.texture().clone();

    let err = rebuilder()
        .rebuild(Some(&existing), vec![SourceSprite::new("huge", solid(300, 4, RED))])
        .unwrap_err();
    assert!(matches!(err, AtlasError::PackingInfeasible { .. }));
    assert_eq!(existing.sprites, before_sprites);
    assert_eq!(existing.texture(), &before_texture);
}

#[test]
fn empty_result_deletes_the_atlas() {
    let out = rebuilder().rebuild(None, Vec::new()).unwrap();
    assert!(out.outcome.is_deleted());
    assert_eq!(out.report.final_phase(), RebuildPhase::Done);
    assert!(!out.report.phases.contains(&RebuildPhase::Packing));
    let atlas = out.outcome.into_atlas();
    assert!(atlas.is_empty());
    assert!(atlas.texture().is_empty());
    assert_eq!(atlas.settings, AtlasSettings::default());
}

#[test]
fn degenerate_regions_and_missing_pixels_are_dropped() {
    let texture = solid(8, 8, RED);
    let existing = Atlas::with_texture(
        texture,
        vec![SpriteRecord::new("ghost", Rect::new(2, 2, 0, 4))],
        AtlasSettings::default(),
    );
    let mut no_pixels = SourceSprite::new("broken", PixelBuffer::empty());
    no_pixels.image = None;

    let out = rebuilder().rebuild(Some(&existing), vec![no_pixels]).unwrap();
    assert!(out.outcome.is_deleted());
    assert!(out.report.dropped.contains(&"ghost".to_string()));
    assert!(out.report.dropped.contains(&"broken".to_string()));
}

#[test]
fn guid_match_wins_over_name() {
    let built = rebuilder()
        .rebuild(
            None,
            vec![
                SourceSprite::new("old", solid(8, 8, RED)).with_guid("g-1"),
                SourceSprite::new("keep", solid(8, 8, GREEN)),
            ],
        )
        .unwrap();
    let mut existing = built.outcome.into_atlas();
    existing
        .sprites
        .iter_mut()
        .filter(|s| s.name == "old")
        .for_each(|s| s.meta.border = [1, 2, 3, 4]);

    let out = rebuilder()
        .rebuild(
            Some(&existing),
            vec![SourceSprite::new("renamed", solid(6, 6, BLUE)).with_guid("g-1")],
        )
        .unwrap();
    assert_eq!(out.report.replaced, vec!["old"]);
    let atlas = out.outcome.atlas();
    assert!(atlas.sprite("old").is_none());
    let renamed = atlas.sprite("renamed").unwrap();
    assert_eq!(renamed.guid.as_deref(), Some("g-1"));
    assert_eq!(renamed.meta.border, [1, 2, 3, 4]);
    assert!(is_solid(&pixels_of(atlas, "keep"), GREEN));
}

#[test]
fn name_match_inherits_guid() {
    let built = rebuilder()
        .rebuild(None, vec![SourceSprite::new("hero", solid(4, 4, RED)).with_guid("g-9")])
        .unwrap();
    let existing = built.outcome.into_atlas();

    let out = rebuilder()
        .rebuild(Some(&existing), vec![SourceSprite::new("hero", solid(5, 5, GREEN))])
        .unwrap();
    let hero = out.outcome.atlas().sprite("hero").unwrap().clone();
    assert_eq!(hero.guid.as_deref(), Some("g-9"));
    assert_eq!((hero.rect.w, hero.rect.h), (5, 5));
}

#[test]
fn duplicate_names_keep_the_first_entry() {
    let out = rebuilder()
        .rebuild(
            None,
            vec![
                SourceSprite::new("dup", solid(4, 4, RED)),
                SourceSprite::new("dup", solid(8, 8, GREEN)),
            ],
        )
        .unwrap();
    let atlas = out.outcome.atlas();
    assert_eq!(atlas.sprites.len(), 1);
    assert!(is_solid(&pixels_of(atlas, "dup"), RED));
    assert_eq!(pixels_of(atlas, "dup").dimensions(), (4, 4));
    assert_eq!(out.report.warnings.len(), 1);
    assert!(out.report.warnings[0].contains("dup"));
}

#[test]
fn reuse_size_hint_keeps_previous_dimensions() {
    let existing = Atlas::with_texture(
        solid(256, 256, BLUE),
        vec![SpriteRecord::new("a", Rect::new(0, 0, 8, 8))],
        AtlasSettings::default(),
    );

    let compact = rebuilder().rebuild(Some(&existing), Vec::new()).unwrap();
    assert_eq!(compact.outcome.atlas().texture().dimensions(), (8, 8));

    let cfg = RebuildConfig::builder().max_size(512).reuse_size_hint(true).build();
    let hinted = AtlasRebuilder::new(cfg).unwrap().rebuild(Some(&existing), Vec::new()).unwrap();
    assert_eq!(hinted.outcome.atlas().texture().dimensions(), (256, 256));
    assert_eq!(hinted.report.preserved, vec!["a"]);
}

fn record(name: &str, rect: Rect, guid: Option<&str>, border: u32) -> SpriteRecord {
    let mut rec = SpriteRecord::new(name, rect);
    rec.guid = guid.map(str::to_owned);
    rec.meta.border = [border; 4];
    rec
}

#[test]
fn guid_owner_is_matched_before_any_name() {
    let existing = Atlas::with_texture(
        solid(16, 8, RED),
        vec![
            record("x", Rect::new(0, 0, 8, 8), None, 1),
            record("y", Rect::new(8, 0, 8, 8), Some("g"), 9),
        ],
        AtlasSettings::default(),
    );
    let out = rebuilder()
        .rebuild(
            Some(&existing),
            vec![SourceSprite::new("x", solid(4, 4, GREEN)).with_guid("g")],
        )
        .unwrap();

    let atlas = out.outcome.atlas();
    assert_eq!(atlas.sprites.len(), 1);
    let x = atlas.sprite("x").unwrap();
    assert_eq!(x.guid.as_deref(), Some("g"));
    assert_eq!(x.meta.border, [9; 4]);
    assert!(is_solid(&pixels_of(atlas, "x"), GREEN));
    assert_eq!(
        atlas.sprites.iter().filter(|s| s.guid.as_deref() == Some("g")).count(),
        1
    );

    assert_eq!(out.report.replaced, vec!["y"]);
    assert!(out.report.preserved.is_empty());
    assert_eq!(out.report.dropped, vec!["x"]);
}

#[test]
fn duplicate_preserved_sprite_is_reported_dropped() {
    let existing = Atlas::with_texture(
        solid(16, 8, RED),
        vec![
            record("q", Rect::new(0, 0, 8, 8), Some("g"), 0),
            record("x", Rect::new(8, 0, 8, 8), None, 0),
        ],
        AtlasSettings::default(),
    );
    let out = rebuilder()
        .rebuild(
            Some(&existing),
            vec![SourceSprite::new("x", solid(4, 4, GREEN)).with_guid("g")],
        )
        .unwrap();
    assert_eq!(out.report.replaced, vec!["q"]);
    assert!(!out.report.preserved.contains(&"x".to_string()));
    assert!(out.report.dropped.contains(&"x".to_string()));
    assert_eq!(out.outcome.atlas().sprites.len(), 1);
}

#[test]
fn different_guids_never_match_by_name() {
    let existing = Atlas::with_texture(
        solid(8, 8, RED),
        vec![record("x", Rect::new(0, 0, 8, 8), Some("a"), 3)],
        AtlasSettings::default(),
    );
    let out = rebuilder()
        .rebuild(
            Some(&existing),
            vec![SourceSprite::new("x", solid(4, 4, GREEN)).with_guid("b")],
        )
        .unwrap();
    assert!(out.report.replaced.is_empty());
    assert_eq!(out.report.added, vec!["x"]);
    let x = out.outcome.atlas().sprite("x").unwrap().clone();
    assert_eq!(x.guid.as_deref(), Some("b"));
    assert_eq!(x.meta.border, [0; 4]);
}
