use spritepack_core::config::{FilterMode, MAX_PADDING, RebuildConfig};
use spritepack_core::error::AtlasError;
use spritepack_core::rebuild::AtlasRebuilder;

#[test]
fn defaults_are_valid() {
    let cfg = RebuildConfig::default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.settings.padding, 2);
    assert_eq!(cfg.settings.filter_mode, FilterMode::Bilinear);
    assert_eq!(cfg.max_size, 2048);
}

#[test]
fn padding_bounds() {
    let ok = RebuildConfig::builder().padding(MAX_PADDING).build();
    assert!(ok.validate().is_ok());

    let err = RebuildConfig::builder().padding(MAX_PADDING + 1).build().validate();
    assert!(matches!(err, Err(AtlasError::InvalidConfig(msg)) if msg.contains("padding")));

    let err = RebuildConfig::builder().padding(4).max_size(4).build().validate();
    assert!(matches!(err, Err(AtlasError::InvalidConfig(_))));
}

#[test]
fn zero_max_size_is_rejected() {
    let err = RebuildConfig::builder().max_size(0).build().validate();
    assert!(matches!(err, Err(AtlasError::InvalidDimensions { width: 0, height: 0 })));
}

#[test]
fn pixels_per_unit_must_be_positive() {
    for ppu in [0.0, -1.0, f32::NAN, f32::INFINITY] {
        let cfg = RebuildConfig::builder().pixels_per_unit(ppu).build();
        assert!(cfg.validate().is_err(), "{ppu} accepted");
    }
}

#[test]
fn rebuilder_refuses_invalid_config() {
    let cfg = RebuildConfig::builder().padding(50).build();
    assert!(AtlasRebuilder::new(cfg).is_err());
}

#[test]
fn serde_fills_missing_fields() {
    let cfg: RebuildConfig =
        serde_json::from_str(r#"{ "padding": 0, "heuristic": "contactpoint" }"#).unwrap();
    assert_eq!(cfg.settings.padding, 0);
    assert_eq!(cfg.max_size, 2048);
    assert!((cfg.settings.pixels_per_unit - 100.0).abs() < f32::EPSILON);
    assert!(cfg.validate().is_ok());
}

#[test]
fn filter_mode_names_parse() {
    assert_eq!("point".parse(), Ok(FilterMode::Point));
    assert_eq!("Trilinear".parse(), Ok(FilterMode::Trilinear));
    assert!("cubic".parse::<FilterMode>().is_err());
}
