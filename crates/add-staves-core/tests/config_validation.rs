use add_staves_core::config::{Grouping, LayoutConfig, MAX_STAVES, StaffPosition};
use add_staves_core::error::LayoutError;

#[test]
fn defaults_are_valid_a4() {
    let cfg = LayoutConfig::default();
    assert!(cfg.validate().is_ok());
    assert_eq!((cfg.page_width, cfg.page_height), (595.0, 842.0));
    assert_eq!(cfg.staff_position, StaffPosition::Below);
    assert!(cfg.ragged_last);
    assert!(!cfg.ragged);
    assert_eq!(cfg.grouping, Grouping::Auto);
}

#[test]
fn test_zero_width() {
    let cfg = LayoutConfig {
        page_width: 0.0,
        ..Default::default()
    };
    match cfg.validate() {
        Err(LayoutError::InvalidDimensions { width, height }) => {
            assert_eq!(width, 0.0);
            assert_eq!(height, 842.0);
        }
        _ => panic!("Expected InvalidDimensions error"),
    }
}

#[test]
fn test_negative_height() {
    let cfg = LayoutConfig::builder().with_page_size(595.0, -1.0).build();
    assert!(matches!(
        cfg.validate(),
        Err(LayoutError::InvalidDimensions { .. })
    ));
}

#[test]
fn test_non_finite_spacing() {
    let cfg = LayoutConfig::builder().outer_spacing(f64::NAN).build();
    match cfg.validate() {
        Err(LayoutError::InvalidConfig(msg)) => assert!(msg.contains("outer_spacing")),
        _ => panic!("Expected InvalidConfig error"),
    }
}

#[test]
fn test_too_many_staves() {
    let cfg = LayoutConfig::builder().staves(MAX_STAVES + 1).build();
    assert!(matches!(cfg.validate(), Err(LayoutError::InvalidConfig(_))));
    let cfg = LayoutConfig::builder().staves(0).build();
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_zero_group() {
    let cfg = LayoutConfig::builder()
        .grouping(Grouping::Groups(vec![3, 0]))
        .build();
    assert!(matches!(cfg.validate(), Err(LayoutError::InvalidConfig(_))));
}

#[test]
fn grouping_text_forms() {
    let plan = |s: &str| s.parse::<Grouping>().expect("valid plan");
    assert_eq!(plan("4 5"), Grouping::Groups(vec![4, 5]));
    assert_eq!(plan("4,5"), Grouping::Groups(vec![4, 5]));
    assert_eq!(plan(" 4,  5 \t6"), Grouping::Groups(vec![4, 5, 6]));
    assert_eq!(plan(""), Grouping::SinglePage);
    assert_eq!(plan("   "), Grouping::SinglePage);
}

#[test]
fn grouping_rejects_bad_counts() {
    assert!(matches!(
        "4 x".parse::<Grouping>(),
        Err(LayoutError::InvalidGrouping(_))
    ));
    assert!(matches!(
        "0 3".parse::<Grouping>(),
        Err(LayoutError::InvalidGrouping(_))
    ));
    assert!("-2".parse::<Grouping>().is_err());
}

#[test]
fn grouping_from_optional_plan() {
    assert_eq!(Grouping::from_plan(None), Grouping::Auto);
    assert_eq!(Grouping::from_plan(Some(vec![])), Grouping::SinglePage);
    assert_eq!(Grouping::from_plan(Some(vec![2])), Grouping::Groups(vec![2]));
}

#[test]
fn serde_fills_optional_fields() {
    let cfg: LayoutConfig = serde_json::from_str(
        r#"{
            "inner_spacing": 10, "outer_spacing": 15,
            "top_margin": 5, "bottom_margin": 5, "left_margin": 0,
            "page_height": 800, "page_width": 600, "ragged": true,
            "grouping": {"groups": [2, 2]}
        }"#,
    )
    .expect("config json");
    assert!(cfg.ragged_last);
    assert_eq!(cfg.staves, 2);
    assert_eq!(cfg.shift, 0.0);
    assert_eq!(cfg.grouping, Grouping::Groups(vec![2, 2]));
    assert!(cfg.validate().is_ok());
}
