//! Loading pipeline settings from host-side JSON.
use glam::Vec3;
use softraster::{AttributeUsage, Camera, FormatError, NumericKind, RasterConfig, VertexFormat};

#[test]
fn raster_config_fills_missing_fields_with_defaults() {
    let config: RasterConfig = serde_json::from_str(r#"{ "base_color": 4278255360 }"#).unwrap();
    assert_eq!(config.base_color, 0xFF00FF00);
    assert_eq!(config.cull_degenerate_area, RasterConfig::default().cull_degenerate_area);

    let empty: RasterConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(empty, RasterConfig::default());
}

#[test]
fn camera_round_trips_through_json() {
    let mut camera = Camera::new(Vec3::new(1.0, 2.0, 3.0), 16.0 / 9.0);
    camera.fov = 60.0;
    camera.near = 0.25;

    let json = serde_json::to_string(&camera).unwrap();
    let back: Camera = serde_json::from_str(&json).unwrap();
    assert_eq!(back, camera);
    assert_eq!(back.frustum().near, 0.25);
}

#[test]
fn vertex_layout_from_json_description() {
    let json = r#"[
        ["Position", "Vec3"],
        ["Color", "Vec4"],
        ["Uv", "Vec2"],
        [{ "Custom": 2 }, "Scalar"]
    ]"#;
    let entries: Vec<(AttributeUsage, NumericKind)> = serde_json::from_str(json).unwrap();
    let format = entries
        .iter()
        .fold(VertexFormat::builder(), |b, &(usage, kind)| b.attribute(usage, kind))
        .build()
        .unwrap();

    assert_eq!(format.stride(), 4 * (3 + 4 + 2 + 1));
    assert_eq!(format.find(AttributeUsage::Custom(2)).map(|a| a.offset), Some(36));
}

#[test]
fn invalid_layouts_are_reported() {
    let json = r#"[["Position", "Vec3"], ["Position", "Vec2"]]"#;
    let entries: Vec<(AttributeUsage, NumericKind)> = serde_json::from_str(json).unwrap();
    let result = entries
        .iter()
        .fold(VertexFormat::builder(), |b, &(usage, kind)| b.attribute(usage, kind))
        .build();
    assert_eq!(result.unwrap_err(), FormatError::DuplicatePosition);

    let too_wide = (0..5).fold(VertexFormat::builder(), |b, i| {
        b.attribute(AttributeUsage::Custom(i), NumericKind::Vec4)
    });
    assert!(matches!(too_wide.build(), Err(FormatError::StrideTooLarge { stride: 80, .. })));
}
