//! Integration tests: floor-plan dimension requests.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{ImageFormat, RgbImage};
use pretty_assertions::assert_eq;
use std::io::Cursor;
use wayfind_core::geometry::ImageDimensions;
use wayfind_core::model::Position;
use wayfind_editor::{AnnotationStore, DimensionState, FloorPatch};

fn png_data_url(width: u32, height: u32) -> String {
    let mut out = Cursor::new(Vec::new());
    RgbImage::new(width, height)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    format!("data:image/png;base64,{}", STANDARD.encode(out.into_inner()))
}

#[test]
fn without_runtime_probe_settles_inline() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut store = AnnotationStore::new();
    let floor = store.add_floor("Ground", Some(png_data_url(64, 32)));
    assert_eq!(
        store.floor_dimensions(floor),
        Some(ImageDimensions::new(64, 32))
    );
    assert!(store.poll_floor_dimensions().is_empty());
}

#[test]
fn unreadable_background_fails_without_blocking_the_floor() {
    let mut store = AnnotationStore::new();
    let floor = store.add_floor("Ground", Some("plan.png".to_string()));
    assert!(matches!(
        store.floor_dimension_state(floor),
        DimensionState::Failed(_)
    ));
    assert_eq!(store.floor_dimensions(floor), None);
    assert!(store.set_current_floor(floor).is_ok());
}

#[tokio::test]
async fn runtime_probe_can_be_awaited() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut store = AnnotationStore::new();
    let floor = store.add_floor("Ground", Some(png_data_url(120, 80)));
    assert_eq!(store.floor_dimension_state(floor), DimensionState::Pending);

    let dims = store.await_floor_dimensions("floor-0").await;
    assert_eq!(dims, Some(Ok(ImageDimensions::new(120, 80))));

    let world = store
        .world_position(&Position::on_floor(120.0, 0.0, floor))
        .unwrap();
    // 50 world units across the 120 px side.
    assert!((world.x - 25.0).abs() < 1e-9);
    assert!((world.z - 50.0 / 120.0 * 40.0).abs() < 1e-9);
}

#[tokio::test]
async fn replacing_background_starts_a_new_probe() {
    let mut store = AnnotationStore::new();
    let floor = store.add_floor("Ground", Some(png_data_url(10, 10)));
    store.await_floor_dimensions("floor-0").await;

    store
        .update_floor(
            "floor-0",
            FloorPatch {
                background_image: Some(Some(png_data_url(30, 20))),
                ..Default::default()
            },
        )
        .unwrap();
    store.await_floor_dimensions("floor-0").await;
    assert_eq!(
        store.floor_dimensions(floor),
        Some(ImageDimensions::new(30, 20))
    );

    store
        .update_floor(
            "floor-0",
            FloorPatch {
                background_image: Some(None),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(store.floor_dimension_state(floor), DimensionState::Unknown);
}

#[test]
fn dimensions_from_the_ui_are_accepted() {
    let mut store = AnnotationStore::new();
    store.add_floor("Ground", None);
    store
        .set_floor_dimensions("floor-0", ImageDimensions::new(800, 600))
        .unwrap();
    assert_eq!(
        store.floor_dimensions(0),
        Some(ImageDimensions::new(800, 600))
    );
    assert!(
        store
            .set_floor_dimensions("floor-3", ImageDimensions::new(1, 1))
            .is_err()
    );
}
