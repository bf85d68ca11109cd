use std::sync::Arc;

use cephkit_engine::catalogue::cephalometry;
use cephkit_engine::commands::EngineCommand;
use cephkit_engine::controller::Controller;
use cephkit_engine::model::CanvasPoint;
use cephkit_engine::raster::{ImageRaster, ImageSource, RasterPayload};
use cephkit_engine::renderer::{to_rgba_image, RenderStyle, Renderer, Scene};
use cephkit_engine::tools::ToolMode;
use cephkit_core::InputError;

/// Lateral engine on a 400x400 canvas showing a 200x100 grey image,
/// drawn at scale 2 with 100 px bands above and below.
fn engine() -> Controller {
    let mut engine = Controller::builtin(cephalometry::LATERAL).unwrap();
    engine
        .apply(EngineCommand::ResizeCanvas {
            width: 400.0,
            height: 400.0,
        })
        .unwrap();
    let request = engine.request_raster(cephalometry::LATERAL, ImageSource::Handle(1)).unwrap();
    let payload = RasterPayload::new(Arc::new(ImageRaster::blank(200, 100).unwrap()));
    engine.on_raster_ready(request.generation, Ok(payload)).unwrap();
    engine
}

fn close(a: u8, b: u8) -> bool {
    a.abs_diff(b) <= 2
}

#[test]
fn test_render_letterboxed_raster() {
    let engine = engine();
    let scene = Scene::from_controller(&engine).unwrap();
    let pixmap = Renderer::default().render(&scene).unwrap();
    assert_eq!((pixmap.width(), pixmap.height()), (400, 400));

    let image = to_rgba_image(&pixmap);
    assert_eq!(image.get_pixel(200, 20).0, [0, 0, 0, 255]);
    let inside = image.get_pixel(200, 200).0;
    assert!(close(inside[0], 128) && close(inside[1], 128) && close(inside[2], 128));
}

#[test]
fn test_rendering_is_idempotent() {
    let mut engine = engine();
    engine.apply(EngineCommand::SelectTool(ToolMode::Calibrate)).unwrap();
    engine.apply(EngineCommand::Calibrate { at: CanvasPoint::new(20.0, 120.0) }).unwrap();
    engine.apply(EngineCommand::Calibrate { at: CanvasPoint::new(120.0, 120.0) }).unwrap();
    engine.apply(EngineCommand::PlacePoint { at: CanvasPoint::new(100.0, 200.0) }).unwrap();
    engine.apply(EngineCommand::PlacePoint { at: CanvasPoint::new(300.0, 200.0) }).unwrap();

    let renderer = Renderer::default();
    let scene = Scene::from_controller(&engine).unwrap();
    let first = renderer.render(&scene).unwrap();
    let mut second = first.clone();
    renderer.render_into(&mut second, &scene);
    assert_eq!(first.data(), second.data());
}

#[test]
fn test_selected_point_uses_selection_colour() {
    let mut engine = engine();
    engine.apply(EngineCommand::SelectTool(ToolMode::Calibrate)).unwrap();
    engine.apply(EngineCommand::Calibrate { at: CanvasPoint::new(20.0, 120.0) }).unwrap();
    engine.apply(EngineCommand::Calibrate { at: CanvasPoint::new(120.0, 120.0) }).unwrap();
    engine.apply(EngineCommand::PlacePoint { at: CanvasPoint::new(250.0, 250.0) }).unwrap();

    let style = RenderStyle {
        show_labels: false,
        ..RenderStyle::default()
    };
    let renderer = Renderer::new(style.clone());
    let scene = Scene::from_controller(&engine).unwrap();
    let image = to_rgba_image(&renderer.render(&scene).unwrap());
    let p = style.point;
    assert_eq!(image.get_pixel(250, 250).0, [p.r, p.g, p.b, 255]);

    engine.apply(EngineCommand::SelectPoint(Some("S".into()))).unwrap();
    let scene = Scene::from_controller(&engine).unwrap();
    let image = to_rgba_image(&renderer.render(&scene).unwrap());
    let s = style.selected;
    assert_eq!(image.get_pixel(250, 250).0, [s.r, s.g, s.b, 255]);
}

#[test]
fn test_magnifier_inset() {
    let mut engine = engine();
    let renderer = Renderer::default();
    let scene = Scene::from_controller(&engine).unwrap();
    assert!(renderer.render_magnifier(&scene, 2.0, 200).unwrap().is_none());

    engine
        .apply(EngineCommand::ToggleMagnifier {
            at: CanvasPoint::new(200.0, 200.0),
        })
        .unwrap();
    let scene = Scene::from_controller(&engine).unwrap();
    let inset = renderer.render_magnifier(&scene, 2.0, 120).unwrap().unwrap();
    assert_eq!((inset.width(), inset.height()), (120, 120));
    // The inset is centred on the image, so its middle shows the raster
    let middle = to_rgba_image(&inset).get_pixel(60, 60).0;
    assert!(close(middle[0], 128));
}

#[test]
fn test_render_without_canvas_fails() {
    let engine = Controller::builtin(cephalometry::LATERAL).unwrap();
    let scene = Scene::from_controller(&engine).unwrap();
    let err = Renderer::default().render(&scene).unwrap_err();
    assert!(matches!(err, InputError::InvalidRaster { .. }));
}
