use std::io::Cursor;
use std::sync::Arc;

use cephkit_core::AcquisitionError;
use cephkit_engine::calibration::PixelSpacing;
use cephkit_engine::raster::{ImageDecoder, ImageRaster, ImageSource, RasterInfo, RasterPayload, RasterResolver};
use image::{DynamicImage, ImageFormat, RgbaImage};

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

#[test]
fn test_decode_raw_bytes() {
    let payload = ImageDecoder::new().resolve(&ImageSource::Raw(png_bytes(4, 3))).unwrap();
    assert_eq!(payload.raster.width(), 4);
    assert_eq!(payload.raster.height(), 3);
    assert!(payload.pixel_spacing.is_none());
}

#[test]
fn test_decoder_attaches_pixel_spacing() {
    let spacing = PixelSpacing {
        row_mm: 0.1,
        col_mm: 0.1,
    };
    let decoder = ImageDecoder::new().with_pixel_spacing(spacing);
    let payload = decoder.resolve(&ImageSource::Raw(png_bytes(2, 2))).unwrap();
    assert_eq!(payload.pixel_spacing, Some(spacing));
}

#[test]
fn test_garbage_bytes_fail_to_decode() {
    let err = ImageDecoder::new()
        .resolve(&ImageSource::Raw(b"definitely not an image".to_vec()))
        .unwrap_err();
    assert!(matches!(err, AcquisitionError::Decode { .. }));
}

#[test]
fn test_decode_local_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scan.png");
    std::fs::write(&path, png_bytes(5, 7)).unwrap();

    let decoder = ImageDecoder::new();
    let plain = decoder.resolve(&ImageSource::Url(path.display().to_string())).unwrap();
    assert_eq!((plain.raster.width(), plain.raster.height()), (5, 7));

    let url = format!("file://{}", path.display());
    let from_url = decoder.resolve(&ImageSource::Url(url)).unwrap();
    assert_eq!(from_url.raster.width(), 5);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.png");
    let err = ImageDecoder::new()
        .resolve(&ImageSource::Url(path.display().to_string()))
        .unwrap_err();
    assert!(matches!(err, AcquisitionError::Io { .. }));
}

#[test]
fn test_unsupported_sources() {
    let decoder = ImageDecoder::new();
    let err = decoder
        .resolve(&ImageSource::Url("https://example.org/ceph.png".into()))
        .unwrap_err();
    assert!(matches!(err, AcquisitionError::Unsupported { .. }));
    let err = decoder.resolve(&ImageSource::Handle(7)).unwrap_err();
    assert_eq!(
        err,
        AcquisitionError::Unsupported {
            source_kind: "handle".into()
        }
    );
}

#[test]
fn test_empty_raster_is_rejected() {
    let err = ImageRaster::blank(0, 5).unwrap_err();
    assert_eq!(err, AcquisitionError::EmptyRaster { width: 0, height: 5 });
}

#[test]
fn test_raster_info_from_payload() {
    let payload = RasterPayload::new(Arc::new(ImageRaster::blank(64, 32).unwrap()));
    let info = RasterInfo::from_payload(payload).unwrap();
    assert_eq!((info.width, info.height), (64, 32));
    assert_eq!(info.size().width, 64.0);
}
