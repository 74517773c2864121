use std::io::Cursor;
use std::path::PathBuf;

use super::*;
use kurbo::Point;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("kinetype_bg_{}_{name}", std::process::id()))
}

fn write_png(path: &Path, w: u32, h: u32, px: [u8; 4]) {
    let img = image::RgbaImage::from_fn(w, h, |_, _| image::Rgba(px));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    std::fs::write(path, buf).unwrap();
}

#[test]
fn decode_image_png_dimensions_and_premul() {
    let src_rgba = vec![100u8, 50u8, 200u8, 128u8];
    let img = image::RgbaImage::from_raw(1, 1, src_rgba).unwrap();

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();

    let prepared = decode_image(&buf).unwrap();
    assert_eq!((prepared.width, prepared.height), (1, 1));
    assert_eq!(
        prepared.rgba8_premul.as_slice(),
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn solid_and_transparent_are_ready_immediately() {
    let fallback = Rgba8::rgb(1, 2, 3);
    let mut solid = BackgroundAsset::load(
        &BackgroundDesc::Solid {
            color: Some("#ff0000".to_owned()),
        },
        fallback,
    );
    assert!(solid.is_ready());
    assert!(matches!(solid.frame_at(0.0), BackgroundFrame::Solid(c) if c == Rgba8::rgb(255, 0, 0)));

    let mut clear = BackgroundAsset::load(&BackgroundDesc::Transparent, fallback);
    assert!(clear.is_ready());
    assert!(clear.is_transparent());
    assert!(matches!(clear.frame_at(0.0), BackgroundFrame::Clear));
}

#[test]
fn missing_image_falls_back_to_solid() {
    let fallback = Rgba8::rgb(9, 9, 9);
    let mut bg = BackgroundAsset::load(
        &BackgroundDesc::Image {
            source: PathBuf::from("/no/such/background.png"),
        },
        fallback,
    );
    assert!(bg.is_ready());
    assert_eq!(bg.dimensions(), None);
    assert!(matches!(bg.frame_at(100.0), BackgroundFrame::Solid(c) if c == fallback));
}

#[test]
fn image_background_reports_dimensions_and_releases() {
    let path = temp_path("img.png");
    write_png(&path, 8, 4, [10, 20, 30, 255]);

    let mut bg = BackgroundAsset::load(
        &BackgroundDesc::Image {
            source: path.clone(),
        },
        Rgba8::rgb(0, 0, 0),
    );
    assert_eq!(bg.dimensions(), Some((8, 4)));
    assert!(matches!(bg.frame_at(0.0), BackgroundFrame::Raster(ref img) if img.width == 8));

    bg.release();
    assert!(!bg.is_ready());
    assert_eq!(bg.dimensions(), None);
    bg.release();

    let _ = std::fs::remove_file(path);
}

#[test]
fn cover_transform_fills_and_centers() {
    let canvas = Canvas::new(100, 200).unwrap();
    let t = cover_transform(50, 50, canvas);
    // Square source scales by 4 to cover the 200 px height; width overflows equally on both sides.
    let tl = t * Point::new(0.0, 0.0);
    let br = t * Point::new(50.0, 50.0);
    assert!((tl.x - -50.0).abs() < 1e-9 && tl.y.abs() < 1e-9);
    assert!((br.x - 150.0).abs() < 1e-9 && (br.y - 200.0).abs() < 1e-9);
}
