//! End-to-end transcoding behaviour on synthetic images.

use std::io::Cursor;

use image::codecs::gif::GifEncoder;
use image::{Delay, DynamicImage, Frame, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use pixbudget_core::{
    fingerprint, probe, reduce_to_target, EncodeRequest, Engine, EngineConfig, EngineError,
    FilterType, Orientation, OutputFormat, SourceFormat,
};

fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            ((x * 255) / width) as u8,
            ((y * 255) / height) as u8,
            128,
        ])
    }))
}

fn textured(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            ((x * 31 + y * 17) % 256) as u8,
            ((x * y + 7) % 256) as u8,
            ((x ^ y) % 256) as u8,
        ])
    }))
}

fn encode_source(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, format).unwrap();
    out.into_inner()
}

/// Insert an APP1 Exif segment carrying only an Orientation tag right after SOI.
fn with_exif_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II*\0");
    tiff.extend_from_slice(&8u32.to_le_bytes());
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x0112u16.to_le_bytes());
    tiff.extend_from_slice(&3u16.to_le_bytes());
    tiff.extend_from_slice(&1u32.to_le_bytes());
    tiff.extend_from_slice(&orientation.to_le_bytes());
    tiff.extend_from_slice(&[0, 0]);
    tiff.extend_from_slice(&0u32.to_le_bytes());

    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&tiff);

    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&jpeg[2..]);
    out
}

fn fast_engine() -> Engine {
    Engine::new(EngineConfig::default().with_filter(FilterType::Bilinear))
}

#[test]
fn large_jpeg_reaches_ten_kilobytes() {
    let raw = encode_source(&gradient(2000, 2000), ImageFormat::Jpeg);
    let request = EncodeRequest::new(10240, 80, OutputFormat::Jpeg);

    let result = fast_engine().transcode(&raw, &request).unwrap();

    assert!(result.final_size <= 10240);
    assert!(!result.attempts.is_empty());
    assert_eq!(result.final_size, result.bytes.len() as u64);
    assert_eq!(&result.bytes[0..2], &[0xFF, 0xD8]);
}

#[test]
fn small_png_succeeds_on_baseline() {
    let raw = encode_source(&gradient(100, 100), ImageFormat::Png);
    let request = EncodeRequest::new(10240, 80, OutputFormat::Png);

    let result = Engine::default().transcode(&raw, &request).unwrap();

    assert_eq!(result.attempts.len(), 1);
    assert_eq!(result.attempts[0].index, 0);
    assert_eq!((result.attempts[0].width, result.attempts[0].height), (100, 100));
    assert!(result.final_size <= 10240);
}

#[test]
fn zero_budget_is_invalid_request() {
    let raw = encode_source(&gradient(32, 32), ImageFormat::Png);
    let request = EncodeRequest::new(0, 80, OutputFormat::Jpeg);

    let err = Engine::default().transcode(&raw, &request).unwrap_err();
    assert!(matches!(err, EngineError::InvalidRequest(_)));
}

#[test]
fn truncated_stream_is_corrupt() {
    let raw = encode_source(&gradient(64, 64), ImageFormat::Jpeg);
    let truncated = &raw[..20];

    assert!(matches!(probe(truncated), Err(EngineError::CorruptImage(_))));

    let request = EncodeRequest::new(10240, 80, OutputFormat::Jpeg);
    let err = Engine::default().transcode(truncated, &request).unwrap_err();
    assert!(matches!(err, EngineError::CorruptImage(_)));
}

#[test]
fn truncated_pixel_data_is_corrupt_before_encoding() {
    let raw = encode_source(&textured(64, 64), ImageFormat::Png);
    let truncated = &raw[..raw.len() / 2];

    // Header survives, so probing still works
    assert!(probe(truncated).is_ok());

    let request = EncodeRequest::new(10240, 80, OutputFormat::Png);
    let err = Engine::default().transcode(truncated, &request).unwrap_err();
    assert!(matches!(err, EngineError::CorruptImage(_)));
}

#[test]
fn unsupported_source_is_rejected() {
    let request = EncodeRequest::new(10240, 80, OutputFormat::Jpeg);
    let err = Engine::default()
        .transcode(b"plain text is not an image", &request)
        .unwrap_err();
    assert!(matches!(err, EngineError::UnsupportedFormat(_)));
}

#[test]
fn one_byte_budget_exhausts_every_attempt() {
    let raw = encode_source(&textured(64, 64), ImageFormat::Png);

    for format in OutputFormat::ALL {
        let request = EncodeRequest::new(1, 80, format);
        let err = fast_engine().transcode(&raw, &request).unwrap_err();

        match err {
            EngineError::TargetUnreachable {
                best_size,
                budget,
                attempts,
            } => {
                assert_eq!(attempts.len(), 11, "{format}");
                assert_eq!(budget, 1);
                assert_eq!(best_size, attempts.iter().map(|a| a.size).min().unwrap());
                assert!(best_size > 1);
            }
            other => panic!("{format}: expected TargetUnreachable, got {other:?}"),
        }
    }
}

#[test]
fn every_success_is_within_budget() {
    let raw = encode_source(&textured(256, 192), ImageFormat::Png);

    for format in OutputFormat::ALL {
        for budget in [4096u64, 16384, 65536] {
            let request = EncodeRequest::new(budget, 90, format);
            match fast_engine().transcode(&raw, &request) {
                Ok(result) => {
                    assert!(result.final_size <= budget, "{format} {budget}");
                    assert_eq!(result.format, format);
                }
                Err(EngineError::TargetUnreachable { best_size, .. }) => {
                    assert!(best_size > budget);
                }
                Err(other) => panic!("{format} {budget}: unexpected {other:?}"),
            }
        }
    }
}

#[test]
fn first_fitting_attempt_is_returned() {
    let raw = encode_source(&textured(320, 240), ImageFormat::Png);
    let request = EncodeRequest::new(20000, 80, OutputFormat::Webp);

    let result = fast_engine().transcode(&raw, &request).unwrap();
    let (last, earlier) = result.attempts.split_last().unwrap();

    assert_eq!(last.size, result.final_size);
    assert!(earlier.iter().all(|a| a.size > 20000));
}

#[test]
fn identical_calls_are_byte_identical() {
    let raw = encode_source(&textured(200, 150), ImageFormat::Png);

    for format in OutputFormat::ALL {
        let request = EncodeRequest::new(6000, 70, format);
        let engine = fast_engine();
        let first = engine.transcode(&raw, &request);
        let second = engine.transcode(&raw, &request);

        match (first, second) {
            (Ok(a), Ok(b)) => {
                assert_eq!(a.bytes, b.bytes, "{format}");
                assert_eq!(a.digest, b.digest);
                assert_eq!(a.attempts, b.attempts);
            }
            (
                Err(EngineError::TargetUnreachable { attempts: a, .. }),
                Err(EngineError::TargetUnreachable { attempts: b, .. }),
            ) => assert_eq!(a, b),
            (a, b) => panic!("{format}: diverging outcomes {a:?} / {b:?}"),
        }
    }
}

#[test]
fn digest_matches_final_bytes() {
    let raw = encode_source(&gradient(120, 80), ImageFormat::Png);
    let request = EncodeRequest::new(10240, 80, OutputFormat::Jpeg);

    let result = Engine::default().transcode(&raw, &request).unwrap();
    assert_eq!(result.digest, fingerprint(&result.bytes));
    assert_eq!(result.digest.to_hex().len(), 64);

    let mut tampered = result.bytes.clone();
    let mid = tampered.len() / 2;
    tampered[mid] ^= 0xFF;
    assert_ne!(result.digest, fingerprint(&tampered));
}

#[test]
fn scaled_attempts_preserve_aspect_ratio() {
    let raw = encode_source(&textured(300, 200), ImageFormat::Png);
    let request = EncodeRequest::new(1, 80, OutputFormat::Png);

    let err = fast_engine().transcode(&raw, &request).unwrap_err();
    let EngineError::TargetUnreachable { attempts, .. } = err else {
        panic!("expected TargetUnreachable");
    };

    let original = 300.0 / 200.0;
    for attempt in &attempts {
        let ratio = attempt.width as f64 / attempt.height as f64;
        assert!(
            (ratio - original).abs() < 0.02,
            "attempt {} is {}x{}",
            attempt.index,
            attempt.width,
            attempt.height
        );
        assert!(attempt.width <= 300 && attempt.height <= 200);
    }
}

#[test]
fn sizes_trend_downward() {
    let raw = encode_source(&textured(256, 256), ImageFormat::Png);
    let request = EncodeRequest::new(1, 90, OutputFormat::Jpeg);

    let EngineError::TargetUnreachable { attempts, .. } =
        fast_engine().transcode(&raw, &request).unwrap_err()
    else {
        panic!("expected TargetUnreachable");
    };

    let first = attempts.first().unwrap().size;
    let last = attempts.last().unwrap().size;
    assert!(last < first);
}

#[test]
fn gif_and_webp_sources_are_accepted() {
    let image = gradient(48, 32);
    for (format, expected) in [
        (ImageFormat::Gif, SourceFormat::Gif),
        (ImageFormat::WebP, SourceFormat::Webp),
    ] {
        let raw = encode_source(&image, format);
        assert_eq!(probe(&raw).unwrap().source_format, expected);

        let request = EncodeRequest::new(10240, 80, OutputFormat::Jpeg);
        let result = Engine::default().transcode(&raw, &request).unwrap();
        assert!(result.final_size <= 10240);
    }
}

#[test]
fn animated_gif_uses_first_frame() {
    let first = RgbaImage::from_pixel(48, 32, Rgba([220, 20, 20, 255]));
    let second = RgbaImage::from_pixel(16, 16, Rgba([20, 20, 220, 255]));

    let mut raw = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut raw);
        encoder
            .encode_frames(vec![
                Frame::from_parts(first, 0, 0, Delay::from_numer_denom_ms(100, 1)),
                Frame::from_parts(second, 0, 0, Delay::from_numer_denom_ms(100, 1)),
            ])
            .unwrap();
    }

    let metadata = probe(&raw).unwrap();
    assert_eq!(metadata.source_format, SourceFormat::Gif);
    assert_eq!((metadata.width, metadata.height), (48, 32));

    let request = EncodeRequest::new(10240, 80, OutputFormat::Png);
    let result = Engine::default().transcode(&raw, &request).unwrap();
    let decoded = image::load_from_memory(&result.bytes).unwrap().to_rgb8();

    assert_eq!(decoded.dimensions(), (48, 32));
    for (x, y) in [(0, 0), (10, 10), (47, 31)] {
        let Rgb([r, g, b]) = *decoded.get_pixel(x, y);
        assert!(r > 200 && g < 50 && b < 50, "pixel ({x}, {y}) is {r},{g},{b}");
    }
}

#[test]
fn exif_rotation_scales_from_upright_dimensions() {
    let jpeg = encode_source(&gradient(40, 20), ImageFormat::Jpeg);
    let raw = with_exif_orientation(&jpeg, 6);

    let metadata = probe(&raw).unwrap();
    assert_eq!((metadata.width, metadata.height), (40, 20));
    assert_eq!(metadata.orientation, Orientation::Rotate90CW);
    assert_eq!(metadata.oriented_dimensions(), (20, 40));

    let request = EncodeRequest::new(64 * 1024, 80, OutputFormat::Png);
    let result = Engine::default().transcode(&raw, &request).unwrap();
    let baseline = result.attempts[0];
    assert_eq!((baseline.width, baseline.height), (20, 40));

    let result = reduce_to_target(&raw, &metadata, &request).unwrap();
    assert_eq!((result.attempts[0].width, result.attempts[0].height), (20, 40));

    let tight = EncodeRequest::new(1, 80, OutputFormat::Png);
    let EngineError::TargetUnreachable { attempts, .. } =
        reduce_to_target(&raw, &metadata, &tight).unwrap_err()
    else {
        panic!("expected TargetUnreachable");
    };
    assert_eq!((attempts[1].width, attempts[1].height), (18, 36));
}

#[test]
fn transparent_png_keeps_alpha_in_png_output() {
    let image = DynamicImage::ImageRgba8(RgbaImage::from_fn(32, 32, |x, _| {
        Rgba([255, 0, 0, (x * 8) as u8])
    }));
    let raw = encode_source(&image, ImageFormat::Png);
    let request = EncodeRequest::new(10240, 80, OutputFormat::Png);

    let result = Engine::default().transcode(&raw, &request).unwrap();
    let decoded = image::load_from_memory(&result.bytes).unwrap();
    assert!(decoded.color().has_alpha());
}

#[test]
fn reduce_to_target_contract() {
    let raw = encode_source(&textured(160, 120), ImageFormat::Png);
    let metadata = probe(&raw).unwrap();
    let request = EncodeRequest::new(8000, 75, OutputFormat::Webp);

    let result = reduce_to_target(&raw, &metadata, &request).unwrap();
    assert!(result.final_size <= 8000);
    assert_eq!(result.original_size, raw.len() as u64);

    let expected =
        (raw.len() as f64 - result.final_size as f64) / raw.len() as f64 * 100.0;
    assert!((result.compression_ratio_percent - expected).abs() < 1e-9);
}

#[test]
fn request_from_options_drives_engine() {
    let engine = Engine::default();
    let request =
        EncodeRequest::from_options(Some(4096), None, Some("jpg"), engine.config()).unwrap();
    assert_eq!(request.initial_quality, 80);

    let raw = encode_source(&gradient(64, 64), ImageFormat::Png);
    let result = engine.transcode(&raw, &request).unwrap();
    assert_eq!(result.format, OutputFormat::Jpeg);
}

#[cfg(feature = "tokio")]
#[tokio::test]
async fn offloaded_transcode_matches_inline() {
    let raw = encode_source(&gradient(128, 96), ImageFormat::Png);
    let request = EncodeRequest::new(10240, 80, OutputFormat::Webp);
    let engine = Engine::default();

    let inline = engine.transcode(&raw, &request).unwrap();
    let offloaded = engine.transcode_offloaded(raw, request).await.unwrap();
    assert_eq!(inline.bytes, offloaded.bytes);
}
