//! Tests PNG + base64 encoding of captured frames.

use balatro_advisor_core::{AnalysisKind, AnalysisRequest, CapturedFrame, HAND_PROMPT};
use base64::Engine as _;

fn checker_frame(width: u32, height: u32) -> CapturedFrame {
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            let value = if (x + y) % 2 == 0 { 255 } else { 0 };
            rgb.extend_from_slice(&[value, 0, 255 - value]);
        }
    }
    CapturedFrame::new(width, height, rgb).expect("fixture frame should be valid")
}

#[test]
fn frame_encoding_tests_png_is_lossless() {
    let frame = checker_frame(7, 5);
    let png = frame.to_png().expect("png encoding should succeed");

    let decoded = image::load_from_memory_with_format(&png, image::ImageFormat::Png)
        .expect("png should decode")
        .to_rgb8();
    assert_eq!(decoded.width(), 7);
    assert_eq!(decoded.height(), 5);
    assert_eq!(decoded.as_raw().as_slice(), frame.rgb());
}

#[test]
fn frame_encoding_tests_base64_wraps_png_bytes() {
    let frame = checker_frame(4, 4);
    let expected_png = frame.to_png().expect("png encoding should succeed");

    let encoded = AnalysisRequest::for_kind(frame, AnalysisKind::Hand)
        .encode()
        .expect("request should encode");
    let png = base64::engine::general_purpose::STANDARD
        .decode(&encoded.image_base64)
        .expect("base64 should decode");

    assert_eq!(png, expected_png);
    assert_eq!(encoded.png_len, expected_png.len());
    assert_eq!(encoded.instructions, HAND_PROMPT);
    assert_eq!((encoded.width, encoded.height), (4, 4));
    assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
}
