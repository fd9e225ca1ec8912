//! # Branding Asset Loader
//!
//! Resolves the clinic's logo and signature rasters from whatever the
//! tenant profile carries — a file path, a data URI, or a bare base64
//! blob — and prepares them for PDF embedding. JPEG bytes pass through
//! untouched (the serializer embeds them with DCTDecode); PNG decodes to
//! RGB with the alpha channel split off for an SMask, so transparent
//! signature scans composite over the page.
//!
//! Branding is additive chrome. Nothing here is allowed to fail a render:
//! the only caller-facing entry point is [`load_optional`], which turns
//! every failure into a logged warning and an omitted element.

use std::io::Cursor;
use std::path::Path;

use thiserror::Error;

/// Why a branding asset could not be loaded. Reported in a warning, never
/// propagated to the caller.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("unreadable source '{src}': {reason}")]
    Source { src: String, reason: String },
    #[error("invalid base64 image data: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("broken {0} data: {1}")]
    Decode(&'static str, String),
    #[error("unrecognized image format (logo and signature must be JPEG or PNG)")]
    UnknownFormat,
}

/// A loaded raster ready for PDF embedding.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub pixel_data: ImagePixelData,
    pub width_px: u32,
    pub height_px: u32,
}

impl LoadedImage {
    /// Width over height. The header keeps the logo's aspect ratio while
    /// clamping it into a fixed slot.
    pub fn aspect_ratio(&self) -> f64 {
        self.width_px as f64 / self.height_px.max(1) as f64
    }
}

/// Pixel data in the exact shape the PDF serializer embeds.
#[derive(Debug, Clone)]
pub enum ImagePixelData {
    /// Original JPEG bytes, embedded as-is with DCTDecode.
    Jpeg {
        data: Vec<u8>,
        color_space: JpegColorSpace,
    },
    /// Decoded pixels: width * height * 3 RGB bytes, plus one alpha byte
    /// per pixel when any pixel is not fully opaque.
    Decoded {
        rgb: Vec<u8>,
        alpha: Option<Vec<u8>>,
    },
}

/// JPEG color space for the PDF /ColorSpace entry.
#[derive(Debug, Clone, Copy)]
pub enum JpegColorSpace {
    DeviceRGB,
    DeviceGray,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RasterFormat {
    Jpeg,
    Png,
}

/// Load a branding asset, degrading to `None` with a logged warning.
/// `label` names the slot ("logo", "signature") in the diagnostic.
pub fn load_optional(label: &str, src: Option<&str>) -> Option<LoadedImage> {
    let src = src?;
    match load_image(src) {
        Ok(img) => Some(img),
        Err(e) => {
            log::warn!("{label} image unavailable, omitting: {e}");
            None
        }
    }
}

/// Resolve a source string and decode it.
///
/// Accepted `src` forms, tried in order:
/// - `data:image/...;base64,...` data URI
/// - a file path (`/`, `./` or `../` prefixed)
/// - bare base64 image bytes
pub fn load_image(src: &str) -> Result<LoadedImage, AssetError> {
    let bytes = resolve_source(src)?;
    decode_image_bytes(&bytes)
}

fn resolve_source(src: &str) -> Result<Vec<u8>, AssetError> {
    if let Some(uri_body) = src.strip_prefix("data:image/") {
        let b64 = uri_body
            .split_once(',')
            .map(|(_, payload)| payload)
            .ok_or_else(|| AssetError::Source {
                src: "data URI".to_string(),
                reason: "missing ',' separator".to_string(),
            })?;
        return decode_base64(b64);
    }

    // Only explicit path prefixes are treated as files: bare base64 also
    // contains '/' and must not be mistaken for a path.
    if src.starts_with('/') || src.starts_with("./") || src.starts_with("../") {
        return std::fs::read(Path::new(src)).map_err(|e| AssetError::Source {
            src: src.to_string(),
            reason: e.to_string(),
        });
    }

    decode_base64(src)
}

fn decode_base64(input: &str) -> Result<Vec<u8>, AssetError> {
    use base64::Engine;
    Ok(base64::engine::general_purpose::STANDARD.decode(input)?)
}

fn decode_image_bytes(data: &[u8]) -> Result<LoadedImage, AssetError> {
    match sniff_format(data) {
        Some(RasterFormat::Jpeg) => load_jpeg(data),
        Some(RasterFormat::Png) => load_png(data),
        None => Err(AssetError::UnknownFormat),
    }
}

/// Identify the raster format from its magic bytes.
fn sniff_format(data: &[u8]) -> Option<RasterFormat> {
    match data {
        [0xFF, 0xD8, ..] => Some(RasterFormat::Jpeg),
        [0x89, b'P', b'N', b'G', ..] => Some(RasterFormat::Png),
        _ => None,
    }
}

/// JPEG: only the dimensions and component count are read; the original
/// bytes travel into the PDF unchanged.
fn load_jpeg(data: &[u8]) -> Result<LoadedImage, AssetError> {
    let (width_px, height_px) = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| AssetError::Decode("JPEG", e.to_string()))?
        .into_dimensions()
        .map_err(|e| AssetError::Decode("JPEG", e.to_string()))?;

    let color_space = if sof_component_count(data) == 1 {
        JpegColorSpace::DeviceGray
    } else {
        JpegColorSpace::DeviceRGB
    };

    Ok(LoadedImage {
        pixel_data: ImagePixelData::Jpeg {
            data: data.to_vec(),
            color_space,
        },
        width_px,
        height_px,
    })
}

/// Walk the JPEG marker chain to the SOF segment and return its component
/// count (1 = grayscale scan, 3 = color). Defaults to 3 when no SOF is
/// found before the data runs out.
fn sof_component_count(data: &[u8]) -> u8 {
    let mut i = 2; // past the FF D8 SOI marker
    while i + 9 < data.len() {
        if data[i] != 0xFF {
            break;
        }
        let marker = data[i + 1];
        if matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF) {
            // SOF layout: marker(2) length(2) precision(1) height(2)
            // width(2) components(1)
            return data[i + 9];
        }
        if i + 3 >= data.len() {
            break;
        }
        let segment_len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        i += 2 + segment_len;
    }
    3
}

/// PNG: decode fully, then split RGB from alpha. The alpha plane is kept
/// only when some pixel actually uses it, so opaque logos skip the SMask.
fn load_png(data: &[u8]) -> Result<LoadedImage, AssetError> {
    let decoded = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| AssetError::Decode("PNG", e.to_string()))?
        .decode()
        .map_err(|e| AssetError::Decode("PNG", e.to_string()))?;

    let rgba = decoded.to_rgba8();
    let (width_px, height_px) = (rgba.width(), rgba.height());

    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    let mut alpha = Vec::with_capacity(rgba.len() / 4);
    for px in rgba.pixels() {
        rgb.extend_from_slice(&px.0[..3]);
        alpha.push(px.0[3]);
    }
    let translucent = alpha.iter().any(|&a| a != u8::MAX);

    Ok(LoadedImage {
        pixel_data: ImagePixelData::Decoded {
            rgb,
            alpha: translucent.then_some(alpha),
        },
        width_px,
        height_px,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;

    fn png_bytes(pixel: [u8; 4]) -> Vec<u8> {
        let mut img = image::RgbaImage::new(1, 1);
        img.put_pixel(0, 0, image::Rgba(pixel));
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), 1, 1, image::ColorType::Rgba8)
            .unwrap();
        buf
    }

    fn jpeg_bytes() -> Vec<u8> {
        let img = image::RgbImage::from_fn(4, 2, |_, _| image::Rgb([0, 107, 112]));
        let mut buf = Vec::new();
        let encoder = image::codecs::jpeg::JpegEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), 4, 2, image::ColorType::Rgb8)
            .unwrap();
        buf
    }

    #[test]
    fn test_sniff_format() {
        assert_eq!(sniff_format(&jpeg_bytes()), Some(RasterFormat::Jpeg));
        assert_eq!(
            sniff_format(&png_bytes([0, 0, 0, 255])),
            Some(RasterFormat::Png)
        );
        assert_eq!(sniff_format(b"GIF89a"), None);
        assert_eq!(sniff_format(&[]), None);
    }

    #[test]
    fn test_logo_from_data_uri() {
        let b64 = base64::engine::general_purpose::STANDARD.encode(png_bytes([0, 107, 112, 255]));
        let logo = load_image(&format!("data:image/png;base64,{b64}")).unwrap();
        assert_eq!((logo.width_px, logo.height_px), (1, 1));
    }

    #[test]
    fn test_bare_base64_accepted() {
        let b64 = base64::engine::general_purpose::STANDARD.encode(jpeg_bytes());
        assert!(load_image(&b64).is_ok());
    }

    #[test]
    fn test_jpeg_logo_passes_through_unmodified() {
        let original = jpeg_bytes();
        let logo = decode_image_bytes(&original).unwrap();
        assert_eq!(logo.width_px, 4);
        assert!((logo.aspect_ratio() - 2.0).abs() < f64::EPSILON);
        match &logo.pixel_data {
            ImagePixelData::Jpeg { data, color_space } => {
                assert_eq!(data, &original, "DCTDecode embeds the source bytes");
                assert!(matches!(color_space, JpegColorSpace::DeviceRGB));
            }
            _ => panic!("JPEG must not be re-encoded"),
        }
    }

    #[test]
    fn test_opaque_signature_has_no_smask_plane() {
        let img = decode_image_bytes(&png_bytes([255, 0, 0, 255])).unwrap();
        match &img.pixel_data {
            ImagePixelData::Decoded { rgb, alpha } => {
                assert_eq!(rgb, &[255, 0, 0]);
                assert!(alpha.is_none());
            }
            _ => panic!("PNG must decode to pixels"),
        }
    }

    #[test]
    fn test_translucent_signature_keeps_alpha_plane() {
        let img = decode_image_bytes(&png_bytes([255, 0, 0, 128])).unwrap();
        match &img.pixel_data {
            ImagePixelData::Decoded { alpha, .. } => {
                assert_eq!(alpha.as_deref(), Some(&[128][..]));
            }
            _ => panic!("PNG must decode to pixels"),
        }
    }

    #[test]
    fn test_malformed_data_uri_is_source_error() {
        assert!(matches!(
            load_image("data:image/png;base64"),
            Err(AssetError::Source { .. })
        ));
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(matches!(
            decode_image_bytes(b"BM\x00\x00\x00\x00"),
            Err(AssetError::UnknownFormat)
        ));
        assert!(matches!(
            decode_image_bytes(&[]),
            Err(AssetError::UnknownFormat)
        ));
    }

    #[test]
    fn test_load_optional_never_fails_a_render() {
        assert!(load_optional("logo", None).is_none());
        assert!(load_optional("logo", Some("not-base64!!")).is_none());
        assert!(load_optional("signature", Some("./no/such/file.png")).is_none());
        let b64 = base64::engine::general_purpose::STANDARD.encode(png_bytes([1, 2, 3, 255]));
        assert!(load_optional("logo", Some(&b64)).is_some());
    }
}
