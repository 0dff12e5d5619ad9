//! Photo normalization and thumbnail generation
//!
//! Stored photos are bounded to a maximum edge length and have their EXIF
//! orientation baked into the pixels. A photo that already fits and needs no
//! rotation is stored byte-for-byte as uploaded, so repeated imports of an
//! untouched file stay bit-identical.

use crate::error::{IngestError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use std::io::Cursor;
use tracing::debug;

/// A photo after normalization.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Whether the pixels differ from the input (resize or rotation)
    pub was_resized: bool,
    /// Library extension matching the encoded bytes, with leading dot
    pub extension: &'static str,
}

fn decode(data: &[u8]) -> Result<(DynamicImage, Orientation, Option<ImageFormat>)> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| IngestError::Image(e.to_string()))?;
    let format = reader.format();

    let mut decoder = reader
        .into_decoder()
        .map_err(|e| IngestError::Image(e.to_string()))?;
    let orientation = decoder
        .orientation()
        .unwrap_or(Orientation::NoTransforms);
    let image =
        DynamicImage::from_decoder(decoder).map_err(|e| IngestError::Image(e.to_string()))?;

    Ok((image, orientation, format))
}

/// Normalize a photo for library storage.
///
/// Applies the EXIF orientation and bounds the image to `max_dimension` on
/// its longest edge, preserving aspect ratio. When neither is needed the
/// original bytes are returned verbatim.
pub fn prepare_photo(data: &[u8], max_dimension: u32) -> Result<ProcessedImage> {
    let (mut image, orientation, format) = decode(data)?;

    let needs_rotation = orientation != Orientation::NoTransforms;
    if needs_rotation {
        image.apply_orientation(orientation);
    }

    let needs_resize = image.width() > max_dimension || image.height() > max_dimension;

    if !needs_resize && !needs_rotation {
        return Ok(ProcessedImage {
            bytes: data.to_vec(),
            width: image.width(),
            height: image.height(),
            was_resized: false,
            extension: extension_for(format),
        });
    }

    if needs_resize {
        image = image.resize(max_dimension, max_dimension, FilterType::Lanczos3);
    }

    // PNG sources stay PNG to keep transparency; everything else becomes JPEG
    let (bytes, extension) = if format == Some(ImageFormat::Png) {
        let mut buf = Cursor::new(Vec::new());
        image
            .write_to(&mut buf, ImageFormat::Png)
            .map_err(|e| IngestError::Image(e.to_string()))?;
        (buf.into_inner(), ".png")
    } else {
        (encode_jpeg(&image, 90)?, ".jpg")
    };

    debug!(
        width = image.width(),
        height = image.height(),
        "Normalized photo"
    );

    Ok(ProcessedImage {
        width: image.width(),
        height: image.height(),
        bytes,
        was_resized: true,
        extension,
    })
}

/// Render a square-bounded JPEG thumbnail for a photo.
pub fn make_thumbnail(data: &[u8], size: u32, quality: u8) -> Result<Vec<u8>> {
    let (mut image, orientation, _) = decode(data)?;
    if orientation != Orientation::NoTransforms {
        image.apply_orientation(orientation);
    }

    let thumbnail = image.resize(size, size, FilterType::CatmullRom);
    encode_jpeg(&thumbnail, quality)
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    // JPEG has no alpha channel
    let rgb = image.to_rgb8();
    let mut buf = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buf, quality)
        .encode_image(&rgb)
        .map_err(|e| IngestError::Image(e.to_string()))?;
    Ok(buf.into_inner())
}

fn extension_for(format: Option<ImageFormat>) -> &'static str {
    match format {
        Some(ImageFormat::Png) => ".png",
        Some(ImageFormat::Gif) => ".gif",
        Some(ImageFormat::WebP) => ".webp",
        Some(ImageFormat::Bmp) => ".bmp",
        Some(ImageFormat::Tiff) => ".tiff",
        _ => ".jpg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            image::Rgb([120, 40, 200]),
        ));
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_oversized_photo_is_bounded_preserving_aspect() {
        let data = png_bytes(2000, 1000);
        let processed = prepare_photo(&data, 800).unwrap();

        assert!(processed.was_resized);
        assert_eq!(processed.width, 800);
        assert_eq!(processed.height, 400);
        assert_eq!(processed.extension, ".png");
    }

    #[test]
    fn test_small_photo_kept_verbatim() {
        let data = png_bytes(100, 100);
        let processed = prepare_photo(&data, 200).unwrap();

        assert!(!processed.was_resized);
        assert_eq!(processed.bytes, data);
        assert_eq!(processed.width, 100);
        assert_eq!(processed.height, 100);
    }

    #[test]
    fn test_thumbnail_is_jpeg() {
        let data = png_bytes(1000, 500);
        let thumb = make_thumbnail(&data, 200, 85).unwrap();

        let decoded = ImageReader::new(Cursor::new(&thumb))
            .with_guessed_format()
            .unwrap();
        assert_eq!(decoded.format(), Some(ImageFormat::Jpeg));

        let img = decoded.decode().unwrap();
        assert_eq!(img.width(), 200);
        assert_eq!(img.height(), 100);
    }

    #[test]
    fn test_garbage_input_is_image_error() {
        let err = prepare_photo(b"not an image", 800).unwrap_err();
        assert!(matches!(err, IngestError::Image(_)));
    }
}
