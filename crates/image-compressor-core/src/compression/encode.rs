use image::codecs::bmp::BmpEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, GenericImageView, ImageEncoder};
use mozjpeg::{ColorSpace, Compress};

use super::options::{CompressionOptions, OutputFormat};

/// libwebp compression method, 6 is the slowest and smallest
const WEBP_METHOD: i32 = 6;

/// Encode an already converted image into the target format in memory
pub fn encode(img: &DynamicImage, options: &CompressionOptions) -> Result<Vec<u8>, String> {
    match options.format {
        OutputFormat::Jpeg => encode_jpeg(img, options.quality.get()),
        OutputFormat::Png => encode_png(img),
        OutputFormat::Webp => encode_webp(img, options.quality.get()),
        OutputFormat::Bmp => encode_bmp(img),
    }
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, String> {
    encode_jpeg_with(img, quality, true)
}

/// mozjpeg encode; `optimize` turns on optimal Huffman tables
fn encode_jpeg_with(img: &DynamicImage, quality: u8, optimize: bool) -> Result<Vec<u8>, String> {
    let (color_space, pixels) = match img {
        DynamicImage::ImageLuma8(gray) => (ColorSpace::JCS_GRAYSCALE, gray.as_raw().clone()),
        DynamicImage::ImageRgb8(rgb) => (ColorSpace::JCS_RGB, rgb.as_raw().clone()),
        DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_)
        | DynamicImage::ImageRgb16(_)
        | DynamicImage::ImageRgba16(_) => {
            return Err("Failed to encode JPEG: JPEG cannot hold 16-bit samples".to_string())
        }
        other => (ColorSpace::JCS_RGB, other.to_rgb8().into_raw()),
    };

    let (width, height) = img.dimensions();
    let mut comp = Compress::new(color_space);
    comp.set_size(width as usize, height as usize);
    comp.set_quality(f32::from(quality));
    comp.set_optimize_coding(optimize);

    let jpeg_error = |e: std::io::Error| format!("Failed to encode JPEG: {}", e);
    let mut writer = comp.start_compress(Vec::new()).map_err(jpeg_error)?;
    writer.write_scanlines(&pixels).map_err(jpeg_error)?;
    writer.finish().map_err(jpeg_error)
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, String> {
    let (width, height) = img.dimensions();
    let mut buf = Vec::new();
    PngEncoder::new_with_quality(&mut buf, CompressionType::Default, FilterType::Adaptive)
        .write_image(img.as_bytes(), width, height, img.color())
        .map_err(|e| format!("Failed to encode PNG: {}", e))?;
    Ok(buf)
}

fn encode_bmp(img: &DynamicImage) -> Result<Vec<u8>, String> {
    let (width, height) = img.dimensions();
    let mut buf = Vec::new();
    BmpEncoder::new(&mut buf)
        .write_image(img.as_bytes(), width, height, img.color())
        .map_err(|e| format!("Failed to encode BMP: {}", e))?;
    Ok(buf)
}

/// WebP has no grayscale mode, so pixels go to libwebp as RGB or RGBA
fn encode_webp(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, String> {
    let mut config =
        webp::WebPConfig::new().map_err(|_| "Failed to initialise WebP config".to_string())?;
    config.lossless = 0;
    config.quality = f32::from(quality);
    config.method = WEBP_METHOD;

    let (width, height) = img.dimensions();
    let pixels = if img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    };

    let encoder = match &pixels {
        DynamicImage::ImageRgba8(rgba) => webp::Encoder::from_rgba(rgba.as_raw(), width, height),
        _ => webp::Encoder::from_rgb(pixels.as_bytes(), width, height),
    };
    let memory = encoder
        .encode_advanced(&config)
        .map_err(|e| format!("Failed to encode WebP: {:?}", e))?;

    Ok(memory.to_vec())
}
