use image::{DynamicImage, GrayImage, Luma};

use super::options::BitDepth;

/// Luminance at or above this becomes white in 1-bit output
const MONO_THRESHOLD: u8 = 128;

/// Apply the bit-depth policy to a decoded image.
///
/// - `One`: thresholded black/white, one 8-bit channel holding 0 or 255.
/// - `Eight`: RGB8 when the source carries colour, Luma8 otherwise.
/// - `Sixteen`: Luma16, kept as-is when already Luma16.
pub fn convert_bit_depth(img: DynamicImage, bit_depth: BitDepth) -> DynamicImage {
    match bit_depth {
        BitDepth::One => to_monochrome(&img),
        BitDepth::Eight => {
            if img.color().has_color() {
                DynamicImage::ImageRgb8(img.to_rgb8())
            } else {
                DynamicImage::ImageLuma8(img.to_luma8())
            }
        }
        BitDepth::Sixteen => match img {
            DynamicImage::ImageLuma16(_) => img,
            other => DynamicImage::ImageLuma16(other.to_luma16()),
        },
    }
}

fn to_monochrome(img: &DynamicImage) -> DynamicImage {
    let gray = img.to_luma8();
    let mono = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y).0[0] >= MONO_THRESHOLD {
            Luma([u8::MAX])
        } else {
            Luma([0])
        }
    });
    DynamicImage::ImageLuma8(mono)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ColorType, ImageBuffer, Rgb, RgbImage, Rgba, RgbaImage};

    fn colour_image() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(4, 4, |x, y| {
            Rgb([(x * 60) as u8, (y * 60) as u8, 200])
        }))
    }

    #[test]
    fn test_colour_stays_colour_at_eight_bits() {
        let converted = convert_bit_depth(colour_image(), BitDepth::Eight);
        assert_eq!(converted.color(), ColorType::Rgb8);
    }

    #[test]
    fn test_alpha_is_dropped_at_eight_bits() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 40])));
        let converted = convert_bit_depth(rgba, BitDepth::Eight);
        assert_eq!(converted.color(), ColorType::Rgb8);
    }

    #[test]
    fn test_single_channel_becomes_grayscale_at_eight_bits() {
        let gray16: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::from_pixel(3, 3, Luma([40_000u16]));
        let converted = convert_bit_depth(DynamicImage::ImageLuma16(gray16), BitDepth::Eight);
        assert_eq!(converted.color(), ColorType::L8);

        let gray8 = DynamicImage::ImageLuma8(GrayImage::from_pixel(3, 3, Luma([77])));
        let converted = convert_bit_depth(gray8, BitDepth::Eight);
        assert_eq!(converted.color(), ColorType::L8);
    }

    #[test]
    fn test_monochrome_is_thresholded() {
        let gray = GrayImage::from_fn(4, 1, |x, _| Luma([[0u8, 127, 128, 255][x as usize]]));
        let converted = convert_bit_depth(DynamicImage::ImageLuma8(gray), BitDepth::One);

        let luma = converted.as_luma8().unwrap();
        let values: Vec<u8> = luma.pixels().map(|p| p.0[0]).collect();
        assert_eq!(values, vec![0, 0, 255, 255]);
    }

    #[test]
    fn test_sixteen_bits_is_grayscale() {
        let converted = convert_bit_depth(colour_image(), BitDepth::Sixteen);
        assert_eq!(converted.color(), ColorType::L16);
    }

    #[test]
    fn test_sixteen_bit_grayscale_is_unchanged() {
        let gray16: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::from_fn(2, 2, |x, y| Luma([(x * 1000 + y * 20_000) as u16]));
        let original = DynamicImage::ImageLuma16(gray16.clone());

        let converted = convert_bit_depth(original, BitDepth::Sixteen);
        assert_eq!(converted.as_luma16().unwrap(), &gray16);
    }
}
