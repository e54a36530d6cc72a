//! 알파 채널 평탄화.
//!
//! JPEG에는 알파가 없으므로 투명 픽셀을 흰 배경에 합성한다.

use image::{DynamicImage, Rgb, RgbImage};

/// 흰 배경에 합성한 불투명 RGB 이미지 반환
pub fn flatten_onto_white(image: DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.into_rgb8();
    }

    let rgba = image.into_rgba8();
    let (width, height) = rgba.dimensions();
    let mut out = RgbImage::new(width, height);

    for (dst, src) in out.pixels_mut().zip(rgba.pixels()) {
        let alpha = src[3] as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        *dst = Rgb([blend(src[0]), blend(src[1]), blend(src[2])]);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn transparent_becomes_white() {
        let mut rgba = RgbaImage::from_pixel(4, 4, Rgba([200, 10, 10, 0]));
        rgba.put_pixel(0, 0, Rgba([200, 10, 10, 255]));

        let flat = flatten_onto_white(DynamicImage::ImageRgba8(rgba));
        assert_eq!(flat.get_pixel(1, 1), &Rgb([255, 255, 255]));
        assert_eq!(flat.get_pixel(0, 0), &Rgb([200, 10, 10]));
    }

    #[test]
    fn half_alpha_blends_toward_white() {
        let rgba = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 128]));
        let flat = flatten_onto_white(DynamicImage::ImageRgba8(rgba));
        let px = flat.get_pixel(0, 0);
        assert!(px[0] > 120 && px[0] < 135, "blend: {:?}", px);
    }

    #[test]
    fn opaque_image_unchanged() {
        let rgb = RgbImage::from_pixel(3, 2, Rgb([1, 2, 3]));
        let flat = flatten_onto_white(DynamicImage::ImageRgb8(rgb.clone()));
        assert_eq!(flat, rgb);
    }
}
