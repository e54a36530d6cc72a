//! 고속 리사이즈.
//!
//! fast_image_resize 기반. 알파가 있으면 RGBA(U8x4), 없으면 RGB(U8x3)로 처리한다.

use docmat_core::error::CoreError;
use fast_image_resize::{images::Image as FirImage, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, RgbImage, RgbaImage};
use tracing::debug;

fn resize_raw(
    src_w: u32,
    src_h: u32,
    raw: Vec<u8>,
    width: u32,
    height: u32,
    pixel_type: PixelType,
) -> Result<Vec<u8>, CoreError> {
    if src_w == 0 || src_h == 0 {
        return Err(CoreError::ImageEncode("소스 이미지 크기 0".to_string()));
    }
    if width == 0 || height == 0 {
        return Err(CoreError::ImageEncode("목표 이미지 크기 0".to_string()));
    }

    let src_image = FirImage::from_vec_u8(src_w, src_h, raw, pixel_type)
        .map_err(|e| CoreError::ImageEncode(format!("소스 이미지 생성 실패: {e}")))?;

    let mut dst_image = FirImage::new(width, height, pixel_type);

    let mut resizer = Resizer::new();
    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(
        fast_image_resize::FilterType::Bilinear,
    ));

    resizer
        .resize(&src_image, &mut dst_image, &options)
        .map_err(|e| CoreError::ImageEncode(format!("리사이즈 실패: {e}")))?;

    debug!("리사이즈: {}x{} → {}x{}", src_w, src_h, width, height);
    Ok(dst_image.into_vec())
}

/// RGB 이미지 리사이즈 (원본 소비)
pub fn resize_rgb(image: RgbImage, width: u32, height: u32) -> Result<RgbImage, CoreError> {
    let (src_w, src_h) = image.dimensions();
    if (src_w, src_h) == (width, height) {
        return Ok(image);
    }

    let raw = resize_raw(src_w, src_h, image.into_raw(), width, height, PixelType::U8x3)?;
    RgbImage::from_raw(width, height, raw)
        .ok_or_else(|| CoreError::ImageEncode("결과 이미지 생성 실패".to_string()))
}

/// 디코딩 직후 다운샘플 — 알파 채널 유지 (원본 소비)
pub fn resize_dynamic(
    image: DynamicImage,
    width: u32,
    height: u32,
) -> Result<DynamicImage, CoreError> {
    if (image.width(), image.height()) == (width, height) {
        return Ok(image);
    }

    if image.color().has_alpha() {
        let rgba = image.into_rgba8();
        let (src_w, src_h) = rgba.dimensions();
        let raw = resize_raw(src_w, src_h, rgba.into_raw(), width, height, PixelType::U8x4)?;
        let resized = RgbaImage::from_raw(width, height, raw)
            .ok_or_else(|| CoreError::ImageEncode("결과 이미지 생성 실패".to_string()))?;
        Ok(DynamicImage::ImageRgba8(resized))
    } else {
        resize_rgb(image.into_rgb8(), width, height).map(DynamicImage::ImageRgb8)
    }
}
