//! JPEG 인코더.
//!
//! 바이트 예산 기반 적응형 압축. 품질을 먼저 낮추고,
//! 최저 품질에서도 넘치면 해상도를 한 번 축소한 뒤 품질을 다시 시작한다.
//!
//! 루프 상태는 [`CompressionState`], 다음 행동 결정은 순수 함수 [`next_step`].

use docmat_core::config::ImagePrepConfig;
use docmat_core::error::CoreError;
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use tracing::debug;

use crate::resize;

/// JPEG 인코딩
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, CoreError> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100))
        .encode_image(image)
        .map_err(|e| CoreError::ImageEncode(format!("JPEG 인코딩 실패 (품질 {quality}): {e}")))?;
    Ok(buf)
}

/// 압축 루프 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionState {
    /// 현재 JPEG 품질
    pub quality: u8,
    /// 해상도 축소가 한 번 이상 일어났는지
    pub scaled_once: bool,
    pub width: u32,
    pub height: u32,
}

impl CompressionState {
    pub fn new(policy: &ImagePrepConfig, width: u32, height: u32) -> Self {
        Self {
            quality: policy.start_quality,
            scaled_once: false,
            width,
            height,
        }
    }

    /// 축소 후 상태 — 품질은 시작값으로 복귀
    pub fn after_downscale(self, policy: &ImagePrepConfig, width: u32, height: u32) -> Self {
        Self {
            quality: policy.start_quality,
            scaled_once: true,
            width,
            height,
        }
    }
}

/// 종료 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// 예산 이하
    WithinBudget,
    /// 축소 후 최저 품질 도달 — 최선의 결과
    QualityFloor,
    /// 더 축소할 수 없음 — 최선의 결과
    CannotShrink,
}

/// 루프의 다음 행동
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionStep {
    /// 현재 인코딩 결과로 종료
    Finish(FinishReason),
    /// 같은 비트맵으로 낮은 품질 재시도
    LowerQuality(u8),
    /// 해상도 축소 후 재시도
    Downscale { width: u32, height: u32 },
}

/// 현재 상태와 인코딩 크기로 다음 행동 결정
pub fn next_step(
    state: &CompressionState,
    encoded_len: usize,
    policy: &ImagePrepConfig,
) -> CompressionStep {
    if encoded_len <= policy.max_upload_bytes {
        return CompressionStep::Finish(FinishReason::WithinBudget);
    }
    if state.quality <= policy.min_quality && state.scaled_once {
        return CompressionStep::Finish(FinishReason::QualityFloor);
    }
    if state.quality > policy.min_quality {
        let lowered = state
            .quality
            .saturating_sub(policy.quality_step)
            .max(policy.min_quality);
        return CompressionStep::LowerQuality(lowered);
    }

    // 최소 해상도 클램프가 확대로 바뀌면 축소 불가로 본다
    let width = scale_dimension(state.width, policy);
    let height = scale_dimension(state.height, policy);
    if width >= state.width || height >= state.height {
        return CompressionStep::Finish(FinishReason::CannotShrink);
    }
    CompressionStep::Downscale { width, height }
}

fn scale_dimension(current: u32, policy: &ImagePrepConfig) -> u32 {
    let scaled = (current as f64 * policy.scale_step as f64).round() as u32;
    scaled.max(policy.min_dimension)
}

/// 압축 결과
#[derive(Debug, Clone)]
pub struct CompressedJpeg {
    pub bytes: Vec<u8>,
    pub quality: u8,
    pub width: u32,
    pub height: u32,
    pub scaled_once: bool,
    pub reason: FinishReason,
}

/// 예산 이하가 되도록 적응형 압축. 예산을 맞출 수 없으면 최선의 결과를 반환한다.
///
/// 축소로 대체된 비트맵은 즉시 해제되어 동시에 최대 두 개만 존재한다.
pub fn compress_to_budget(
    image: RgbImage,
    policy: &ImagePrepConfig,
) -> Result<CompressedJpeg, CoreError> {
    let (width, height) = image.dimensions();
    let mut state = CompressionState::new(policy, width, height);
    let mut current = image;

    loop {
        let bytes = encode_jpeg(&current, state.quality)?;
        debug!(
            "JPEG 압축: {}x{} 품질 {} → {} bytes (예산 {})",
            state.width,
            state.height,
            state.quality,
            bytes.len(),
            policy.max_upload_bytes
        );

        match next_step(&state, bytes.len(), policy) {
            CompressionStep::Finish(reason) => {
                return Ok(CompressedJpeg {
                    bytes,
                    quality: state.quality,
                    width: state.width,
                    height: state.height,
                    scaled_once: state.scaled_once,
                    reason,
                });
            }
            CompressionStep::LowerQuality(quality) => {
                state.quality = quality;
            }
            CompressionStep::Downscale { width, height } => {
                current = resize::resize_rgb(current, width, height)?;
                state = state.after_downscale(policy, width, height);
            }
        }
    }
}

/// 품질만 낮추는 단순 압축 (해상도 유지).
///
/// 반환: (인코딩 바이트, 최종 품질, 예산 충족 여부)
pub fn compress_quality_only(
    image: &RgbImage,
    max_bytes: usize,
    start_quality: u8,
    quality_step: u8,
    min_quality: u8,
) -> Result<(Vec<u8>, u8, bool), CoreError> {
    let mut quality = start_quality;
    loop {
        let bytes = encode_jpeg(image, quality)?;
        if bytes.len() <= max_bytes {
            return Ok((bytes, quality, true));
        }
        let next = quality.saturating_sub(quality_step.max(1));
        if next < min_quality.max(1) {
            return Ok((bytes, quality, false));
        }
        quality = next;
    }
}
