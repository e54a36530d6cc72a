//! 히스토리 문서 인라인 인코딩.
//!
//! 이미 준비된 JPEG를 인라인 예산 이하로 품질만 낮춰 재압축한 뒤 Base64로 변환한다.
//! 해상도 축소, EXIF, 알파 처리는 하지 않는다.

use std::path::Path;

use base64::{engine::general_purpose::STANDARD as B64, Engine};
use docmat_core::config::InlineImageConfig;
use docmat_core::error::CoreError;
use docmat_core::ports::image::InlineImageEncoder;
use tracing::debug;

use crate::encoder;

/// JPEG 재압축 + Base64 인라인 인코더
#[derive(Debug, Clone, Default)]
pub struct JpegInlineEncoder {
    config: InlineImageConfig,
}

impl JpegInlineEncoder {
    pub fn new(config: InlineImageConfig) -> Self {
        Self { config }
    }

    /// 이미지 바이트를 인라인 Base64로 변환
    pub fn encode_bytes(&self, bytes: &[u8]) -> Result<String, CoreError> {
        let rgb = image::load_from_memory(bytes)
            .map_err(|e| CoreError::ImageDecode(format!("인라인용 디코딩 실패: {e}")))?
            .into_rgb8();

        let (jpeg, quality, fits) = encoder::compress_quality_only(
            &rgb,
            self.config.inline_max_bytes,
            self.config.start_quality,
            self.config.quality_step,
            self.config.min_quality,
        )?;

        if !fits {
            return Err(CoreError::ImageEncode(format!(
                "인라인 예산 초과: 품질 {} 에서 {} bytes > {} bytes",
                quality,
                jpeg.len(),
                self.config.inline_max_bytes
            )));
        }

        let encoded = B64.encode(&jpeg);
        debug!(
            "인라인 인코딩: {} bytes (품질 {}) → Base64 {} chars",
            jpeg.len(),
            quality,
            encoded.len()
        );
        Ok(encoded)
    }
}

impl InlineImageEncoder for JpegInlineEncoder {
    fn encode_inline(&self, image_path: &Path) -> Result<String, CoreError> {
        let bytes = std::fs::read(image_path).map_err(|e| {
            CoreError::ImageDecode(format!("이미지 읽기 실패: {}: {}", image_path.display(), e))
        })?;
        self.encode_bytes(&bytes)
    }
}
