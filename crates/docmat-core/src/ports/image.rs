//! 이미지 인코딩 포트.
//!
//! 구현: `docmat-vision` crate (image, base64)

use std::path::Path;

use crate::error::CoreError;

/// 히스토리 문서 인라인용 이미지 인코더
pub trait InlineImageEncoder: Send + Sync {
    /// 이미지 파일을 인라인 예산 이하로 재압축한 뒤 Base64 문자열로 반환.
    ///
    /// 최저 품질로도 예산을 넘으면 에러.
    fn encode_inline(&self, image_path: &Path) -> Result<String, CoreError>;
}
