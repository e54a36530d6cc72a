//! 예측 서비스 포트.
//!
//! 구현: `docmat-network` crate (reqwest multipart)

use std::path::Path;

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::prediction::PredictionRecord;

/// 원격 잎 이미지 분류 서비스
#[async_trait]
pub trait PredictionService: Send + Sync {
    /// 준비된 JPEG 파일을 업로드하고 분류 결과를 받는다.
    async fn predict(&self, image_path: &Path) -> Result<PredictionRecord, CoreError>;
}
