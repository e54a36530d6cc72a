//! 객체(바이너리) 저장소 포트.
//!
//! 구현: `docmat-storage` crate (로컬 파일시스템)

use std::path::Path;

use async_trait::async_trait;

use crate::error::CoreError;

/// 이미지 객체 저장소
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// 로컬 파일을 `object_path`에 업로드하고 조회 URL을 반환한다.
    async fn upload(
        &self,
        object_path: &str,
        local_file: &Path,
        content_type: &str,
    ) -> Result<String, CoreError>;

    /// 객체 삭제 (없으면 무시)
    async fn delete(&self, object_path: &str) -> Result<(), CoreError>;
}
