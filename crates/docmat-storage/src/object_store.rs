//! 이미지 객체 파일 저장소.
//!
//! `ObjectStore` 포트 구현. 객체 경로(`users/{uid}/predictions/{doc}.jpg`)를
//! 기본 디렉토리 아래 상대 경로로 그대로 사용하고 `file://` URL을 반환한다.

use async_trait::async_trait;
use docmat_core::error::CoreError;
use docmat_core::ports::object_store::ObjectStore;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// 로컬 파일시스템 객체 저장소
pub struct LocalObjectStore {
    base_dir: PathBuf,
}

impl LocalObjectStore {
    /// 새 객체 저장소 생성 (디렉토리 자동 생성)
    pub async fn new(base_dir: PathBuf) -> Result<Self, CoreError> {
        fs::create_dir_all(&base_dir).await?;
        info!("객체 저장소 초기화: {}", base_dir.display());
        Ok(Self { base_dir })
    }

    /// 기본 디렉토리
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// 객체 경로 → 로컬 파일 경로 (기본 디렉토리 밖으로 나가는 경로 거부)
    pub fn resolve(&self, object_path: &str) -> Result<PathBuf, CoreError> {
        let relative = Path::new(object_path);
        let safe = !object_path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(CoreError::Validation {
                field: "object_path".to_string(),
                message: format!("허용되지 않는 객체 경로: {object_path}"),
            });
        }
        Ok(self.base_dir.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn upload(
        &self,
        object_path: &str,
        local_file: &Path,
        content_type: &str,
    ) -> Result<String, CoreError> {
        if !content_type.starts_with("image/") {
            return Err(CoreError::Validation {
                field: "content_type".to_string(),
                message: format!("이미지 타입만 저장 가능: {content_type}"),
            });
        }

        let dest = self.resolve(object_path)?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }

        let bytes = fs::copy(local_file, &dest).await.map_err(|e| {
            CoreError::Storage(format!(
                "객체 업로드 실패: {} → {}: {}",
                local_file.display(),
                object_path,
                e
            ))
        })?;

        let absolute = fs::canonicalize(&dest).await?;
        let url = url::Url::from_file_path(&absolute)
            .map_err(|_| CoreError::Storage(format!("파일 URL 변환 실패: {}", absolute.display())))?;

        debug!("객체 업로드: {object_path} ({bytes} bytes, {content_type})");
        Ok(url.to_string())
    }

    async fn delete(&self, object_path: &str) -> Result<(), CoreError> {
        let path = self.resolve(object_path)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!("객체 삭제: {object_path}");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CoreError::Storage(format!("객체 삭제 실패: {object_path}: {e}"))),
        }
    }
}
