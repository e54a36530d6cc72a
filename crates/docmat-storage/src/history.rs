//! 예측 히스토리 저장소.
//!
//! 분석 결과 한 건을 정확히 하나의 문서로 남기는 폴백 체인:
//! 1. 인라인 — 이미지를 재압축해 Base64로 문서에 포함
//! 2. 객체 저장소 — 원본 준비 이미지를 업로드하고 URL만 문서에 기록
//! 3. 메타데이터 — 이미지 없이 문서만 기록
//!
//! 각 전략은 호출당 한 번만 시도되며, 첫 성공에서 멈춘다.
//! 임시 이미지 파일 정리는 호출자 책임.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use docmat_core::error::CoreError;
use docmat_core::models::history::{HistoryEntry, HistoryImage};
use docmat_core::models::prediction::PredictionRecord;
use docmat_core::ports::auth::AuthProvider;
use docmat_core::ports::document_store::DocumentStore;
use docmat_core::ports::image::InlineImageEncoder;
use docmat_core::ports::object_store::ObjectStore;
use tracing::{debug, error, info, warn};

/// 업로드 객체 MIME 타입
const OBJECT_CONTENT_TYPE: &str = "image/jpeg";

/// 히스토리 저장 전략 (시도 순서대로)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistStrategy {
    Inline,
    ObjectStorage,
    MetadataOnly,
}

impl PersistStrategy {
    /// 시도 순서
    pub const ORDER: [PersistStrategy; 3] = [
        PersistStrategy::Inline,
        PersistStrategy::ObjectStorage,
        PersistStrategy::MetadataOnly,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PersistStrategy::Inline => "inline",
            PersistStrategy::ObjectStorage => "object",
            PersistStrategy::MetadataOnly => "metadata",
        }
    }
}

/// 저장 성공 결과
#[derive(Debug, Clone)]
pub struct SavedHistory {
    /// 성공한 전략
    pub strategy: PersistStrategy,
    /// 저장된 문서
    pub entry: HistoryEntry,
}

impl SavedHistory {
    pub fn id(&self) -> &str {
        &self.entry.id
    }
}

/// 객체 저장 경로 `users/{uid}/predictions/{doc_id}.jpg`
pub fn object_path(user_id: &str, doc_id: &str) -> String {
    format!("users/{user_id}/predictions/{doc_id}.jpg")
}

/// 히스토리 저장소 — 폴백 체인 + 조회
pub struct HistoryRepository {
    auth: Arc<dyn AuthProvider>,
    documents: Arc<dyn DocumentStore>,
    objects: Arc<dyn ObjectStore>,
    inline: Arc<dyn InlineImageEncoder>,
}

impl HistoryRepository {
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        documents: Arc<dyn DocumentStore>,
        objects: Arc<dyn ObjectStore>,
        inline: Arc<dyn InlineImageEncoder>,
    ) -> Self {
        Self {
            auth,
            documents,
            objects,
            inline,
        }
    }

    async fn require_user(&self) -> Result<String, CoreError> {
        self.auth
            .current_user_id()
            .await
            .ok_or_else(|| CoreError::Auth("로그인이 필요합니다".to_string()))
    }

    /// 예측 결과와 준비된 이미지를 히스토리로 저장
    ///
    /// 세 전략이 모두 실패하면 `PersistenceExhausted` (전략별 사유 포함).
    pub async fn save(
        &self,
        record: &PredictionRecord,
        image_path: &Path,
        local_image_uri: &str,
    ) -> Result<SavedHistory, CoreError> {
        let user_id = self.require_user().await?;

        let mut base = HistoryEntry::from_prediction(record, &user_id, local_image_uri);
        base.id = self.documents.new_document_id(&user_id);
        debug!("히스토리 저장 시작: users/{user_id}/predictions/{}", base.id);

        let mut attempts = Vec::with_capacity(PersistStrategy::ORDER.len());
        for strategy in PersistStrategy::ORDER {
            match self.attempt(strategy, &base, image_path).await {
                Ok(entry) => {
                    info!(
                        "히스토리 저장 완료: {} (전략: {}, 이전 실패 {}건)",
                        entry.id,
                        strategy.name(),
                        attempts.len()
                    );
                    return Ok(SavedHistory { strategy, entry });
                }
                Err(e) => {
                    warn!("히스토리 저장 전략 실패 [{}]: {e}", strategy.name());
                    attempts.push(format!("{}: {e}", strategy.name()));
                }
            }
        }

        error!("히스토리 저장 실패 — 모든 전략 실패: {}", base.id);
        Err(CoreError::PersistenceExhausted { attempts })
    }

    async fn attempt(
        &self,
        strategy: PersistStrategy,
        base: &HistoryEntry,
        image_path: &Path,
    ) -> Result<HistoryEntry, CoreError> {
        let image = match strategy {
            PersistStrategy::Inline => HistoryImage::Inline {
                base64: self.encode_inline(image_path).await?,
            },
            PersistStrategy::ObjectStorage => {
                let path = object_path(&base.user_id, &base.id);
                let url = self
                    .objects
                    .upload(&path, image_path, OBJECT_CONTENT_TYPE)
                    .await?;
                HistoryImage::Remote { url }
            }
            PersistStrategy::MetadataOnly => HistoryImage::None,
        };

        let entry = base.with_image(image);
        if let Err(e) = self.documents.put(&entry).await {
            if strategy == PersistStrategy::ObjectStorage {
                self.discard_object(&entry).await;
            }
            return Err(e);
        }
        Ok(entry)
    }

    async fn encode_inline(&self, image_path: &Path) -> Result<String, CoreError> {
        let encoder = Arc::clone(&self.inline);
        let path: PathBuf = image_path.to_path_buf();
        tokio::task::spawn_blocking(move || encoder.encode_inline(&path))
            .await
            .map_err(|e| CoreError::Internal(format!("인라인 인코딩 태스크 실패: {e}")))?
    }

    /// 문서 기록에 실패한 업로드 객체 정리 (best-effort)
    async fn discard_object(&self, entry: &HistoryEntry) {
        let path = object_path(&entry.user_id, &entry.id);
        if let Err(e) = self.objects.delete(&path).await {
            warn!("고아 객체 삭제 실패 {path}: {e}");
        }
    }

    /// 현재 사용자 히스토리 (최신순)
    pub async fn list(&self, limit: Option<usize>) -> Result<Vec<HistoryEntry>, CoreError> {
        let user_id = self.require_user().await?;
        self.documents.list(&user_id, limit).await
    }

    /// 히스토리 단건
    pub async fn get(&self, doc_id: &str) -> Result<HistoryEntry, CoreError> {
        let user_id = self.require_user().await?;
        self.documents
            .get(&user_id, doc_id)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                resource_type: "History".to_string(),
                id: doc_id.to_string(),
            })
    }

    /// 히스토리 삭제 — 원격 이미지가 있으면 객체도 삭제 (best-effort)
    pub async fn delete(&self, doc_id: &str) -> Result<(), CoreError> {
        let entry = self.get(doc_id).await?;
        self.documents.delete(&entry.user_id, doc_id).await?;

        if matches!(entry.image, HistoryImage::Remote { .. }) {
            self.discard_object(&entry).await;
        }
        info!("히스토리 삭제: {doc_id}");
        Ok(())
    }

    /// 현재 사용자 히스토리 개수
    pub async fn count(&self) -> Result<u64, CoreError> {
        let user_id = self.require_user().await?;
        self.documents.count(&user_id).await
    }

    /// 질병 이름/증상 검색 (대소문자 무시, 빈 검색어는 전체)
    pub async fn search(&self, query: &str) -> Result<Vec<HistoryEntry>, CoreError> {
        let entries = self.list(None).await?;
        let query = query.trim();
        if query.is_empty() {
            return Ok(entries);
        }
        Ok(entries
            .into_iter()
            .filter(|e| e.matches_query(query))
            .collect())
    }
}
