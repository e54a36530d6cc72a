//! 문서 저장소 포트.
//!
//! 사용자별 히스토리 컬렉션 (`users/{uid}/predictions/{docId}`).
//! 구현: `docmat-storage` crate (rusqlite)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::history::HistoryEntry;

/// 사용자별 히스토리 문서 저장소
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 새 문서 ID 할당 (아직 쓰지 않음)
    fn new_document_id(&self, user_id: &str) -> String;

    /// 문서 쓰기 (`entry.user_id`/`entry.id` 위치, 같은 ID면 덮어쓰기)
    async fn put(&self, entry: &HistoryEntry) -> Result<(), CoreError>;

    /// 문서 단건 조회
    async fn get(&self, user_id: &str, doc_id: &str) -> Result<Option<HistoryEntry>, CoreError>;

    /// 사용자 문서 목록 (최신 `timestamp` 순)
    async fn list(&self, user_id: &str, limit: Option<usize>)
        -> Result<Vec<HistoryEntry>, CoreError>;

    /// 문서 삭제. 존재했으면 `true`.
    async fn delete(&self, user_id: &str, doc_id: &str) -> Result<bool, CoreError>;

    /// 사용자 문서 수
    async fn count(&self, user_id: &str) -> Result<u64, CoreError>;
}
