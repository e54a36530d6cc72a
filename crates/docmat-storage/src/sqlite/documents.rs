//! 히스토리 문서 스토리지 (DocumentStore 포트 구현).
//!
//! 문서 전체는 JSON(`data`)으로 저장하고, 정렬/표시용 필드만 컬럼으로 둔다.

use async_trait::async_trait;
use chrono::SecondsFormat;
use docmat_core::error::CoreError;
use docmat_core::models::history::HistoryEntry;
use docmat_core::ports::document_store::DocumentStore;
use tracing::{debug, warn};
use uuid::Uuid;

use super::SqliteDocumentStore;

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    fn new_document_id(&self, _user_id: &str) -> String {
        Uuid::new_v4().simple().to_string()
    }

    async fn put(&self, entry: &HistoryEntry) -> Result<(), CoreError> {
        if entry.user_id.is_empty() || entry.id.is_empty() {
            return Err(CoreError::Validation {
                field: "id".to_string(),
                message: "문서 위치(user_id/id)가 비어 있음".to_string(),
            });
        }

        let data = serde_json::to_string(entry)?;
        // 고정 자릿수 UTC 문자열이라 사전순 정렬 = 시간순 정렬
        let timestamp = entry.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true);

        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO predictions
                (user_id, doc_id, predict_id, disease_name, confidence, image_kind, timestamp, data)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                entry.user_id,
                entry.id,
                entry.predict_id,
                entry.disease_name,
                entry.confidence,
                entry.image.kind(),
                timestamp,
                data
            ],
        )
        .map_err(|e| CoreError::Storage(format!("히스토리 문서 저장 실패: {e}")))?;

        debug!(
            "히스토리 문서 저장: users/{}/predictions/{} ({})",
            entry.user_id,
            entry.id,
            entry.image.kind()
        );
        Ok(())
    }

    async fn get(&self, user_id: &str, doc_id: &str) -> Result<Option<HistoryEntry>, CoreError> {
        let conn = self.lock()?;
        let result = conn.query_row(
            "SELECT data FROM predictions WHERE user_id = ?1 AND doc_id = ?2",
            rusqlite::params![user_id, doc_id],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(data) => Ok(Some(serde_json::from_str(&data)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(CoreError::Storage(format!("히스토리 조회 실패: {e}"))),
        }
    }

    async fn list(
        &self,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<HistoryEntry>, CoreError> {
        // LIMIT -1 은 SQLite에서 무제한
        let limit = limit.map(|l| l as i64).unwrap_or(-1);

        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT data FROM predictions WHERE user_id = ?1
                 ORDER BY timestamp DESC, created_at DESC LIMIT ?2",
            )
            .map_err(|e| CoreError::Storage(format!("쿼리 준비 실패: {e}")))?;

        let entries = stmt
            .query_map(rusqlite::params![user_id, limit], |row| {
                row.get::<_, String>(0)
            })
            .map_err(|e| CoreError::Storage(format!("쿼리 실행 실패: {e}")))?
            .filter_map(|r| r.ok())
            .filter_map(|data| match serde_json::from_str::<HistoryEntry>(&data) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("손상된 히스토리 문서 건너뜀: {e}");
                    None
                }
            })
            .collect();

        Ok(entries)
    }

    async fn delete(&self, user_id: &str, doc_id: &str) -> Result<bool, CoreError> {
        let conn = self.lock()?;
        let deleted = conn
            .execute(
                "DELETE FROM predictions WHERE user_id = ?1 AND doc_id = ?2",
                rusqlite::params![user_id, doc_id],
            )
            .map_err(|e| CoreError::Storage(format!("히스토리 삭제 실패: {e}")))?;

        debug!("히스토리 문서 삭제: users/{user_id}/predictions/{doc_id} ({deleted}건)");
        Ok(deleted > 0)
    }

    async fn count(&self, user_id: &str) -> Result<u64, CoreError> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM predictions WHERE user_id = ?1",
                rusqlite::params![user_id],
                |row| row.get(0),
            )
            .map_err(|e| CoreError::Storage(format!("히스토리 개수 조회 실패: {e}")))?;
        Ok(count.max(0) as u64)
    }
}
