//! 뉴스 서비스 포트.
//!
//! 구현: `docmat-network` crate (reqwest)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::news::{NewsArticle, NewsSummary};

/// 농업 뉴스/팁 조회
#[async_trait]
pub trait NewsService: Send + Sync {
    /// 뉴스 목록
    async fn list(&self) -> Result<Vec<NewsSummary>, CoreError>;

    /// 뉴스 상세
    async fn detail(&self, id: i64) -> Result<NewsArticle, CoreError>;

    /// 키워드 검색
    async fn search(&self, keyword: &str) -> Result<Vec<NewsSummary>, CoreError>;

    /// 관련 뉴스
    async fn related(&self, id: i64) -> Result<Vec<NewsSummary>, CoreError>;
}
