//! 농업 뉴스 API 클라이언트.
//!
//! `NewsService` 포트 구현. 목록은 메모리에 캐시하고 `refresh`로 우회한다.
//! 일시적 네트워크/서버 에러는 지수 백오프로 재시도.

use async_trait::async_trait;
use docmat_core::error::CoreError;
use docmat_core::models::news::{NewsArticle, NewsSummary};
use docmat_core::ports::news::NewsService;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error_mapping::{check_response, map_transport_error};

/// 기본 재시도 횟수
const DEFAULT_MAX_RETRIES: u32 = 2;

/// 재시도 대기 상한 (`Retry-After` 포함)
const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(30);

/// 재시도 가능한 에러인지 판별
fn is_retryable(error: &CoreError) -> bool {
    matches!(
        error,
        CoreError::Network(_)
            | CoreError::Timeout(_)
            | CoreError::ServiceUnavailable(_)
            | CoreError::RateLimit { .. }
    )
}

/// 이번 재시도 전 대기 시간 (`RateLimit`은 서버 지정값, 모두 상한 적용)
fn retry_delay(error: &CoreError, backoff: Duration, max_backoff: Duration) -> Duration {
    let wait = match error {
        CoreError::RateLimit { retry_after_secs } => Duration::from_secs(*retry_after_secs),
        _ => backoff,
    };
    wait.min(max_backoff)
}

/// 뉴스 API 응답 봉투 `{"status": "...", "data": ...}`
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    status: Option<String>,
    data: T,
}

/// 헬스 체크 응답
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self.status.to_ascii_lowercase().as_str(), "ok" | "success" | "healthy")
    }
}

/// 뉴스 API 클라이언트 — `NewsService` 포트 구현
pub struct HttpNewsClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
    max_backoff: Duration,
    cache: RwLock<Option<Vec<NewsSummary>>>,
}

impl HttpNewsClient {
    /// 새 뉴스 클라이언트 생성
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            max_backoff: DEFAULT_MAX_BACKOFF,
            cache: RwLock::new(None),
        })
    }

    /// 재시도 횟수 설정
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// 재시도 대기 상한 설정
    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    /// 캐시를 무시하고 목록을 다시 받아온다
    pub async fn refresh(&self) -> Result<Vec<NewsSummary>, CoreError> {
        let items: Vec<NewsSummary> = self
            .execute_with_retry(|| self.get_data("/api/news", &[]))
            .await?;
        *self.cache.write() = Some(items.clone());
        debug!("뉴스 목록 갱신: {}건", items.len());
        Ok(items)
    }

    /// 캐시 비우기
    pub fn invalidate(&self) {
        *self.cache.write() = None;
    }

    /// 서버 헬스 체크
    pub async fn health(&self) -> Result<HealthStatus, CoreError> {
        let url = self.url("/api/health", &[])?;
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| map_transport_error(e, "헬스 체크 실패"))?;
        let resp = check_response(resp, "Health").await?;
        resp.json()
            .await
            .map_err(|e| CoreError::Internal(format!("헬스 응답 파싱 실패: {e}")))
    }

    fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<url::Url, CoreError> {
        let raw = format!("{}{}", self.base_url, path);
        url::Url::parse_with_params(&raw, query)
            .map_err(|e| CoreError::Config(format!("잘못된 뉴스 URL {raw}: {e}")))
    }

    async fn get_data<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, CoreError> {
        let url = self.url(path, query)?;
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| map_transport_error(e, "뉴스 요청 실패"))?;
        let resp = check_response(resp, "News").await?;
        let envelope: Envelope<T> = resp
            .json()
            .await
            .map_err(|e| CoreError::Internal(format!("뉴스 응답 파싱 실패: {e}")))?;
        if let Some(status) = envelope.status.as_deref() {
            if status.eq_ignore_ascii_case("error") {
                return Err(CoreError::ServiceUnavailable(format!(
                    "뉴스 서버 에러 응답: {path}"
                )));
            }
        }
        Ok(envelope.data)
    }

    /// 재시도가 포함된 요청 실행
    ///
    /// exponential backoff: 1s → 2s → 4s, 서버의 `Retry-After`도 `max_backoff`로 제한
    async fn execute_with_retry<F, Fut, T>(&self, operation: F) -> Result<T, CoreError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut delay = Duration::from_secs(1);
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if !is_retryable(&e) || attempt >= self.max_retries => return Err(e),
                Err(e) => {
                    let wait = retry_delay(&e, delay, self.max_backoff);
                    warn!(
                        "뉴스 요청 실패 (시도 {}/{}): {e}, {wait:?} 후 재시도",
                        attempt + 1,
                        self.max_retries + 1
                    );
                    tokio::time::sleep(wait).await;
                    delay = (wait * 2).min(self.max_backoff);
                    attempt += 1;
                }
            }
        }
    }
}

#[async_trait]
impl NewsService for HttpNewsClient {
    async fn list(&self) -> Result<Vec<NewsSummary>, CoreError> {
        if let Some(cached) = self.cache.read().clone() {
            debug!("뉴스 목록 캐시 사용: {}건", cached.len());
            return Ok(cached);
        }
        self.refresh().await
    }

    async fn detail(&self, id: i64) -> Result<NewsArticle, CoreError> {
        let path = format!("/api/news/{id}");
        self.execute_with_retry(|| self.get_data(&path, &[]))
            .await
            .map_err(|e| match e {
                CoreError::NotFound { resource_type, .. } => CoreError::NotFound {
                    resource_type,
                    id: id.to_string(),
                },
                other => other,
            })
    }

    async fn search(&self, keyword: &str) -> Result<Vec<NewsSummary>, CoreError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return self.list().await;
        }
        let query = [("keyword", keyword)];
        self.execute_with_retry(|| self.get_data("/api/news/search", &query))
            .await
    }

    async fn related(&self, id: i64) -> Result<Vec<NewsSummary>, CoreError> {
        let path = format!("/api/news/{id}/related");
        self.execute_with_retry(|| self.get_data(&path, &[])).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const LIST_BODY: &str = r#"{
        "status": "success",
        "data": [
            {"id": 1, "title": "Cara mencegah busuk daun", "description": "Tips", "imageUrl": "https://x/1.jpg", "source": "Kementan"},
            {"id": 2, "title": "Pupuk organik", "description": "Panduan"}
        ]
    }"#;

    fn client(url: &str) -> HttpNewsClient {
        HttpNewsClient::new(url, Duration::from_secs(5))
            .unwrap()
            .with_max_retries(0)
    }

    #[tokio::test]
    async fn list_is_cached() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/news")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(LIST_BODY)
            .expect(1)
            .create_async()
            .await;

        let news = client(&server.url());
        let first = news.list().await.unwrap();
        let second = news.list().await.unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(first[0].image_url.as_deref(), Some("https://x/1.jpg"));
        assert!(first[1].source.is_none());
        assert_eq!(first, second);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn refresh_bypasses_cache() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/news")
            .with_status(200)
            .with_body(LIST_BODY)
            .expect(2)
            .create_async()
            .await;

        let news = client(&server.url());
        news.list().await.unwrap();
        news.refresh().await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn detail_parses_article() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/news/7")
            .with_status(200)
            .with_body(
                r#"{"status":"success","data":{"id":7,"title":"T","description":"D","url":"https://x/7","publishedAt":"2025-05-01","content":"isi","category":"tips"}}"#,
            )
            .create_async()
            .await;

        let article = client(&server.url()).detail(7).await.unwrap();
        assert_eq!(article.id, 7);
        assert_eq!(article.category.as_deref(), Some("tips"));
        assert_eq!(article.published_at.as_deref(), Some("2025-05-01"));
    }

    #[tokio::test]
    async fn detail_not_found_carries_id() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/news/99")
            .with_status(404)
            .with_body(r#"{"detail":"not found"}"#)
            .create_async()
            .await;

        let err = client(&server.url()).detail(99).await.unwrap_err();
        assert_matches!(err, CoreError::NotFound { ref id, .. } if id == "99");
    }

    #[tokio::test]
    async fn search_sends_keyword() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/news/search")
            .match_query(mockito::Matcher::UrlEncoded(
                "keyword".into(),
                "busuk daun".into(),
            ))
            .with_status(200)
            .with_body(LIST_BODY)
            .create_async()
            .await;

        let results = client(&server.url()).search(" busuk daun ").await.unwrap();
        assert_eq!(results.len(), 2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn related_list() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/news/1/related")
            .with_status(200)
            .with_body(r#"{"status":"success","data":[]}"#)
            .create_async()
            .await;

        assert!(client(&server.url()).related(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn server_error_retried_then_reported() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/news/5/related")
            .with_status(503)
            .expect(2)
            .create_async()
            .await;

        let news = HttpNewsClient::new(&server.url(), Duration::from_secs(5))
            .unwrap()
            .with_max_retries(1);
        let err = news.related(5).await.unwrap_err();
        assert_matches!(err, CoreError::ServiceUnavailable(_));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn huge_retry_after_is_capped() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/news")
            .with_status(429)
            .with_header("retry-after", "86400")
            .expect(2)
            .create_async()
            .await;

        let news = HttpNewsClient::new(&server.url(), Duration::from_secs(5))
            .unwrap()
            .with_max_retries(1)
            .with_max_backoff(Duration::from_millis(50));
        let err = tokio::time::timeout(Duration::from_secs(5), news.list())
            .await
            .expect("Retry-After 상한이 적용되어야 함")
            .unwrap_err();
        assert_matches!(err, CoreError::RateLimit { retry_after_secs: 86400 });
        mock.assert_async().await;
    }

    #[test]
    fn retry_delay_respects_cap() {
        let cap = Duration::from_secs(30);
        let rate_limited = CoreError::RateLimit {
            retry_after_secs: 86400,
        };
        assert_eq!(retry_delay(&rate_limited, Duration::from_secs(1), cap), cap);

        let short = CoreError::RateLimit {
            retry_after_secs: 3,
        };
        assert_eq!(
            retry_delay(&short, Duration::from_secs(1), cap),
            Duration::from_secs(3)
        );

        let network = CoreError::Network("x".into());
        assert_eq!(
            retry_delay(&network, Duration::from_secs(2), cap),
            Duration::from_secs(2)
        );
        assert_eq!(retry_delay(&network, Duration::from_secs(64), cap), cap);
    }

    #[tokio::test]
    async fn health_check() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/health")
            .with_status(200)
            .with_body(r#"{"status":"ok","message":"running"}"#)
            .create_async()
            .await;

        let health = client(&server.url()).health().await.unwrap();
        assert!(health.is_ok());
    }

    #[test]
    fn retryable_errors() {
        assert!(is_retryable(&CoreError::Network("x".into())));
        assert!(is_retryable(&CoreError::Timeout("x".into())));
        assert!(!is_retryable(&CoreError::Auth("x".into())));
        assert!(!is_retryable(&CoreError::NotFound {
            resource_type: "News".into(),
            id: "1".into()
        }));
    }
}
