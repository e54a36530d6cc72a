//! ID 토큰 인증 관리.
//!
//! 계정 REST API 로그인/가입, 리프레시 토큰 갱신, 자동 만료 관리를 담당한다.
//! `AuthProvider` 포트 구현.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use docmat_core::config::AuthConfig;
use docmat_core::error::CoreError;
use docmat_core::ports::auth::AuthProvider;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error_mapping::map_transport_error;

/// 토큰 기본 수명 (초)
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// 만료 몇 분 전에 갱신할지
const REFRESH_MARGIN_MINUTES: i64 = 5;

/// 계정 API 응답 — 로그인/가입
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

/// 토큰 API 응답 — 갱신
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
}

/// 에러 응답 `{"error":{"message":"EMAIL_NOT_FOUND"}}`
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// 로그인 세션 (세션 파일로 저장/복원 가능)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    /// 갱신이 필요한지 (만료 5분 전부터)
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::minutes(REFRESH_MARGIN_MINUTES) >= self.expires_at
    }
}

/// ID 토큰 매니저 — 로그인/갱신/만료 관리
#[derive(Clone)]
pub struct TokenManager {
    account_url: String,
    token_url: String,
    api_key: String,
    client: reqwest::Client,
    state: Arc<RwLock<Option<AuthSession>>>,
}

impl TokenManager {
    /// 새 토큰 매니저 생성
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            account_url: config.base_url.trim_end_matches('/').to_string(),
            token_url: config.token_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client: reqwest::Client::new(),
            state: Arc::new(RwLock::new(None)),
        }
    }

    /// 이메일/비밀번호 로그인
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, CoreError> {
        self.account_request("accounts:signInWithPassword", email, password)
            .await
    }

    /// 신규 계정 가입 (가입 즉시 로그인 상태)
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, CoreError> {
        self.account_request("accounts:signUp", email, password)
            .await
    }

    async fn account_request(
        &self,
        action: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, CoreError> {
        let url = format!("{}/v1/{}?key={}", self.account_url, action, self.api_key);
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        });

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_transport_error(e, "계정 요청 실패"))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(CoreError::Auth(format!(
                "{action} 실패 ({status}): {}",
                error_code(&text)
            )));
        }

        let account: AccountResponse = resp
            .json()
            .await
            .map_err(|e| CoreError::Auth(format!("계정 응답 파싱 실패: {e}")))?;

        let session = AuthSession {
            user_id: account.local_id,
            email: account.email.or_else(|| Some(email.to_string())),
            id_token: account.id_token,
            refresh_token: account.refresh_token,
            expires_at: expires_at(account.expires_in.as_deref()),
        };

        *self.state.write().await = Some(session.clone());
        info!("로그인 성공: user_id={}", session.user_id);
        Ok(session)
    }

    /// 토큰 갱신 (refresh_token 사용)
    pub async fn refresh(&self) -> Result<(), CoreError> {
        let current = self
            .state
            .read()
            .await
            .clone()
            .ok_or_else(|| CoreError::Auth("인증되지 않음".to_string()))?;

        let url = format!("{}/v1/token?key={}", self.token_url, self.api_key);
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", current.refresh_token.as_str()),
        ];

        let resp = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| map_transport_error(e, "토큰 갱신 요청 실패"))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(CoreError::Auth(format!(
                "토큰 갱신 실패 ({status}): {}",
                error_code(&text)
            )));
        }

        let token: RefreshResponse = resp
            .json()
            .await
            .map_err(|e| CoreError::Auth(format!("갱신 토큰 파싱 실패: {e}")))?;

        let refreshed = AuthSession {
            user_id: token.user_id.unwrap_or(current.user_id),
            email: current.email,
            id_token: token.id_token,
            refresh_token: token.refresh_token.unwrap_or(current.refresh_token),
            expires_at: expires_at(token.expires_in.as_deref()),
        };

        debug!("토큰 갱신 성공, 새 만료: {}", refreshed.expires_at);
        *self.state.write().await = Some(refreshed);
        Ok(())
    }

    /// 유효한 ID 토큰 반환 (만료 임박 시 자동 갱신)
    pub async fn get_token(&self) -> Result<String, CoreError> {
        let needs_refresh = {
            let state = self.state.read().await;
            match &*state {
                Some(s) => s.needs_refresh(Utc::now()),
                None => return Err(CoreError::Auth("인증되지 않음".to_string())),
            }
        };

        if needs_refresh {
            if let Err(e) = self.refresh().await {
                warn!("자동 토큰 갱신 실패: {e}");
            }
        }

        let state = self.state.read().await;
        state
            .as_ref()
            .map(|s| s.id_token.clone())
            .ok_or_else(|| CoreError::Auth("인증되지 않음".to_string()))
    }

    /// 저장된 세션 복원
    pub async fn restore(&self, session: AuthSession) {
        debug!("세션 복원: user_id={}", session.user_id);
        *self.state.write().await = Some(session);
    }

    /// 현재 세션 (저장용)
    pub async fn session(&self) -> Option<AuthSession> {
        self.state.read().await.clone()
    }

    /// 로그아웃 (로컬 상태만 제거)
    pub async fn sign_out(&self) {
        *self.state.write().await = None;
        debug!("로그아웃 완료");
    }

    /// 현재 인증 상태 확인
    pub async fn is_authenticated(&self) -> bool {
        let state = self.state.read().await;
        state.as_ref().is_some_and(|s| Utc::now() < s.expires_at)
    }
}

#[async_trait]
impl AuthProvider for TokenManager {
    async fn current_user_id(&self) -> Option<String> {
        self.state.read().await.as_ref().map(|s| s.user_id.clone())
    }

    async fn id_token(&self) -> Result<String, CoreError> {
        self.get_token().await
    }
}

fn expires_at(expires_in: Option<&str>) -> DateTime<Utc> {
    let secs = expires_in
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(DEFAULT_EXPIRES_IN_SECS);
    Utc::now() + Duration::seconds(secs)
}

fn error_code(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}
