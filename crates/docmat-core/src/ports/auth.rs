//! 인증 포트.
//!
//! 구현: `docmat-network` crate (`TokenManager`)

use async_trait::async_trait;

use crate::error::CoreError;

/// 현재 사용자 식별 및 ID 토큰 제공
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// 로그인된 사용자 ID. 로그아웃 상태면 `None`.
    async fn current_user_id(&self) -> Option<String>;

    /// 유효한 ID 토큰 반환 (만료 임박 시 갱신)
    async fn id_token(&self) -> Result<String, CoreError>;
}
