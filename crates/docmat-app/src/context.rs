//! 어댑터 생성 및 의존성 주입.

use anyhow::{Context, Result};
use docmat_core::config::AppConfig;
use docmat_core::config_manager::ConfigManager;
use docmat_core::ports::auth::AuthProvider;
use docmat_core::ports::prediction::PredictionService;
use docmat_network::auth::TokenManager;
use docmat_network::news_client::HttpNewsClient;
use docmat_network::prediction_client::HttpPredictionClient;
use docmat_storage::history::HistoryRepository;
use docmat_storage::object_store::LocalObjectStore;
use docmat_storage::sqlite::SqliteDocumentStore;
use docmat_vision::inline::JpegInlineEncoder;
use docmat_vision::pipeline::ImagePreparer;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::analyze::Analyzer;
use crate::session::SessionStore;

/// 데이터 디렉토리 결정 (CLI 인자 > 설정 파일 > 플랫폼 기본 경로)
///
/// - macOS: `~/Library/Application Support/com.docmat.docmat/`
/// - Windows: `%APPDATA%\docmat\docmat\data\`
/// - Linux: `~/.local/share/docmat/`
pub fn resolve_data_dir(cli: Option<&Path>, config: &AppConfig) -> PathBuf {
    cli.map(Path::to_path_buf)
        .or_else(|| config.storage.data_dir.clone())
        .or_else(|| ConfigManager::data_dir().ok())
        .unwrap_or_else(|| PathBuf::from("./docmat-data"))
}

/// 런타임 컨텍스트 — 모든 어댑터를 한 번만 생성
pub struct AppContext {
    pub tokens: Arc<TokenManager>,
    pub sessions: SessionStore,
    pub news: Arc<HttpNewsClient>,
    pub history: Arc<HistoryRepository>,
    pub analyzer: Analyzer,
}

impl AppContext {
    pub async fn build(config: AppConfig, data_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("데이터 디렉토리 생성 실패: {}", data_dir.display()))?;
        let timeout = config.request_timeout();

        // 1. 인증 + 저장된 세션 복원
        let tokens = Arc::new(TokenManager::new(&config.auth));
        let sessions = SessionStore::new(&data_dir);
        if let Some(session) = sessions.load() {
            tokens.restore(session).await;
        }
        let auth: Arc<dyn AuthProvider> = tokens.clone();

        // 2. 네트워크
        let predictor: Arc<dyn PredictionService> = Arc::new(HttpPredictionClient::new(
            &config.server.base_url,
            auth.clone(),
            timeout,
        )?);
        let news = Arc::new(HttpNewsClient::new(&config.server.base_url, timeout)?);

        // 3. 저장소
        let documents = Arc::new(SqliteDocumentStore::open(
            &data_dir.join(&config.storage.db_file_name),
        )?);
        let objects =
            Arc::new(LocalObjectStore::new(data_dir.join(&config.storage.objects_dir_name)).await?);
        let inline = Arc::new(JpegInlineEncoder::new(config.history.clone()));
        let history = Arc::new(HistoryRepository::new(auth, documents, objects, inline));

        // 4. 이미지 준비 + 분석 흐름
        let preparer = ImagePreparer::new(config.vision.clone())?;
        let analyzer = Analyzer::new(
            preparer,
            predictor,
            history.clone(),
            data_dir.join("cache"),
        );

        info!(
            "컨텍스트 준비: 서버={}, 데이터={}",
            config.server.base_url,
            data_dir.display()
        );

        Ok(Self {
            tokens,
            sessions,
            news,
            history,
            analyzer,
        })
    }

    /// 토큰이 갱신됐을 수 있으므로 현재 세션을 파일에 반영
    pub async fn persist_session(&self) -> Result<()> {
        match self.tokens.session().await {
            Some(session) => self.sessions.save(&session),
            None => {
                debug!("저장할 세션 없음");
                Ok(())
            }
        }
    }
}
