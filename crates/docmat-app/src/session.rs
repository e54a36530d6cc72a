//! 로그인 세션 파일 (`<data_dir>/session.json`).

use anyhow::{Context, Result};
use docmat_network::auth::AuthSession;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 세션 파일 이름
pub const SESSION_FILE_NAME: &str = "session.json";

/// 세션 파일 저장소
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(SESSION_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 저장된 세션 로드 (없거나 손상되면 None)
    pub fn load(&self) -> Option<AuthSession> {
        let text = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&text) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!("세션 파일 손상, 무시: {}: {e}", self.path.display());
                None
            }
        }
    }

    /// 세션 저장
    pub fn save(&self, session: &AuthSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("데이터 디렉토리 생성 실패: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(session)?;
        let mut file = open_private(&self.path)
            .with_context(|| format!("세션 파일 열기 실패: {}", self.path.display()))?;
        file.write_all(json.as_bytes())
            .with_context(|| format!("세션 저장 실패: {}", self.path.display()))?;

        debug!("세션 저장: {}", self.path.display());
        Ok(())
    }

    /// 세션 파일 삭제
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("세션 삭제 실패: {}", self.path.display())),
        }
    }
}

/// 소유자만 읽을 수 있는 파일로 열기 (토큰을 쓰기 전에 권한 확정)
fn open_private(path: &Path) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
        options.mode(0o600);
        let file = options.open(path)?;
        // 기존 파일은 mode가 적용되지 않으므로 직접 좁힌다
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
        Ok(file)
    }
    #[cfg(not(unix))]
    {
        options.open(path)
    }
}
