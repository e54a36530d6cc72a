//! 분석 흐름: 이미지 준비 → 예측 → 히스토리 저장 → 임시 파일 정리.
//!
//! 히스토리 저장 실패는 분석 결과를 막지 않는다 (경고만 남김).

use docmat_core::error::CoreError;
use docmat_core::models::prediction::PredictionRecord;
use docmat_core::ports::prediction::PredictionService;
use docmat_storage::history::{HistoryRepository, SavedHistory};
use docmat_vision::pipeline::{ImagePreparer, PreparedImage};
use docmat_vision::source::{FileImageSource, ImageSource};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// 분석 한 건의 결과
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub prepared: PreparedImage,
    pub prediction: PredictionRecord,
    /// 히스토리 저장 결과 (실패해도 분석은 성공)
    pub history: Result<SavedHistory, CoreError>,
    /// 임시 업로드 파일이 삭제됐는지
    pub temp_removed: bool,
}

/// 분석기
pub struct Analyzer {
    preparer: ImagePreparer,
    predictor: Arc<dyn PredictionService>,
    history: Arc<HistoryRepository>,
    temp_dir: PathBuf,
}

impl Analyzer {
    pub fn new(
        preparer: ImagePreparer,
        predictor: Arc<dyn PredictionService>,
        history: Arc<HistoryRepository>,
        temp_dir: PathBuf,
    ) -> Self {
        Self {
            preparer,
            predictor,
            history,
            temp_dir,
        }
    }

    pub fn preparer(&self) -> &ImagePreparer {
        &self.preparer
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// 이미지 한 장 분석
    ///
    /// 예측 실패는 에러로 전파한다. 임시 파일은 결과와 무관하게 정리
    /// (`keep_temp`가 아닐 때).
    pub async fn analyze(
        &self,
        image: &Path,
        keep_temp: bool,
    ) -> Result<AnalysisOutcome, CoreError> {
        let source: Arc<dyn ImageSource> = Arc::new(FileImageSource::new(image));
        let prepared = self
            .preparer
            .prepare_blocking(source, self.temp_dir.clone())
            .await?;

        let prediction = match self.predictor.predict(&prepared.path).await {
            Ok(prediction) => prediction,
            Err(e) => {
                if !keep_temp {
                    cleanup(&prepared);
                }
                return Err(e);
            }
        };

        let local_uri = local_image_uri(image);
        let history = self
            .history
            .save(&prediction, &prepared.path, &local_uri)
            .await;
        if let Err(e) = &history {
            warn!("히스토리 저장 실패 (분석 결과는 유지): {e}");
        }

        let temp_removed = !keep_temp && cleanup(&prepared);
        info!(
            "분석 완료: {} ({})",
            prediction.disease_name,
            prediction.confidence_percentage()
        );

        Ok(AnalysisOutcome {
            prepared,
            prediction,
            history,
            temp_removed,
        })
    }
}

fn cleanup(prepared: &PreparedImage) -> bool {
    match prepared.remove() {
        Ok(()) => true,
        Err(e) => {
            warn!("임시 파일 삭제 실패 {}: {e}", prepared.path.display());
            false
        }
    }
}

/// 원본 이미지의 로컬 URI (같은 기기에서만 유효)
pub fn local_image_uri(image: &Path) -> String {
    let absolute = std::fs::canonicalize(image).unwrap_or_else(|_| image.to_path_buf());
    format!("file://{}", absolute.display())
}
