//! 예측 서비스 HTTP 클라이언트.
//!
//! `PredictionService` 포트 구현. 준비된 이미지를 multipart로 업로드하고
//! 서버 응답 DTO를 `PredictionRecord`로 매핑한다.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use docmat_core::error::CoreError;
use docmat_core::models::prediction::{PredictionRecord, PredictionStatus};
use docmat_core::ports::auth::AuthProvider;
use docmat_core::ports::prediction::PredictionService;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error_mapping::{check_response, map_transport_error};

/// multipart 파트 이름
const FILE_PART_NAME: &str = "file";

/// 예측 응답 최상위
#[derive(Debug, Deserialize)]
pub struct PredictionResponseDto {
    pub status: String,
    pub predict_id: String,
    pub timestamp: String,
    pub model_version: String,
    pub data: PredictionDataDto,
}

/// 예측 응답 `data`
#[derive(Debug, Deserialize)]
pub struct PredictionDataDto {
    #[serde(default)]
    pub disease_id: Option<String>,
    pub nama_penyakit: String,
    pub confidence: f64,
    pub confidence_str: String,
    #[serde(default)]
    pub gejala: Vec<String>,
    #[serde(default)]
    pub penyebab: String,
    #[serde(default)]
    pub solusi: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl PredictionResponseDto {
    /// 도메인 모델로 변환
    pub fn into_record(self) -> PredictionRecord {
        let status = if self.status.eq_ignore_ascii_case("unrecognized") {
            PredictionStatus::Unrecognized
        } else {
            PredictionStatus::Success
        };

        PredictionRecord {
            predict_id: self.predict_id,
            disease_id: self.data.disease_id.filter(|id| !id.is_empty()),
            disease_name: self.data.nama_penyakit,
            confidence: normalize_confidence(self.data.confidence),
            confidence_str: self.data.confidence_str,
            symptoms: bullet_list(&self.data.gejala),
            causes: self.data.penyebab,
            solutions: bullet_list(&self.data.solusi),
            image_url: self.data.image_url.unwrap_or_default(),
            timestamp: parse_timestamp(&self.timestamp),
            model_version: self.model_version,
            status,
        }
    }
}

/// 목록을 불릿 텍스트로 결합 (`• a\n• b`)
pub fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("• {}", item.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 서버 타임스탬프 파싱 — 실패 시 현재 시각
pub fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Utc);
    }
    let trimmed = raw.trim_end_matches('Z');
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive.and_utc();
    }
    warn!("타임스탬프 파싱 실패, 현재 시각 사용: {raw}");
    Utc::now()
}

/// 확신도는 항상 0~1 비율로 저장 (1 초과 값은 백분율로 간주)
fn normalize_confidence(value: f64) -> f64 {
    if value > 1.0 {
        (value / 100.0).clamp(0.0, 1.0)
    } else {
        value.max(0.0)
    }
}

/// 확장자 → MIME 타입
pub fn mime_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

/// 예측 서비스 클라이언트 — `PredictionService` 포트 구현
pub struct HttpPredictionClient {
    client: reqwest::Client,
    base_url: String,
    auth: Arc<dyn AuthProvider>,
}

impl HttpPredictionClient {
    /// 새 예측 클라이언트 생성
    pub fn new(
        base_url: &str,
        auth: Arc<dyn AuthProvider>,
        timeout: Duration,
    ) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }
}

#[async_trait]
impl PredictionService for HttpPredictionClient {
    async fn predict(&self, image_path: &Path) -> Result<PredictionRecord, CoreError> {
        let token = self.auth.id_token().await?;

        let bytes = tokio::fs::read(image_path).await.map_err(|e| {
            CoreError::ImageDecode(format!("업로드 파일 읽기 실패: {}: {}", image_path.display(), e))
        })?;
        let file_name = image_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.jpg")
            .to_string();
        let size = bytes.len();

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime_for_path(image_path))
            .map_err(|e| CoreError::Internal(format!("multipart 파트 생성 실패: {e}")))?;
        let form = reqwest::multipart::Form::new().part(FILE_PART_NAME, part);

        debug!("예측 요청: {} ({} bytes)", image_path.display(), size);
        let url = format!("{}/predict", self.base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| map_transport_error(e, "예측 요청 실패"))?;

        let resp = check_response(resp, "Prediction").await?;
        let dto: PredictionResponseDto = resp
            .json()
            .await
            .map_err(|e| CoreError::Internal(format!("예측 응답 파싱 실패: {e}")))?;

        let record = dto.into_record();
        info!(
            "예측 완료: {} ({}, {:?})",
            record.disease_name, record.confidence_str, record.status
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    /// 고정 토큰 인증
    struct StaticAuth(Option<&'static str>);

    #[async_trait]
    impl AuthProvider for StaticAuth {
        async fn current_user_id(&self) -> Option<String> {
            self.0.map(|_| "uid_1".to_string())
        }

        async fn id_token(&self) -> Result<String, CoreError> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| CoreError::Auth("인증되지 않음".to_string()))
        }
    }

    const SUCCESS_BODY: &str = r#"{
        "status": "success",
        "predict_id": "9b1d",
        "timestamp": "2025-06-01T08:30:00.123456Z",
        "model_version": "2.0.0",
        "data": {
            "disease_id": "Tomato_Late_blight",
            "nama_penyakit": "Busuk Daun (Late Blight)",
            "confidence": 0.9321,
            "confidence_str": "93.21%",
            "gejala": ["Bercak coklat kehitaman", "Lapisan putih di bawah daun"],
            "penyebab": "Jamur Phytophthora infestans",
            "solusi": ["Buang daun terinfeksi", "Semprot fungisida"],
            "image_url": "https://appku.com/ilustrasi/Tomato_Late_blight.jpg"
        }
    }"#;

    const UNRECOGNIZED_BODY: &str = r#"{
        "status": "unrecognized",
        "predict_id": "77aa",
        "timestamp": "not-a-date",
        "model_version": "2.0.0",
        "data": {
            "disease_id": null,
            "nama_penyakit": "Gambar Tidak Dapat Diidentifikasi",
            "confidence": 0.41,
            "confidence_str": "41.00%",
            "gejala": ["Model tidak cukup yakin untuk membuat diagnosis."],
            "penyebab": "Gambar buram.",
            "solusi": ["Silakan coba ambil foto ulang."]
        }
    }"#;

    fn write_image(dir: &TempDir, name: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, [0xFF, 0xD8, 0xFF, 0xD9]).unwrap();
        path
    }

    fn client(url: &str, token: Option<&'static str>) -> HttpPredictionClient {
        HttpPredictionClient::new(url, Arc::new(StaticAuth(token)), Duration::from_secs(5))
            .unwrap()
    }

    #[test]
    fn maps_success_dto() {
        let dto: PredictionResponseDto = serde_json::from_str(SUCCESS_BODY).unwrap();
        let record = dto.into_record();

        assert_eq!(record.status, PredictionStatus::Success);
        assert_eq!(record.disease_id.as_deref(), Some("Tomato_Late_blight"));
        assert_eq!(
            record.symptoms,
            "• Bercak coklat kehitaman\n• Lapisan putih di bawah daun"
        );
        assert_eq!(record.solutions, "• Buang daun terinfeksi\n• Semprot fungisida");
        assert_eq!(record.timestamp.to_rfc3339(), "2025-06-01T08:30:00.123456+00:00");
        assert!((record.confidence - 0.9321).abs() < 1e-9);
    }

    #[test]
    fn maps_unrecognized_dto() {
        let before = Utc::now();
        let dto: PredictionResponseDto = serde_json::from_str(UNRECOGNIZED_BODY).unwrap();
        let record = dto.into_record();

        assert_eq!(record.status, PredictionStatus::Unrecognized);
        assert!(record.disease_id.is_none());
        assert!(record.image_url.is_empty());
        assert!(record.timestamp >= before);
    }

    #[test]
    fn naive_timestamp_parsed() {
        let ts = parse_timestamp("2025-06-01T08:30:00");
        assert_eq!(ts.to_rfc3339(), "2025-06-01T08:30:00+00:00");
    }

    #[test]
    fn percentage_confidence_normalized() {
        assert!((normalize_confidence(93.0) - 0.93).abs() < 1e-9);
        assert!((normalize_confidence(0.5) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn mime_by_extension() {
        assert_eq!(mime_for_path(Path::new("a.PNG")), "image/png");
        assert_eq!(mime_for_path(Path::new("a.webp")), "image/webp");
        assert_eq!(mime_for_path(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("a")), "image/jpeg");
    }

    #[tokio::test]
    async fn predict_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/predict")
            .match_header("authorization", "Bearer id_token_1")
            .match_header(
                "content-type",
                mockito::Matcher::Regex("^multipart/form-data".to_string()),
            )
            .match_body(mockito::Matcher::Regex(r#"name="file""#.to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(SUCCESS_BODY)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let path = write_image(&dir, "upload_1.jpg");
        let record = client(&server.url(), Some("id_token_1"))
            .predict(&path)
            .await
            .unwrap();

        assert_eq!(record.predict_id, "9b1d");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn predict_status_errors() {
        let dir = TempDir::new().unwrap();
        let path = write_image(&dir, "upload_2.jpg");

        for (status, check) in [
            (400u16, "image_format"),
            (413, "image_size"),
            (422, "image_content"),
        ] {
            let mut server = mockito::Server::new_async().await;
            let _mock = server
                .mock("POST", "/predict")
                .with_status(status as usize)
                .with_body(r#"{"detail":"x"}"#)
                .create_async()
                .await;

            let err = client(&server.url(), Some("t"))
                .predict(&path)
                .await
                .unwrap_err();
            assert_matches!(err, CoreError::Validation { ref field, .. } if field == check);
        }
    }

    #[tokio::test]
    async fn predict_server_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/predict")
            .with_status(500)
            .with_body(r#"{"detail":"Terjadi kesalahan pada server"}"#)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let path = write_image(&dir, "upload_3.jpg");
        let err = client(&server.url(), Some("t"))
            .predict(&path)
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::ServiceUnavailable(_));
    }

    #[tokio::test]
    async fn predict_requires_token() {
        let dir = TempDir::new().unwrap();
        let path = write_image(&dir, "upload_4.jpg");
        let err = client("http://127.0.0.1:9", None)
            .predict(&path)
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Auth(_));
    }

    #[tokio::test]
    async fn predict_missing_file() {
        let err = client("http://127.0.0.1:9", Some("t"))
            .predict(Path::new("/nonexistent/upload.jpg"))
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::ImageDecode(_));
    }
}
