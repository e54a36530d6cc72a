//! 예측 히스토리 모델.
//!
//! 사용자별 문서 저장소에 기록되는 분석 이력 한 건.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::prediction::{format_percentage, PredictionRecord};

/// 히스토리에 저장된 이미지 표현 (정확히 하나)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistoryImage {
    /// 문서에 직접 포함된 Base64 JPEG
    Inline { base64: String },
    /// 객체 저장소 참조 URL
    Remote { url: String },
    /// 이미지 없음 (메타데이터 전용)
    #[default]
    None,
}

impl HistoryImage {
    /// 저장 방식 이름 (로그/표시용)
    pub fn kind(&self) -> &'static str {
        match self {
            HistoryImage::Inline { .. } => "inline",
            HistoryImage::Remote { .. } => "remote",
            HistoryImage::None => "none",
        }
    }
}

/// 표시용 최적 이미지 소스
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSourceRef<'a> {
    /// Base64 데이터 (모든 기기)
    Inline(&'a str),
    /// 원격 URL (모든 기기)
    Remote(&'a str),
    /// 로컬 URI (저장한 기기 전용)
    Local(&'a str),
    /// 이미지 없음
    Missing,
}

/// 분석 이력 한 건
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// 문서 ID (저장 시 할당)
    pub id: String,
    /// 소유 사용자 ID
    pub user_id: String,
    pub predict_id: String,
    pub disease_id: Option<String>,
    pub disease_name: String,
    /// 확신도 (0.0 ~ 1.0 비율)
    pub confidence: f64,
    pub confidence_str: String,
    pub symptoms: String,
    pub causes: String,
    pub solutions: String,
    /// 저장된 이미지 표현
    #[serde(default)]
    pub image: HistoryImage,
    /// 오프라인 표시용 로컬 이미지 URI
    #[serde(default)]
    pub local_image_uri: String,
    /// 예측 시각
    pub timestamp: DateTime<Utc>,
    pub model_version: String,
    /// 기록 생성 시각
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    /// 예측 결과로부터 이미지 없는 히스토리 항목 생성
    ///
    /// 서버가 준 참고 이미지 URL은 복사하지 않는다 (사용자 촬영 이미지가 아님).
    pub fn from_prediction(record: &PredictionRecord, user_id: &str, local_image_uri: &str) -> Self {
        Self {
            id: String::new(),
            user_id: user_id.to_string(),
            predict_id: record.predict_id.clone(),
            disease_id: record.disease_id.clone(),
            disease_name: record.disease_name.clone(),
            confidence: record.confidence,
            confidence_str: record.confidence_str.clone(),
            symptoms: record.symptoms.clone(),
            causes: record.causes.clone(),
            solutions: record.solutions.clone(),
            image: HistoryImage::None,
            local_image_uri: local_image_uri.to_string(),
            timestamp: record.timestamp,
            model_version: record.model_version.clone(),
            created_at: Utc::now(),
        }
    }

    /// 같은 내용에 이미지 표현만 교체한 사본
    pub fn with_image(&self, image: HistoryImage) -> Self {
        Self {
            image,
            ..self.clone()
        }
    }

    /// 최적 이미지 소스 — 우선순위: 인라인 > 원격 > 로컬 > 없음
    pub fn best_image(&self) -> ImageSourceRef<'_> {
        match &self.image {
            HistoryImage::Inline { base64 } if !base64.is_empty() => ImageSourceRef::Inline(base64),
            HistoryImage::Remote { url } if !url.is_empty() => ImageSourceRef::Remote(url),
            _ if !self.local_image_uri.is_empty() => ImageSourceRef::Local(&self.local_image_uri),
            _ => ImageSourceRef::Missing,
        }
    }

    /// 다른 기기에서도 표시 가능한 이미지가 있는지
    pub fn has_cross_device_image(&self) -> bool {
        matches!(
            self.best_image(),
            ImageSourceRef::Inline(_) | ImageSourceRef::Remote(_)
        )
    }

    /// 건강한 잎인지 여부
    pub fn is_healthy(&self) -> bool {
        self.disease_name.to_lowercase().contains("healthy")
    }

    /// 확신도 백분율 문자열 (표시 전용)
    pub fn confidence_percentage(&self) -> String {
        format_percentage(self.confidence)
    }

    /// 질병 이름 또는 증상에 검색어가 포함되는지 (대소문자 무시)
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.disease_name.to_lowercase().contains(&needle)
            || self.symptoms.to_lowercase().contains(&needle)
    }
}
