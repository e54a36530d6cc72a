//! 예측 결과 모델.
//!
//! 원격 분류 서비스가 돌려준 진단 결과와 질병 분류표.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 예측 응답 상태
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionStatus {
    /// 정상 진단
    #[default]
    Success,
    /// 모델 확신도 부족 — 식별 불가
    Unrecognized,
}

/// 원격 분류 결과 (수신 후 불변)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    /// 서버 발급 예측 ID
    pub predict_id: String,
    /// 질병 식별자 (식별 불가 시 None)
    pub disease_id: Option<String>,
    /// 질병 이름
    pub disease_name: String,
    /// 확신도 (0.0 ~ 1.0 비율)
    pub confidence: f64,
    /// 서버가 포맷한 확신도 문자열
    pub confidence_str: String,
    /// 증상 (불릿 텍스트)
    pub symptoms: String,
    /// 원인
    pub causes: String,
    /// 해결책 (불릿 텍스트)
    pub solutions: String,
    /// 참고 이미지 URL
    pub image_url: String,
    /// 예측 시각
    pub timestamp: DateTime<Utc>,
    /// 모델 버전
    pub model_version: String,
    /// 응답 상태
    #[serde(default)]
    pub status: PredictionStatus,
}

impl PredictionRecord {
    /// 확신도를 백분율 문자열로 반환 (표시 전용)
    pub fn confidence_percentage(&self) -> String {
        format_percentage(self.confidence)
    }

    /// 건강한 잎인지 여부
    pub fn is_healthy(&self) -> bool {
        self.disease_name.to_lowercase().contains("healthy")
    }

    /// 질병 분류
    pub fn disease_type(&self) -> DiseaseType {
        match &self.disease_id {
            Some(id) if !id.is_empty() => DiseaseType::from_prediction(id),
            _ => DiseaseType::from_prediction(&self.disease_name),
        }
    }
}

/// 0~1 비율을 정수 백분율 문자열로 변환
pub fn format_percentage(fraction: f64) -> String {
    let clamped = fraction.clamp(0.0, 1.0);
    format!("{}%", (clamped * 100.0).round() as u32)
}

/// 질병 심각도
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    None,
    Low,
    Medium,
    High,
    Critical,
    Unknown,
}

impl Severity {
    /// 정렬용 수준 (Unknown = -1)
    pub fn level(self) -> i8 {
        match self {
            Severity::None => 0,
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
            Severity::Critical => 4,
            Severity::Unknown => -1,
        }
    }

    /// 표시 이름
    pub fn display_name(self) -> &'static str {
        match self {
            Severity::None => "Tidak Ada",
            Severity::Low => "Ringan",
            Severity::Medium => "Sedang",
            Severity::High => "Tinggi",
            Severity::Critical => "Kritis",
            Severity::Unknown => "Tidak Diketahui",
        }
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.level().cmp(&other.level())
    }
}

/// 토마토 질병 종류 (분류 모델 클래스 기준)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiseaseType {
    Healthy,
    BacterialSpot,
    EarlyBlight,
    LateBlight,
    LeafMold,
    SeptoriaLeafSpot,
    SpiderMites,
    TargetSpot,
    YellowLeafCurlVirus,
    MosaicVirus,
    Unknown,
}

/// 부분 문자열 → 질병 매핑 (검사 순서 유지)
const CLASSIFICATION_TABLE: &[(&str, DiseaseType)] = &[
    ("healthy", DiseaseType::Healthy),
    ("bacterial", DiseaseType::BacterialSpot),
    ("early", DiseaseType::EarlyBlight),
    ("late", DiseaseType::LateBlight),
    ("leaf_mold", DiseaseType::LeafMold),
    ("septoria", DiseaseType::SeptoriaLeafSpot),
    ("spider", DiseaseType::SpiderMites),
    ("target", DiseaseType::TargetSpot),
    ("yellow", DiseaseType::YellowLeafCurlVirus),
    ("mosaic", DiseaseType::MosaicVirus),
];

impl DiseaseType {
    /// 서버 예측 문자열을 질병 종류로 변환 (대소문자 무시 부분 일치)
    pub fn from_prediction(prediction: &str) -> Self {
        let lowered = prediction.to_lowercase();
        CLASSIFICATION_TABLE
            .iter()
            .find(|(needle, _)| lowered.contains(needle))
            .map(|(_, disease)| *disease)
            .unwrap_or(DiseaseType::Unknown)
    }

    /// 표시 이름
    pub fn display_name(self) -> &'static str {
        match self {
            DiseaseType::Healthy => "Sehat",
            DiseaseType::BacterialSpot => "Bercak Bakteri",
            DiseaseType::EarlyBlight => "Hawar Awal",
            DiseaseType::LateBlight => "Hawar Akhir",
            DiseaseType::LeafMold => "Jamur Daun",
            DiseaseType::SeptoriaLeafSpot => "Bercak Septoria",
            DiseaseType::SpiderMites => "Tungau Laba-laba",
            DiseaseType::TargetSpot => "Bercak Target",
            DiseaseType::YellowLeafCurlVirus => "Virus Keriting Kuning",
            DiseaseType::MosaicVirus => "Virus Mosaik",
            DiseaseType::Unknown => "Tidak Diketahui",
        }
    }

    /// 심각도
    pub fn severity(self) -> Severity {
        match self {
            DiseaseType::Healthy => Severity::None,
            DiseaseType::BacterialSpot
            | DiseaseType::LeafMold
            | DiseaseType::SeptoriaLeafSpot
            | DiseaseType::SpiderMites
            | DiseaseType::TargetSpot => Severity::Medium,
            DiseaseType::EarlyBlight
            | DiseaseType::YellowLeafCurlVirus
            | DiseaseType::MosaicVirus => Severity::High,
            DiseaseType::LateBlight => Severity::Critical,
            DiseaseType::Unknown => Severity::Unknown,
        }
    }

    /// 표시 색상 (hex)
    pub fn color(self) -> &'static str {
        match self {
            DiseaseType::Healthy => "#4CAF50",
            DiseaseType::BacterialSpot => "#FF9800",
            DiseaseType::EarlyBlight => "#F44336",
            DiseaseType::LateBlight => "#D32F2F",
            DiseaseType::LeafMold => "#FF5722",
            DiseaseType::SeptoriaLeafSpot => "#FF7043",
            DiseaseType::SpiderMites => "#FF8A65",
            DiseaseType::TargetSpot => "#FFAB91",
            DiseaseType::YellowLeafCurlVirus => "#E57373",
            DiseaseType::MosaicVirus => "#EF5350",
            DiseaseType::Unknown => "#9E9E9E",
        }
    }
}
