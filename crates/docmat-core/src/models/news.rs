//! 농업 뉴스/팁 모델.

use serde::{Deserialize, Serialize};

/// 뉴스 목록 항목
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

/// 뉴스 상세
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl NewsArticle {
    /// 목록 항목으로 축약
    pub fn summary(&self) -> NewsSummary {
        NewsSummary {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            image_url: self.image_url.clone(),
            source: self.source.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_parses_camel_case_and_optional_fields() {
        let json = r#"{"id":3,"title":"Panen","description":"Tips","imageUrl":"https://x/y.jpg"}"#;
        let news: NewsSummary = serde_json::from_str(json).unwrap();
        assert_eq!(news.id, 3);
        assert_eq!(news.image_url.as_deref(), Some("https://x/y.jpg"));
        assert!(news.source.is_none());
    }

    #[test]
    fn article_summary_keeps_identity() {
        let article = NewsArticle {
            id: 7,
            title: "Hama".to_string(),
            description: "Ulat".to_string(),
            url: None,
            image_url: None,
            published_at: Some("2025-01-01".to_string()),
            source: Some("Kementan".to_string()),
            content: Some("...".to_string()),
            category: None,
        };
        let summary = article.summary();
        assert_eq!(summary.id, 7);
        assert_eq!(summary.source.as_deref(), Some("Kementan"));
    }
}
