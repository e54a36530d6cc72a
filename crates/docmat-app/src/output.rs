//! 터미널 출력 포맷.

use docmat_core::models::history::{HistoryEntry, ImageSourceRef};
use docmat_core::models::news::{NewsArticle, NewsSummary};
use docmat_core::models::prediction::{PredictionRecord, PredictionStatus};
use docmat_vision::pipeline::PreparedImage;
use std::fmt::Write as _;

/// 예측 결과 상세
pub fn prediction(record: &PredictionRecord) -> String {
    let mut out = String::new();
    let disease = record.disease_type();
    let _ = writeln!(out, "🍅 {}", record.disease_name);
    if record.status == PredictionStatus::Unrecognized {
        let _ = writeln!(out, "   (gambar tidak dapat diidentifikasi)");
    }
    let _ = writeln!(
        out,
        "   Keyakinan: {}   Tingkat: {}",
        record.confidence_percentage(),
        disease.severity().display_name()
    );
    section(&mut out, "Gejala", &record.symptoms);
    section(&mut out, "Penyebab", &record.causes);
    section(&mut out, "Solusi", &record.solutions);
    let _ = writeln!(out, "   model {} · {}", record.model_version, record.predict_id);
    out
}

/// 준비된 업로드 파일 요약
pub fn prepared(image: &PreparedImage) -> String {
    format!(
        "{} ({}x{}, 품질 {}, {} bytes, 배율 1/{}, 회전 {}°{})",
        image.path.display(),
        image.width,
        image.height,
        image.quality,
        image.size_bytes,
        image.sample_size,
        image.orientation.degrees(),
        if image.within_budget() { "" } else { ", 예산 초과" }
    )
}

/// 히스토리 목록 한 줄
pub fn history_line(entry: &HistoryEntry) -> String {
    format!(
        "{}  {}  {:<40} {:>5}  [{}]",
        entry.id,
        entry.timestamp.format("%Y-%m-%d %H:%M"),
        entry.disease_name,
        entry.confidence_percentage(),
        entry.image.kind()
    )
}

/// 히스토리 상세
pub fn history_detail(entry: &HistoryEntry) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} — {}", entry.id, entry.disease_name);
    let _ = writeln!(
        out,
        "   Keyakinan: {}   Waktu: {}",
        entry.confidence_percentage(),
        entry.timestamp.to_rfc3339()
    );
    let image = match entry.best_image() {
        ImageSourceRef::Inline(data) => format!("inline ({} chars base64)", data.len()),
        ImageSourceRef::Remote(url) => url.to_string(),
        ImageSourceRef::Local(uri) => format!("{uri} (hanya perangkat ini)"),
        ImageSourceRef::Missing => "-".to_string(),
    };
    let _ = writeln!(out, "   Gambar: {image}");
    section(&mut out, "Gejala", &entry.symptoms);
    section(&mut out, "Penyebab", &entry.causes);
    section(&mut out, "Solusi", &entry.solutions);
    out
}

pub fn news_line(item: &NewsSummary) -> String {
    match &item.source {
        Some(source) => format!("{:>4}  {} ({source})", item.id, item.title),
        None => format!("{:>4}  {}", item.id, item.title),
    }
}

pub fn news_detail(article: &NewsArticle) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", article.title);
    if let Some(published) = &article.published_at {
        let _ = writeln!(out, "   {published}");
    }
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{}",
        article.content.as_deref().unwrap_or(&article.description)
    );
    if let Some(url) = &article.url {
        let _ = writeln!(out, "\n{url}");
    }
    out
}

fn section(out: &mut String, title: &str, body: &str) {
    if body.trim().is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{title}:");
    for line in body.lines() {
        let _ = writeln!(out, "   {line}");
    }
}
