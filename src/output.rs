//! Dispatch results.
//!
//! A successful dispatch is either a decoded JSON payload or a binary
//! artifact. Failures are [`crate::error::DispatchError`]. Both sides are
//! folded into [`DispatchResult`] so every consumer handles all three cases.

use crate::error::{DispatchError, DocdashError};
use crate::registry::ToolId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// Outcome of one submit.
pub type DispatchResult = Result<DispatchOutput, DispatchError>;

/// A successful dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DispatchOutput {
    /// JSON analytical result.
    Payload(StructuredPayload),
    /// Generated or converted file.
    Artifact(Artifact),
}

impl DispatchOutput {
    pub fn tool(&self) -> ToolId {
        match self {
            DispatchOutput::Payload(p) => p.tool(),
            DispatchOutput::Artifact(a) => a.tool,
        }
    }

    pub fn as_payload(&self) -> Option<&StructuredPayload> {
        match self {
            DispatchOutput::Payload(p) => Some(p),
            DispatchOutput::Artifact(_) => None,
        }
    }

    pub fn into_artifact(self) -> Option<Artifact> {
        match self {
            DispatchOutput::Artifact(a) => Some(a),
            DispatchOutput::Payload(_) => None,
        }
    }
}

/// JSON result, tagged by tool category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum StructuredPayload {
    Summary { tool: ToolId, report: SummaryReport },
    Transcription { tool: ToolId, report: Transcription },
    Plagiarism { tool: ToolId, report: PlagiarismReport },
    /// JSON from a tool that normally returns a file (e.g. a status message).
    Other {
        tool: ToolId,
        value: serde_json::Value,
    },
}

impl StructuredPayload {
    pub fn tool(&self) -> ToolId {
        match self {
            StructuredPayload::Summary { tool, .. }
            | StructuredPayload::Transcription { tool, .. }
            | StructuredPayload::Plagiarism { tool, .. }
            | StructuredPayload::Other { tool, .. } => *tool,
        }
    }

    /// Category tag: `summary`, `transcription`, `plagiarism` or `other`.
    pub fn category(&self) -> &'static str {
        match self {
            StructuredPayload::Summary { .. } => "summary",
            StructuredPayload::Transcription { .. } => "transcription",
            StructuredPayload::Plagiarism { .. } => "plagiarism",
            StructuredPayload::Other { .. } => "other",
        }
    }
}

// ── Summary ──────────────────────────────────────────────────────────────

/// Result of `document-summary` and `text-summary`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executive_summary: Option<String>,
    #[serde(default)]
    pub key_points: Vec<String>,
    /// `key_concepts` for documents, `topics` for raw text.
    #[serde(default, alias = "topics")]
    pub key_concepts: Vec<String>,
    #[serde(default)]
    pub statistics: SummaryStatistics,
    /// Fields the service sent that are not modelled above.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    #[serde(default, alias = "original_word_count", skip_serializing_if = "Option::is_none")]
    pub word_count: Option<u64>,
    #[serde(default, alias = "original_sentence_count", skip_serializing_if = "Option::is_none")]
    pub sentence_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_word_count: Option<u64>,
    /// Percent of words removed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading_time_minutes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_reading_time_minutes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_type: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Transcription ────────────────────────────────────────────────────────

/// Result of `voice-to-text`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcription {
    pub text: String,
    #[serde(default)]
    pub statistics: TranscriptionStatistics,
    /// Fields the service sent that are not modelled above.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionStatistics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// 0.0–1.0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recognition_engine: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time_seconds: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Plagiarism ───────────────────────────────────────────────────────────

/// Result of `plagiarism`. Field names follow the service's camelCase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlagiarismReport {
    pub percentage: f64,
    /// HTML with flagged sentences wrapped in highlight spans.
    #[serde(default)]
    pub highlighted_text: String,
    #[serde(default)]
    pub sentence_analysis: Vec<SentenceAnalysis>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub flagged_count: u64,
    #[serde(default)]
    pub total_sentences: u64,
    /// Fields the service sent that are not modelled above.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentenceAnalysis {
    pub text: String,
    /// 0.0–1.0.
    #[serde(default)]
    pub similarity: f64,
    /// `high`, `medium`, `low`, or `original` for a clean sentence.
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub css_class: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Artifact ─────────────────────────────────────────────────────────────

/// Output size as reported by the service, or computed locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeReport {
    /// Verbatim header value, e.g. `"84.21KB"`.
    Header(String),
    /// Byte length of the received body.
    Computed(u64),
}

impl std::fmt::Display for SizeReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SizeReport::Header(s) => f.write_str(s),
            SizeReport::Computed(n) => write!(f, "{:.2}KB", *n as f64 / 1024.0),
        }
    }
}

/// A generated or converted file held in memory.
///
/// The consumer owns the bytes once it takes the artifact out of the
/// session; dropping it releases them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Artifact {
    pub tool: ToolId,
    pub filename: String,
    pub content_type: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    /// `X-Original-FileSize`, when sent.
    pub original_size: Option<String>,
    /// `X-Compressed-FileSize`, else the body length.
    pub output_size: SizeReport,
    /// `X-Compression-Ratio`, when sent.
    pub compression_ratio: Option<String>,
    /// Every other `X-*` header, lower-cased name → value.
    pub extra: BTreeMap<String, String>,
}

impl Artifact {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Write the artifact to `path` atomically (temp file in the target
    /// directory, then rename). Missing parent directories are created.
    pub async fn save_to(&self, path: impl AsRef<Path>) -> Result<(), DocdashError> {
        let path = path.as_ref().to_path_buf();
        let bytes = self.bytes.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, &bytes))
            .await
            .map_err(|e| DocdashError::Internal(format!("write task: {e}")))?
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), DocdashError> {
    let write_err = |e: std::io::Error| DocdashError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plagiarism_report_defaults_missing_fields() {
        let json = r#"{"percentage": 12, "highlightedText": "...", "flaggedCount": 1, "totalSentences": 8}"#;
        let report: PlagiarismReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.percentage, 12.0);
        assert_eq!(report.highlighted_text, "...");
        assert_eq!(report.flagged_count, 1);
        assert_eq!(report.total_sentences, 8);
        assert!(report.sentence_analysis.is_empty());
        assert!(report.recommendations.is_empty());
    }

    #[test]
    fn text_summary_topics_map_to_key_concepts() {
        let json = r#"{
            "summary": "Short.",
            "executive_summary": "TL;DR",
            "key_points": ["a", "b"],
            "topics": ["rust", "http"],
            "statistics": {"word_count": 120, "compression_ratio": 71.5, "text_type": "technical"}
        }"#;
        let report: SummaryReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.key_concepts, vec!["rust", "http"]);
        assert_eq!(report.statistics.word_count, Some(120));
        assert_eq!(report.statistics.compression_ratio, Some(71.5));
    }

    #[test]
    fn document_summary_statistics_aliases() {
        let json = r#"{
            "summary": "S",
            "key_concepts": ["x"],
            "statistics": {"original_word_count": 900, "original_sentence_count": 40, "page_count": 3}
        }"#;
        let report: SummaryReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.statistics.word_count, Some(900));
        assert_eq!(report.statistics.sentence_count, Some(40));
        assert_eq!(report.statistics.page_count, Some(3));
    }

    #[test]
    fn unmodelled_fields_survive_a_round_trip() {
        let body = serde_json::json!({
            "text": "hello there",
            "language_code": "en-US",
            "speed_ratio": 1.0,
            "metadata": {"sample_rate": 16000},
            "statistics": {"word_count": 2, "confidence": 0.93, "channels": 1}
        });
        let report: Transcription = serde_json::from_value(body.clone()).unwrap();
        assert_eq!(report.statistics.word_count, Some(2));
        assert_eq!(report.extra["language_code"], "en-US");
        assert_eq!(report.statistics.extra["channels"], 1);
        assert_eq!(serde_json::to_value(&report).unwrap(), body);

        let body = serde_json::json!({
            "summary": "S",
            "key_points": [],
            "key_concepts": ["x"],
            "paragraph_count": 4,
            "statistics": {"original_word_count": 900}
        });
        let report: SummaryReport = serde_json::from_value(body).unwrap();
        assert_eq!(report.statistics.word_count, Some(900));
        assert_eq!(report.extra["paragraph_count"], 4);
        assert!(report.statistics.extra.is_empty());
    }

    #[test]
    fn size_report_display() {
        assert_eq!(SizeReport::Header("84.21KB".into()).to_string(), "84.21KB");
        assert_eq!(SizeReport::Computed(2048).to_string(), "2.00KB");
    }

    #[test]
    fn artifact_save_is_atomic_and_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/merged.pdf");
        let artifact = Artifact {
            tool: ToolId::PdfMerge,
            filename: "merged.pdf".into(),
            content_type: "application/pdf".into(),
            bytes: b"%PDF-merged".to_vec(),
            original_size: None,
            output_size: SizeReport::Computed(11),
            compression_ratio: None,
            extra: BTreeMap::new(),
        };

        tokio_test::block_on(artifact.save_to(&path)).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-merged");
        let leftovers = std::fs::read_dir(dir.path().join("nested/out")).unwrap().count();
        assert_eq!(leftovers, 1, "temp file left behind");
    }

    #[test]
    fn payload_category_tags() {
        let p = StructuredPayload::Plagiarism {
            tool: ToolId::Plagiarism,
            report: PlagiarismReport::default(),
        };
        assert_eq!(p.category(), "plagiarism");
        assert_eq!(p.tool(), ToolId::Plagiarism);
        let out = DispatchOutput::Payload(p);
        assert!(out.as_payload().is_some());
        assert!(out.into_artifact().is_none());
    }
}
