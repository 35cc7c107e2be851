//! Service registry: the compiled-in map from tool to backend service.
//!
//! Every tool is served by its own process listening on a fixed local port.
//! The registry is built once at startup and never mutated afterwards; the
//! health monitor reads it to know what to probe and the dispatcher reads it
//! to know where and how to send work.
//!
//! ```text
//! tool id            base URL                 work path
//! ─────────────────  ───────────────────────  ───────────────────────
//! pdf-to-word        http://localhost:5001    /api/pdf-to-word
//! …                  …                        …
//! plagiarism         http://localhost:5012    /api/plagiarism-checker
//! ```
//!
//! Liveness is always `GET <base>/api/health`.

use crate::error::DocdashError;
use crate::options::{OptionSchema, ToolOptions};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Host every service binds to unless overridden.
pub const DEFAULT_HOST: &str = "http://localhost";

/// Path of the liveness endpoint, relative to a service's base URL.
pub const HEALTH_PATH: &str = "/api/health";

const MIB: u64 = 1024 * 1024;

/// One selectable conversion or analysis function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolId {
    PdfToWord,
    WordToPdf,
    PdfMerge,
    DocumentSummary,
    PdfToImage,
    ImageToPdf,
    TextSummary,
    BgRemove,
    ImageCompress,
    VoiceToText,
    TextToVoice,
    Plagiarism,
}

impl ToolId {
    /// All tools in dashboard order.
    pub const ALL: [ToolId; 12] = [
        ToolId::PdfToWord,
        ToolId::WordToPdf,
        ToolId::PdfMerge,
        ToolId::DocumentSummary,
        ToolId::PdfToImage,
        ToolId::ImageToPdf,
        ToolId::TextSummary,
        ToolId::BgRemove,
        ToolId::ImageCompress,
        ToolId::VoiceToText,
        ToolId::TextToVoice,
        ToolId::Plagiarism,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolId::PdfToWord => "pdf-to-word",
            ToolId::WordToPdf => "word-to-pdf",
            ToolId::PdfMerge => "pdf-merge",
            ToolId::DocumentSummary => "document-summary",
            ToolId::PdfToImage => "pdf-to-image",
            ToolId::ImageToPdf => "image-to-pdf",
            ToolId::TextSummary => "text-summary",
            ToolId::BgRemove => "bg-remove",
            ToolId::ImageCompress => "image-compress",
            ToolId::VoiceToText => "voice-to-text",
            ToolId::TextToVoice => "text-to-voice",
            ToolId::Plagiarism => "plagiarism",
        }
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolId {
    type Err = DocdashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        ToolId::ALL
            .into_iter()
            .find(|t| t.as_str() == needle)
            .ok_or_else(|| DocdashError::UnknownTool(s.to_string()))
    }
}

/// What the user stages for a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum InputMode {
    /// Exactly one file, sent as the `file` form field.
    SingleFile,
    /// An ordered list of files, each sent as a repeated `files` field.
    MultiFile { min_files: usize },
    /// Raw text sent as a JSON body. Length is counted on the trimmed text.
    Text {
        min_chars: usize,
        max_chars: Option<usize>,
    },
}

impl InputMode {
    pub fn is_text(&self) -> bool {
        matches!(self, InputMode::Text { .. })
    }

    /// Short phrase used in "expects …" messages.
    pub fn describe(&self) -> &'static str {
        match self {
            InputMode::SingleFile => "a single file",
            InputMode::MultiFile { .. } => "a list of files",
            InputMode::Text { .. } => "text input",
        }
    }
}

/// What a successful response is decoded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    Summary,
    Transcription,
    Plagiarism,
    /// Binary file (converted document, image, audio).
    Artifact,
}

/// Immutable description of one tool and its backing service.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub id: ToolId,
    /// Human-readable label.
    pub name: &'static str,
    /// Service root, e.g. `http://localhost:5003`. No trailing slash.
    pub base_url: String,
    /// Work endpoint relative to `base_url`.
    pub work_path: &'static str,
    /// Accepted file patterns: `.ext` suffixes or `type/*` MIME prefixes.
    pub accept: &'static [&'static str],
    /// Per-file size ceiling in bytes. `None` for text tools.
    pub max_size_bytes: Option<u64>,
    pub input: InputMode,
    pub result: ResultKind,
    pub options: OptionSchema,
}

impl ToolDescriptor {
    /// `POST` target for this tool.
    pub fn endpoint_url(&self) -> String {
        format!("{}{}", self.base_url, self.work_path)
    }

    /// `POST` target for a dispatch with `options`, which may pick an
    /// alternative work path.
    pub fn endpoint_url_for(&self, options: &ToolOptions) -> String {
        let path = options.work_path().unwrap_or(self.work_path);
        format!("{}{}", self.base_url, path)
    }

    /// `GET` target for the liveness probe.
    pub fn health_url(&self) -> String {
        format!("{}{}", self.base_url, HEALTH_PATH)
    }

    /// Does a file with this name and (optional) MIME type match the
    /// accepted patterns? Tools with no patterns accept anything.
    pub fn accepts(&self, file_name: &str, content_type: Option<&str>) -> bool {
        if self.accept.is_empty() {
            return true;
        }
        let name = file_name.to_ascii_lowercase();
        let mime = content_type
            .map(|c| c.to_ascii_lowercase())
            .or_else(|| crate::input::guess_content_type(&name).map(str::to_string));

        self.accept.iter().any(|pattern| {
            if pattern.starts_with('.') {
                name.ends_with(pattern)
            } else if let Some(prefix) = pattern.strip_suffix('*') {
                mime.as_deref().is_some_and(|m| m.starts_with(prefix))
            } else {
                mime.as_deref() == Some(*pattern)
            }
        })
    }

    /// Comma-separated accepted patterns for error messages.
    pub fn accept_list(&self) -> String {
        self.accept.join(", ")
    }
}

/// Read-only lookup table from [`ToolId`] to [`ToolDescriptor`].
///
/// Build with [`ServiceRegistry::default()`] for the compiled-in endpoint
/// map, or with [`ServiceRegistry::builder()`] to point some or all tools at
/// a different host.
#[derive(Debug, Clone)]
pub struct ServiceRegistry {
    // Indexed by position in `ToolId::ALL`.
    tools: Vec<ToolDescriptor>,
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::with_host(DEFAULT_HOST)
    }
}

impl ServiceRegistry {
    pub fn builder() -> ServiceRegistryBuilder {
        ServiceRegistryBuilder {
            host: DEFAULT_HOST.to_string(),
            overrides: Vec::new(),
        }
    }

    fn with_host(host: &str) -> Self {
        let host = host.trim_end_matches('/');
        let tools = ToolId::ALL
            .into_iter()
            .map(|id| compiled_descriptor(id, host))
            .collect();
        Self { tools }
    }

    /// Descriptor for `id`. Every [`ToolId`] is always registered.
    pub fn get(&self, id: ToolId) -> &ToolDescriptor {
        let idx = ToolId::ALL
            .iter()
            .position(|t| *t == id)
            .unwrap_or_default();
        &self.tools[idx]
    }

    /// Resolve a user-supplied tool name.
    pub fn lookup(&self, name: &str) -> Result<&ToolDescriptor, DocdashError> {
        let id: ToolId = name.parse()?;
        Ok(self.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Builder for [`ServiceRegistry`].
#[derive(Debug)]
pub struct ServiceRegistryBuilder {
    host: String,
    overrides: Vec<(ToolId, String)>,
}

impl ServiceRegistryBuilder {
    /// Rebind every service to `host` (scheme + hostname, no port),
    /// keeping each tool's compiled-in port.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Point one tool at an explicit base URL (scheme + host + port).
    pub fn base_url(mut self, tool: ToolId, url: impl Into<String>) -> Self {
        self.overrides.push((tool, url.into()));
        self
    }

    pub fn build(self) -> Result<ServiceRegistry, DocdashError> {
        let mut registry = ServiceRegistry::with_host(&self.host);
        for (tool, url) in self.overrides {
            let url = url.trim_end_matches('/').to_string();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(DocdashError::InvalidConfig(format!(
                    "base URL for {tool} must be http(s), got '{url}'"
                )));
            }
            let idx = ToolId::ALL
                .iter()
                .position(|t| *t == tool)
                .unwrap_or_default();
            registry.tools[idx].base_url = url;
        }
        Ok(registry)
    }
}

/// The compiled-in endpoint map.
fn compiled_descriptor(id: ToolId, host: &str) -> ToolDescriptor {
    const PDF: &[&str] = &[".pdf"];
    const WORD: &[&str] = &[".doc", ".docx"];
    const DOCUMENT: &[&str] = &[".pdf", ".docx", ".txt"];
    const IMAGE: &[&str] = &["image/*"];
    const AUDIO: &[&str] = &["audio/*"];
    const TEXT: &[&str] = &[];

    let (name, port, work_path, accept, max_size, input, result, options) = match id {
        ToolId::PdfToWord => (
            "PDF to Word",
            5001,
            "/api/pdf-to-word",
            PDF,
            Some(100 * MIB),
            InputMode::SingleFile,
            ResultKind::Artifact,
            OptionSchema::None,
        ),
        ToolId::WordToPdf => (
            "Word to PDF",
            5002,
            "/api/word-to-pdf",
            WORD,
            Some(100 * MIB),
            InputMode::SingleFile,
            ResultKind::Artifact,
            OptionSchema::None,
        ),
        ToolId::PdfMerge => (
            "PDF Merge",
            5003,
            "/api/pdf-merge",
            PDF,
            Some(200 * MIB),
            InputMode::MultiFile { min_files: 2 },
            ResultKind::Artifact,
            OptionSchema::Merge,
        ),
        ToolId::DocumentSummary => (
            "Document Summary",
            5004,
            "/api/document-summary",
            DOCUMENT,
            Some(100 * MIB),
            InputMode::SingleFile,
            ResultKind::Summary,
            OptionSchema::DocumentSummary,
        ),
        ToolId::PdfToImage => (
            "PDF to Image",
            5005,
            "/api/pdf-to-image",
            PDF,
            Some(100 * MIB),
            InputMode::SingleFile,
            ResultKind::Artifact,
            OptionSchema::PdfRender,
        ),
        ToolId::ImageToPdf => (
            "Image to PDF",
            5006,
            "/api/image-to-pdf",
            IMAGE,
            Some(100 * MIB),
            InputMode::SingleFile,
            ResultKind::Artifact,
            OptionSchema::ImageLayout,
        ),
        ToolId::TextSummary => (
            "Text Summary",
            5007,
            "/api/text-summary",
            TEXT,
            None,
            InputMode::Text {
                min_chars: 50,
                max_chars: None,
            },
            ResultKind::Summary,
            OptionSchema::TextSummary,
        ),
        ToolId::BgRemove => (
            "Background Remove",
            5008,
            "/api/bg-remove",
            IMAGE,
            Some(100 * MIB),
            InputMode::SingleFile,
            ResultKind::Artifact,
            OptionSchema::Background,
        ),
        ToolId::ImageCompress => (
            "Image Compress",
            5009,
            "/api/image-compress",
            IMAGE,
            Some(100 * MIB),
            InputMode::SingleFile,
            ResultKind::Artifact,
            OptionSchema::Compression,
        ),
        ToolId::VoiceToText => (
            "Voice to Text",
            5010,
            "/api/voice-to-text",
            AUDIO,
            Some(200 * MIB),
            InputMode::SingleFile,
            ResultKind::Transcription,
            OptionSchema::None,
        ),
        ToolId::TextToVoice => (
            "Text to Voice",
            5011,
            "/api/text-to-voice",
            TEXT,
            None,
            InputMode::Text {
                min_chars: 1,
                max_chars: Some(5000),
            },
            ResultKind::Artifact,
            OptionSchema::Speech,
        ),
        ToolId::Plagiarism => (
            "Plagiarism Checker",
            5012,
            "/api/plagiarism-checker",
            TEXT,
            None,
            InputMode::Text {
                min_chars: 50,
                max_chars: None,
            },
            ResultKind::Plagiarism,
            OptionSchema::None,
        ),
    };

    ToolDescriptor {
        id,
        name,
        base_url: format!("{host}:{port}"),
        work_path,
        accept,
        max_size_bytes: max_size,
        input,
        result,
        options,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tool_is_registered_once() {
        let registry = ServiceRegistry::default();
        assert_eq!(registry.len(), ToolId::ALL.len());
        for id in ToolId::ALL {
            assert_eq!(registry.get(id).id, id);
        }
    }

    #[test]
    fn compiled_in_urls() {
        let registry = ServiceRegistry::default();
        let merge = registry.get(ToolId::PdfMerge);
        assert_eq!(merge.endpoint_url(), "http://localhost:5003/api/pdf-merge");
        assert_eq!(merge.health_url(), "http://localhost:5003/api/health");
        assert_eq!(
            merge.endpoint_url_for(&ToolOptions::Merge(crate::options::MergeOptions {
                bookmarks: true
            })),
            "http://localhost:5003/api/pdf-merge-with-bookmarks"
        );
        assert_eq!(
            merge.endpoint_url_for(&merge.options.default_options()),
            merge.endpoint_url()
        );

        let plag = registry.get(ToolId::Plagiarism);
        assert_eq!(
            plag.endpoint_url(),
            "http://localhost:5012/api/plagiarism-checker"
        );
    }

    #[test]
    fn tool_id_round_trips_through_str() {
        for id in ToolId::ALL {
            assert_eq!(id.as_str().parse::<ToolId>().unwrap(), id);
        }
        assert_eq!(" PDF-Merge ".parse::<ToolId>().unwrap(), ToolId::PdfMerge);
        assert!("pdf-explode".parse::<ToolId>().is_err());
    }

    #[test]
    fn tool_id_serde_uses_kebab_case() {
        let json = serde_json::to_string(&ToolId::TextToVoice).unwrap();
        assert_eq!(json, "\"text-to-voice\"");
    }

    #[test]
    fn builder_rebinds_host_and_single_tool() {
        let registry = ServiceRegistry::builder()
            .host("http://10.0.0.7/")
            .base_url(ToolId::Plagiarism, "http://127.0.0.1:9999/")
            .build()
            .unwrap();
        assert_eq!(
            registry.get(ToolId::PdfToWord).base_url,
            "http://10.0.0.7:5001"
        );
        assert_eq!(
            registry.get(ToolId::Plagiarism).base_url,
            "http://127.0.0.1:9999"
        );
    }

    #[test]
    fn builder_rejects_non_http_override() {
        let err = ServiceRegistry::builder()
            .base_url(ToolId::PdfMerge, "ftp://example.com")
            .build()
            .unwrap_err();
        assert!(matches!(err, DocdashError::InvalidConfig(_)));
    }

    #[test]
    fn accepts_extension_and_mime_patterns() {
        let registry = ServiceRegistry::default();
        let word = registry.get(ToolId::WordToPdf);
        assert!(word.accepts("Report.DOCX", None));
        assert!(!word.accepts("report.pdf", None));

        let compress = registry.get(ToolId::ImageCompress);
        assert!(compress.accepts("photo.jpg", None));
        assert!(compress.accepts("blob", Some("image/webp")));
        assert!(!compress.accepts("notes.txt", None));

        let voice = registry.get(ToolId::VoiceToText);
        assert!(voice.accepts("memo.mp3", None));
    }

    #[test]
    fn text_tools_have_minimums() {
        let registry = ServiceRegistry::default();
        assert_eq!(
            registry.get(ToolId::Plagiarism).input,
            InputMode::Text {
                min_chars: 50,
                max_chars: None
            }
        );
        assert!(registry.get(ToolId::TextToVoice).input.is_text());
        assert!(!registry.get(ToolId::PdfMerge).input.is_text());
    }
}
