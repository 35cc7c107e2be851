//! Request dispatcher: one submit, one POST.
//!
//! ## Flow
//!
//! ```text
//!  status != online ──► ServiceOffline          (nothing sent)
//!  options schema ≠ ──► OptionsMismatch         (nothing sent)
//!  input shape bad  ──► InvalidInput            (nothing sent)
//!          │
//!          ▼
//!  build body: multipart `file` | repeated `files` | JSON {"text", ...}
//!          │
//!          ▼
//!  POST ─────────────┬──── progress ticker (+step every tick, frozen at cap)
//!          │         │
//!          ▼         ▼
//!  response ──► non-2xx ──► Http { message from JSON `error` or status }
//!          │
//!          ├── JSON   ──► StructuredPayload (per ResultKind)
//!          └── binary ──► Artifact (+ X-* header metadata)
//! ```
//!
//! A dispatch either returns a complete result or an error. No partial
//! artifact is ever exposed.

use crate::catalogue::{
    BackgroundCatalogue, LanguageCatalogue, BACKGROUND_OPTIONS_PATH, SUPPORTED_LANGUAGES_PATH,
};
use crate::config::ClientConfig;
use crate::error::{DispatchError, DocdashError};
use crate::health::ServiceStatus;
use crate::input::{extension_for, PendingInput, UploadFile};
use crate::options::ToolOptions;
use crate::output::{
    Artifact, DispatchOutput, DispatchResult, PlagiarismReport, SizeReport, StructuredPayload,
    SummaryReport, Transcription,
};
use crate::progress::SyntheticProgress;
use crate::registry::{InputMode, ResultKind, ServiceRegistry, ToolDescriptor, ToolId};
use crate::validate::validate;
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use std::collections::BTreeMap;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

const HEADER_FILENAME: &str = "x-filename";
const HEADER_ORIGINAL_SIZE: &str = "x-original-filesize";
const HEADER_OUTPUT_SIZE: &str = "x-compressed-filesize";
const HEADER_RATIO: &str = "x-compression-ratio";

/// Sends staged input to a tool's service.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: reqwest::Client,
    config: ClientConfig,
}

/// What the service sent back, fully read.
struct RawResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Dispatcher {
    pub fn new(config: ClientConfig) -> Result<Self, DocdashError> {
        // No overall request timeout: a merge or transcription can run for
        // minutes and a dispatch is not cancellable.
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| DocdashError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Submit `input` to `tool`.
    ///
    /// `status` is the tool's last known liveness; anything but `online`
    /// refuses the dispatch without a request. `on_progress` receives each
    /// synthetic progress value, as does the configured progress callback.
    pub async fn dispatch(
        &self,
        tool: &ToolDescriptor,
        input: &PendingInput,
        options: &ToolOptions,
        status: ServiceStatus,
        mut on_progress: impl FnMut(u8),
    ) -> DispatchResult {
        if !status.is_online() {
            warn!("Refusing {}: service is {}", tool.id, status);
            return Err(DispatchError::ServiceOffline { tool: tool.id });
        }
        if options.schema() != tool.options {
            return Err(DispatchError::OptionsMismatch {
                tool: tool.id,
                expected: tool.options.as_str(),
                got: options.schema().as_str(),
            });
        }
        validate(tool, input)?;

        let request = self.build_request(tool, input, options)?;

        let cb = self.config.progress_callback.as_ref();
        if let Some(cb) = cb {
            cb.on_dispatch_start(tool.id);
        }
        let mut report = |value: u8| {
            on_progress(value);
            if let Some(cb) = cb {
                cb.on_progress(tool.id, value);
            }
        };

        info!("Dispatching {} → {}", tool.id, tool.endpoint_url_for(options));
        let started = std::time::Instant::now();

        let mut progress = SyntheticProgress::new(self.config.progress_step, self.config.progress_cap);
        report(progress.value());

        let tick = self.config.progress_tick();
        let mut ticker = time::interval_at(Instant::now() + tick, tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let exchange = send_and_read(request, tool.id);
        tokio::pin!(exchange);

        let raw = loop {
            tokio::select! {
                res = &mut exchange => break res,
                _ = ticker.tick() => {
                    if let Some(value) = progress.tick() {
                        report(value);
                    }
                }
            }
        };

        let result = raw.and_then(|raw| interpret(tool, raw));
        match &result {
            Ok(out) => {
                report(progress.complete());
                info!(
                    "{} finished in {:.1}s ({})",
                    tool.id,
                    started.elapsed().as_secs_f64(),
                    describe(out)
                );
            }
            Err(e) => warn!("{} failed: {}", tool.id, e),
        }
        if let Some(cb) = cb {
            cb.on_dispatch_complete(tool.id, result.is_ok());
        }
        result
    }

    /// Named backgrounds `bg-remove` accepts for `bg_option`.
    pub async fn background_options(
        &self,
        registry: &ServiceRegistry,
    ) -> Result<BackgroundCatalogue, DispatchError> {
        self.fetch_catalogue(registry.get(ToolId::BgRemove), BACKGROUND_OPTIONS_PATH)
            .await
    }

    /// Languages, voices and styles `text-to-voice` accepts.
    pub async fn supported_languages(
        &self,
        registry: &ServiceRegistry,
    ) -> Result<LanguageCatalogue, DispatchError> {
        self.fetch_catalogue(registry.get(ToolId::TextToVoice), SUPPORTED_LANGUAGES_PATH)
            .await
    }

    async fn fetch_catalogue<T: serde::de::DeserializeOwned>(
        &self,
        tool: &ToolDescriptor,
        path: &str,
    ) -> Result<T, DispatchError> {
        let url = format!("{}{}", tool.base_url, path);
        debug!("Fetching {} catalogue from {}", tool.id, url);
        let raw = send_and_read(self.client.get(&url), tool.id).await?;
        if !raw.status.is_success() {
            return Err(DispatchError::Http {
                tool: tool.id,
                status: raw.status.as_u16(),
                message: error_message(raw.status, &raw.body),
            });
        }
        decode(tool.id, &raw.body)
    }

    fn build_request(
        &self,
        tool: &ToolDescriptor,
        input: &PendingInput,
        options: &ToolOptions,
    ) -> Result<reqwest::RequestBuilder, DispatchError> {
        let post = self.client.post(tool.endpoint_url_for(options));
        let wrong_kind = || {
            DispatchError::InvalidInput(crate::error::ValidationError::WrongInputKind {
                tool: tool.id,
                expected: tool.input.describe(),
            })
        };

        match tool.input {
            InputMode::Text { .. } => {
                let text = match input {
                    PendingInput::Text(t) => t.clone(),
                    PendingInput::Empty => String::new(),
                    _ => return Err(wrong_kind()),
                };
                let mut body = serde_json::Map::new();
                body.insert("text".into(), serde_json::Value::String(text));
                body.extend(options.json_members());
                Ok(post.json(&serde_json::Value::Object(body)))
            }
            InputMode::SingleFile => {
                let file = match input {
                    PendingInput::File(f) => f,
                    PendingInput::Files(files) if files.len() == 1 => &files[0],
                    _ => return Err(wrong_kind()),
                };
                let form = with_fields(Form::new().part("file", file_part(file)), options);
                Ok(post.multipart(form))
            }
            InputMode::MultiFile { .. } => {
                let files: Vec<&UploadFile> = match input {
                    PendingInput::Files(files) => files.iter().collect(),
                    PendingInput::File(f) => vec![f],
                    _ => return Err(wrong_kind()),
                };
                let form = files
                    .into_iter()
                    .fold(Form::new(), |form, f| form.part("files", file_part(f)));
                Ok(post.multipart(with_fields(form, options)))
            }
        }
    }
}

// ── Request body ─────────────────────────────────────────────────────────

fn file_part(file: &UploadFile) -> Part {
    let plain = || Part::bytes(file.bytes.clone()).file_name(file.name.clone());
    file.content_type
        .as_deref()
        .and_then(|ct| plain().mime_str(ct).ok())
        .unwrap_or_else(plain)
}

fn with_fields(form: Form, options: &ToolOptions) -> Form {
    options
        .form_fields()
        .into_iter()
        .fold(form, |form, (name, value)| form.text(name, value))
}

async fn send_and_read(
    request: reqwest::RequestBuilder,
    tool: ToolId,
) -> Result<RawResponse, DispatchError> {
    let transport = |e: reqwest::Error| DispatchError::Transport {
        tool,
        detail: e.to_string(),
    };
    let resp = request.send().await.map_err(transport)?;
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = resp.bytes().await.map_err(transport)?.to_vec();
    debug!("{} responded HTTP {} ({} bytes)", tool, status.as_u16(), body.len());
    Ok(RawResponse {
        status,
        headers,
        body,
    })
}

// ── Response ─────────────────────────────────────────────────────────────

fn interpret(tool: &ToolDescriptor, raw: RawResponse) -> DispatchResult {
    if !raw.status.is_success() {
        return Err(DispatchError::Http {
            tool: tool.id,
            status: raw.status.as_u16(),
            message: error_message(raw.status, &raw.body),
        });
    }

    let is_json = raw
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"));

    match (tool.result, is_json) {
        (ResultKind::Artifact, false) => Ok(DispatchOutput::Artifact(build_artifact(tool.id, raw))),
        (ResultKind::Artifact, true) => {
            let value = decode::<serde_json::Value>(tool.id, &raw.body)?;
            Ok(DispatchOutput::Payload(StructuredPayload::Other {
                tool: tool.id,
                value,
            }))
        }
        (_, false) => Err(DispatchError::Decode {
            tool: tool.id,
            detail: "expected a JSON body".into(),
        }),
        (ResultKind::Summary, true) => Ok(DispatchOutput::Payload(StructuredPayload::Summary {
            tool: tool.id,
            report: decode::<SummaryReport>(tool.id, &raw.body)?,
        })),
        (ResultKind::Transcription, true) => {
            Ok(DispatchOutput::Payload(StructuredPayload::Transcription {
                tool: tool.id,
                report: decode::<Transcription>(tool.id, &raw.body)?,
            }))
        }
        (ResultKind::Plagiarism, true) => {
            Ok(DispatchOutput::Payload(StructuredPayload::Plagiarism {
                tool: tool.id,
                report: decode::<PlagiarismReport>(tool.id, &raw.body)?,
            }))
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(tool: ToolId, body: &[u8]) -> Result<T, DispatchError> {
    serde_json::from_slice(body).map_err(|e| DispatchError::Decode {
        tool,
        detail: e.to_string(),
    })
}

/// The service's JSON `error` (or `message`) field, else a message built
/// from the status code.
fn error_message(status: StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["error", "message"]
                .iter()
                .find_map(|k| v.get(*k).and_then(|m| m.as_str()).map(str::to_string))
        })
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| match status.canonical_reason() {
            Some(reason) => format!("Request failed with status {} ({reason})", status.as_u16()),
            None => format!("Request failed with status {}", status.as_u16()),
        })
}

fn build_artifact(tool: ToolId, raw: RawResponse) -> Artifact {
    let header = |name: &str| {
        raw.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };

    let content_type = header(CONTENT_TYPE.as_str())
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let filename = header(HEADER_FILENAME)
        .or_else(|| header(CONTENT_DISPOSITION.as_str()).and_then(|cd| disposition_filename(&cd)))
        .unwrap_or_else(|| format!("{tool}-result.{}", extension_for(&content_type)));

    let output_size = match header(HEADER_OUTPUT_SIZE) {
        Some(s) => SizeReport::Header(s),
        None => SizeReport::Computed(raw.body.len() as u64),
    };

    let extra: BTreeMap<String, String> = raw
        .headers
        .iter()
        .filter(|(name, _)| {
            let n = name.as_str();
            n.starts_with("x-")
                && ![HEADER_FILENAME, HEADER_ORIGINAL_SIZE, HEADER_OUTPUT_SIZE, HEADER_RATIO]
                    .contains(&n)
        })
        .filter_map(|(name, v)| Some((name.as_str().to_string(), v.to_str().ok()?.to_string())))
        .collect();

    Artifact {
        tool,
        filename,
        content_type,
        original_size: header(HEADER_ORIGINAL_SIZE),
        output_size,
        compression_ratio: header(HEADER_RATIO),
        extra,
        bytes: raw.body,
    }
}

/// `filename` (or `filename*=UTF-8''…`) parameter of a Content-Disposition value.
fn disposition_filename(value: &str) -> Option<String> {
    let mut plain = None;
    for param in value.split(';').map(str::trim) {
        let Some((key, val)) = param.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                let encoded = val.trim().rsplit("''").next().unwrap_or(val);
                let decoded = urlencoding::decode_binary(encoded.as_bytes());
                return Some(String::from_utf8_lossy(&decoded).into_owned())
                    .filter(|s| !s.is_empty());
            }
            "filename" => plain = Some(val.trim().trim_matches('"').to_string()),
            _ => {}
        }
    }
    plain.filter(|s| !s.is_empty())
}

fn describe(out: &DispatchOutput) -> String {
    match out {
        DispatchOutput::Payload(p) => format!("{} payload", p.category()),
        DispatchOutput::Artifact(a) => format!("{}, {}", a.filename, a.output_size),
    }
}
