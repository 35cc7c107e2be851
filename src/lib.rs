//! # docdash
//!
//! Client and orchestration layer for a dashboard of document, image and
//! audio conversion services.
//!
//! ## Why this crate?
//!
//! Each conversion (PDF↔Word, PDF merge, summarisation, background removal,
//! image compression, transcription, text-to-speech, plagiarism check) runs
//! in its own HTTP service on its own port. Talking to twelve services
//! directly means twelve request formats, twelve response shapes and no
//! shared idea of which ones are up. This crate keeps one registry of them,
//! watches their health, checks input before anything is sent, and turns
//! every response into one typed result.
//!
//! ## Pipeline Overview
//!
//! ```text
//! select tool ──► (refused unless online)
//!  │
//!  ├─ 1. Stage     file, ordered file list, or text     (input)
//!  ├─ 2. Validate  type, size, count, text length       (validate)
//!  ├─ 3. Dispatch  one POST, synthetic progress          (dispatch)
//!  └─ 4. Result    typed payload or binary artifact      (output)
//!
//! HealthMonitor ── sweep every 30 s ──► watch::Receiver<StatusMap> ──► Session
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docdash::{ClientConfig, Dispatcher, HealthMonitor, ServiceRegistry, Session, ToolId};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = Arc::new(ServiceRegistry::default());
//!     let config = ClientConfig::default();
//!
//!     let monitor = HealthMonitor::new(registry.clone(), config.clone())?;
//!     let (mut status, _handle) = monitor.spawn();
//!     status.changed().await?; // first sweep
//!
//!     let mut session = Session::new(registry, status, Dispatcher::new(config)?);
//!     session.select_tool(ToolId::Plagiarism)?;
//!     session.set_text("The quick brown fox jumps over the lazy dog, twice over.");
//!     let output = session.submit().await?;
//!     println!("{}", serde_json::to_string_pretty(output)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docdash` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! docdash = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod catalogue;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod health;
pub mod input;
pub mod options;
pub mod output;
pub mod progress;
pub mod registry;
pub mod session;
pub mod validate;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use catalogue::{BackgroundCatalogue, LanguageCatalogue};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use dispatch::Dispatcher;
pub use error::{DispatchError, DocdashError, ValidationError};
pub use health::{HealthMonitor, ServiceStatus, StatusMap};
pub use input::{PendingInput, UploadFile};
pub use options::{MergeOptions, OptionSchema, ToolOptions};
pub use output::{
    Artifact, DispatchOutput, DispatchResult, PlagiarismReport, SizeReport, StructuredPayload,
    SummaryReport, Transcription,
};
pub use progress::{DispatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use registry::{InputMode, ResultKind, ServiceRegistry, ToolDescriptor, ToolId};
pub use session::Session;
pub use validate::validate;
