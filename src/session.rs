//! The dashboard session: one owned state struct.
//!
//! A [`Session`] holds what the user is working on (active tool, staged
//! input, per-tool options), the latest service status map, the synthetic
//! progress value and the last dispatch result. Every mutation goes through
//! a method on `&mut self`; [`Session::submit`] included, so one session can
//! never have two dispatches in flight.

use crate::dispatch::Dispatcher;
use crate::error::DocdashError;
use crate::health::{ServiceStatus, StatusMap};
use crate::input::{PendingInput, UploadFile};
use crate::options::ToolOptions;
use crate::output::{DispatchOutput, DispatchResult};
use crate::registry::{ServiceRegistry, ToolDescriptor, ToolId};
use crate::validate::validate;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

pub struct Session {
    registry: Arc<ServiceRegistry>,
    status: watch::Receiver<StatusMap>,
    dispatcher: Dispatcher,
    active: Option<ToolId>,
    input: PendingInput,
    options: ToolOptions,
    progress: u8,
    processing: bool,
    last_result: Option<DispatchResult>,
}

impl Session {
    /// `status` is usually the receiver returned by
    /// [`crate::health::HealthMonitor::spawn`].
    pub fn new(
        registry: Arc<ServiceRegistry>,
        status: watch::Receiver<StatusMap>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            registry,
            status,
            dispatcher,
            active: None,
            input: PendingInput::Empty,
            options: ToolOptions::None,
            progress: 0,
            processing: false,
            last_result: None,
        }
    }

    // ── Read access ──────────────────────────────────────────────────────

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    pub fn active_tool(&self) -> Option<&ToolDescriptor> {
        self.active.map(|id| self.registry.get(id))
    }

    pub fn input(&self) -> &PendingInput {
        &self.input
    }

    pub fn options(&self) -> &ToolOptions {
        &self.options
    }

    /// Latest published status map.
    pub fn statuses(&self) -> StatusMap {
        self.status.borrow().clone()
    }

    pub fn status_of(&self, tool: ToolId) -> ServiceStatus {
        self.status.borrow().get(tool)
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn last_result(&self) -> Option<&DispatchResult> {
        self.last_result.as_ref()
    }

    // ── Mutation ─────────────────────────────────────────────────────────

    /// Make `tool` active. Refused unless its service is online.
    ///
    /// Staged input, options and the last result are replaced wholesale.
    pub fn select_tool(&mut self, tool: ToolId) -> Result<(), DocdashError> {
        let status = self.status_of(tool);
        if !status.is_online() {
            return Err(DocdashError::ToolUnavailable {
                tool,
                status: status.to_string(),
            });
        }
        let descriptor = self.registry.get(tool);
        self.active = Some(tool);
        self.input = PendingInput::Empty;
        self.options = descriptor.options.default_options();
        self.progress = 0;
        self.last_result = None;
        info!("Selected {}", descriptor.name);
        Ok(())
    }

    /// Replace the staged input with one file.
    pub fn stage_file(&mut self, file: UploadFile) {
        debug!("Staged {}", file.name);
        self.input = PendingInput::File(file);
    }

    /// Replace the staged input with an ordered list of files.
    pub fn stage_files(&mut self, files: Vec<UploadFile>) {
        self.input = PendingInput::Files(files);
    }

    /// Append a file to the staged list.
    pub fn add_file(&mut self, file: UploadFile) {
        self.input.push_file(file);
    }

    pub fn remove_file(&mut self, index: usize) -> Result<UploadFile, DocdashError> {
        self.input.remove_file(index)
    }

    /// Reorder the staged list; the order is the merge order.
    pub fn move_file(&mut self, from: usize, to: usize) -> Result<(), DocdashError> {
        self.input.move_file(from, to)
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.input = PendingInput::Text(text.into());
    }

    /// Replace the options for the active tool.
    pub fn set_options(&mut self, options: ToolOptions) -> Result<(), DocdashError> {
        let tool = self.active.ok_or(DocdashError::NoToolSelected)?;
        let expected = self.registry.get(tool).options;
        if options.schema() != expected {
            return Err(crate::error::DispatchError::OptionsMismatch {
                tool,
                expected: expected.as_str(),
                got: options.schema().as_str(),
            }
            .into());
        }
        self.options = options;
        Ok(())
    }

    /// Clear input, options, progress and result. The active tool stays.
    pub fn reset(&mut self) {
        self.input = PendingInput::Empty;
        self.options = self
            .active_tool()
            .map(|t| t.options.default_options())
            .unwrap_or_default();
        self.progress = 0;
        self.processing = false;
        self.last_result = None;
    }

    /// Validate the staged input, then dispatch it to the active tool.
    ///
    /// Validation failures return immediately without touching the network
    /// or the stored result. Dispatch outcomes (success or failure) are
    /// stored and also returned as a reference. Staged input is left as is
    /// either way so a failed submit can be retried.
    pub async fn submit(&mut self) -> Result<&DispatchOutput, DocdashError> {
        let tool = self.active.ok_or(DocdashError::NoToolSelected)?;
        let descriptor = self.registry.get(tool);
        validate(descriptor, &self.input)?;

        let status = self.status.borrow().get(tool);
        self.progress = 0;
        self.processing = true;
        self.last_result = None;

        let progress = &mut self.progress;
        let result = self
            .dispatcher
            .dispatch(descriptor, &self.input, &self.options, status, |v| {
                *progress = v
            })
            .await;

        self.processing = false;
        match self.last_result.insert(result) {
            Ok(out) => Ok(&*out),
            Err(e) => Err(e.clone().into()),
        }
    }

    /// Move the last successful output out of the session.
    ///
    /// The caller owns it from here; dropping it releases the bytes.
    pub fn take_result(&mut self) -> Option<DispatchOutput> {
        match self.last_result.take()? {
            Ok(out) => Some(out),
            Err(e) => {
                self.last_result = Some(Err(e));
                None
            }
        }
    }
}
