//! State and flows behind the conversation screen.
//!
//! [`ConversationState`] is a plain struct so the flows can be exercised
//! without a renderer. The async drivers (`run_query`, `run_upload`,
//! `run_rebuild`) reach it through a [`ConversationHandle`], which skips
//! updates once the owning view is gone.

use crate::api::{ApiResult, DocumentUpload, RagBackend};
use crate::ticker::{Tick, repeat_every};
use crate::types::{ChatTurn, QueryResponse, RebuildIndexResponse, SelectedFile, UploadResponse};
use futures::future::{Either, select};
use std::pin::pin;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

pub const QUERY_ERROR_TEXT: &str = "Sorry, I encountered an error processing your query.";

pub const PROGRESS_TICK: Duration = Duration::from_millis(100);
pub const PROGRESS_STEP: u8 = 5;
pub const PROGRESS_MAX: u8 = 100;

const NOTICE_SHORT: Duration = Duration::from_secs(3);
const NOTICE_LONG: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("query is empty")]
    EmptyQuery,

    #[error("{name} is {media_type}, not a PDF")]
    NotPdf { name: String, media_type: String },

    #[error("no file selected")]
    NoFileSelected,

    #[error("could not read {name}")]
    Unreadable { name: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Transient toast shown over the conversation screen.
#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub id: u64,
    pub level: NoticeLevel,
    pub message: String,
    pub duration: Duration,
}

#[derive(Debug, Default)]
pub struct ConversationState {
    input: String,
    transcript: Vec<ChatTurn>,
    querying: bool,
    uploading: bool,
    rebuilding_index: bool,
    upload_progress: u8,
    selected_file: Option<SelectedFile>,
    notices: Vec<Notice>,
    next_notice_id: u64,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    pub fn is_querying(&self) -> bool {
        self.querying
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn is_rebuilding_index(&self) -> bool {
        self.rebuilding_index
    }

    pub fn upload_progress(&self) -> u8 {
        self.upload_progress
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected_file.as_ref()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn can_send(&self) -> bool {
        !self.querying && !self.input.trim().is_empty()
    }

    pub fn can_upload(&self) -> bool {
        !self.uploading && self.selected_file.is_some()
    }

    /// Validates the input without touching any state.
    pub fn validate_query(&self) -> Result<&str, ValidationError> {
        if self.input.trim().is_empty() {
            Err(ValidationError::EmptyQuery)
        } else {
            Ok(&self.input)
        }
    }

    /// Appends the user turn and closes the query gate. Returns the text to
    /// send, or `None` when the input is blank or a query is in flight.
    pub fn begin_query(&mut self) -> Option<String> {
        if self.querying || self.validate_query().is_err() {
            return None;
        }
        let text = std::mem::take(&mut self.input);
        self.transcript.push(ChatTurn::user(text.clone()));
        self.querying = true;
        Some(text)
    }

    pub fn finish_query(&mut self, result: ApiResult<QueryResponse>) {
        match result {
            Ok(response) => {
                tracing::info!(sources = response.sources.len(), "query answered");
                self.transcript.push(ChatTurn::answer(response));
            }
            Err(err) => {
                tracing::error!("query failed: {err}");
                self.transcript.push(ChatTurn::assistant(QUERY_ERROR_TEXT));
            }
        }
        self.querying = false;
    }

    pub fn select_file(&mut self, file: SelectedFile) -> Result<(), ValidationError> {
        if file.bytes.is_empty() {
            return Err(self.reject_unreadable(file.name));
        }
        if file.is_pdf() {
            tracing::debug!(?file, "file selected");
            self.selected_file = Some(file);
            return Ok(());
        }
        self.selected_file = None;
        self.notify(NoticeLevel::Error, "Please select a PDF file", NOTICE_SHORT);
        Err(ValidationError::NotPdf {
            name: file.name,
            media_type: file.media_type,
        })
    }

    /// Drops any previous pick when the picker could not hand over the
    /// file contents.
    pub fn reject_unreadable(&mut self, name: impl Into<String>) -> ValidationError {
        self.selected_file = None;
        self.notify(
            NoticeLevel::Error,
            "Could not read the selected file",
            NOTICE_SHORT,
        );
        ValidationError::Unreadable { name: name.into() }
    }

    pub fn validate_upload(&self) -> Result<&SelectedFile, ValidationError> {
        self.selected_file
            .as_ref()
            .ok_or(ValidationError::NoFileSelected)
    }

    /// Closes the upload gate and resets progress. Returns the payload to
    /// send, or `None` when nothing is selected or an upload is in flight.
    pub fn begin_upload(&mut self) -> Option<DocumentUpload> {
        if self.uploading {
            return None;
        }
        let file = self.validate_upload().ok()?;
        let upload = DocumentUpload {
            file_name: file.name.clone(),
            bytes: file.bytes.clone(),
        };
        self.uploading = true;
        self.upload_progress = 0;
        Some(upload)
    }

    /// One step of the cosmetic progress bar.
    pub fn tick_progress(&mut self) -> Tick {
        if !self.uploading {
            return Tick::Stop;
        }
        self.upload_progress = self
            .upload_progress
            .saturating_add(PROGRESS_STEP)
            .min(PROGRESS_MAX);
        if self.upload_progress >= PROGRESS_MAX {
            Tick::Stop
        } else {
            Tick::Continue
        }
    }

    pub fn finish_upload(&mut self, result: ApiResult<UploadResponse>) {
        match result {
            Ok(response) => {
                tracing::info!(name = %response.name, chunks = response.chunk_count, "document uploaded");
                self.upload_progress = PROGRESS_MAX;
                self.selected_file = None;
                self.notify(
                    NoticeLevel::Success,
                    format!(
                        "Uploaded {} with {} chunks",
                        response.name, response.chunk_count
                    ),
                    NOTICE_LONG,
                );
            }
            Err(err) => {
                // Selection stays for a retry.
                tracing::error!("upload failed: {err}");
                self.upload_progress = 0;
                self.notify(NoticeLevel::Error, "Error uploading document", NOTICE_SHORT);
            }
        }
        self.uploading = false;
    }

    /// Closes the rebuild gate. Returns `false` when a rebuild is in flight.
    pub fn begin_rebuild(&mut self) -> bool {
        if self.rebuilding_index {
            return false;
        }
        self.rebuilding_index = true;
        self.notify(NoticeLevel::Info, "Rebuilding index...", NOTICE_SHORT);
        true
    }

    pub fn finish_rebuild(&mut self, result: ApiResult<RebuildIndexResponse>) {
        match result {
            Ok(response) => {
                tracing::info!(
                    documents = response.documents_processed,
                    chunks = response.total_chunks,
                    "index rebuilt"
                );
                self.notify(
                    NoticeLevel::Success,
                    format!(
                        "Index rebuilt! Processed {} documents with {} chunks",
                        response.documents_processed, response.total_chunks
                    ),
                    NOTICE_LONG,
                );
            }
            Err(err) => {
                tracing::error!("index rebuild failed: {err}");
                self.notify(NoticeLevel::Error, "Error rebuilding index", NOTICE_SHORT);
            }
        }
        self.rebuilding_index = false;
    }

    pub fn clear_chat(&mut self) {
        self.transcript.clear();
    }

    pub fn notify(
        &mut self,
        level: NoticeLevel,
        message: impl Into<String>,
        duration: Duration,
    ) -> u64 {
        self.next_notice_id += 1;
        let id = self.next_notice_id;
        self.notices.push(Notice {
            id,
            level,
            message: message.into(),
            duration,
        });
        id
    }

    pub fn dismiss_notice(&mut self, id: u64) {
        self.notices.retain(|notice| notice.id != id);
    }
}

/// Access to a [`ConversationState`] that may have been torn down.
pub trait ConversationHandle: Clone {
    /// Runs `f` against the live state. Returns `None` without calling `f`
    /// when the state no longer exists.
    fn update<R>(&mut self, f: impl FnOnce(&mut ConversationState) -> R) -> Option<R>;
}

// Poisoned locks are recovered so finish steps always reopen their gate.
impl ConversationHandle for Arc<Mutex<ConversationState>> {
    fn update<R>(&mut self, f: impl FnOnce(&mut ConversationState) -> R) -> Option<R> {
        let mut state = self.lock().unwrap_or_else(PoisonError::into_inner);
        Some(f(&mut state))
    }
}

impl ConversationHandle for Weak<Mutex<ConversationState>> {
    fn update<R>(&mut self, f: impl FnOnce(&mut ConversationState) -> R) -> Option<R> {
        let shared = self.upgrade()?;
        let mut state = shared.lock().unwrap_or_else(PoisonError::into_inner);
        Some(f(&mut state))
    }
}

#[cfg(feature = "ui")]
impl ConversationHandle for dioxus_signals::Signal<ConversationState> {
    fn update<R>(&mut self, f: impl FnOnce(&mut ConversationState) -> R) -> Option<R> {
        use dioxus_signals::Writable;
        use generational_box::BorrowMutError;
        match self.try_write() {
            Ok(mut state) => Some(f(&mut state)),
            Err(BorrowMutError::Dropped(_)) => None,
            Err(err) => panic!("conversation state is already borrowed: {err}"),
        }
    }
}

pub async fn run_query<H, B>(mut handle: H, backend: &B)
where
    H: ConversationHandle,
    B: RagBackend + ?Sized,
{
    let Some(text) = handle.update(|state| state.begin_query()).flatten() else {
        return;
    };
    tracing::debug!(len = text.len(), "query started");
    let result = backend.submit_query(&text).await;
    handle.update(|state| state.finish_query(result));
}

/// Uploads the selected file while the progress ticker runs. The ticker is
/// dropped as soon as the request resolves.
pub async fn run_upload<H, B>(mut handle: H, backend: &B)
where
    H: ConversationHandle,
    B: RagBackend + ?Sized,
{
    let Some(upload) = handle.update(|state| state.begin_upload()).flatten() else {
        return;
    };
    tracing::debug!(file = %upload.file_name, "upload started");

    let mut ticker_handle = handle.clone();
    let ticker = pin!(repeat_every(PROGRESS_TICK, move || {
        ticker_handle
            .update(|state| state.tick_progress())
            .unwrap_or(Tick::Stop)
    }));
    let request = backend.upload_document(upload);

    let result = match select(request, ticker).await {
        Either::Left((result, _ticker)) => result,
        Either::Right(((), request)) => request.await,
    };
    handle.update(|state| state.finish_upload(result));
}

pub async fn run_rebuild<H, B>(mut handle: H, backend: &B)
where
    H: ConversationHandle,
    B: RagBackend + ?Sized,
{
    if !handle
        .update(|state| state.begin_rebuild())
        .unwrap_or(false)
    {
        return;
    }
    let result = backend.rebuild_index().await;
    handle.update(|state| state.finish_rebuild(result));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::types::{DocumentSource, QueryTiming, SourceId};

    fn server_error() -> ApiError {
        ApiError::Server {
            status: 500,
            message: "boom".into(),
        }
    }

    fn pdf() -> SelectedFile {
        SelectedFile::new("manual.pdf", Some("application/pdf".into()), b"%PDF-1.4".to_vec())
    }

    #[test]
    fn blank_input_is_rejected() {
        let mut state = ConversationState::new();
        state.set_input("   \n\t");
        assert_eq!(state.validate_query(), Err(ValidationError::EmptyQuery));
        assert!(state.begin_query().is_none());
        assert!(state.transcript().is_empty());
        assert!(!state.is_querying());
    }

    #[test]
    fn user_turn_keeps_raw_text_and_clears_input() {
        let mut state = ConversationState::new();
        state.set_input("  hello  ");
        assert_eq!(state.begin_query().as_deref(), Some("  hello  "));
        assert_eq!(state.input(), "");
        assert!(state.is_querying());
        assert_eq!(state.transcript().len(), 1);
        assert!(state.transcript()[0].is_from_user);
        assert_eq!(state.transcript()[0].text, "  hello  ");
    }

    #[test]
    fn query_gate_blocks_second_send() {
        let mut state = ConversationState::new();
        state.set_input("first");
        state.begin_query();
        state.set_input("second");
        assert!(!state.can_send());
        assert!(state.begin_query().is_none());
        assert_eq!(state.transcript().len(), 1);
        assert_eq!(state.input(), "second");
    }

    #[test]
    fn answer_and_failure_both_reopen_gate() {
        let mut state = ConversationState::new();
        state.set_input("q1");
        state.begin_query();
        state.finish_query(Ok(QueryResponse {
            answer: "a1".into(),
            sources: vec![DocumentSource {
                id: SourceId::Number(1),
                document_name: "policy.pdf".into(),
                page: Some(2),
                source: "...".into(),
                content_preview: None,
            }],
            timing: QueryTiming { total_ms: 5.0 },
        }));
        assert!(!state.is_querying());

        state.set_input("q2");
        state.begin_query();
        state.finish_query(Err(server_error()));
        assert!(!state.is_querying());

        let texts: Vec<_> = state.transcript().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["q1", "a1", "q2", QUERY_ERROR_TEXT]);
        assert_eq!(state.transcript()[1].sources.len(), 1);
        assert!(state.transcript()[3].sources.is_empty());
        assert!(state.notices().is_empty());
    }

    #[test]
    fn non_pdf_selection_clears_previous_pick() {
        let mut state = ConversationState::new();
        state.select_file(pdf()).unwrap();
        assert!(state.selected_file().is_some());

        let err = state
            .select_file(SelectedFile::new("notes.txt", None, b"hi".to_vec()))
            .unwrap_err();
        assert!(matches!(err, ValidationError::NotPdf { .. }));
        assert!(state.selected_file().is_none());
        assert!(state.transcript().is_empty());
        assert_eq!(state.notices().len(), 1);
        assert_eq!(state.notices()[0].level, NoticeLevel::Error);
        assert_eq!(state.notices()[0].message, "Please select a PDF file");
    }

    #[test]
    fn unreadable_pick_is_not_selected() {
        let mut state = ConversationState::new();
        state.select_file(pdf()).unwrap();

        let err = state
            .select_file(SelectedFile::new("scan.pdf", None, Vec::new()))
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::Unreadable {
                name: "scan.pdf".into()
            }
        );
        assert!(state.selected_file().is_none());
        assert!(!state.can_upload());
        assert!(state.begin_upload().is_none());
        assert_eq!(state.notices().len(), 1);
        assert_eq!(state.notices()[0].level, NoticeLevel::Error);
    }

    #[test]
    fn upload_requires_selection() {
        let mut state = ConversationState::new();
        assert!(!state.can_upload());
        assert_eq!(
            state.validate_upload().unwrap_err(),
            ValidationError::NoFileSelected
        );
        assert!(state.begin_upload().is_none());
        assert!(!state.is_uploading());
    }

    #[test]
    fn progress_caps_at_one_hundred() {
        let mut state = ConversationState::new();
        state.select_file(pdf()).unwrap();
        state.begin_upload().unwrap();
        let mut ticks = 0;
        while state.tick_progress() == Tick::Continue {
            ticks += 1;
        }
        assert_eq!(ticks, 19);
        assert_eq!(state.upload_progress(), PROGRESS_MAX);
        assert_eq!(state.tick_progress(), Tick::Stop);
        assert_eq!(state.upload_progress(), PROGRESS_MAX);
    }

    #[test]
    fn progress_does_not_move_outside_an_upload() {
        let mut state = ConversationState::new();
        assert_eq!(state.tick_progress(), Tick::Stop);
        assert_eq!(state.upload_progress(), 0);
    }

    #[test]
    fn failed_upload_keeps_selection() {
        let mut state = ConversationState::new();
        state.select_file(pdf()).unwrap();
        state.begin_upload().unwrap();
        state.tick_progress();
        state.finish_upload(Err(server_error()));
        assert_eq!(state.upload_progress(), 0);
        assert!(!state.is_uploading());
        assert_eq!(state.selected_file().map(|f| f.name.as_str()), Some("manual.pdf"));
        assert_eq!(state.notices().last().unwrap().message, "Error uploading document");
    }

    #[test]
    fn successful_upload_reports_chunks() {
        let mut state = ConversationState::new();
        state.select_file(pdf()).unwrap();
        state.begin_upload().unwrap();
        state.finish_upload(Ok(UploadResponse {
            id: SourceId::Number(9),
            name: "manual".into(),
            chunk_count: 14,
            message: String::new(),
        }));
        assert_eq!(state.upload_progress(), PROGRESS_MAX);
        assert!(state.selected_file().is_none());
        let notice = state.notices().last().unwrap();
        assert_eq!(notice.level, NoticeLevel::Success);
        assert_eq!(notice.message, "Uploaded manual with 14 chunks");
        assert_eq!(notice.duration, NOTICE_LONG);
    }

    #[test]
    fn rebuild_gate_and_notices() {
        let mut state = ConversationState::new();
        assert!(state.begin_rebuild());
        assert!(!state.begin_rebuild());
        assert_eq!(state.notices().len(), 1);
        state.finish_rebuild(Ok(RebuildIndexResponse {
            success: true,
            documents_processed: 3,
            total_chunks: 40,
            message: String::new(),
        }));
        assert!(!state.is_rebuilding_index());
        let messages: Vec<_> = state.notices().iter().map(|n| n.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Rebuilding index...",
                "Index rebuilt! Processed 3 documents with 40 chunks"
            ]
        );
    }

    #[test]
    fn clear_empties_transcript_while_querying() {
        let mut state = ConversationState::new();
        state.set_input("q");
        state.begin_query();
        state.clear_chat();
        assert!(state.transcript().is_empty());
        assert!(state.is_querying());
        state.finish_query(Err(server_error()));
        assert_eq!(state.transcript().len(), 1);
    }

    #[test]
    fn notices_dismiss_by_id() {
        let mut state = ConversationState::new();
        let first = state.notify(NoticeLevel::Info, "a", NOTICE_SHORT);
        let second = state.notify(NoticeLevel::Info, "b", NOTICE_SHORT);
        assert_ne!(first, second);
        state.dismiss_notice(first);
        assert_eq!(state.notices().len(), 1);
        assert_eq!(state.notices()[0].id, second);
    }

    #[test]
    fn weak_handle_skips_dropped_state() {
        let shared = Arc::new(Mutex::new(ConversationState::new()));
        let mut weak = Arc::downgrade(&shared);
        assert_eq!(weak.update(|state| state.transcript().len()), Some(0));
        drop(shared);
        assert_eq!(weak.update(|state| state.transcript().len()), None);
    }

    #[test]
    fn poisoned_lock_still_reopens_gate() {
        let shared = Arc::new(Mutex::new(ConversationState::new()));
        let mut handle = shared.clone();
        handle.update(|state| {
            state.set_input("q");
            state.begin_query();
        });

        let poisoner = shared.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison");
        })
        .join();
        assert!(shared.is_poisoned());

        handle.update(|state| state.finish_query(Err(server_error())));
        assert_eq!(handle.update(|state| state.is_querying()), Some(false));
    }
}
