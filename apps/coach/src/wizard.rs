//! The interview wizard: Upload → QuestionLoop → Loading → Results.
//!
//! `WizardController` owns the `SessionState` for one interview and is the
//! only thing that mutates it. Every operation takes `&mut self`, so one
//! capture or feedback chain runs at a time. `SharedWizard` puts the
//! controller behind a mutex for callers (UI event handlers) that hold it by
//! shared reference; they get `WizardError::Busy` instead of waiting while a
//! chain is in flight.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{error, info, warn};

use crate::capture::{ActiveRecording, AnswerCapture, AudioInput, CaptureError, CaptureOutcome};
use crate::feedback::{generate_feedback, FeedbackReport};
use crate::gateway::{BackendGateway, GatewayError};
use crate::model::{FeedbackItem, Question, SessionError, SessionState};
use crate::prompts::question_prompt;
use crate::upload::{ResumeSource, UploadError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Upload,
    QuestionLoop,
    Loading,
    Results,
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("Error generating questions: {0}. Please check server connection.")]
    Generation(#[from] GatewayError),

    #[error("Error generating questions: {0}")]
    Session(#[from] SessionError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("question {} has not been answered yet", .index + 1)]
    Unanswered { index: usize },

    #[error("operation not allowed in the {0:?} phase")]
    WrongPhase(Phase),

    #[error("no recording in progress")]
    NotRecording,

    #[error("another operation is still in progress")]
    Busy,
}

/// Derived display state for the question page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Navigation {
    pub position: usize,
    pub total: usize,
    /// `(position + 1) / total`, in `0.0..=1.0`.
    pub progress: f64,
    pub previous_enabled: bool,
    pub next_enabled: bool,
    pub is_last: bool,
}

impl Navigation {
    pub fn of(session: &SessionState) -> Self {
        let position = session.position();
        let total = session.len();
        Self {
            position,
            total,
            progress: (position + 1) as f64 / total as f64,
            previous_enabled: position > 0,
            next_enabled: session.current_answer().is_some(),
            is_last: session.is_last(),
        }
    }
}

/// Result of a successful `advance`.
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    Moved(Navigation),
    Finished(FeedbackReport),
}

/// How answers can currently be given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Voice,
    TextOnly,
}

/// Inputs collected on the upload page, kept for prompt building.
#[derive(Debug, Clone, Default)]
struct InterviewContext {
    resume_text: String,
    job_description: String,
    company_name: Option<String>,
}

pub struct WizardController {
    gateway: Arc<dyn BackendGateway>,
    capture: AnswerCapture,
    audio: Option<Arc<dyn AudioInput>>,
    voice_disabled: bool,
    recording: Option<ActiveRecording>,
    phase: Phase,
    context: InterviewContext,
    session: Option<SessionState>,
    results: Option<FeedbackReport>,
    last_error: Option<String>,
}

impl WizardController {
    pub fn new(gateway: Arc<dyn BackendGateway>) -> Self {
        Self {
            capture: AnswerCapture::new(Arc::clone(&gateway)),
            gateway,
            audio: None,
            voice_disabled: false,
            recording: None,
            phase: Phase::Upload,
            context: InterviewContext::default(),
            session: None,
            results: None,
            last_error: None,
        }
    }

    /// Evaluate every committed answer individually.
    pub fn with_evaluation(mut self, evaluate: bool) -> Self {
        self.capture = self.capture.with_evaluation(evaluate);
        self
    }

    pub fn with_audio_input(mut self, audio: Arc<dyn AudioInput>) -> Self {
        self.audio = Some(audio);
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn session(&self) -> Option<&SessionState> {
        self.session.as_ref()
    }

    pub fn results(&self) -> Option<&FeedbackReport> {
        self.results.as_ref()
    }

    /// User-visible message from the last failed operation, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn navigation(&self) -> Option<Navigation> {
        match self.phase {
            Phase::QuestionLoop => self.session.as_ref().map(Navigation::of),
            _ => None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    pub fn input_mode(&self) -> InputMode {
        match &self.audio {
            Some(audio) if !self.voice_disabled && audio.is_available() => InputMode::Voice,
            _ => InputMode::TextOnly,
        }
    }

    /// Validates the upload form, extracts the resume, generates questions and
    /// enters the question loop. Any failure leaves the wizard on Upload with
    /// no session and `last_error` set.
    pub async fn start(
        &mut self,
        resume: ResumeSource,
        job_description: &str,
        company_name: Option<&str>,
    ) -> Result<Navigation, WizardError> {
        self.require_phase(Phase::Upload)?;
        self.last_error = None;

        let result = self.generate_session(resume, job_description, company_name).await;
        match result {
            Ok(questions) => self.begin(questions),
            Err(e) => {
                error!("{e}");
                self.phase = Phase::Upload;
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    async fn generate_session(
        &mut self,
        resume: ResumeSource,
        job_description: &str,
        company_name: Option<&str>,
    ) -> Result<Vec<Question>, WizardError> {
        let job_description = job_description.trim();
        if job_description.is_empty() {
            return Err(UploadError::MissingInput.into());
        }
        resume.validate()?;

        self.phase = Phase::Loading;
        let resume_text = match &resume {
            ResumeSource::File(file) => self.gateway.upload_resume(file).await?,
            ResumeSource::Text(text) => self.gateway.upload_resume_text(text).await?,
        };

        let company_name = company_name.map(str::trim).filter(|c| !c.is_empty());
        let prompt = question_prompt(&resume_text, job_description, company_name);
        let questions = self.gateway.generate_questions(&prompt).await?;

        self.context = InterviewContext {
            resume_text,
            job_description: job_description.to_string(),
            company_name: company_name.map(str::to_string),
        };
        Ok(questions)
    }

    /// Creates a fresh session at position 0 from generated questions. Any
    /// recording from a previous session is stopped and discarded.
    pub fn begin(&mut self, questions: Vec<Question>) -> Result<Navigation, WizardError> {
        if self.recording.take().is_some() {
            warn!("Discarding recording from the previous session");
        }
        self.last_error = None;
        let context = self.context.clone();
        match SessionState::new(
            questions,
            context.resume_text,
            context.job_description,
            context.company_name,
        ) {
            Ok(session) => {
                info!("Interview started with {} questions", session.len());
                let nav = Navigation::of(&session);
                self.session = Some(session);
                self.results = None;
                self.phase = Phase::QuestionLoop;
                Ok(nav)
            }
            Err(e) => {
                warn!("Cannot start interview: {e}");
                self.session = None;
                self.phase = Phase::Upload;
                let e = WizardError::from(e);
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Moves to the next question, or generates the final feedback from the
    /// last one. Blocked while the current question is unanswered.
    pub async fn advance(&mut self) -> Result<Advance, WizardError> {
        self.require_phase(Phase::QuestionLoop)?;
        if self.recording.is_some() {
            return Err(WizardError::Busy);
        }
        let session = self.session_mut()?;
        if session.current_answer().is_none() {
            return Err(WizardError::Unanswered {
                index: session.position(),
            });
        }
        if session.step_forward() {
            return Ok(Advance::Moved(Navigation::of(session)));
        }

        self.phase = Phase::Loading;
        let report = match &self.session {
            Some(session) => generate_feedback(self.gateway.as_ref(), session).await,
            None => return Err(WizardError::WrongPhase(Phase::Loading)),
        };
        self.results = Some(report.clone());
        self.phase = Phase::Results;
        Ok(Advance::Finished(report))
    }

    /// Moves to the previous question; stays put on the first one.
    pub fn retreat(&mut self) -> Result<Navigation, WizardError> {
        self.require_phase(Phase::QuestionLoop)?;
        if self.recording.is_some() {
            return Err(WizardError::Busy);
        }
        let session = self.session_mut()?;
        session.step_back();
        Ok(Navigation::of(session))
    }

    /// Stores typed text as the current answer.
    pub async fn submit_text(&mut self, text: &str) -> Result<CaptureOutcome, WizardError> {
        self.require_phase(Phase::QuestionLoop)?;
        if self.recording.is_some() {
            return Err(WizardError::Busy);
        }
        let capture = self.capture.clone();
        let session = self.session_mut()?;
        Ok(capture.commit_text(session, text).await?)
    }

    /// Starts recording. Falls back to text-only input, without error, when no
    /// usable audio device exists.
    pub async fn start_recording(&mut self) -> Result<InputMode, WizardError> {
        self.require_phase(Phase::QuestionLoop)?;
        if self.recording.is_some() {
            return Err(WizardError::Busy);
        }
        let audio = match (&self.audio, self.input_mode()) {
            (Some(audio), InputMode::Voice) => Arc::clone(audio),
            _ => return Ok(InputMode::TextOnly),
        };
        match ActiveRecording::start(audio.as_ref()).await {
            Ok(recording) => {
                self.recording = Some(recording);
                Ok(InputMode::Voice)
            }
            Err(e) => {
                warn!("Audio recording unavailable, switching to text input: {e}");
                self.voice_disabled = true;
                Ok(InputMode::TextOnly)
            }
        }
    }

    /// Stops recording, transcribes, and stores the answer.
    pub async fn stop_recording(&mut self) -> Result<CaptureOutcome, WizardError> {
        let recording = self.recording.take().ok_or(WizardError::NotRecording)?;
        let clip = recording.finish().await?;
        let capture = self.capture.clone();
        let session = self.session_mut()?;
        Ok(capture.commit_voice(session, &clip).await)
    }

    /// Discards the session and returns to Upload, from any phase.
    pub fn reset(&mut self) {
        // Dropping an active recording stops it and releases the device.
        self.recording = None;
        self.session = None;
        self.results = None;
        self.last_error = None;
        self.context = InterviewContext::default();
        self.phase = Phase::Upload;
        info!("Interview reset");
    }

    /// Per-question feedback recorded so far, if a session exists.
    pub fn answer_feedback(&self) -> Option<&[Option<FeedbackItem>]> {
        self.session.as_ref().map(SessionState::feedback)
    }

    fn require_phase(&self, phase: Phase) -> Result<(), WizardError> {
        if self.phase != phase {
            return Err(WizardError::WrongPhase(self.phase));
        }
        Ok(())
    }

    fn session_mut(&mut self) -> Result<&mut SessionState, WizardError> {
        let phase = self.phase;
        self.session.as_mut().ok_or(WizardError::WrongPhase(phase))
    }
}

/// A `WizardController` that can be driven from several handles. Operations
/// never queue: while one is in flight the others fail with `Busy`.
#[derive(Clone)]
pub struct SharedWizard {
    inner: Arc<Mutex<WizardController>>,
}

impl SharedWizard {
    pub fn new(controller: WizardController) -> Self {
        Self {
            inner: Arc::new(Mutex::new(controller)),
        }
    }

    pub fn acquire(&self) -> Result<MutexGuard<'_, WizardController>, WizardError> {
        self.inner.try_lock().map_err(|_| WizardError::Busy)
    }

    pub fn is_busy(&self) -> bool {
        self.inner.try_lock().is_err()
    }

    pub async fn start(
        &self,
        resume: ResumeSource,
        job_description: &str,
        company_name: Option<&str>,
    ) -> Result<Navigation, WizardError> {
        self.acquire()?
            .start(resume, job_description, company_name)
            .await
    }

    pub async fn advance(&self) -> Result<Advance, WizardError> {
        self.acquire()?.advance().await
    }

    pub fn retreat(&self) -> Result<Navigation, WizardError> {
        self.acquire()?.retreat()
    }

    pub async fn submit_text(&self, text: &str) -> Result<CaptureOutcome, WizardError> {
        self.acquire()?.submit_text(text).await
    }

    pub async fn start_recording(&self) -> Result<InputMode, WizardError> {
        self.acquire()?.start_recording().await
    }

    pub async fn stop_recording(&self) -> Result<CaptureOutcome, WizardError> {
        self.acquire()?.stop_recording().await
    }

    pub fn reset(&self) -> Result<(), WizardError> {
        self.acquire()?.reset();
        Ok(())
    }
}
