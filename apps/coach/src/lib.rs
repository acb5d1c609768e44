//! Client-side core of the mock interview assistant.
//!
//! The wizard walks one candidate through resume upload, a loop over the
//! generated questions, and a final feedback page. All backend traffic goes
//! through a `BackendGateway`; every network call is wrapped in bounded retry.

pub mod capture;
pub mod feedback;
pub mod gateway;
pub mod model;
pub mod prompts;
pub mod report;
pub mod retry;
pub mod upload;
pub mod wizard;

pub use capture::{AnswerCapture, AudioClip, AudioInput, AudioStream, CaptureError, CaptureOutcome};
pub use feedback::FeedbackReport;
pub use gateway::{BackendGateway, GatewayError, HttpGateway, MockGateway};
pub use model::{FeedbackItem, Question, SessionState};
pub use retry::{FetchError, RetryPolicy};
pub use upload::{ResumeFile, ResumeSource, UploadError};
pub use wizard::{
    Advance, InputMode, Navigation, Phase, SharedWizard, WizardController, WizardError,
};
