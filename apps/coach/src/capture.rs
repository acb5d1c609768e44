//! Turning the candidate's response into an answer for the current question.
//!
//! Voice answers run acquire → accumulate → finalize → release, then go
//! through transcription. Typed answers are stored directly. Either way the
//! stored answer can trigger a best-effort evaluation of that single answer.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::gateway::BackendGateway;
use crate::model::{FeedbackItem, SessionState};
use crate::prompts::evaluation_prompt;

/// Stored in place of a transcript when transcription could not be completed.
pub const TRANSCRIPTION_FAILED_ANSWER: &str = "Audio response recorded (transcription failed)";

pub const EVALUATION_FAILED_CONTENT: &str =
    "This answer could not be evaluated. It has been saved and will still be included in your final feedback.";

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("audio input unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("audio device error: {0}")]
    Device(String),

    #[error("answer is empty")]
    EmptyAnswer,

    #[error("recording task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// A finished recording ready for upload.
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub bytes: Bytes,
    pub file_name: String,
    pub mime_type: String,
}

impl AudioClip {
    pub fn wav(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            file_name: "response.wav".to_string(),
            mime_type: "audio/wav".to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A microphone, or anything that can stand in for one.
#[async_trait]
pub trait AudioInput: Send + Sync {
    /// Capability check; `false` means only typed answers are possible.
    fn is_available(&self) -> bool;

    async fn open(&self) -> Result<Box<dyn AudioStream>, CaptureError>;
}

/// An acquired device producing audio chunks.
#[async_trait]
pub trait AudioStream: Send {
    /// `None` once the device has nothing more to deliver.
    async fn next_chunk(&mut self) -> Option<Result<Bytes, CaptureError>>;

    /// Stops the device. Must tolerate being called more than once.
    fn release(&mut self);
}

/// Releases the device whenever the accumulation loop ends, however it ends.
struct DeviceGuard(Box<dyn AudioStream>);

impl Drop for DeviceGuard {
    fn drop(&mut self) {
        self.0.release();
        debug!("Audio device released");
    }
}

/// A recording in progress. Dropping it without calling `finish` still stops
/// the recording and releases the device.
pub struct ActiveRecording {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<Vec<Bytes>>,
}

impl ActiveRecording {
    /// Acquires the device and starts accumulating chunks in the background.
    pub async fn start(input: &dyn AudioInput) -> Result<Self, CaptureError> {
        if !input.is_available() {
            return Err(CaptureError::DeviceUnavailable(
                "no audio input device".to_string(),
            ));
        }
        let stream = input.open().await?;
        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(accumulate(DeviceGuard(stream), stop_rx));
        info!("Recording started");
        Ok(Self {
            stop: Some(stop_tx),
            task,
        })
    }

    /// Stops recording and packages everything captured so far.
    pub async fn finish(mut self) -> Result<AudioClip, CaptureError> {
        if let Some(stop) = self.stop.take() {
            // The task may already have ended on its own (device closed).
            let _ = stop.send(());
        }
        let chunks = self.task.await?;
        let mut audio = BytesMut::with_capacity(chunks.iter().map(Bytes::len).sum());
        for chunk in &chunks {
            audio.extend_from_slice(chunk);
        }
        info!("Recording stopped: {} chunks, {} bytes", chunks.len(), audio.len());
        Ok(AudioClip::wav(audio.freeze()))
    }
}

async fn accumulate(mut device: DeviceGuard, mut stop: oneshot::Receiver<()>) -> Vec<Bytes> {
    let mut chunks = Vec::new();
    loop {
        tokio::select! {
            biased;
            _ = &mut stop => break,
            chunk = device.0.next_chunk() => match chunk {
                Some(Ok(bytes)) => chunks.push(bytes),
                Some(Err(e)) => {
                    warn!("Recording error, keeping {} chunks: {e}", chunks.len());
                    break;
                }
                None => break,
            },
        }
    }
    chunks
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    Voice,
    Text,
}

/// What one capture chain stored into the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOutcome {
    pub index: usize,
    pub answer: String,
    pub modality: Modality,
    pub feedback: Option<FeedbackItem>,
}

/// Writes answers into the session and optionally evaluates each one.
#[derive(Clone)]
pub struct AnswerCapture {
    gateway: Arc<dyn BackendGateway>,
    evaluate: bool,
}

impl AnswerCapture {
    pub fn new(gateway: Arc<dyn BackendGateway>) -> Self {
        Self {
            gateway,
            evaluate: false,
        }
    }

    pub fn with_evaluation(mut self, evaluate: bool) -> Self {
        self.evaluate = evaluate;
        self
    }

    pub fn evaluates(&self) -> bool {
        self.evaluate
    }

    /// Stores trimmed typed text as the current answer.
    pub async fn commit_text(
        &self,
        session: &mut SessionState,
        text: &str,
    ) -> Result<CaptureOutcome, CaptureError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CaptureError::EmptyAnswer);
        }
        Ok(self.store(session, text.to_string(), Modality::Text).await)
    }

    /// Transcribes a recording and stores the result as the current answer.
    ///
    /// Never fails: a transcription failure stores a placeholder answer instead.
    pub async fn commit_voice(
        &self,
        session: &mut SessionState,
        clip: &AudioClip,
    ) -> CaptureOutcome {
        let answer = match self.gateway.transcribe(clip).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                warn!("Transcription returned no text");
                TRANSCRIPTION_FAILED_ANSWER.to_string()
            }
            Err(e) => {
                warn!("Transcription failed: {e}");
                TRANSCRIPTION_FAILED_ANSWER.to_string()
            }
        };
        self.store(session, answer, Modality::Voice).await
    }

    async fn store(
        &self,
        session: &mut SessionState,
        answer: String,
        modality: Modality,
    ) -> CaptureOutcome {
        let index = session.record_current_answer(answer.clone());

        let feedback = if self.evaluate {
            let item = self.evaluate_answer(session, index, &answer).await;
            session.record_current_feedback(item.clone());
            Some(item)
        } else {
            None
        };

        CaptureOutcome {
            index,
            answer,
            modality,
            feedback,
        }
    }

    async fn evaluate_answer(
        &self,
        session: &SessionState,
        index: usize,
        answer: &str,
    ) -> FeedbackItem {
        let question = &session.questions()[index].text;
        let prompt = evaluation_prompt(question, answer, &session.job_description);
        match self.gateway.evaluate_answer(&prompt).await {
            Ok(item) => item,
            Err(e) => {
                warn!("Evaluation of answer {} failed: {e}", index + 1);
                FeedbackItem::error(EVALUATION_FAILED_CONTENT)
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FakeMicrophone;
    use super::*;
    use crate::gateway::{Endpoint, MockGateway};
    use crate::model::Question;

    fn session() -> SessionState {
        SessionState::new(
            vec![Question::new("Q1"), Question::new("Q2")],
            "resume",
            "jd",
            None,
        )
        .unwrap()
    }

    async fn wait_for_chunks() {
        // Let the accumulation task drain the scripted chunks.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_recording_concatenates_chunks_and_releases_device() {
        let mic = FakeMicrophone::with_chunks(vec![b"RIFF", b"data"]);
        let recording = ActiveRecording::start(&mic).await.unwrap();
        wait_for_chunks().await;
        let clip = recording.finish().await.unwrap();

        assert_eq!(&clip.bytes[..], b"RIFFdata");
        assert_eq!(clip.file_name, "response.wav");
        assert_eq!(mic.released(), 1);
    }

    #[tokio::test]
    async fn test_device_error_ends_recording_and_releases() {
        let mut mic = FakeMicrophone::with_chunks(vec![b"abc"]);
        mic.chunks.push(Err("unplugged".to_string()));
        mic.chunks.push(Ok(Bytes::from_static(b"never")));
        let recording = ActiveRecording::start(&mic).await.unwrap();
        wait_for_chunks().await;
        let clip = recording.finish().await.unwrap();

        assert_eq!(&clip.bytes[..], b"abc");
        assert_eq!(mic.released(), 1);
    }

    #[tokio::test]
    async fn test_dropping_recording_releases_device() {
        let mic = FakeMicrophone::with_chunks(vec![b"abc"]);
        let recording = ActiveRecording::start(&mic).await.unwrap();
        drop(recording);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(mic.released(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_device_is_not_opened() {
        let mic = FakeMicrophone::unavailable();
        let err = ActiveRecording::start(&mic).await.err().unwrap();
        assert!(matches!(err, CaptureError::DeviceUnavailable(_)));
        assert_eq!(mic.opened.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_text_answer_is_trimmed_and_overwrites() {
        let gateway = Arc::new(MockGateway::new());
        let capture = AnswerCapture::new(gateway.clone());
        let mut s = session();

        capture.commit_text(&mut s, "  first  ").await.unwrap();
        let outcome = capture.commit_text(&mut s, "second").await.unwrap();

        assert_eq!(outcome.index, 0);
        assert_eq!(s.answer(0), Some("second"));
        assert!(s.feedback()[0].is_none());
        assert_eq!(gateway.calls(Endpoint::EvaluateAnswer), 0);
    }

    #[tokio::test]
    async fn test_blank_text_is_rejected_without_state_change() {
        let capture = AnswerCapture::new(Arc::new(MockGateway::new()));
        let mut s = session();
        let err = capture.commit_text(&mut s, "   ").await.unwrap_err();
        assert!(matches!(err, CaptureError::EmptyAnswer));
        assert!(s.answer(0).is_none());
    }

    #[tokio::test]
    async fn test_transcription_failure_stores_placeholder() {
        let gateway = Arc::new(MockGateway::new());
        gateway.push_failure(Endpoint::Transcribe, "speech service down");
        let capture = AnswerCapture::new(gateway);
        let mut s = session();

        let outcome = capture.commit_voice(&mut s, &AudioClip::wav(vec![1, 2, 3])).await;
        assert_eq!(outcome.modality, Modality::Voice);
        assert_eq!(s.answer(0), Some(TRANSCRIPTION_FAILED_ANSWER));
    }

    #[tokio::test]
    async fn test_evaluation_failure_stores_error_feedback() {
        let gateway = Arc::new(MockGateway::new());
        gateway.push_failure(Endpoint::EvaluateAnswer, "model timeout");
        let capture = AnswerCapture::new(gateway.clone()).with_evaluation(true);
        let mut s = session();

        let outcome = capture.commit_text(&mut s, "I shipped it").await.unwrap();
        assert!(outcome.feedback.as_ref().unwrap().is_error());
        assert!(s.feedback()[0].as_ref().unwrap().is_error());
        assert_eq!(s.answer(0), Some("I shipped it"));
        assert!(gateway
            .last_prompt(Endpoint::EvaluateAnswer)
            .unwrap()
            .contains("Answer: I shipped it"));
    }

    #[tokio::test]
    async fn test_successful_evaluation_is_stored() {
        let gateway = Arc::new(MockGateway::new());
        gateway.push_json(
            Endpoint::EvaluateAnswer,
            serde_json::json!({"title": "Strong answer", "content": "Concrete and measurable."}),
        );
        let capture = AnswerCapture::new(gateway).with_evaluation(true);
        let mut s = session();

        capture.commit_voice(&mut s, &AudioClip::wav(vec![0])).await;
        assert_eq!(
            s.feedback()[0],
            Some(FeedbackItem::new("Strong answer", "Concrete and measurable."))
        );
    }
}
