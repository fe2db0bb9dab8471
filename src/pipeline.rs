//! # Pipeline Orchestrator
//!
//! Sequences one or two dependent calls to the external inference service per
//! incoming request. Every operation is a plain sequential async pipeline: no
//! retry, no cancellation, and the second call happens only on the first
//! call's success.
//!
//! Only the two-stage operation touches shared state. It marks the run as
//! loading before the first call, publishes the final answer on success, and
//! publishes a generic failure notice on either stage's failure — so viewers
//! see failures too, not just the original caller. The single-stage
//! operations leave shared state alone entirely, including on failure; that
//! asymmetry is deliberate product behavior.

use crate::error::{AppError, AppResult};
use crate::inference::{prompt, InferenceClient, InferenceError};
use crate::shared_state::{SharedStateStore, SharedStateUpdate};
use std::sync::Arc;
use tracing::{error, info};

/// Shown to viewers when a two-stage run fails at either stage.
pub const PROCESSING_FAILURE_NOTICE: &str = "An error occurred while processing the images.";

const NO_IMAGE_DATA: &str = "No image data provided";
const NO_TRANSCRIPT: &str = "No transcript provided";

/// Result of a successful two-stage run.
#[derive(Debug, Clone)]
pub struct TwoStageOutcome {
    /// First-stage output, verbatim.
    pub initial_transcript: String,
    /// Second-stage output; also published as the shared `responseText`.
    pub final_response: String,
}

/// Orchestrates inference calls and shared-state mutations for one request.
pub struct Pipeline {
    client: Arc<dyn InferenceClient>,
    store: SharedStateStore,
    image_detail: String,
}

impl Pipeline {
    pub fn new(
        client: Arc<dyn InferenceClient>,
        store: SharedStateStore,
        image_detail: impl Into<String>,
    ) -> Self {
        Self {
            client,
            store,
            image_detail: image_detail.into(),
        }
    }

    /// Transcribe the images, then elaborate an optimal solution from the
    /// transcript in a second dependent call.
    pub async fn transcribe_and_elaborate(&self, images: &[String]) -> AppResult<TwoStageOutcome> {
        if images.is_empty() {
            return Err(AppError::InvalidInput(NO_IMAGE_DATA.to_string()));
        }

        // Viewers see the run start before the first call goes out.
        self.store.merge(SharedStateUpdate::loading());

        info!(images = images.len(), "Sending transcription request");
        let messages = prompt::transcription_messages(images, &self.image_detail);
        let initial_transcript = match self.client.complete(&messages).await {
            Ok(text) => text,
            Err(err) => return Err(self.fail_and_broadcast(err)),
        };

        info!("Received transcript, sending follow-up request");
        let follow_up = prompt::elaboration_messages(&messages, &initial_transcript);
        let final_response = match self.client.complete(&follow_up).await {
            Ok(text) => text,
            Err(err) => return Err(self.fail_and_broadcast(err)),
        };

        info!("Received follow-up response");
        self.store
            .merge(SharedStateUpdate::completed(final_response.clone()));

        Ok(TwoStageOutcome {
            initial_transcript,
            final_response,
        })
    }

    /// Single-stage transcription. Does not touch shared state.
    pub async fn transcribe(&self, images: &[String]) -> AppResult<String> {
        if images.is_empty() {
            return Err(AppError::InvalidInput(NO_IMAGE_DATA.to_string()));
        }

        info!(images = images.len(), "Sending transcription request");
        let messages = prompt::transcription_messages(images, &self.image_detail);
        let transcript = self.client.complete(&messages).await?;
        Ok(transcript)
    }

    /// Classify a transcript against the curriculum-theme taxonomy in one
    /// call. Does not touch shared state.
    pub async fn classify_theme(&self, transcript: &str) -> AppResult<String> {
        if transcript.trim().is_empty() {
            return Err(AppError::InvalidInput(NO_TRANSCRIPT.to_string()));
        }

        info!("Sending theme classification request");
        let messages = prompt::theme_messages(transcript);
        let analyzed_theme = self.client.complete(&messages).await?;
        Ok(analyzed_theme)
    }

    /// Publish the generic failure notice and clear the loading flag, then
    /// hand the error back to the caller. One broadcast per failure.
    fn fail_and_broadcast(&self, err: InferenceError) -> AppError {
        error!(error = %err, "Image processing pipeline failed");
        self.store
            .merge(SharedStateUpdate::completed(PROCESSING_FAILURE_NOTICE));
        AppError::Service(err.to_string())
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::broadcast::tests::{spawn_collector, Drained};
    use crate::broadcast::Broadcaster;
    use crate::inference::ChatMessage;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted inference double: pops one canned reply per call and records
    /// every conversation it was given.
    pub struct ScriptedClient {
        replies: Mutex<VecDeque<Result<String, InferenceError>>>,
        pub calls: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedClient {
        pub fn new(replies: Vec<Result<String, InferenceError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl InferenceClient for ScriptedClient {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String, InferenceError> {
            self.calls.lock().unwrap().push(messages.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(InferenceError::EmptyResponse))
        }
    }

    fn make_pipeline(
        replies: Vec<Result<String, InferenceError>>,
    ) -> (Pipeline, Arc<ScriptedClient>, SharedStateStore) {
        let client = Arc::new(ScriptedClient::new(replies));
        let store = SharedStateStore::new(Broadcaster::new());
        let pipeline = Pipeline::new(client.clone(), store.clone(), "high");
        (pipeline, client, store)
    }

    #[actix_web::test]
    async fn two_stage_success_returns_both_texts_and_publishes_final() {
        let (pipeline, client, store) = make_pipeline(vec![
            Ok("transcript text".to_string()),
            Ok("final answer".to_string()),
        ]);

        let outcome = pipeline
            .transcribe_and_elaborate(&["aW1n".to_string()])
            .await
            .unwrap();

        assert_eq!(outcome.initial_transcript, "transcript text");
        assert_eq!(outcome.final_response, "final answer");
        assert_eq!(client.calls.lock().unwrap().len(), 2);

        let state = store.snapshot();
        assert_eq!(state.response_text, "final answer");
        assert!(!state.is_loading);
    }

    #[actix_web::test]
    async fn two_stage_second_prompt_contains_first_exchange_and_transcript() {
        let (pipeline, client, _store) = make_pipeline(vec![
            Ok("the transcript".to_string()),
            Ok("answer".to_string()),
        ]);

        pipeline
            .transcribe_and_elaborate(&["aW1n".to_string()])
            .await
            .unwrap();

        let calls = client.calls.lock().unwrap();
        let first = &calls[0];
        let second = &calls[1];
        // Follow-up = first exchange + new system turn + transcript turn.
        assert_eq!(second.len(), first.len() + 2);
        assert_eq!(second[second.len() - 1].role, "user");
        assert_eq!(second[second.len() - 2].role, "system");
    }

    #[actix_web::test]
    async fn empty_image_list_is_invalid_input_with_no_state_change() {
        let (pipeline, client, store) = make_pipeline(vec![]);
        let (addr, received) = spawn_collector();
        store.broadcaster().subscribe(addr.clone().recipient());

        let err = pipeline.transcribe_and_elaborate(&[]).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(err.to_string(), "No image data provided");

        // No inference call, no mutation, no broadcast.
        assert!(client.calls.lock().unwrap().is_empty());
        assert_eq!(store.snapshot(), Default::default());
        assert_eq!(addr.send(Drained).await.unwrap(), 0);
        assert!(received.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn second_stage_failure_broadcasts_generic_notice() {
        let (pipeline, _client, store) = make_pipeline(vec![
            Ok("transcript".to_string()),
            Err(InferenceError::Request("connection reset".to_string())),
        ]);
        let (addr, received) = spawn_collector();
        store.broadcaster().subscribe(addr.clone().recipient());

        let err = pipeline
            .transcribe_and_elaborate(&["aW1n".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Service(_)));

        let state = store.snapshot();
        assert_eq!(state.response_text, PROCESSING_FAILURE_NOTICE);
        assert!(!state.is_loading);

        // Exactly two broadcasts: loading, then the failure notice.
        assert_eq!(addr.send(Drained).await.unwrap(), 2);
        let received = received.lock().unwrap();
        assert!(received[0].is_loading);
        assert_eq!(received[1].response_text, PROCESSING_FAILURE_NOTICE);
        assert!(!received[1].is_loading);
    }

    #[actix_web::test]
    async fn first_stage_failure_skips_the_second_call() {
        let (pipeline, client, store) = make_pipeline(vec![Err(InferenceError::Timeout)]);

        let err = pipeline
            .transcribe_and_elaborate(&["aW1n".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Service(_)));
        assert_eq!(client.calls.lock().unwrap().len(), 1);
        assert_eq!(store.snapshot().response_text, PROCESSING_FAILURE_NOTICE);
    }

    #[actix_web::test]
    async fn single_stage_transcribe_leaves_shared_state_alone() {
        let (pipeline, _client, store) = make_pipeline(vec![Ok("transcript".to_string())]);

        let transcript = pipeline.transcribe(&["aW1n".to_string()]).await.unwrap();
        assert_eq!(transcript, "transcript");
        assert_eq!(store.snapshot(), Default::default());
    }

    #[actix_web::test]
    async fn single_stage_failure_does_not_broadcast() {
        let (pipeline, _client, store) =
            make_pipeline(vec![Err(InferenceError::Request("boom".to_string()))]);
        let (addr, _received) = spawn_collector();
        store.broadcaster().subscribe(addr.clone().recipient());

        let err = pipeline.transcribe(&["aW1n".to_string()]).await.unwrap_err();
        assert!(matches!(err, AppError::Service(_)));
        assert_eq!(store.snapshot(), Default::default());
        assert_eq!(addr.send(Drained).await.unwrap(), 0);
    }

    #[actix_web::test]
    async fn classify_theme_rejects_empty_transcript() {
        let (pipeline, client, _store) = make_pipeline(vec![]);

        let err = pipeline.classify_theme("   ").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(client.calls.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn classify_theme_returns_model_text_verbatim() {
        let reply = "Science in human activities and occupation and objective: explain energy conversion";
        let (pipeline, _client, _store) = make_pipeline(vec![Ok(reply.to_string())]);

        let analyzed = pipeline
            .classify_theme("Photosynthesis converts light into chemical energy")
            .await
            .unwrap();
        assert_eq!(analyzed, reply);
    }
}
