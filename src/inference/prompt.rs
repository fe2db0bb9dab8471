//! Prompt builders for the three pipeline conversations.
//!
//! Three kinds of conversations are constructed here:
//! * **Transcription** — one system instruction plus a single user turn
//!   embedding the instruction text and every image, in input order.
//! * **Elaboration** — the *entire* transcription exchange, then a new system
//!   instruction and a user turn carrying the first-stage transcript. The
//!   model does measurably better when transcription and reasoning are
//!   decoupled into separate turns, and the second call keeps the full first
//!   exchange for context continuity.
//! * **Theme classification** — one system instruction enumerating the full
//!   curriculum taxonomy, plus the transcript as the user turn.

use crate::inference::message::{ChatMessage, ContentPart};
use crate::taxonomy;

const TRANSCRIBE_SYSTEM: &str = "You are a helpful assistant who will transcribe the texts in the images I send you and return a coherent transcript.";

const TRANSCRIBE_USER: &str =
    "Transcribe the texts in the images I send you and return a coherent transcript";

const ELABORATE_SYSTEM: &str = "You are a helpful teacher who will provide the optimal solution to the code and an explanation for that code for this challenge with NO usage example. Your answer should start with the data structure or technique used to solve this problem";

/// Build the transcription conversation for a batch of base64 images.
///
/// Each image becomes a `data:image/jpeg;base64,...` URL part tagged with the
/// configured detail level, appended after the instruction text in input
/// order.
pub fn transcription_messages(images: &[String], image_detail: &str) -> Vec<ChatMessage> {
    let mut parts = Vec::with_capacity(images.len() + 1);
    parts.push(ContentPart::text(TRANSCRIBE_USER));
    for image in images {
        parts.push(ContentPart::image_url(
            format!("data:image/jpeg;base64,{}", image),
            image_detail,
        ));
    }

    vec![
        ChatMessage::system(TRANSCRIBE_SYSTEM),
        ChatMessage::user_parts(parts),
    ]
}

/// Build the follow-up conversation: the full first exchange, a new system
/// instruction, and the transcript as the user turn.
pub fn elaboration_messages(first_exchange: &[ChatMessage], transcript: &str) -> Vec<ChatMessage> {
    let mut messages = first_exchange.to_vec();
    messages.push(ChatMessage::system(ELABORATE_SYSTEM));
    messages.push(ChatMessage::user(transcript));
    messages
}

/// Build the single-call theme-classification conversation.
///
/// The system instruction enumerates the whole taxonomy and constrains the
/// answer to exactly the theme and objective, nothing else.
pub fn theme_messages(transcript: &str) -> Vec<ChatMessage> {
    let system = format!(
        "You are a helpful teacher who will classify the transcript I send you \
         against the following curriculum themes:\n\n{}\n\
         Answer with exactly the theme and objective and nothing else.",
        taxonomy::numbered_theme_list()
    );

    vec![ChatMessage::system(system), ChatMessage::user(transcript)]
}
