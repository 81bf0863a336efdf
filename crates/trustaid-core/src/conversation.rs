//! Conversation controller.
//!
//! A submission is split in two: [`Conversation::begin`] validates the input
//! and applies the optimistic state (user entry, busy flag), and
//! [`Conversation::complete`] folds the request outcome back into the
//! transcript. Frontends run the request in between however they like;
//! [`Conversation::submit`] does all three in one call.

use std::sync::Arc;

use crate::error::ChatResult;
use crate::payload::Payload;
use crate::pipeline::Pipeline;
use crate::responder::Responder;
use crate::settings::Settings;
use crate::state::{ChatEntry, EntryAction};

/// Transcript text for any failed request.
pub const ERROR_REPLY: &str = "Sorry, something went wrong. Please try again.";
/// Error slot text when the failure carried no description.
pub const GENERIC_FAILURE: &str = "Request failed";
pub const FOLLOW_UP_TEXT: &str = "Would you like me to show the steps?";
pub const SHOW_STEPS_PROMPT: &str = "Show me the steps";

/// Where a query is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Live,
    Demo,
}

/// A validated query waiting to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub query: String,
    pub pipeline: Pipeline,
    pub source: Source,
}

/// The live and demo responders, picked per request by the demo-mode setting.
#[derive(Clone)]
pub struct Responders {
    live: Arc<dyn Responder>,
    demo: Arc<dyn Responder>,
}

impl Responders {
    pub fn new(live: Arc<dyn Responder>, demo: Arc<dyn Responder>) -> Self {
        Self { live, demo }
    }

    pub fn for_source(&self, source: Source) -> Arc<dyn Responder> {
        match source {
            Source::Live => Arc::clone(&self.live),
            Source::Demo => Arc::clone(&self.demo),
        }
    }

    pub fn set_live(&mut self, live: Arc<dyn Responder>) {
        self.live = live;
    }
}

/// Owns the transcript and the single in-flight request.
#[derive(Debug, Default)]
pub struct Conversation {
    transcript: Vec<ChatEntry>,
    busy: bool,
    error: Option<String>,
    /// Text the user is currently composing.
    pub input: String,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the transcript with a system greeting.
    pub fn with_greeting(greeting: &str) -> Self {
        Self {
            transcript: vec![ChatEntry::system(greeting)],
            ..Self::default()
        }
    }

    pub fn transcript(&self) -> &[ChatEntry] {
        &self.transcript
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Description of the most recent failure, cleared on the next submit.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Validate and record a submission.
    ///
    /// Uses `text` if given, otherwise the input buffer. Returns `None` (and
    /// changes nothing) when busy or when the effective text is blank.
    pub fn begin(&mut self, text: Option<&str>, settings: &Settings) -> Option<Dispatch> {
        if self.busy {
            tracing::debug!("submit ignored: request already in flight");
            return None;
        }

        let query = text.unwrap_or(&self.input).trim().to_string();
        if query.is_empty() {
            return None;
        }

        self.error = None;
        self.input.clear();
        self.transcript.push(ChatEntry::user(query.clone()));
        self.busy = true;

        let source = if settings.demo_mode {
            Source::Demo
        } else {
            Source::Live
        };
        tracing::info!(?source, pipeline = settings.pipeline.as_str(), "submitting query");

        Some(Dispatch {
            query,
            pipeline: settings.pipeline,
            source,
        })
    }

    /// Fold a request outcome into the transcript and return to idle.
    pub fn complete(&mut self, dispatch: &Dispatch, outcome: ChatResult<Payload>) {
        match outcome {
            Ok(payload) => {
                let follow_up = follow_up(&payload, dispatch.source);
                self.transcript.push(ChatEntry::from_payload(payload));
                if let Some(entry) = follow_up {
                    self.transcript.push(entry);
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "chat request failed");
                let message = err.to_string();
                self.error = Some(if message.trim().is_empty() {
                    GENERIC_FAILURE.to_string()
                } else {
                    message
                });
                self.transcript.push(ChatEntry::assistant(ERROR_REPLY));
            }
        }
        self.busy = false;
    }

    /// Submit and await the answer in one step.
    pub async fn submit(&mut self, text: Option<&str>, settings: &Settings, responders: &Responders) {
        let Some(dispatch) = self.begin(text, settings) else {
            return;
        };
        let responder = responders.for_source(dispatch.source);
        let outcome = responder.respond(&dispatch.query, dispatch.pipeline).await;
        self.complete(&dispatch, outcome);
    }

    /// The follow-up prompt offered by the latest entry, if any.
    pub fn pending_follow_up(&self) -> Option<&str> {
        match self.transcript.last()?.action.as_ref()? {
            EntryAction::ShowSteps { prompt } => Some(prompt.as_str()),
        }
    }
}

/// The synthetic entry appended after an answer, if that answer warrants one.
///
/// Only navigator answers from the live backend offer to show their steps.
pub fn follow_up(payload: &Payload, source: Source) -> Option<ChatEntry> {
    if source != Source::Live || !payload.is_navigator() {
        return None;
    }
    Some(
        ChatEntry::assistant(FOLLOW_UP_TEXT).with_action(EntryAction::ShowSteps {
            prompt: SHOW_STEPS_PROMPT.to_string(),
        }),
    )
}
