pub mod client;
pub mod conversation;
pub mod demo;
pub mod error;
pub mod format;
pub mod logging;
pub mod payload;
pub mod pipeline;
pub mod prefs;
pub mod responder;
pub mod settings;
pub mod state;

// Re-export main types for convenience
pub use client::{BackendClient, Health};
pub use conversation::{Conversation, Dispatch, Responders, Source};
pub use demo::DemoResponder;
pub use error::{ChatError, ChatResult};
pub use payload::{
    Chart, ChartType, Confidence, Dataset, Evidence, NavigatorPayload, Payload, Step, Table,
    TrustbotPayload,
};
pub use pipeline::Pipeline;
pub use prefs::PrefStore;
pub use responder::Responder;
pub use settings::Settings;
pub use state::{ChatEntry, ChatRole, EntryAction};
