use std::sync::Arc;

use anyhow::Result;
use ratatui::layout::Rect;
use tokio::task::JoinHandle;
use trustaid_core::{
    BackendClient, ChatError, ChatResult, Conversation, DemoResponder, Dispatch, Health, Payload,
    PrefStore, Responders, Settings,
};

pub const GREETING: &str =
    "Ask about government services (\"what to do when someone dies\") or spending data (\"top vendor payments this quarter\").";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Last known backend status from `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendStatus {
    Unchecked,
    Checking,
    Up { demo: bool },
    Down(String),
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Conversation (transcript, busy flag, error slot, input buffer)
    pub conversation: Conversation,
    pub query_cursor: usize, // cursor position in conversation.input, in chars
    pub query_task: Option<(Dispatch, JoinHandle<ChatResult<Payload>>)>,

    // Chat view
    pub chat_scroll: u16,
    pub follow_bottom: bool,
    pub chat_height: u16, // inner height of the chat pane, updated during render
    pub chat_area: Option<Rect>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Settings
    pub settings: Settings,
    pub prefs: PrefStore,
    pub responders: Responders,
    /// Transient notice shown in the footer (e.g. a settings write failure).
    pub notice: Option<String>,

    // API base input popup
    pub show_api_base_input: bool,
    pub api_base_input: String,
    pub api_base_cursor: usize,

    // Backend health
    pub backend_status: BackendStatus,
    pub health_task: Option<JoinHandle<ChatResult<Health>>>,
}

impl App {
    pub fn new(settings: Settings, prefs: PrefStore) -> Self {
        let responders = Responders::new(
            Arc::new(BackendClient::new(&settings.api_base)),
            Arc::new(DemoResponder::default()),
        );

        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            conversation: Conversation::with_greeting(GREETING),
            query_cursor: 0,
            query_task: None,
            chat_scroll: 0,
            follow_bottom: true,
            chat_height: 0,
            chat_area: None,
            animation_frame: 0,
            settings,
            prefs,
            responders,
            notice: None,
            show_api_base_input: false,
            api_base_input: String::new(),
            api_base_cursor: 0,
            backend_status: BackendStatus::Unchecked,
            health_task: None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.conversation.is_busy()
    }

    /// Submit `text`, or the input buffer when `None`, on a background task.
    pub fn submit(&mut self, text: Option<&str>) {
        let Some(dispatch) = self.conversation.begin(text, &self.settings) else {
            return;
        };
        if text.is_none() {
            self.query_cursor = 0;
        }
        self.follow_bottom = true;

        let responder = self.responders.for_source(dispatch.source);
        let query = dispatch.query.clone();
        let pipeline = dispatch.pipeline;
        let handle = tokio::spawn(async move { responder.respond(&query, pipeline).await });
        self.query_task = Some((dispatch, handle));
    }

    /// Send the follow-up offered by the latest answer.
    pub fn accept_follow_up(&mut self) {
        if let Some(prompt) = self.conversation.pending_follow_up().map(str::to_string) {
            self.submit(Some(&prompt));
        }
    }

    /// Collect finished background work. Called once per event-loop turn.
    pub async fn poll_tasks(&mut self) {
        if self.query_task.as_ref().is_some_and(|(_, h)| h.is_finished()) {
            if let Some((dispatch, handle)) = self.query_task.take() {
                let outcome = match handle.await {
                    Ok(outcome) => outcome,
                    Err(e) => Err(ChatError::Task(e.to_string())),
                };
                self.conversation.complete(&dispatch, outcome);
                self.follow_bottom = true;
            }
        }

        if self.health_task.as_ref().is_some_and(|h| h.is_finished()) {
            if let Some(handle) = self.health_task.take() {
                self.backend_status = match handle.await {
                    Ok(Ok(health)) if health.ok => BackendStatus::Up { demo: health.demo },
                    Ok(Ok(_)) => BackendStatus::Down("backend reports not ok".to_string()),
                    Ok(Err(e)) => BackendStatus::Down(e.to_string()),
                    Err(e) => BackendStatus::Down(e.to_string()),
                };
                tracing::info!(status = ?self.backend_status, "health check finished");
            }
        }
    }

    pub fn check_health(&mut self) {
        if self.health_task.is_some() {
            return;
        }
        let client = BackendClient::new(&self.settings.api_base);
        self.backend_status = BackendStatus::Checking;
        self.health_task = Some(tokio::spawn(async move { client.health().await }));
    }

    pub fn toggle_demo_mode(&mut self) {
        let demo_mode = !self.settings.demo_mode;
        let result = self.settings.set_demo_mode(&mut self.prefs, demo_mode);
        self.report_save(result);
    }

    pub fn cycle_pipeline(&mut self) {
        let pipeline = self.settings.pipeline.next();
        let result = self.settings.set_pipeline(&mut self.prefs, pipeline);
        self.report_save(result);
    }

    pub fn open_api_base_input(&mut self) {
        self.api_base_input = self.settings.api_base.clone();
        self.api_base_cursor = self.api_base_input.chars().count();
        self.show_api_base_input = true;
    }

    pub fn close_api_base_input(&mut self) {
        self.show_api_base_input = false;
        self.api_base_input.clear();
        self.api_base_cursor = 0;
    }

    /// Save the API base from the popup and point the live client at it.
    pub fn apply_api_base(&mut self) {
        let input = self.api_base_input.trim().to_string();
        if !input.is_empty() {
            let result = self.settings.set_api_base(&mut self.prefs, &input);
            self.report_save(result);
            self.responders
                .set_live(Arc::new(BackendClient::new(&self.settings.api_base)));
            // A check still running targets the old URL
            if let Some(handle) = self.health_task.take() {
                handle.abort();
            }
            self.backend_status = BackendStatus::Unchecked;
        }
        self.close_api_base_input();
    }

    fn report_save(&mut self, result: Result<()>) {
        match result {
            Ok(()) => self.notice = None,
            Err(e) => {
                tracing::warn!(error = %e, "failed to save preferences");
                self.notice = Some(format!("Could not save settings: {}", e));
            }
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.follow_bottom = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.follow_bottom = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use trustaid_core::{ChatRole, Pipeline};

    fn demo_app(dir: &std::path::Path) -> App {
        let prefs = PrefStore::at(dir.join("prefs.json"));
        let settings = Settings {
            api_base: "http://127.0.0.1:9".to_string(),
            demo_mode: true,
            pipeline: Pipeline::Auto,
        };
        let mut app = App::new(settings, prefs);
        app.responders = Responders::new(
            Arc::new(BackendClient::new("http://127.0.0.1:9")),
            Arc::new(DemoResponder::new(std::time::Duration::ZERO)),
        );
        app
    }

    async fn wait_for_answer(app: &mut App) {
        while app.query_task.is_some() {
            tokio::task::yield_now().await;
            app.poll_tasks().await;
        }
    }

    #[tokio::test]
    async fn test_submit_runs_in_background() {
        let dir = tempdir().unwrap();
        let mut app = demo_app(dir.path());
        app.conversation.input = "show top vendor payments this quarter".to_string();
        app.query_cursor = app.conversation.input.chars().count();

        app.submit(None);
        assert!(app.is_busy());
        assert_eq!(app.query_cursor, 0);

        // A second submit while busy changes nothing
        app.submit(Some("again"));
        assert_eq!(app.conversation.transcript().len(), 2);

        wait_for_answer(&mut app).await;
        let entries = app.conversation.transcript();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2].role, ChatRole::Assistant);
        assert_eq!(entries[2].payload.as_ref().unwrap().kind(), "trustbot");
        assert!(!app.is_busy());
    }

    #[test]
    fn test_settings_toggles_persist() {
        let dir = tempdir().unwrap();
        let mut app = demo_app(dir.path());

        app.toggle_demo_mode();
        app.cycle_pipeline();

        let reloaded = Settings::load(&PrefStore::at(dir.path().join("prefs.json")));
        assert!(!reloaded.demo_mode);
        assert_eq!(reloaded.pipeline, Pipeline::Navigator);
        assert!(app.notice.is_none());
    }

    #[test]
    fn test_apply_api_base() {
        let dir = tempdir().unwrap();
        let mut app = demo_app(dir.path());

        app.open_api_base_input();
        assert_eq!(app.api_base_input, "http://127.0.0.1:9");
        app.api_base_input = "https://trustaid.example.org/".to_string();
        app.apply_api_base();

        assert!(!app.show_api_base_input);
        assert_eq!(app.settings.api_base, "https://trustaid.example.org");
    }

    #[tokio::test]
    async fn test_new_api_base_discards_pending_health_check() {
        let dir = tempdir().unwrap();
        let mut app = demo_app(dir.path());
        app.backend_status = BackendStatus::Checking;
        app.health_task = Some(tokio::spawn(async {
            Ok(Health {
                ok: true,
                demo: false,
            })
        }));

        app.open_api_base_input();
        app.api_base_input = "http://127.0.0.1:8001".to_string();
        app.apply_api_base();
        assert!(app.health_task.is_none());

        tokio::task::yield_now().await;
        app.poll_tasks().await;
        assert_eq!(app.backend_status, BackendStatus::Unchecked);
    }

    #[test]
    fn test_blank_api_base_is_ignored() {
        let dir = tempdir().unwrap();
        let mut app = demo_app(dir.path());

        app.open_api_base_input();
        app.api_base_input = "   ".to_string();
        app.apply_api_base();
        assert_eq!(app.settings.api_base, "http://127.0.0.1:9");
    }
}
