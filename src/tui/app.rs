use crate::core::{
    BatchEvent, CoachingOutput, CoachingSession, FileType, GeneratorConfig, ItemOutcome,
    ReportMode, ReportService, SessionEvent, SessionOutcome, StorageService, TranscriptResolver,
    export_routine, format_plan_readable, storage::FileEntry,
};
use crate::error::Result;
use crate::tui::components::{ContentViewer, FileList, InputField, ProgressBar};
use crate::tui::events::AppEvent;
use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, MouseEvent};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Home,
    NewSession,
    Processing,
    Results,
    Browser,
    Viewer,
    Settings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFilter {
    All,
    Reports,
    Plans,
    Calendars,
}

/// Typed progress protocol between the background session task and the UI.
#[derive(Debug)]
pub enum SessionMessage {
    Progress(f64),
    Status(String),
    Log(String),
    Notice(String),
    Done(Box<Result<SessionOutcome>>),
}

pub struct App {
    pub state: AppState,
    pub should_quit: bool,

    // Home screen
    pub selected_option: usize,

    // New session screen
    pub url_input: InputField,
    pub urls: Vec<String>,
    pub structured_mode: bool,
    pub export_calendar: bool,
    pub input_focus: usize,

    // Processing screen
    pub progress_bar: ProgressBar,

    // Results screen
    pub outcome: Option<SessionOutcome>,
    pub notice: Option<String>,

    // Browser screen
    pub file_list: FileList,
    pub search_input: InputField,
    pub filter: FileFilter,

    // Viewer screen
    pub content_viewer: Option<ContentViewer>,
    pub viewer_height: u16,

    // Settings screen; the credential lives here for the session only and
    // is never written to disk.
    pub api_key_input: InputField,
    pub model_input: InputField,
    pub api_base_input: InputField,
    pub settings_focus: usize,

    // Async communication
    pub session_tx: Option<mpsc::UnboundedSender<SessionMessage>>,
    pub session_rx: Option<mpsc::UnboundedReceiver<SessionMessage>>,
}

impl App {
    pub fn new() -> Self {
        let files = StorageService::list_files().unwrap_or_default();

        let mut model_input = InputField::new("Model", "gpt-4.1-mini");
        model_input.set_value(GeneratorConfig::default().model);

        Self {
            state: AppState::Home,
            should_quit: false,

            selected_option: 0,

            url_input: InputField::new("Video URL", "https://youtu.be/..."),
            urls: Vec::new(),
            structured_mode: false,
            export_calendar: false,
            input_focus: 0,

            progress_bar: ProgressBar::new(),

            outcome: None,
            notice: None,

            file_list: FileList::new(files),
            search_input: InputField::new("Search", "Filter files..."),
            filter: FileFilter::All,

            content_viewer: None,
            viewer_height: 0,

            api_key_input: InputField::masked("API Key", "credential (kept in memory only)"),
            model_input,
            api_base_input: InputField::new("API Base URL", "default backend endpoint"),
            settings_focus: 0,

            session_tx: None,
            session_rx: None,
        }
    }

    pub fn handle_event(&mut self, event: AppEvent) -> Result<()> {
        match event {
            AppEvent::Key(key) => self.handle_key(key)?,
            AppEvent::Mouse(mouse) => self.handle_mouse(mouse),
            AppEvent::Tick => self.handle_tick()?,
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        match self.state {
            AppState::Home => self.handle_home_key(key),
            AppState::NewSession => self.handle_new_session_key(key),
            AppState::Processing => self.handle_processing_key(key),
            AppState::Results => self.handle_results_key(key),
            AppState::Browser => self.handle_browser_key(key),
            AppState::Viewer => self.handle_viewer_key(key),
            AppState::Settings => self.handle_settings_key(key),
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        match self.state {
            AppState::Browser => {
                self.file_list.handle_mouse(mouse);
            }
            AppState::Viewer | AppState::Results => {
                if let Some(viewer) = &mut self.content_viewer {
                    use crossterm::event::MouseEventKind;
                    match mouse.kind {
                        MouseEventKind::ScrollUp => viewer.scroll_up(),
                        MouseEventKind::ScrollDown => viewer.scroll_down(self.viewer_height as usize),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    fn handle_home_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
            }
            KeyCode::Up => {
                if self.selected_option > 0 {
                    self.selected_option -= 1;
                }
            }
            KeyCode::Down => {
                if self.selected_option < 3 {
                    self.selected_option += 1;
                }
            }
            KeyCode::Char('1') => self.selected_option = 0,
            KeyCode::Char('2') => self.selected_option = 1,
            KeyCode::Char('3') => self.selected_option = 2,
            KeyCode::Char('4') => self.selected_option = 3,
            KeyCode::Enter => match self.selected_option {
                0 => {
                    self.state = AppState::NewSession;
                    self.url_input.focused = true;
                    self.input_focus = 0;
                    self.notice = None;
                }
                1 => {
                    self.filter = FileFilter::Reports;
                    self.refresh_file_list()?;
                    self.state = AppState::Browser;
                }
                2 => {
                    self.filter = FileFilter::Plans;
                    self.refresh_file_list()?;
                    self.state = AppState::Browser;
                }
                3 => {
                    self.state = AppState::Settings;
                    self.settings_focus = 0;
                    self.api_key_input.focused = true;
                    self.model_input.focused = false;
                    self.api_base_input.focused = false;
                }
                _ => {}
            },
            _ => {}
        }
        Ok(())
    }

    fn handle_new_session_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                self.state = AppState::Home;
            }
            KeyCode::Tab => {
                self.cycle_input_focus();
            }
            KeyCode::Enter => {
                if self.input_focus == 0 && self.url_input.is_valid() {
                    let url = self.url_input.take();
                    self.urls.push(url.trim().to_string());
                } else {
                    self.start_session();
                }
            }
            KeyCode::Backspace if self.input_focus == 0 && self.url_input.value.is_empty() => {
                self.urls.pop();
            }
            KeyCode::Char(' ') if self.input_focus == 1 => {
                self.structured_mode = !self.structured_mode;
            }
            KeyCode::Char(' ') if self.input_focus == 2 => {
                self.export_calendar = !self.export_calendar;
            }
            _ => {
                if self.input_focus == 0 {
                    self.url_input.handle_key(key);
                }
            }
        }
        Ok(())
    }

    fn handle_processing_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.code == KeyCode::Esc {
            // Back to the form. A run already in flight is not interruptible;
            // its result still arrives over the channel when it completes.
            self.state = AppState::NewSession;
            self.progress_bar.reset();
        }
        Ok(())
    }

    fn handle_results_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                self.state = AppState::Home;
                self.urls.clear();
            }
            KeyCode::Char('s') => self.save_result(),
            KeyCode::Char('c') => self.export_calendar_result(),
            _ => {
                if let Some(viewer) = &mut self.content_viewer {
                    viewer.handle_key(key, self.viewer_height as usize);
                }
            }
        }
        Ok(())
    }

    fn handle_browser_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.search_input.focused {
            if key.code == KeyCode::Esc {
                self.search_input.focused = false;
                self.search_input.clear();
                self.apply_filter();
            } else if key.code == KeyCode::Enter {
                self.search_input.focused = false;
            } else {
                self.search_input.handle_key(key);
                self.apply_filter();
            }
            return Ok(());
        }

        match key.code {
            KeyCode::Esc => {
                self.state = AppState::Home;
            }
            KeyCode::Enter => {
                if let Some(file) = self.file_list.get_selected() {
                    self.open_file(file.clone())?;
                }
            }
            KeyCode::Delete => {
                self.delete_selected_files()?;
            }
            KeyCode::Char('/') => {
                self.search_input.focused = true;
            }
            KeyCode::Char('1') => {
                self.filter = FileFilter::All;
                self.apply_filter();
            }
            KeyCode::Char('2') => {
                self.filter = FileFilter::Reports;
                self.apply_filter();
            }
            KeyCode::Char('3') => {
                self.filter = FileFilter::Plans;
                self.apply_filter();
            }
            KeyCode::Char('4') => {
                self.filter = FileFilter::Calendars;
                self.apply_filter();
            }
            _ => {
                self.file_list.handle_key(key);
            }
        }
        Ok(())
    }

    fn handle_viewer_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                self.state = AppState::Browser;
            }
            _ => {
                if let Some(viewer) = &mut self.content_viewer {
                    viewer.handle_key(key, self.viewer_height as usize);
                }
            }
        }
        Ok(())
    }

    fn handle_settings_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                self.api_key_input.focused = false;
                self.model_input.focused = false;
                self.api_base_input.focused = false;
                self.state = AppState::Home;
            }
            KeyCode::Tab => {
                self.settings_focus = (self.settings_focus + 1) % 3;
                self.api_key_input.focused = self.settings_focus == 0;
                self.model_input.focused = self.settings_focus == 1;
                self.api_base_input.focused = self.settings_focus == 2;
            }
            _ => {
                match self.settings_focus {
                    0 => self.api_key_input.handle_key(key),
                    1 => self.model_input.handle_key(key),
                    _ => self.api_base_input.handle_key(key),
                };
            }
        }
        Ok(())
    }

    fn handle_tick(&mut self) -> Result<()> {
        let mut messages = Vec::new();
        if let Some(rx) = &mut self.session_rx {
            while let Ok(message) = rx.try_recv() {
                messages.push(message);
            }
        }

        for message in messages {
            match message {
                SessionMessage::Progress(progress) => self.progress_bar.set_progress(progress),
                SessionMessage::Status(status) => self.progress_bar.set_message(status),
                SessionMessage::Log(log) => self.progress_bar.add_log(log),
                SessionMessage::Notice(notice) => self.notice = Some(notice),
                SessionMessage::Done(result) => match *result {
                    Ok(outcome) => self.show_results(outcome),
                    Err(e) => {
                        self.progress_bar.set_message("Failed".to_string());
                        for line in e.to_string().lines().take(4) {
                            self.progress_bar.add_log(line.to_string());
                        }
                    }
                },
            }
        }
        Ok(())
    }

    fn cycle_input_focus(&mut self) {
        self.input_focus = (self.input_focus + 1) % 3;
        self.url_input.focused = self.input_focus == 0;
    }

    fn start_session(&mut self) {
        let mut urls = self.urls.clone();
        if self.url_input.is_valid() {
            urls.push(self.url_input.take().trim().to_string());
        }
        if urls.is_empty() {
            self.notice = Some("Add at least one video URL first".to_string());
            return;
        }
        let Some(tx) = self.session_tx.clone() else {
            return;
        };

        self.urls = urls.clone();
        let mode = if self.structured_mode || self.export_calendar {
            ReportMode::Structured
        } else {
            ReportMode::Narrative
        };
        let config = GeneratorConfig {
            api_key: non_empty(&self.api_key_input.value),
            api_base: non_empty(&self.api_base_input.value),
            model: non_empty(&self.model_input.value)
                .unwrap_or_else(|| GeneratorConfig::default().model),
        };

        self.outcome = None;
        self.notice = None;
        self.progress_bar.reset();
        self.progress_bar.set_message("Starting...".to_string());
        self.state = AppState::Processing;

        tokio::spawn(run_session_task(urls, mode, config, tx));
    }

    fn show_results(&mut self, outcome: SessionOutcome) {
        let mut content = String::new();
        for item in &outcome.outcomes {
            if let ItemOutcome::Skipped { url, reason } = item {
                content.push_str(&format!("⚠ skipped {url}: {}\n", reason.describe()));
            }
        }
        if !content.is_empty() {
            content.push('\n');
        }
        match &outcome.output {
            CoachingOutput::Narrative(text) => content.push_str(text),
            CoachingOutput::Plan(plan) => content.push_str(&format_plan_readable(plan)),
        }

        self.content_viewer = Some(ContentViewer::new(content, "Coaching Result".to_string()));
        self.outcome = Some(outcome);
        self.state = AppState::Results;
    }

    fn save_result(&mut self) {
        let Some(outcome) = &self.outcome else {
            return;
        };
        let Some(tx) = self.session_tx.clone() else {
            return;
        };
        let output = outcome.output.clone();

        tokio::spawn(async move {
            let saved = match &output {
                CoachingOutput::Narrative(text) => StorageService::save_report(text).await,
                CoachingOutput::Plan(plan) => StorageService::save_plan(plan).await,
            };
            let _ = tx.send(SessionMessage::Notice(match saved {
                Ok(path) => format!("Saved to {}", path.display()),
                Err(e) => format!("Save failed: {e}"),
            }));
        });
    }

    fn export_calendar_result(&mut self) {
        let Some(outcome) = &self.outcome else {
            return;
        };
        let CoachingOutput::Plan(plan) = &outcome.output else {
            self.notice = Some("Calendar export needs a structured plan run".to_string());
            return;
        };
        let Some(tx) = self.session_tx.clone() else {
            return;
        };
        let routine = plan.routine.clone();

        tokio::spawn(async move {
            let ics = export_routine(&routine, Local::now());
            let _ = tx.send(SessionMessage::Notice(
                match StorageService::save_calendar(&ics).await {
                    Ok(path) => format!("Calendar saved to {}", path.display()),
                    Err(e) => format!("Calendar export failed: {e}"),
                },
            ));
        });
    }

    fn refresh_file_list(&mut self) -> Result<()> {
        self.apply_filter();
        Ok(())
    }

    fn apply_filter(&mut self) {
        let search = self.search_input.value.to_lowercase();
        let files: Vec<FileEntry> = StorageService::list_files()
            .unwrap_or_default()
            .into_iter()
            .filter(|file| {
                let matches_filter = match self.filter {
                    FileFilter::All => true,
                    FileFilter::Reports => file.file_type == FileType::Report,
                    FileFilter::Plans => file.file_type == FileType::Plan,
                    FileFilter::Calendars => file.file_type == FileType::Calendar,
                };
                let matches_search =
                    search.is_empty() || file.name.to_lowercase().contains(&search);
                matches_filter && matches_search
            })
            .collect();

        self.file_list.update_items(files);
    }

    fn open_file(&mut self, file: FileEntry) -> Result<()> {
        let content = std::fs::read_to_string(&file.path)?;
        self.content_viewer = Some(ContentViewer::new(content, file.name.clone()));
        self.state = AppState::Viewer;
        Ok(())
    }

    fn delete_selected_files(&mut self) -> Result<()> {
        for file in self.file_list.get_selected_items() {
            StorageService::delete_file(&file.path)?;
        }
        self.apply_filter();
        Ok(())
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// The whole pipeline for one run, driven off the UI thread. Progress flows
/// back over the channel; the terminal value arrives as a single `Done`.
async fn run_session_task(
    urls: Vec<String>,
    mode: ReportMode,
    config: GeneratorConfig,
    tx: mpsc::UnboundedSender<SessionMessage>,
) {
    let resolver = match TranscriptResolver::new() {
        Ok(resolver) => resolver,
        Err(e) => {
            let _ = tx.send(SessionMessage::Done(Box::new(Err(e))));
            return;
        }
    };
    let session = CoachingSession::new(resolver, ReportService::new(config));

    let result = session
        .run(&urls, mode, |event| match event {
            SessionEvent::Batch(BatchEvent::Started { index, total, url }) => {
                let fraction = (index - 1) as f64 / total.max(1) as f64;
                let _ = tx.send(SessionMessage::Progress(fraction * 0.8));
                let _ = tx.send(SessionMessage::Status(format!(
                    "Resolving video {index}/{total}..."
                )));
                let _ = tx.send(SessionMessage::Log(format!("Processing {url}")));
            }
            SessionEvent::Batch(BatchEvent::Resolved {
                video_id,
                language_code,
                tier,
                ..
            }) => {
                let _ = tx.send(SessionMessage::Log(format!(
                    "Resolved {video_id} ({language_code}, {} captions)",
                    tier.label()
                )));
            }
            SessionEvent::Batch(BatchEvent::Skipped { url, reason, .. }) => {
                let _ = tx.send(SessionMessage::Log(format!(
                    "Skipped {url}: {}",
                    reason.describe()
                )));
            }
            SessionEvent::Generating { resolved_count } => {
                let _ = tx.send(SessionMessage::Progress(0.85));
                let _ = tx.send(SessionMessage::Status(format!(
                    "Generating coaching output from {resolved_count} transcript(s)..."
                )));
            }
        })
        .await;

    let _ = tx.send(SessionMessage::Progress(1.0));
    let _ = tx.send(SessionMessage::Done(Box::new(result)));
}
