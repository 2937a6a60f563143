use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::config::AppSettings;
use crate::engine::{context, deadline, Commit, CommitBoundary, ContextAction, InteractionController};
use crate::io::storage::{FileStorage, KeyValueStorage, MemoryStorage};
use crate::io::{StorageProjectStore, TodoStore};
use crate::model::{Project, TimelineWindow, TodoFilter, TodoList, WindowSpan};
use crate::ui;

/// Which page the central panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Timeline,
    Todos,
}

/// Palette popup opened by right-clicking a stream.
#[derive(Debug, Clone)]
pub struct ColorMenu {
    pub stream_id: Uuid,
    pub at: DateTime<Utc>,
    pub pos: egui::Pos2,
}

#[derive(Debug, Clone)]
pub struct DeadlineEditor {
    pub deadline_id: Uuid,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct StreamEditor {
    pub stream_id: Uuid,
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct ProjectDraft {
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub progress: i64,
    pub notes: String,
}

/// A todo or subtask whose text is being edited inline.
#[derive(Debug, Clone)]
pub struct TodoEdit {
    pub todo_id: Uuid,
    pub subtask_id: Option<Uuid>,
    pub text: String,
}

/// Main application state.
pub struct TimelineApp {
    pub project: Project,
    pub boundary: CommitBoundary,
    pub controller: InteractionController,
    pub todos: TodoList,
    todo_store: TodoStore<Box<dyn KeyValueStorage>>,

    pub settings: AppSettings,
    settings_path: PathBuf,
    pub data_dir: Option<PathBuf>,

    pub view: View,
    pub status_message: String,

    // Popups and dialogs
    pub color_menu: Option<ColorMenu>,
    pub deadline_editor: Option<DeadlineEditor>,
    pub stream_editor: Option<StreamEditor>,
    pub project_draft: Option<ProjectDraft>,
    pub show_history: bool,
    pub show_about: bool,

    // Todo page
    pub todo_filter: TodoFilter,
    pub new_todo_text: String,
    pub subtask_inputs: HashMap<Uuid, String>,
    pub todo_edit: Option<TodoEdit>,
}

impl TimelineApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        // Register Phosphor icon font as a fallback so icons render inline with text
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);
        ui::theme::apply_theme(&cc.egui_ctx);

        let settings_path = AppSettings::default_path();
        let settings = AppSettings::load(&settings_path);
        let (storage, data_dir) = open_storage(&settings);

        let now = Utc::now();
        let mut boundary =
            CommitBoundary::new(Box::new(StorageProjectStore::new(storage.clone_boxed())));
        let project = boundary.load(now);
        let todo_store = TodoStore::new(storage.clone_boxed());
        let todos = todo_store.load(now);
        tracing::info!(
            streams = project.streams.len(),
            todos = todos.todos.len(),
            "loaded"
        );

        Self {
            project,
            boundary,
            controller: InteractionController::new(),
            todos,
            todo_store,
            settings,
            settings_path,
            data_dir,
            view: View::Timeline,
            status_message: "Ready".to_string(),
            color_menu: None,
            deadline_editor: None,
            stream_editor: None,
            project_draft: None,
            show_history: false,
            show_about: false,
            todo_filter: TodoFilter::default(),
            new_todo_text: String::new(),
            subtask_inputs: HashMap::new(),
            todo_edit: None,
        }
    }

    /// The visible window, recomputed from the clock on every call.
    pub fn window(&self) -> TimelineWindow {
        TimelineWindow::around(Utc::now(), self.settings.window_span)
    }

    pub fn set_window_span(&mut self, span: WindowSpan) {
        if self.settings.window_span == span {
            return;
        }
        self.settings.window_span = span;
        if let Err(e) = self.settings.save(&self.settings_path) {
            tracing::warn!(error = %e, "failed to save settings");
        }
        self.status_message = format!("Showing {}", span.label());
    }

    // --- Timeline edits ---

    pub fn apply_commit(&mut self, commit: Commit) {
        match self.boundary.commit(&mut self.project, commit) {
            Ok(true) => {
                self.status_message = match commit {
                    Commit::Reschedule { stream_id, .. } => self
                        .project
                        .stream(stream_id)
                        .map(|s| {
                            format!(
                                "Updated '{}' ({} → {})",
                                s.label,
                                s.start_date.format("%Y-%m-%d"),
                                s.end_date.format("%Y-%m-%d")
                            )
                        })
                        .unwrap_or_else(|| "Timeline updated".to_string()),
                    Commit::Reorder { .. } => "Streams reordered".to_string(),
                };
            }
            Ok(false) => {}
            Err(e) => self.status_message = format!("Save failed: {} (changes kept)", e),
        }
    }

    /// Persist after a direct edit, reporting the outcome in the status bar.
    fn persist(&mut self, done: impl Into<String>) {
        match self.boundary.persist(&self.project) {
            Ok(()) => self.status_message = done.into(),
            Err(e) => self.status_message = format!("Save failed: {} (changes kept)", e),
        }
    }

    pub fn handle_context_action(&mut self, action: ContextAction, pos: egui::Pos2) {
        match action {
            ContextAction::CreateStream { lane, at } => {
                let id = context::create_stream_at(&mut self.project, at, lane);
                let label = self
                    .project
                    .stream(id)
                    .map(|s| s.label.clone())
                    .unwrap_or_default();
                self.persist(format!("Added '{}'", label));
            }
            ContextAction::ColorMenu { stream_id, at } => {
                self.color_menu = Some(ColorMenu { stream_id, at, pos });
            }
            ContextAction::None => {}
        }
    }

    pub fn set_stream_color(&mut self, stream_id: Uuid, color: usize) {
        if context::set_stream_color(&mut self.project, stream_id, color) {
            self.persist("Color changed");
        }
    }

    pub fn add_deadline(&mut self, stream_id: Uuid, at: DateTime<Utc>) {
        if let Some(id) = deadline::add_deadline(&mut self.project, stream_id, at) {
            self.persist("Deadline added");
            self.open_deadline_editor(id);
        }
    }

    pub fn open_deadline_editor(&mut self, deadline_id: Uuid) {
        let text = self
            .project
            .streams
            .iter()
            .find_map(|s| s.deadline(deadline_id))
            .map(|d| d.comment.clone());
        if let Some(text) = text {
            self.deadline_editor = Some(DeadlineEditor { deadline_id, text });
        }
    }

    pub fn save_deadline_comment(&mut self, deadline_id: Uuid, text: &str) {
        if deadline::edit_comment(&mut self.project, deadline_id, text) {
            self.persist("Deadline updated");
        }
    }

    pub fn remove_deadline(&mut self, deadline_id: Uuid) {
        if deadline::remove_deadline(&mut self.project, deadline_id) {
            self.persist("Deadline removed");
        }
    }

    pub fn open_stream_editor(&mut self, stream_id: Uuid) {
        if let Some(s) = self.project.stream(stream_id) {
            self.stream_editor = Some(StreamEditor {
                stream_id,
                label: s.label.clone(),
                start: s.start_date.date_naive(),
                end: s.end_date.date_naive(),
            });
        }
    }

    pub fn save_stream_editor(&mut self, editor: &StreamEditor) {
        let Some(stream) = self.project.stream(editor.stream_id) else {
            return;
        };
        // Dates come from day pickers; keep each bound's time of day.
        let start = editor.start.and_time(stream.start_date.time()).and_utc();
        let end = editor.end.and_time(stream.end_date.time()).and_utc();
        context::rename_stream(&mut self.project, editor.stream_id, &editor.label);
        context::reschedule_stream(&mut self.project, editor.stream_id, start, end);
        self.persist("Stream updated");
    }

    pub fn delete_stream(&mut self, stream_id: Uuid) {
        if let Some(stream) = self.project.remove_stream(stream_id) {
            self.persist(format!("Deleted '{}'", stream.label));
        }
    }

    pub fn open_project_dialog(&mut self) {
        let p = &self.project;
        self.project_draft = Some(ProjectDraft {
            name: p.name.clone(),
            start: p.start_date.date_naive(),
            end: p.end_date.date_naive(),
            progress: p.progress as i64,
            notes: p.notes.clone(),
        });
    }

    pub fn save_project_draft(&mut self, draft: &ProjectDraft) {
        let name = draft.name.trim();
        if !name.is_empty() {
            self.project.name = name.to_string();
        }
        let start = draft.start.and_time(chrono::NaiveTime::MIN).and_utc();
        let end = draft.end.and_time(chrono::NaiveTime::MIN).and_utc();
        self.project.start_date = start;
        self.project.end_date = end.max(start);
        self.project.set_progress(draft.progress);
        self.project.notes = draft.notes.clone();
        self.persist("Project updated");
    }

    /// Save now, retrying any write that failed earlier.
    pub fn save(&mut self) {
        self.persist("Saved");
        if let Err(e) = self.todo_store.save(&self.todos) {
            self.status_message = format!("Saving todos failed: {}", e);
        }
    }

    // --- Import / export ---

    pub fn export_project(&mut self) {
        let default_name = format!("{}.json", self.project.name);
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Project", &["json"])
            .set_file_name(&default_name)
            .save_file()
        {
            match crate::io::exchange::export_project(&self.project, &path) {
                Ok(()) => self.status_message = "Project exported".to_string(),
                Err(e) => self.status_message = format!("Export failed: {}", e),
            }
        }
    }

    pub fn import_project(&mut self) {
        let confirm = rfd::MessageDialog::new()
            .set_title("Import Project")
            .set_description("This will replace the current project. Continue?")
            .set_buttons(rfd::MessageButtons::YesNo)
            .show();
        if confirm != rfd::MessageDialogResult::Yes {
            return;
        }
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Project", &["json"])
            .pick_file()
        {
            match crate::io::exchange::import_project(&path, Utc::now()) {
                Ok(project) => {
                    self.project = project;
                    self.color_menu = None;
                    self.stream_editor = None;
                    self.deadline_editor = None;
                    self.persist(format!("Imported '{}'", self.project.name));
                }
                Err(e) => self.status_message = format!("Import failed: {}", e),
            }
        }
    }

    pub fn export_csv(&mut self) {
        if self.project.streams.is_empty() {
            self.status_message = "Nothing to export, the project has no streams".to_string();
            return;
        }
        let default_name = format!("{}.csv", self.project.name);
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .set_file_name(&default_name)
            .save_file()
        {
            match crate::io::csv_export::export_streams_csv(&self.project.streams, &path) {
                Ok(count) => self.status_message = format!("Exported {} streams to CSV", count),
                Err(e) => self.status_message = format!("CSV export failed: {}", e),
            }
        }
    }

    pub fn export_todos(&mut self) {
        let default_name = format!("todos-{}.json", Utc::now().format("%Y-%m-%d"));
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Todos", &["json"])
            .set_file_name(&default_name)
            .save_file()
        {
            match crate::io::exchange::export_todos(&self.todos, &path) {
                Ok(count) => self.status_message = format!("Exported {} todos", count),
                Err(e) => self.status_message = format!("Export failed: {}", e),
            }
        }
    }

    pub fn import_todos(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Todos", &["json"])
            .pick_file()
        else {
            return;
        };
        match crate::io::exchange::import_todos(&path, Utc::now()) {
            Ok(items) => {
                let confirm = rfd::MessageDialog::new()
                    .set_title("Import Todos")
                    .set_description(format!(
                        "Import {} todos and replace the current list?",
                        items.len()
                    ))
                    .set_buttons(rfd::MessageButtons::YesNo)
                    .show();
                if confirm == rfd::MessageDialogResult::Yes {
                    let count = items.len();
                    self.todos.todos = items;
                    self.todo_edit = None;
                    self.save_todos(format!("Imported {} todos", count));
                }
            }
            Err(e) => self.status_message = format!("Import failed: {}", e),
        }
    }

    pub fn open_data_folder(&mut self) {
        match &self.data_dir {
            Some(dir) => {
                if let Err(e) = open::that(dir) {
                    self.status_message = format!("Could not open folder: {}", e);
                }
            }
            None => self.status_message = "Data is only kept in memory this session".to_string(),
        }
    }

    // --- Todos ---

    pub fn save_todos(&mut self, done: impl Into<String>) {
        match self.todo_store.save(&self.todos) {
            Ok(()) => self.status_message = done.into(),
            Err(e) => {
                tracing::warn!(error = %e, "todo save failed");
                self.status_message = format!("Saving todos failed: {}", e);
            }
        }
    }

    pub fn add_todo(&mut self) {
        let text = std::mem::take(&mut self.new_todo_text);
        if self.todos.add(&text, Utc::now()).is_some() {
            self.save_todos("Todo added");
        }
    }

    pub fn start_new_day(&mut self) {
        let count = self.todos.start_new_day(Utc::now());
        self.todo_filter = TodoFilter::All;
        self.save_todos(format!("Archived {} todos", count));
    }
}

/// Open file-backed storage, falling back to memory so the app still starts.
fn open_storage(settings: &AppSettings) -> (Box<dyn CloneStorage>, Option<PathBuf>) {
    let dir = match &settings.data_dir {
        Some(dir) => Ok(dir.clone()),
        None => FileStorage::default_dir(),
    };
    match dir.and_then(FileStorage::open) {
        Ok(storage) => {
            tracing::info!(dir = ?storage.dir(), "using file storage");
            let dir = storage.dir().to_path_buf();
            (Box::new(storage), Some(dir))
        }
        Err(e) => {
            tracing::warn!(error = %e, "falling back to in-memory storage");
            (Box::new(MemoryStorage::default()), None)
        }
    }
}

/// Storage handle that can be shared between the project and todo stores.
trait CloneStorage: KeyValueStorage {
    fn clone_boxed(&self) -> Box<dyn KeyValueStorage>;
}

impl<T: KeyValueStorage + Clone + 'static> CloneStorage for T {
    fn clone_boxed(&self) -> Box<dyn KeyValueStorage> {
        Box::new(self.clone())
    }
}

impl eframe::App for TimelineApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let should_save = ctx.input(|i| i.modifiers.ctrl && i.key_pressed(egui::Key::S));
        if should_save {
            self.save();
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui::toolbar::show_toolbar(self, ui);
        });

        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(ui::theme::STATUS_BAR_HEIGHT)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_HEADER)
                    .inner_margin(egui::Margin::symmetric(10.0, 0.0)),
            )
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    ui.label(
                        egui::RichText::new(&self.status_message)
                            .font(ui::theme::font_sub())
                            .color(ui::theme::TEXT_SECONDARY),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if self.boundary.is_dirty() {
                            ui.label(
                                egui::RichText::new("Unsaved changes")
                                    .size(10.5)
                                    .color(ui::theme::TODAY_LINE),
                            );
                            ui.label(egui::RichText::new(" · ").size(10.5).color(ui::theme::TEXT_DIM));
                        }
                        ui.label(
                            egui::RichText::new(format!(
                                "Streams: {} · Todos: {}",
                                self.project.streams.len(),
                                self.todos.todos.len()
                            ))
                            .size(10.5)
                            .color(ui::theme::TEXT_DIM),
                        );
                    });
                });
            });

        let frame = egui::Frame::default()
            .fill(ui::theme::BG_DARK)
            .inner_margin(egui::Margin::ZERO);
        egui::CentralPanel::default().frame(frame).show(ctx, |ui| match self.view {
            View::Timeline => {
                let window = self.window();
                let interaction =
                    ui::timeline_view::show_timeline(&self.project, &mut self.controller, window, ui);
                if let Some(commit) = interaction.commit {
                    self.apply_commit(commit);
                }
                if let Some((action, pos)) = interaction.context {
                    self.handle_context_action(action, pos);
                }
                if let Some(id) = interaction.edit_deadline {
                    self.open_deadline_editor(id);
                }
                if let Some(id) = interaction.edit_stream {
                    self.open_stream_editor(id);
                }
            }
            View::Todos => ui::todo_panel::show_todo_panel(self, ui),
        });

        if self.color_menu.is_some() {
            ui::dialogs::show_color_menu(self, ctx);
        }
        if self.deadline_editor.is_some() {
            ui::dialogs::show_deadline_editor(self, ctx);
        }
        if self.stream_editor.is_some() {
            ui::dialogs::show_stream_editor(self, ctx);
        }
        if self.project_draft.is_some() {
            ui::dialogs::show_project_dialog(self, ctx);
        }
        if self.show_history {
            ui::dialogs::show_history_dialog(self, ctx);
        }
        if self.show_about {
            ui::dialogs::show_about_dialog(self, ctx);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Err(e) = self.boundary.flush(&self.project) {
            tracing::warn!(error = %e, "unsaved project changes lost on exit");
        }
    }
}
