use std::cell::Cell;
use std::rc::Rc;

use chrono::Local;
use log::{debug, info, warn};

use crate::config::{self, PlannerConfig};
use crate::io::{self, FileStore};
use crate::model::{TaskDraft, TaskId, TaskPatch, TaskRepository, TimelineViewport};
use crate::ui;
use crate::ui::task_form::{FormOutcome, TaskForm};
use crate::ui::task_list::{TaskList, TaskListAction};
use crate::ui::timeline_view::TimelineView;

/// Main application state.
pub struct PlannerApp {
    pub repo: TaskRepository<FileStore>,
    pub viewport: TimelineViewport,
    pub selected: Option<TaskId>,

    // Views
    pub timeline: TimelineView,
    pub task_list: TaskList,

    // Dialog state
    pub form: Option<TaskForm>,
    pub show_about: bool,

    // Status message
    pub status_message: String,

    /// Bumped by the repository subscription on every change.
    revision: Rc<Cell<u64>>,
}

impl PlannerApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: PlannerConfig) -> Self {
        // Register Phosphor icon font as a fallback so icons render inline with text
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);
        ui::theme::apply_theme(&cc.egui_ctx);

        let store = FileStore::new(config::data_dir());
        info!("storing tasks in {}", store.dir().display());
        let repo = TaskRepository::open(store, config.storage_key.clone());
        Self::with_repository(repo, &config)
    }

    fn with_repository(mut repo: TaskRepository<FileStore>, config: &PlannerConfig) -> Self {
        let revision = Rc::new(Cell::new(0));
        let counter = Rc::clone(&revision);
        repo.subscribe(move |change, tasks| {
            counter.set(counter.get() + 1);
            debug!("repository changed: {:?} ({} tasks)", change, tasks.len());
        });

        let today = Local::now().date_naive();
        Self {
            repo,
            viewport: TimelineViewport::new(config.timeline.clone(), today),
            selected: None,
            timeline: TimelineView::default(),
            task_list: TaskList::new(config.search_debounce_ms),
            form: None,
            show_about: false,
            status_message: "Ready".to_string(),
            revision,
        }
    }

    // --- Navigation ---

    pub fn go_to_today(&mut self) {
        self.viewport.go_to_today(Local::now().date_naive());
    }

    // --- Task operations ---

    pub fn open_new_task_form(&mut self) {
        self.form = Some(TaskForm::new_task(Local::now().naive_local()));
    }

    pub fn open_edit_form(&mut self, id: &str) {
        match self.repo.get_by_id(id) {
            Some(task) => self.form = Some(TaskForm::edit(task)),
            None => warn!("edit requested for unknown task {}", id),
        }
    }

    /// Save a submitted form. Returns `false` (and keeps the form open with
    /// the error) when the repository rejects it.
    fn submit_form(&mut self, editing: Option<TaskId>, draft: TaskDraft) -> bool {
        let result = match &editing {
            Some(id) => self.repo.update(id, TaskPatch::from(draft)),
            None => self.repo.add(draft),
        };
        match result {
            Ok(task) => {
                self.status_message = if editing.is_some() {
                    format!("Updated '{}'", task.name)
                } else {
                    format!("Added '{}'", task.name)
                };
                self.selected = Some(task.id);
                true
            }
            Err(e) => {
                if let Some(form) = self.form.as_mut() {
                    form.error = Some(e.to_string());
                }
                false
            }
        }
    }

    pub fn delete_task(&mut self, id: &str) {
        let Some(task) = self.repo.get_by_id(id) else {
            return;
        };
        let name = task.name.clone();
        let subtasks = self.repo.descendants(id).len();
        if !ui::dialogs::confirm_delete(&name, subtasks) {
            return;
        }

        match self.repo.delete(id) {
            Ok(removed) => {
                if self
                    .selected
                    .as_ref()
                    .is_some_and(|sel| removed.contains(sel))
                {
                    self.selected = None;
                }
                self.status_message = if removed.len() > 1 {
                    format!("Deleted '{}' and {} subtask(s)", name, removed.len() - 1)
                } else {
                    format!("Deleted '{}'", name)
                };
            }
            Err(e) => self.status_message = format!("Delete failed: {}", e),
        }
    }

    // --- Calendar ---

    pub fn export_ics(&mut self) {
        let contents = match io::export_all(self.repo.get_all()) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("export aborted: {}", e);
                ui::dialogs::warn_empty_export();
                self.status_message = "Nothing to export: there are no tasks".to_string();
                return;
            }
        };

        let file_name = io::export_file_name(Local::now().date_naive());
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("iCalendar", &["ics"])
            .set_file_name(&file_name)
            .save_file()
        {
            match io::write_ics(&contents, &path) {
                Ok(()) => {
                    info!("exported {} tasks to {}", self.repo.len(), path.display());
                    self.status_message = format!("Exported {} tasks to {}", self.repo.len(), file_name);
                }
                Err(e) => self.status_message = format!("Export failed: {}", e),
            }
        }
    }

    pub fn open_in_calendar(&mut self, id: &str) {
        let Some(task) = self.repo.get_by_id(id) else {
            return;
        };
        let link = io::build_google_calendar_link(task);
        match open::that(&link) {
            Ok(()) => self.status_message = format!("Opened '{}' in Google Calendar", task.name),
            Err(e) => {
                warn!("failed to open {}: {}", link, e);
                self.status_message = format!("Could not open browser: {}", e);
            }
        }
    }

    fn show_form(&mut self, ctx: &egui::Context) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        let parents = ui::task_form::parent_candidates(self.repo.get_root_tasks(), form.editing.as_deref());
        match form.show(ctx, &parents) {
            FormOutcome::Submit { editing, draft } => {
                if self.submit_form(editing, draft) {
                    self.form = None;
                }
            }
            FormOutcome::Cancel => self.form = None,
            FormOutcome::None => {}
        }
    }
}

impl eframe::App for PlannerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let revision = self.revision.get();

        // Keyboard shortcuts, only while no dialog has focus
        if self.form.is_none() {
            if ctx.input(|i| i.modifiers.ctrl && i.key_pressed(egui::Key::N)) {
                self.open_new_task_form();
            }
            if ctx.input(|i| i.modifiers.ctrl && i.key_pressed(egui::Key::E)) {
                self.export_ics();
            }
        }

        // Top panel: toolbar
        egui::TopBottomPanel::top("toolbar")
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_HEADER)
                    .inner_margin(egui::Margin::symmetric(10.0, 6.0)),
            )
            .show(ctx, |ui| {
                ui::toolbar::show_toolbar(self, ui);
            });

        // Bottom panel: status bar
        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(24.0)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_HEADER)
                    .inner_margin(egui::Margin::symmetric(10.0, 0.0)),
            )
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    ui.label(
                        egui::RichText::new(&self.status_message)
                            .size(11.0)
                            .color(ui::theme::TEXT_SECONDARY),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(
                            egui::RichText::new(format!("Tasks: {}", self.repo.len()))
                                .size(10.5)
                                .color(ui::theme::TEXT_DIM),
                        );
                        ui.label(egui::RichText::new(" · ").size(10.5).color(ui::theme::TEXT_DIM));
                        ui.label(
                            egui::RichText::new(format!(
                                "{} view · Zoom: {}%",
                                self.viewport.view_mode.label(),
                                self.viewport.zoom_percent()
                            ))
                            .size(10.5)
                            .color(ui::theme::TEXT_DIM),
                        );
                    });
                });
            });

        // Left panel: task list
        let mut list_action = TaskListAction::None;
        egui::SidePanel::left("task_panel")
            .default_width(340.0)
            .min_width(240.0)
            .max_width(600.0)
            .resizable(true)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_PANEL)
                    .inner_margin(egui::Margin::same(8.0))
                    .stroke(egui::Stroke::new(1.0, ui::theme::BORDER_SUBTLE)),
            )
            .show(ctx, |ui| {
                list_action = self
                    .task_list
                    .show(&self.repo, revision, self.selected.as_deref(), ui);
            });

        match list_action {
            TaskListAction::Select(id) => self.selected = Some(id),
            TaskListAction::Edit(id) => self.open_edit_form(&id),
            TaskListAction::Delete(id) => self.delete_task(&id),
            TaskListAction::OpenInCalendar(id) => self.open_in_calendar(&id),
            TaskListAction::None => {}
        }

        // Central panel: timeline
        let chart_frame = egui::Frame::default()
            .fill(ui::theme::BG_DARK)
            .inner_margin(egui::Margin::ZERO);
        egui::CentralPanel::default().frame(chart_frame).show(ctx, |ui| {
            let interaction = self.timeline.show(
                &mut self.repo,
                &mut self.viewport,
                self.revision.get(),
                self.selected.as_deref(),
                ui,
            );
            if let Some(id) = interaction.select {
                self.selected = Some(id);
            } else if interaction.clear_selection {
                self.selected = None;
            }
            if interaction.changed {
                if let Some(task) = self.selected.as_deref().and_then(|id| self.repo.get_by_id(id)) {
                    self.status_message = format!(
                        "Updated '{}' ({} → {})",
                        task.name,
                        task.start.format("%m-%d %H:%M"),
                        task.end.format("%m-%d %H:%M")
                    );
                }
            }
            if let Some(id) = interaction.edit {
                self.open_edit_form(&id);
            }
        });

        // Dialogs
        self.show_form(ctx);
        if self.show_about {
            ui::dialogs::show_about_dialog(self, ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RepositoryError;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn app(dir: &tempfile::TempDir) -> PlannerApp {
        let config = PlannerConfig::default();
        let repo = TaskRepository::open_with_seed(
            FileStore::new(dir.path()),
            config.storage_key.clone(),
            Vec::new,
        );
        PlannerApp::with_repository(repo, &config)
    }

    fn draft(name: &str) -> TaskDraft {
        let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        TaskDraft::new(name, day.and_hms_opt(9, 0, 0).unwrap(), day.and_hms_opt(10, 0, 0).unwrap())
    }

    #[test]
    fn submitted_form_adds_and_selects_task() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        assert!(app.submit_form(None, draft("Standup")));

        assert_eq!(app.repo.len(), 1);
        assert_eq!(app.selected.as_deref(), Some(app.repo.get_all()[0].id.as_str()));
        assert_eq!(app.status_message, "Added 'Standup'");
        assert_eq!(app.revision.get(), 1);
        assert!(dir.path().join("timelinePlanner_tasks.json").exists());
    }

    #[test]
    fn edit_submission_overwrites_task() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        let task = app.repo.add(draft("Standup")).unwrap();

        let mut edited = draft("Daily standup");
        edited.description = Some("Room 4".into());
        assert!(app.submit_form(Some(task.id.clone()), edited));

        let stored = app.repo.get_by_id(&task.id).unwrap();
        assert_eq!(stored.name, "Daily standup");
        assert_eq!(stored.description.as_deref(), Some("Room 4"));
        assert_eq!(app.revision.get(), 2);
    }

    #[test]
    fn rejected_submission_keeps_form_open_with_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir);
        app.form = Some(TaskForm::new_task(Local::now().naive_local()));

        assert!(!app.submit_form(None, draft("Child").with_parent("missing")));
        let error = app.form.as_ref().and_then(|f| f.error.clone());
        assert_eq!(
            error,
            Some(RepositoryError::ParentNotFound("missing".into()).to_string())
        );
        assert!(app.repo.is_empty());
        assert_eq!(app.revision.get(), 0);
    }
}
