use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use egui::{Color32, Context, RichText, Ui, Window};

use crate::error::FormError;
use crate::model::task::DEFAULT_COLOR;
use crate::model::timeline::start_of_day;
use crate::model::{Task, TaskDraft, TaskId, TaskPriority};
use crate::ui::theme;

/// What the form asks the controller to do this frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FormOutcome {
    None,
    /// A validated draft. `editing` is the task to overwrite, if any.
    Submit {
        editing: Option<TaskId>,
        draft: TaskDraft,
    },
    Cancel,
}

/// Editable state of the add/edit task dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskForm {
    pub editing: Option<TaskId>,
    pub name: String,
    pub start_date: NaiveDate,
    pub start_hour: u32,
    pub start_minute: u32,
    pub end_date: NaiveDate,
    pub end_hour: u32,
    pub end_minute: u32,
    pub description: String,
    pub priority: TaskPriority,
    pub color: [u8; 3],
    pub has_parent: bool,
    pub parent_id: Option<TaskId>,
    /// Last validation or save error, shown under the fields.
    pub error: Option<String>,
    /// Interval of the task being edited. The fields only show minutes.
    loaded: Option<(NaiveDateTime, NaiveDateTime)>,
}

impl TaskForm {
    /// A blank form starting at the next full hour and lasting two hours.
    pub fn new_task(now: NaiveDateTime) -> Self {
        let hour = start_of_day(now.date()) + Duration::hours(now.hour() as i64);
        let start = hour + Duration::hours(1);
        let end = start + Duration::hours(2);
        let mut form = Self::with_interval(start, end);
        form.color = rgb(DEFAULT_COLOR);
        form
    }

    /// A form pre-filled from an existing task.
    pub fn edit(task: &Task) -> Self {
        let mut form = Self::with_interval(task.start, task.end);
        form.editing = Some(task.id.clone());
        form.name = task.name.clone();
        form.description = task.description.clone().unwrap_or_default();
        form.priority = task.priority;
        form.color = rgb(&task.color);
        form.has_parent = task.parent_id.is_some();
        form.parent_id = task.parent_id.clone();
        form.loaded = Some((task.start, task.end));
        form
    }

    fn with_interval(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            editing: None,
            name: String::new(),
            start_date: start.date(),
            start_hour: start.hour(),
            start_minute: start.minute(),
            end_date: end.date(),
            end_hour: end.hour(),
            end_minute: end.minute(),
            description: String::new(),
            priority: TaskPriority::default(),
            color: rgb(DEFAULT_COLOR),
            has_parent: false,
            parent_id: None,
            error: None,
            loaded: None,
        }
    }

    pub fn title(&self) -> &'static str {
        if self.editing.is_some() {
            "Edit Task"
        } else {
            "New Task"
        }
    }

    pub fn start(&self) -> NaiveDateTime {
        let picked = combine(self.start_date, self.start_hour, self.start_minute);
        keep_seconds(picked, self.loaded.map(|(start, _)| start))
    }

    pub fn end(&self) -> NaiveDateTime {
        let picked = combine(self.end_date, self.end_hour, self.end_minute);
        keep_seconds(picked, self.loaded.map(|(_, end)| end))
    }

    /// Validate the fields into a draft.
    pub fn to_draft(&self) -> Result<TaskDraft, FormError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(FormError::EmptyName);
        }
        let (start, end) = (self.start(), self.end());
        if end <= start {
            return Err(FormError::EndBeforeStart);
        }
        let parent_id = if self.has_parent {
            Some(self.parent_id.clone().ok_or(FormError::MissingParent)?)
        } else {
            None
        };
        let description = self.description.trim();

        Ok(TaskDraft {
            name: name.to_string(),
            start,
            end,
            description: (!description.is_empty()).then(|| description.to_string()),
            priority: self.priority,
            color: theme::to_hex(self.color),
            parent_id,
        })
    }

    /// Render the dialog. `parents` are the candidate parent tasks (id, name).
    pub fn show(&mut self, ctx: &Context, parents: &[(TaskId, String)]) -> FormOutcome {
        let mut outcome = FormOutcome::None;
        let mut open = true;

        Window::new(RichText::new(self.title()).strong().size(14.0))
            .id(egui::Id::new("task_form"))
            .open(&mut open)
            .resizable(false)
            .collapsible(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .fixed_size([380.0, 0.0])
            .show(ctx, |ui| {
                ui.visuals_mut().extreme_bg_color = theme::BG_FIELD;
                ui.visuals_mut().faint_bg_color = Color32::TRANSPARENT;
                ui.visuals_mut().striped = false;

                ui.add_space(4.0);
                self.fields(ui, parents);

                if let Some(error) = &self.error {
                    ui.add_space(4.0);
                    ui.label(RichText::new(error).color(theme::DANGER).size(11.0));
                }

                ui.add_space(6.0);
                ui.separator();
                ui.add_space(4.0);

                ui.horizontal(|ui| {
                    let save_btn = egui::Button::new(RichText::new("Save").color(Color32::WHITE))
                        .fill(theme::ACCENT)
                        .rounding(egui::Rounding::same(4.0));
                    if ui.add_sized([80.0, 28.0], save_btn).clicked() {
                        match self.to_draft() {
                            Ok(draft) => {
                                outcome = FormOutcome::Submit {
                                    editing: self.editing.clone(),
                                    draft,
                                };
                            }
                            Err(e) => self.error = Some(e.to_string()),
                        }
                    }
                    if ui.add_sized([80.0, 28.0], egui::Button::new("Cancel")).clicked() {
                        outcome = FormOutcome::Cancel;
                    }
                });
                ui.add_space(2.0);
            });

        if !open || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            outcome = FormOutcome::Cancel;
        }
        outcome
    }

    fn fields(&mut self, ui: &mut Ui, parents: &[(TaskId, String)]) {
        egui::Grid::new("task_form_grid")
            .num_columns(2)
            .striped(false)
            .spacing([12.0, 8.0])
            .show(ui, |ui| {
                ui.label(RichText::new("Name").color(theme::TEXT_SECONDARY));
                ui.add_sized(
                    [240.0, 24.0],
                    egui::TextEdit::singleline(&mut self.name)
                        .hint_text("Task name...")
                        .text_color(theme::TEXT_PRIMARY),
                );
                ui.end_row();

                ui.label(RichText::new("Start").color(theme::TEXT_SECONDARY));
                time_row(ui, "form_start", &mut self.start_date, &mut self.start_hour, &mut self.start_minute);
                ui.end_row();

                ui.label(RichText::new("End").color(theme::TEXT_SECONDARY));
                time_row(ui, "form_end", &mut self.end_date, &mut self.end_hour, &mut self.end_minute);
                ui.end_row();

                ui.label(RichText::new("Priority").color(theme::TEXT_SECONDARY));
                let selected = format!("{} {}", self.priority.icon(), self.priority.label());
                egui::ComboBox::from_id_salt("form_priority")
                    .selected_text(RichText::new(selected).size(11.0))
                    .width(240.0)
                    .show_ui(ui, |ui| {
                        for p in TaskPriority::all() {
                            let label = format!("{} {}", p.icon(), p.label());
                            ui.selectable_value(&mut self.priority, *p, label);
                        }
                    });
                ui.end_row();

                ui.label(RichText::new("Color").color(theme::TEXT_SECONDARY));
                ui.horizontal(|ui| {
                    ui.spacing_mut().item_spacing = egui::vec2(4.0, 4.0);
                    for hex in theme::TASK_COLORS {
                        let swatch = rgb(hex);
                        let is_current = self.color == swatch;
                        let (rect, resp) = ui.allocate_exact_size(egui::vec2(16.0, 16.0), egui::Sense::click());
                        ui.painter().rect_filled(rect, egui::Rounding::same(3.0), theme::task_color(hex));
                        if is_current {
                            ui.painter().rect_stroke(
                                rect.expand(1.0),
                                egui::Rounding::same(4.0),
                                egui::Stroke::new(2.0, Color32::WHITE),
                            );
                        }
                        if resp.on_hover_text(*hex).clicked() {
                            self.color = swatch;
                        }
                    }
                    ui.color_edit_button_srgb(&mut self.color);
                });
                ui.end_row();

                ui.label(RichText::new("Parent").color(theme::TEXT_SECONDARY));
                ui.horizontal(|ui| {
                    if ui.checkbox(&mut self.has_parent, "Subtask of").changed() && !self.has_parent {
                        self.parent_id = None;
                    }
                    if self.has_parent {
                        let current = self
                            .parent_id
                            .as_ref()
                            .and_then(|id| parents.iter().find(|(pid, _)| pid == id))
                            .map(|(_, name)| name.as_str())
                            .unwrap_or("Select parent task");
                        egui::ComboBox::from_id_salt("form_parent")
                            .selected_text(RichText::new(current).size(11.0))
                            .width(150.0)
                            .show_ui(ui, |ui| {
                                for (id, name) in parents {
                                    if ui
                                        .selectable_label(self.parent_id.as_ref() == Some(id), name.as_str())
                                        .clicked()
                                    {
                                        self.parent_id = Some(id.clone());
                                    }
                                }
                            });
                    }
                });
                ui.end_row();
            });

        ui.add_space(6.0);
        ui.label(RichText::new("Description").color(theme::TEXT_SECONDARY));
        ui.add_sized(
            [ui.available_width(), 60.0],
            egui::TextEdit::multiline(&mut self.description)
                .font(egui::FontId::proportional(11.0))
                .hint_text("Add notes or description..."),
        );
    }
}

/// Candidate parents for the task being edited: root tasks other than itself.
pub fn parent_candidates<'a>(roots: impl IntoIterator<Item = &'a Task>, editing: Option<&str>) -> Vec<(TaskId, String)> {
    roots
        .into_iter()
        .filter(|t| Some(t.id.as_str()) != editing)
        .map(|t| (t.id.clone(), t.name.clone()))
        .collect()
}

fn time_row(ui: &mut Ui, salt: &str, date: &mut NaiveDate, hour: &mut u32, minute: &mut u32) {
    ui.horizontal(|ui| {
        ui.add(egui_extras::DatePickerButton::new(date).id_salt(salt));
        ui.add(egui::DragValue::new(hour).range(0..=23).custom_formatter(|v, _| format!("{:02}", v as u32)));
        ui.label(":");
        ui.add(egui::DragValue::new(minute).range(0..=59).custom_formatter(|v, _| format!("{:02}", v as u32)));
    });
}

fn combine(date: NaiveDate, hour: u32, minute: u32) -> NaiveDateTime {
    date.and_hms_opt(hour.min(23), minute.min(59), 0)
        .unwrap_or_else(|| start_of_day(date))
}

/// The loaded time wins while the fields still show its minute.
fn keep_seconds(picked: NaiveDateTime, loaded: Option<NaiveDateTime>) -> NaiveDateTime {
    let Some(original) = loaded else {
        return picked;
    };
    let shown = original.with_second(0).and_then(|t| t.with_nanosecond(0));
    if shown == Some(picked) {
        original
    } else {
        picked
    }
}

fn rgb(hex: &str) -> [u8; 3] {
    let color = theme::task_color(hex);
    [color.r(), color.g(), color.b()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn new_task_starts_next_hour_for_two_hours() {
        let form = TaskForm::new_task(at(9, 41));
        assert_eq!(form.start(), at(10, 0));
        assert_eq!(form.end(), at(12, 0));
        assert_eq!(theme::to_hex(form.color), "#3498db");
        assert_eq!(form.title(), "New Task");
    }

    #[test]
    fn new_task_late_evening_rolls_into_next_day() {
        let form = TaskForm::new_task(at(23, 5));
        assert_eq!(form.start_date, NaiveDate::from_ymd_opt(2024, 1, 16).unwrap());
        assert_eq!(form.start_hour, 0);
        assert_eq!(form.end_hour, 2);
    }

    #[test]
    fn edit_round_trips_task_fields() {
        let task = Task::from_draft(TaskDraft {
            name: "Review".into(),
            start: at(19, 0),
            end: at(20, 30),
            description: Some("Open changes".into()),
            priority: TaskPriority::High,
            color: "#9b59b6".into(),
            parent_id: Some("p1".into()),
        });
        let form = TaskForm::edit(&task);
        assert_eq!(form.editing.as_deref(), Some(task.id.as_str()));
        assert_eq!(form.title(), "Edit Task");

        let draft = form.to_draft().unwrap();
        assert_eq!(draft.name, task.name);
        assert_eq!(draft.start, task.start);
        assert_eq!(draft.end, task.end);
        assert_eq!(draft.description, task.description);
        assert_eq!(draft.priority, task.priority);
        assert_eq!(draft.color, task.color);
        assert_eq!(draft.parent_id, task.parent_id);
    }

    #[test]
    fn edit_keeps_seconds_until_time_fields_change() {
        let start = at(9, 22) + Duration::seconds(23);
        let end = at(10, 22) + Duration::seconds(23);
        let task = Task::from_draft(TaskDraft::new("dragged", start, end));

        let mut form = TaskForm::edit(&task);
        form.name = "renamed".into();
        let draft = form.to_draft().unwrap();
        assert_eq!(draft.start, start);
        assert_eq!(draft.end, end);

        form.start_minute = 30;
        let draft = form.to_draft().unwrap();
        assert_eq!(draft.start, at(9, 30));
        assert_eq!(draft.end, end);
    }

    #[test]
    fn validation_errors() {
        let mut form = TaskForm::new_task(at(9, 0));
        assert_eq!(form.to_draft(), Err(FormError::EmptyName));

        form.name = "  Plan  ".into();
        form.end_hour = form.start_hour;
        assert_eq!(form.to_draft(), Err(FormError::EndBeforeStart));

        form.end_hour = form.start_hour + 1;
        form.has_parent = true;
        assert_eq!(form.to_draft(), Err(FormError::MissingParent));

        form.has_parent = false;
        let draft = form.to_draft().unwrap();
        assert_eq!(draft.name, "Plan");
        assert_eq!(draft.description, None);
        assert_eq!(draft.parent_id, None);
    }

    #[test]
    fn parent_candidates_exclude_task_itself() {
        let a = Task::from_draft(TaskDraft::new("a", at(1, 0), at(2, 0)));
        let b = Task::from_draft(TaskDraft::new("b", at(1, 0), at(2, 0)));
        let candidates = parent_candidates([&a, &b], Some(a.id.as_str()));
        assert_eq!(candidates, vec![(b.id.clone(), "b".to_string())]);
    }
}
