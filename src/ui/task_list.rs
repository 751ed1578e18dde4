use std::collections::HashSet;
use std::time::{Duration, Instant};

use egui::{Color32, RichText, Ui};
use egui_phosphor::regular as icons;
use log::debug;

use crate::io::Store;
use crate::model::{Task, TaskId, TaskRepository};
use crate::ui::theme;

/// Actions that the task list can request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskListAction {
    None,
    Select(TaskId),
    Edit(TaskId),
    Delete(TaskId),
    OpenInCalendar(TaskId),
}

/// One visible line of the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRow {
    pub task_id: TaskId,
    pub depth: usize,
    pub child_count: usize,
    pub collapsed: bool,
}

/// Search text with a quiet period before it is applied.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub text: String,
    applied: String,
    edited_at: Option<Instant>,
    debounce: Duration,
}

impl SearchQuery {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            text: String::new(),
            applied: String::new(),
            edited_at: None,
            debounce: Duration::from_millis(debounce_ms),
        }
    }

    /// The query the list is currently filtered by.
    pub fn applied(&self) -> &str {
        &self.applied
    }

    /// Record that `text` was edited. Clearing the box applies at once.
    pub fn edited(&mut self, now: Instant) {
        if self.text.trim().is_empty() {
            self.applied.clear();
            self.edited_at = None;
        } else {
            self.edited_at = Some(now);
        }
    }

    /// Apply the pending text once the debounce has elapsed.
    ///
    /// Returns how long to wait before polling again while a change is pending.
    pub fn poll(&mut self, now: Instant) -> Option<Duration> {
        let edited_at = self.edited_at?;
        let elapsed = now.saturating_duration_since(edited_at);
        if elapsed >= self.debounce {
            self.applied = self.text.trim().to_string();
            self.edited_at = None;
            debug!("search applied: {:?}", self.applied);
            None
        } else {
            Some(self.debounce - elapsed)
        }
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.applied.clear();
        self.edited_at = None;
    }
}

/// Rows for the list: the root/child hierarchy, or a flat list of matches
/// while a query is applied.
pub fn build_rows<S: Store>(repo: &TaskRepository<S>, query: &str, collapsed: &HashSet<TaskId>) -> Vec<ListRow> {
    if !query.is_empty() {
        return repo
            .search(query)
            .into_iter()
            .map(|task| ListRow {
                task_id: task.id.clone(),
                depth: 0,
                child_count: 0,
                collapsed: false,
            })
            .collect();
    }

    let mut rows = Vec::with_capacity(repo.len());
    for root in repo.get_root_tasks() {
        push_subtree(repo, root, 0, collapsed, &mut rows);
    }
    rows
}

fn push_subtree<S: Store>(
    repo: &TaskRepository<S>,
    task: &Task,
    depth: usize,
    collapsed: &HashSet<TaskId>,
    rows: &mut Vec<ListRow>,
) {
    let children = repo.get_children(&task.id);
    let is_collapsed = collapsed.contains(&task.id);
    rows.push(ListRow {
        task_id: task.id.clone(),
        depth,
        child_count: children.len(),
        collapsed: is_collapsed,
    });
    if !is_collapsed {
        for child in children {
            push_subtree(repo, child, depth + 1, collapsed, rows);
        }
    }
}

/// Key of everything the cached rows depend on.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RowsKey {
    revision: u64,
    query: String,
    collapse_generation: u64,
}

/// Left-side task list panel.
pub struct TaskList {
    pub search: SearchQuery,
    collapsed: HashSet<TaskId>,
    collapse_generation: u64,
    cached: Option<(RowsKey, Vec<ListRow>)>,
}

impl TaskList {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            search: SearchQuery::new(debounce_ms),
            collapsed: HashSet::new(),
            collapse_generation: 0,
            cached: None,
        }
    }

    pub fn toggle_collapsed(&mut self, id: &str) {
        if !self.collapsed.remove(id) {
            self.collapsed.insert(id.to_string());
        }
        self.collapse_generation += 1;
    }

    /// Rows for the current repository revision, query and collapse state.
    pub fn rows<S: Store>(&mut self, repo: &TaskRepository<S>, revision: u64) -> &[ListRow] {
        let key = RowsKey {
            revision,
            query: self.search.applied().to_string(),
            collapse_generation: self.collapse_generation,
        };
        if self.cached.as_ref().is_some_and(|(k, _)| *k != key) {
            self.cached = None;
        }
        let collapsed = &self.collapsed;
        let (_, rows) = self
            .cached
            .get_or_insert_with(|| {
                let rows = build_rows(repo, &key.query, collapsed);
                (key, rows)
            });
        rows
    }

    /// Render the list panel.
    pub fn show<S: Store>(
        &mut self,
        repo: &TaskRepository<S>,
        revision: u64,
        selected: Option<&str>,
        ui: &mut Ui,
    ) -> TaskListAction {
        let mut action = TaskListAction::None;

        if let Some(wait) = self.search.poll(Instant::now()) {
            ui.ctx().request_repaint_after(wait);
        }

        // Header area
        ui.add_space(2.0);
        ui.horizontal(|ui| {
            ui.label(
                RichText::new("Tasks")
                    .strong()
                    .size(15.0)
                    .color(theme::TEXT_PRIMARY),
            );
            ui.add_space(4.0);
            ui.label(
                RichText::new(format!("({})", repo.len()))
                    .size(11.0)
                    .color(theme::TEXT_DIM),
            );
        });
        ui.add_space(4.0);

        ui.horizontal(|ui| {
            ui.label(RichText::new(icons::MAGNIFYING_GLASS).color(theme::TEXT_DIM));
            let clear_width = if self.search.text.is_empty() { 0.0 } else { 24.0 };
            let edit = ui.add(
                egui::TextEdit::singleline(&mut self.search.text)
                    .hint_text("Search tasks…")
                    .desired_width(ui.available_width() - clear_width),
            );
            if edit.changed() {
                self.search.edited(Instant::now());
                if let Some(wait) = self.search.poll(Instant::now()) {
                    ui.ctx().request_repaint_after(wait);
                }
            }
            if !self.search.text.is_empty()
                && ui
                    .add(egui::Button::new(icons::X).frame(false))
                    .on_hover_text("Clear search")
                    .clicked()
            {
                self.search.clear();
            }
        });

        ui.add_space(6.0);
        ui.separator();
        ui.add_space(2.0);

        let searching = !self.search.applied().is_empty();
        let rows = self.rows(repo, revision).to_vec();

        if rows.is_empty() {
            ui.add_space(24.0);
            ui.vertical_centered(|ui| {
                let message = if searching { "No matching tasks" } else { "No tasks" };
                ui.label(RichText::new(message).size(13.0).color(theme::TEXT_DIM));
            });
            return action;
        }

        let mut toggled = None;
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for (i, row) in rows.iter().enumerate() {
                    let Some(task) = repo.get_by_id(&row.task_id) else {
                        continue;
                    };
                    let is_selected = selected == Some(task.id.as_str());
                    let row_bg = if is_selected {
                        theme::BG_SELECTED
                    } else if i % 2 == 0 {
                        theme::BG_PANEL
                    } else {
                        theme::BG_DARK
                    };

                    let frame = egui::Frame {
                        fill: row_bg,
                        rounding: egui::Rounding::same(4.0),
                        inner_margin: egui::Margin::symmetric(6.0, 4.0),
                        outer_margin: egui::Margin::ZERO,
                        stroke: egui::Stroke::NONE,
                        shadow: egui::epaint::Shadow::NONE,
                    };

                    frame.show(ui, |ui| {
                        ui.horizontal(|ui| {
                            ui.spacing_mut().item_spacing.x = 6.0;
                            ui.add_space(row.depth as f32 * theme::LIST_INDENT);

                            if row.child_count > 0 {
                                let caret = if row.collapsed {
                                    icons::CARET_RIGHT
                                } else {
                                    icons::CARET_DOWN
                                };
                                let hint = format!("{} subtasks", row.child_count);
                                if ui
                                    .add(egui::Button::new(caret).frame(false))
                                    .on_hover_text(hint)
                                    .clicked()
                                {
                                    toggled = Some(task.id.clone());
                                }
                            } else if !searching {
                                ui.add_space(14.0);
                            }

                            // Color dot
                            let (dot_rect, _) =
                                ui.allocate_exact_size(egui::vec2(8.0, 8.0), egui::Sense::hover());
                            ui.painter().circle_filled(
                                dot_rect.center(),
                                4.0,
                                theme::task_color(&task.color),
                            );

                            ui.label(
                                RichText::new(task.priority.icon())
                                    .color(theme::priority_color(task.priority)),
                            )
                            .on_hover_text(task.priority.label());

                            let name_text = RichText::new(&task.name).size(12.0).color(if is_selected {
                                Color32::WHITE
                            } else {
                                theme::TEXT_PRIMARY
                            });
                            let name = ui.add(
                                egui::Label::new(name_text)
                                    .truncate()
                                    .sense(egui::Sense::click()),
                            );
                            if name.double_clicked() {
                                action = TaskListAction::Edit(task.id.clone());
                            } else if name.clicked() {
                                action = TaskListAction::Select(task.id.clone());
                            }

                            ui.with_layout(
                                egui::Layout::right_to_left(egui::Align::Center),
                                |ui| {
                                    ui.spacing_mut().item_spacing.x = 4.0;

                                    let icon_button = |ui: &mut Ui, icon: &str, color: Color32, hint: &str| {
                                        ui.add(
                                            egui::Button::new(RichText::new(icon).size(12.0).color(color))
                                                .frame(false),
                                        )
                                        .on_hover_text(hint)
                                        .clicked()
                                    };

                                    if icon_button(ui, icons::TRASH, theme::DANGER, "Delete task") {
                                        action = TaskListAction::Delete(task.id.clone());
                                    }
                                    if icon_button(ui, icons::PENCIL_SIMPLE, theme::TEXT_SECONDARY, "Edit task") {
                                        action = TaskListAction::Edit(task.id.clone());
                                    }
                                    if icon_button(
                                        ui,
                                        icons::CALENDAR_PLUS,
                                        theme::TEXT_SECONDARY,
                                        "Add to Google Calendar",
                                    ) {
                                        action = TaskListAction::OpenInCalendar(task.id.clone());
                                    }

                                    ui.label(
                                        RichText::new(format!("{:.1}h", task.duration_hours()))
                                            .size(10.0)
                                            .color(theme::TEXT_DIM),
                                    );
                                    ui.label(
                                        RichText::new(task.start.format("%m-%d %H:%M").to_string())
                                            .size(10.0)
                                            .color(theme::TEXT_SECONDARY),
                                    );
                                },
                            );
                        });
                    });

                    ui.add_space(1.0);
                }
            });

        if let Some(id) = toggled {
            self.toggle_collapsed(&id);
        }

        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::store::MemoryStore;
    use crate::model::TaskDraft;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn repo() -> (TaskRepository<MemoryStore>, TaskId, TaskId) {
        let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let at = |h| day.and_hms_opt(h, 0, 0).unwrap();
        let mut repo = TaskRepository::open_with_seed(MemoryStore::default(), "tasks", Vec::new);
        let parent = repo.add(TaskDraft::new("Release", at(9), at(12))).unwrap();
        repo.add(TaskDraft::new("Write notes", at(9), at(10)).with_parent(parent.id.clone()))
            .unwrap();
        let other = repo
            .add(TaskDraft::new("Lunch", at(12), at(13)).with_description("with the release team"))
            .unwrap();
        (repo, parent.id, other.id)
    }

    fn names(repo: &TaskRepository<MemoryStore>, rows: &[ListRow]) -> Vec<(String, usize)> {
        rows.iter()
            .map(|r| (repo.get_by_id(&r.task_id).unwrap().name.clone(), r.depth))
            .collect()
    }

    #[test]
    fn hierarchy_nests_children_under_parents() {
        let (repo, _, _) = repo();
        let rows = build_rows(&repo, "", &HashSet::new());
        assert_eq!(
            names(&repo, &rows),
            vec![
                ("Release".to_string(), 0),
                ("Write notes".to_string(), 1),
                ("Lunch".to_string(), 0),
            ]
        );
        assert_eq!(rows[0].child_count, 1);
    }

    #[test]
    fn collapsing_hides_children_without_touching_tasks() {
        let (repo, parent, _) = repo();
        let collapsed: HashSet<TaskId> = [parent].into_iter().collect();
        let rows = build_rows(&repo, "", &collapsed);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].collapsed);
        assert_eq!(repo.len(), 3);
    }

    #[test]
    fn search_is_flat_and_matches_descriptions() {
        let (repo, _, lunch) = repo();
        let rows = build_rows(&repo, "RELEASE", &HashSet::new());
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.depth == 0));
        assert!(rows.iter().any(|r| r.task_id == lunch));
        assert!(build_rows(&repo, "zzz", &HashSet::new()).is_empty());
    }

    #[test]
    fn debounce_applies_after_quiet_period() {
        let t0 = Instant::now();
        let mut search = SearchQuery::new(300);
        search.text = "rel".into();
        search.edited(t0);

        assert_eq!(search.poll(t0 + Duration::from_millis(100)), Some(Duration::from_millis(200)));
        assert_eq!(search.applied(), "");

        search.text = "release".into();
        search.edited(t0 + Duration::from_millis(200));
        assert!(search.poll(t0 + Duration::from_millis(400)).is_some());
        assert_eq!(search.poll(t0 + Duration::from_millis(500)), None);
        assert_eq!(search.applied(), "release");
    }

    #[test]
    fn clearing_query_restores_immediately() {
        let t0 = Instant::now();
        let mut search = SearchQuery::new(300);
        search.text = "x".into();
        search.edited(t0);
        search.poll(t0 + Duration::from_millis(300));
        assert_eq!(search.applied(), "x");

        search.text.clear();
        search.edited(t0 + Duration::from_millis(310));
        assert_eq!(search.applied(), "");
        assert_eq!(search.poll(t0 + Duration::from_millis(311)), None);
    }

    #[test]
    fn cached_rows_follow_revision_and_collapse() {
        let (mut repo, parent, _) = repo();
        let mut list = TaskList::new(300);
        assert_eq!(list.rows(&repo, 0).len(), 3);

        list.toggle_collapsed(&parent);
        assert_eq!(list.rows(&repo, 0).len(), 2);
        list.toggle_collapsed(&parent);

        repo.delete(&parent).unwrap();
        assert_eq!(list.rows(&repo, 0).len(), 3);
        assert_eq!(list.rows(&repo, 1).len(), 1);
    }
}
