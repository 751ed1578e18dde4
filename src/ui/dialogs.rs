use crate::app::PlannerApp;
use crate::ui::theme;
use egui::{Context, RichText, Window};

/// Ask before deleting a task. `subtasks` counts every descendant removed with it.
pub fn confirm_delete(task_name: &str, subtasks: usize) -> bool {
    let answer = rfd::MessageDialog::new()
        .set_title("Delete Task")
        .set_description(delete_prompt(task_name, subtasks))
        .set_level(rfd::MessageLevel::Warning)
        .set_buttons(rfd::MessageButtons::YesNo)
        .show();
    answer == rfd::MessageDialogResult::Yes
}

fn delete_prompt(task_name: &str, subtasks: usize) -> String {
    match subtasks {
        0 => format!("Delete \"{}\"? This cannot be undone.", task_name),
        1 => format!("Delete \"{}\" and its subtask? This cannot be undone.", task_name),
        n => format!(
            "Delete \"{}\" and all {} of its subtasks? This cannot be undone.",
            task_name, n
        ),
    }
}

pub fn warn_empty_export() {
    rfd::MessageDialog::new()
        .set_title("Export Calendar")
        .set_description("There are no tasks to export.")
        .set_level(rfd::MessageLevel::Info)
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
}

/// Render the "About" dialog.
pub fn show_about_dialog(app: &mut PlannerApp, ctx: &Context) {
    let mut should_close = false;
    Window::new("About")
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .fixed_size([300.0, 200.0])
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(12.0);
                ui.heading(RichText::new("Timeline Planner").strong());
                ui.add_space(2.0);
                ui.label(
                    RichText::new(format!("Version {}", env!("CARGO_PKG_VERSION")))
                        .color(theme::TEXT_SECONDARY),
                );
                ui.add_space(10.0);
                ui.label("Plan your day on a zoomable timeline.");
                ui.label(
                    RichText::new("Drag bars to move · Drag edges to resize · Ctrl+Scroll to zoom")
                        .size(10.5)
                        .color(theme::TEXT_DIM),
                );
                ui.add_space(14.0);
                if ui.add_sized([100.0, 28.0], egui::Button::new("Close")).clicked() {
                    should_close = true;
                }
            });
        });
    if should_close || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        app.show_about = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn delete_prompt_counts_subtasks() {
        assert_eq!(delete_prompt("Plan", 0), "Delete \"Plan\"? This cannot be undone.");
        assert_eq!(
            delete_prompt("Plan", 1),
            "Delete \"Plan\" and its subtask? This cannot be undone."
        );
        assert_eq!(
            delete_prompt("Plan", 2),
            "Delete \"Plan\" and all 2 of its subtasks? This cannot be undone."
        );
    }
}
