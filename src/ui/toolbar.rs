use crate::app::PlannerApp;
use crate::model::ViewMode;
use crate::ui::theme;
use chrono::Duration;
use egui::{Color32, RichText, Ui};
use egui_phosphor::regular as icons;

/// Render the top toolbar.
pub fn show_toolbar(app: &mut PlannerApp, ui: &mut Ui) {
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 6.0;

        let add_btn = egui::Button::new(
            RichText::new(format!("{}  Add Task", icons::PLUS))
                .color(Color32::WHITE)
                .size(12.0),
        )
        .fill(theme::ACCENT)
        .rounding(egui::Rounding::same(5.0));
        if ui.add(add_btn).clicked() {
            app.open_new_task_form();
        }

        ui.separator();

        // Zoom
        let can_out = app.viewport.can_zoom_out();
        if ui
            .add_enabled(can_out, egui::Button::new(icons::MAGNIFYING_GLASS_MINUS))
            .on_hover_text("Zoom out")
            .clicked()
        {
            app.viewport.zoom_out();
        }
        ui.label(
            RichText::new(format!("{}%", app.viewport.zoom_percent()))
                .size(11.0)
                .color(theme::TEXT_SECONDARY),
        );
        let can_in = app.viewport.can_zoom_in();
        if ui
            .add_enabled(can_in, egui::Button::new(icons::MAGNIFYING_GLASS_PLUS))
            .on_hover_text("Zoom in")
            .clicked()
        {
            app.viewport.zoom_in();
        }

        ui.separator();

        // View mode
        for mode in [ViewMode::Day, ViewMode::Week] {
            if ui
                .selectable_label(app.viewport.view_mode == mode, mode.label())
                .clicked()
            {
                app.viewport.set_view_mode(mode);
            }
        }

        ui.separator();

        // Navigation
        if ui
            .button(icons::CARET_LEFT)
            .on_hover_text(format!("Previous {}", app.viewport.view_mode.label().to_lowercase()))
            .clicked()
        {
            app.viewport.step(false);
        }
        if ui.button("Today").clicked() {
            app.go_to_today();
        }
        if ui
            .button(icons::CARET_RIGHT)
            .on_hover_text(format!("Next {}", app.viewport.view_mode.label().to_lowercase()))
            .clicked()
        {
            app.viewport.step(true);
        }
        ui.label(
            RichText::new(range_label(app))
                .size(11.0)
                .color(theme::TEXT_PRIMARY),
        );

        ui.separator();

        if ui
            .button(format!("{}  Export .ics", icons::DOWNLOAD_SIMPLE))
            .on_hover_text("Export all tasks as an iCalendar file")
            .clicked()
        {
            app.export_ics();
        }
        let selected = app.selected.clone();
        if ui
            .add_enabled(
                selected.is_some(),
                egui::Button::new(format!("{}  Google Calendar", icons::CALENDAR_PLUS)),
            )
            .on_hover_text("Open the selected task in Google Calendar")
            .on_disabled_hover_text("Select a task first")
            .clicked()
        {
            if let Some(id) = selected {
                app.open_in_calendar(&id);
            }
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button(icons::INFO).on_hover_text("About").clicked() {
                app.show_about = true;
            }
        });
    });
}

fn range_label(app: &PlannerApp) -> String {
    let start = app.viewport.range_start.date();
    match app.viewport.view_mode {
        ViewMode::Day => start.format("%Y-%m-%d").to_string(),
        ViewMode::Week => format!(
            "{} – {}",
            start.format("%Y-%m-%d"),
            (app.viewport.range_end() - Duration::days(1)).format("%m-%d")
        ),
    }
}
