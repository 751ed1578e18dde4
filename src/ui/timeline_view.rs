use chrono::{Local, NaiveDateTime};
use egui::{Align2, Color32, Id, Pos2, Rect, Rounding, Sense, Stroke, Ui, Vec2};
use log::debug;

use crate::config::TimelineConfig;
use crate::io::Store;
use crate::model::timeline::BarLayout;
use crate::model::{
    GestureState, ResizeEdge, Task, TaskId, TaskRepository, TimelineLayout, TimelineViewport,
    ViewMode,
};
use crate::ui::theme;

const AXIS_Y: f32 = 20.0;
const BAR_TOP_GAP: f32 = 10.0;
const HOVER_LIFT: f32 = 3.0;

/// Key of everything the cached layout depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
struct LayoutKey {
    revision: u64,
    range_start: NaiveDateTime,
    view_mode: ViewMode,
    zoom: u32,
}

/// Result details from interactions with the timeline.
#[derive(Debug, Clone, Default)]
pub struct TimelineInteraction {
    pub changed: bool,
    pub select: Option<TaskId>,
    pub clear_selection: bool,
    pub edit: Option<TaskId>,
}

/// Timeline panel: scale header, axis, now marker and draggable task bars.
#[derive(Default)]
pub struct TimelineView {
    gestures: GestureState,
    cached: Option<(LayoutKey, TimelineLayout)>,
}

impl TimelineView {
    /// Bar layout for the current repository revision and viewport.
    ///
    /// Rebuilt whenever the repository has notified a change or the
    /// viewport geometry moved.
    pub fn layout(&mut self, viewport: &TimelineViewport, tasks: &[Task], revision: u64) -> &TimelineLayout {
        let key = LayoutKey {
            revision,
            range_start: viewport.range_start,
            view_mode: viewport.view_mode,
            zoom: viewport.zoom_percent(),
        };
        if self.cached.as_ref().is_some_and(|(k, _)| *k != key) {
            self.cached = None;
        }
        let (_, layout) = self.cached.get_or_insert_with(|| {
            debug!("relayout timeline: {} tasks, zoom {}%", tasks.len(), key.zoom);
            (key, viewport.layout(tasks))
        });
        layout
    }

    /// Render the timeline area.
    pub fn show<S: Store>(
        &mut self,
        repo: &mut TaskRepository<S>,
        viewport: &mut TimelineViewport,
        revision: u64,
        selected: Option<&str>,
        ui: &mut Ui,
    ) -> TimelineInteraction {
        let mut interaction = TimelineInteraction::default();
        let now = Local::now().naive_local();

        // Ctrl + scroll wheel zooms.
        if ui.rect_contains_pointer(ui.max_rect()) && ui.input(|i| i.modifiers.ctrl) {
            let scroll = ui.input(|i| i.smooth_scroll_delta.y);
            if scroll > 0.0 {
                viewport.zoom_in();
            } else if scroll < 0.0 {
                viewport.zoom_out();
            }
        }

        // Releasing the pointer anywhere ends the gesture.
        if self.gestures.is_active() && !ui.input(|i| i.pointer.any_down()) {
            self.gestures.release();
        }

        let layout = self.layout(viewport, repo.get_all(), revision).clone();
        let config = viewport.config().clone();
        let available = ui.available_size();
        let content_height =
            theme::SCALE_HEIGHT + theme::AXIS_HEIGHT + BAR_TOP_GAP + layout.rows as f32 * config.row_height + 40.0;
        let canvas = Vec2::new(
            viewport.total_width().max(available.x),
            content_height.max(available.y),
        );

        egui::ScrollArea::both()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                let (response, painter) = ui.allocate_painter(canvas, Sense::click());
                let origin = response.rect.min;
                let mut consumed_click = false;

                painter.rect_filled(response.rect, 0.0, theme::BG_DARK);

                draw_scale_header(&painter, origin, viewport, now);
                draw_axis(&painter, origin, viewport, response.rect.bottom());

                if layout.is_empty() {
                    draw_empty_state(&painter, response.rect);
                }

                for bar in &layout.bars {
                    let Some(task) = repo.get_by_id(&bar.task_id).cloned() else {
                        continue;
                    };
                    let bar_rect = bar_rect(origin, bar, &config);
                    let is_selected = selected == Some(task.id.as_str());

                    let body = ui.interact(
                        bar_rect,
                        ui.make_persistent_id(("task-bar", &task.id)),
                        Sense::click_and_drag(),
                    );
                    let left = ui.interact(
                        handle_rect(bar_rect, ResizeEdge::Start),
                        ui.make_persistent_id(("task-resize-left", &task.id)),
                        Sense::drag(),
                    );
                    let right = ui.interact(
                        handle_rect(bar_rect, ResizeEdge::End),
                        ui.make_persistent_id(("task-resize-right", &task.id)),
                        Sense::drag(),
                    );

                    // Begin
                    if left.drag_started() {
                        if let Some(pos) = left.interact_pointer_pos() {
                            self.gestures.begin_resize(&task, ResizeEdge::Start, pos.x);
                        }
                    } else if right.drag_started() {
                        if let Some(pos) = right.interact_pointer_pos() {
                            self.gestures.begin_resize(&task, ResizeEdge::End, pos.x);
                        }
                    } else if body.drag_started() {
                        if let Some(pos) = body.interact_pointer_pos() {
                            self.gestures.begin_move(&task, pos.x);
                        }
                    }

                    // Track
                    let dragging = [&left, &right, &body].into_iter().find(|r| r.dragged());
                    if let Some(resp) = dragging {
                        let cursor = if resp.id == body.id {
                            egui::CursorIcon::Grabbing
                        } else {
                            egui::CursorIcon::ResizeHorizontal
                        };
                        ui.ctx().set_cursor_icon(cursor);
                        if let Some(pos) = resp.interact_pointer_pos() {
                            if let Some(patch) =
                                self.gestures.pointer_moved(pos.x, &task, viewport.pixels_per_hour())
                            {
                                match repo.update(&task.id, patch) {
                                    Ok(_) => interaction.changed = true,
                                    Err(e) => debug!("drag update rejected: {}", e),
                                }
                            }
                        }
                        interaction.select = Some(task.id.clone());
                        consumed_click = true;
                    }

                    // End
                    if left.drag_stopped() || right.drag_stopped() || body.drag_stopped() {
                        if let Some(ended) = self.gestures.release() {
                            debug!("gesture ended on {}", ended.task_id());
                        }
                    }

                    if body.double_clicked() {
                        interaction.edit = Some(task.id.clone());
                        consumed_click = true;
                    } else if body.clicked() {
                        interaction.select = Some(task.id.clone());
                        consumed_click = true;
                    }

                    let hovered = body.hovered() || left.hovered() || right.hovered();
                    let active = self.gestures.active().map(|g| g.task_id()) == Some(task.id.as_str());
                    let lift = if hovered || active { HOVER_LIFT } else { 0.0 };
                    draw_task_bar(
                        &painter,
                        bar_rect.translate(Vec2::new(0.0, -lift)),
                        &task,
                        bar,
                        is_selected,
                        hovered || is_selected,
                    );

                    if left.hovered() || right.hovered() {
                        ui.ctx().set_cursor_icon(egui::CursorIcon::ResizeHorizontal);
                    } else if body.hovered() && !self.gestures.is_active() {
                        ui.ctx().set_cursor_icon(egui::CursorIcon::Grab);
                    }

                    if hovered && !self.gestures.is_active() {
                        egui::show_tooltip_at_pointer(
                            ui.ctx(),
                            ui.layer_id(),
                            Id::new(("task-tip", &task.id)),
                            |ui| {
                                ui.strong(&task.name);
                                ui.label(format!(
                                    "{} → {}",
                                    task.start.format("%m-%d %H:%M"),
                                    task.end.format("%m-%d %H:%M"),
                                ));
                                ui.label(format!(
                                    "{} · {:.1}h",
                                    task.priority.label(),
                                    task.duration_hours()
                                ));
                                if let Some(description) = &task.description {
                                    ui.label(description);
                                }
                            },
                        );
                    }
                }

                // Drawn last so it sits above the bars.
                if let Some(x) = viewport.now_marker_x(now) {
                    draw_now_marker(&painter, origin, x, response.rect.bottom());
                }

                if response.clicked() && !consumed_click {
                    interaction.clear_selection = true;
                }
            });

        if interaction.changed {
            ui.ctx().request_repaint();
        }
        interaction
    }
}

fn bar_rect(origin: Pos2, bar: &BarLayout, config: &TimelineConfig) -> Rect {
    let top = origin.y
        + theme::SCALE_HEIGHT
        + theme::AXIS_HEIGHT
        + BAR_TOP_GAP
        + bar.row as f32 * config.row_height;
    let (indent, height) = if bar.is_child {
        (config.child_indent, config.child_bar_height)
    } else {
        (0.0, config.bar_height)
    };
    Rect::from_min_size(
        Pos2::new(origin.x + bar.geometry.left + indent, top),
        Vec2::new(bar.geometry.width, height),
    )
}

fn handle_rect(bar: Rect, edge: ResizeEdge) -> Rect {
    let x = match edge {
        ResizeEdge::Start => bar.left(),
        ResizeEdge::End => bar.right(),
    };
    Rect::from_min_max(
        Pos2::new(x - theme::HANDLE_WIDTH * 0.5, bar.top()),
        Pos2::new(x + theme::HANDLE_WIDTH * 0.5, bar.bottom()),
    )
}

fn draw_scale_header(
    painter: &egui::Painter,
    origin: Pos2,
    viewport: &TimelineViewport,
    now: NaiveDateTime,
) {
    let width = viewport.total_width();
    painter.rect_filled(
        Rect::from_min_size(origin, Vec2::new(width, theme::SCALE_HEIGHT)),
        0.0,
        theme::BG_HEADER,
    );

    for unit in viewport.scale_units(now) {
        let rect = Rect::from_min_size(
            Pos2::new(origin.x + unit.x, origin.y),
            Vec2::new(unit.width, theme::SCALE_HEIGHT),
        );
        if unit.is_current {
            painter.rect_filled(rect, 0.0, theme::BG_CURRENT_UNIT);
        }
        painter.line_segment(
            [rect.left_top(), rect.left_bottom()],
            Stroke::new(0.5, theme::BORDER_SUBTLE),
        );
        painter.text(
            rect.center(),
            Align2::CENTER_CENTER,
            unit.label,
            theme::font_header(),
            if unit.is_current {
                theme::NOW_LINE
            } else {
                theme::TEXT_SECONDARY
            },
        );
    }

    painter.line_segment(
        [
            Pos2::new(origin.x, origin.y + theme::SCALE_HEIGHT),
            Pos2::new(origin.x + width, origin.y + theme::SCALE_HEIGHT),
        ],
        Stroke::new(1.0, theme::BORDER_SUBTLE),
    );
}

fn draw_axis(painter: &egui::Painter, origin: Pos2, viewport: &TimelineViewport, bottom: f32) {
    let y = origin.y + theme::SCALE_HEIGHT + AXIS_Y;
    painter.line_segment(
        [
            Pos2::new(origin.x, y),
            Pos2::new(origin.x + viewport.total_width(), y),
        ],
        Stroke::new(2.0, theme::AXIS_LINE),
    );

    for tick in viewport.ticks() {
        let x = origin.x + tick.x;
        let (half, stroke) = if tick.major {
            (10.0, Stroke::new(2.0, theme::AXIS_LINE))
        } else {
            (5.0, Stroke::new(1.0, theme::TICK_MINOR))
        };
        painter.line_segment([Pos2::new(x, y - half), Pos2::new(x, y + half)], stroke);
        if tick.major {
            painter.line_segment(
                [Pos2::new(x, y + half), Pos2::new(x, bottom)],
                Stroke::new(0.5, theme::GRID_LINE),
            );
        }
    }
}

fn draw_now_marker(painter: &egui::Painter, origin: Pos2, x: f32, bottom: f32) {
    let x = origin.x + x;
    let top = origin.y + theme::SCALE_HEIGHT;
    painter.extend(egui::Shape::dashed_line(
        &[Pos2::new(x, top), Pos2::new(x, bottom)],
        Stroke::new(3.0, theme::NOW_LINE),
        5.0,
        5.0,
    ));

    let badge = Rect::from_min_size(Pos2::new(x - 18.0, top + 1.0), Vec2::new(36.0, 14.0));
    painter.rect_filled(badge, Rounding::same(3.0), theme::NOW_LINE);
    painter.text(
        badge.center(),
        Align2::CENTER_CENTER,
        "Now",
        theme::font_small(),
        Color32::WHITE,
    );
}

fn draw_empty_state(painter: &egui::Painter, area: Rect) {
    let center = Pos2::new(area.center().x, area.top() + 140.0);
    painter.text(
        center,
        Align2::CENTER_CENTER,
        egui_phosphor::regular::CLIPBOARD_TEXT,
        egui::FontId::proportional(48.0),
        theme::TEXT_DIM,
    );
    painter.text(
        center + Vec2::new(0.0, 44.0),
        Align2::CENTER_CENTER,
        "No tasks yet",
        egui::FontId::proportional(16.0),
        theme::TEXT_SECONDARY,
    );
    painter.text(
        center + Vec2::new(0.0, 66.0),
        Align2::CENTER_CENTER,
        "Click \"Add Task\" in the toolbar to get started",
        theme::font_small(),
        theme::TEXT_DIM,
    );
}

fn draw_task_bar(
    painter: &egui::Painter,
    rect: Rect,
    task: &Task,
    bar: &BarLayout,
    is_selected: bool,
    show_handles: bool,
) {
    let rounding = Rounding::same(theme::BAR_ROUNDING);
    let mut fill = theme::task_color(&task.color);
    if bar.is_child {
        fill = fill.gamma_multiply(0.8);
    }

    // Soft shadow
    painter.rect_filled(
        rect.translate(Vec2::new(1.0, 2.0)),
        rounding,
        Color32::from_black_alpha(35),
    );
    painter.rect_filled(rect, rounding, fill);

    if is_selected {
        painter.rect_stroke(
            rect.expand(1.5),
            Rounding::same(theme::BAR_ROUNDING + 1.5),
            Stroke::new(2.0, theme::BORDER_ACCENT),
        );
    }

    if show_handles {
        for edge in [ResizeEdge::Start, ResizeEdge::End] {
            let handle = handle_rect(rect, edge).shrink2(Vec2::new(1.5, rect.height() * 0.2));
            painter.rect_filled(handle, Rounding::same(2.0), theme::HANDLE_COLOR);
        }
    }

    // Icon, name and duration, clipped to the bar.
    let clipped = painter.with_clip_rect(rect.shrink(2.0));
    let text_y = rect.center().y;
    clipped.text(
        Pos2::new(rect.left() + 12.0, text_y),
        Align2::LEFT_CENTER,
        task.priority.icon(),
        egui::FontId::proportional(15.0),
        theme::TEXT_ON_BAR,
    );
    clipped.text(
        Pos2::new(rect.left() + 34.0, text_y),
        Align2::LEFT_CENTER,
        &task.name,
        theme::font_bar(),
        theme::TEXT_ON_BAR,
    );
    clipped.text(
        Pos2::new(rect.right() - 10.0, text_y),
        Align2::RIGHT_CENTER,
        format!("{:.1}h", bar.geometry.duration_hours),
        theme::font_small(),
        Color32::from_white_alpha(200),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::TaskDraft;
    use crate::model::timeline::BarGeometry;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn bar(row: usize, is_child: bool) -> BarLayout {
        BarLayout {
            task_id: "t".into(),
            row,
            is_child,
            geometry: BarGeometry {
                left: 200.0,
                width: 100.0,
                duration_hours: 1.0,
            },
        }
    }

    #[test]
    fn rows_stack_below_axis() {
        let config = TimelineConfig::default();
        let rect = bar_rect(Pos2::ZERO, &bar(2, false), &config);
        assert_eq!(rect.left(), 200.0);
        assert_eq!(rect.top(), theme::SCALE_HEIGHT + theme::AXIS_HEIGHT + BAR_TOP_GAP + 120.0);
        assert_eq!(rect.height(), 45.0);
    }

    #[test]
    fn child_bars_are_indented_and_shorter() {
        let config = TimelineConfig::default();
        let rect = bar_rect(Pos2::ZERO, &bar(0, true), &config);
        assert_eq!(rect.left(), 230.0);
        assert_eq!(rect.height(), 35.0);
        assert_eq!(rect.width(), 100.0);
    }

    #[test]
    fn handles_straddle_bar_edges() {
        let rect = Rect::from_min_size(Pos2::new(100.0, 0.0), Vec2::new(80.0, 40.0));
        assert_eq!(handle_rect(rect, ResizeEdge::Start).center().x, 100.0);
        assert_eq!(handle_rect(rect, ResizeEdge::End).center().x, 180.0);
    }

    #[test]
    fn cached_layout_follows_revision_and_zoom() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let mut viewport = TimelineViewport::new(TimelineConfig::default(), day);
        let mut tasks = vec![Task::from_draft(TaskDraft::new(
            "a",
            day.and_hms_opt(1, 0, 0).unwrap(),
            day.and_hms_opt(3, 0, 0).unwrap(),
        ))];
        let mut view = TimelineView::default();

        assert_eq!(view.layout(&viewport, &tasks, 0).bars[0].geometry.left, 100.0);

        // Same revision: the cache is reused even though the slice changed.
        tasks[0].start = day.and_hms_opt(2, 0, 0).unwrap();
        assert_eq!(view.layout(&viewport, &tasks, 0).bars[0].geometry.left, 100.0);

        // A change notification bumps the revision and the bar moves.
        assert_eq!(view.layout(&viewport, &tasks, 1).bars[0].geometry.left, 200.0);

        viewport.set_zoom(200);
        assert_eq!(view.layout(&viewport, &tasks, 1).bars[0].geometry.left, 400.0);
    }
}
