use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use super::task::{hours_between, Task, TaskId};
use crate::config::TimelineConfig;

/// Span of time the timeline displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Day,
    Week,
}

impl ViewMode {
    pub fn hours(self) -> i64 {
        match self {
            ViewMode::Day => 24,
            ViewMode::Week => 168,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Day => "Day",
            ViewMode::Week => "Week",
        }
    }
}

/// Manages the visible range and zoom of the timeline.
#[derive(Debug, Clone)]
pub struct TimelineViewport {
    /// Leftmost visible instant.
    pub range_start: NaiveDateTime,
    pub view_mode: ViewMode,
    zoom_percent: u32,
    config: TimelineConfig,
}

impl TimelineViewport {
    pub fn new(config: TimelineConfig, today: NaiveDate) -> Self {
        let zoom_percent = config.default_zoom.clamp(config.min_zoom, config.max_zoom);
        Self {
            range_start: start_of_day(today),
            view_mode: ViewMode::Day,
            zoom_percent,
            config,
        }
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    pub fn zoom_percent(&self) -> u32 {
        self.zoom_percent
    }

    pub fn pixels_per_hour(&self) -> f32 {
        self.config.base_pixels_per_hour * self.zoom_percent as f32 / 100.0
    }

    pub fn range_end(&self) -> NaiveDateTime {
        self.range_start + Duration::hours(self.view_mode.hours())
    }

    /// Total width in pixels of the visible range.
    pub fn total_width(&self) -> f32 {
        self.view_mode.hours() as f32 * self.pixels_per_hour()
    }

    // ── Zoom ────────────────────────────────────────────────────

    /// Set zoom, clamped to the configured range. Returns the applied value.
    pub fn set_zoom(&mut self, percent: u32) -> u32 {
        self.zoom_percent = percent.clamp(self.config.min_zoom, self.config.max_zoom);
        self.zoom_percent
    }

    pub fn zoom_in(&mut self) -> u32 {
        self.set_zoom(self.zoom_percent.saturating_add(self.config.zoom_step))
    }

    pub fn zoom_out(&mut self) -> u32 {
        self.set_zoom(self.zoom_percent.saturating_sub(self.config.zoom_step))
    }

    pub fn can_zoom_in(&self) -> bool {
        self.zoom_percent < self.config.max_zoom
    }

    pub fn can_zoom_out(&self) -> bool {
        self.zoom_percent > self.config.min_zoom
    }

    // ── Navigation ──────────────────────────────────────────────

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
    }

    pub fn go_to_today(&mut self, today: NaiveDate) {
        self.range_start = start_of_day(today);
    }

    /// Shift the range by one full view span.
    pub fn step(&mut self, forward: bool) {
        let span = Duration::hours(self.view_mode.hours());
        self.range_start = if forward {
            self.range_start + span
        } else {
            self.range_start - span
        };
    }

    // ── Geometry ────────────────────────────────────────────────

    /// Horizontal placement of a task bar, or `None` when the task lies
    /// entirely outside the visible range plus the render margin.
    pub fn bar_geometry(&self, task: &Task) -> Option<BarGeometry> {
        let start_offset = hours_between(self.range_start, task.start);
        let duration = task.duration_hours();
        let margin = self.config.render_margin_hours;
        let visible = self.view_mode.hours() as f64;

        if start_offset + duration < -margin || start_offset > visible + margin {
            return None;
        }

        let pph = self.pixels_per_hour();
        Some(BarGeometry {
            left: start_offset as f32 * pph,
            width: (duration as f32 * pph).max(self.config.min_bar_width),
            duration_hours: duration,
        })
    }

    /// X position of the current-time marker, if `now` is within the range.
    pub fn now_marker_x(&self, now: NaiveDateTime) -> Option<f32> {
        let offset = hours_between(self.range_start, now);
        if offset < 0.0 || offset > self.view_mode.hours() as f64 {
            return None;
        }
        Some(offset as f32 * self.pixels_per_hour())
    }

    /// Lay out every task, one row per task in repository order.
    pub fn layout(&self, tasks: &[Task]) -> TimelineLayout {
        let bars = tasks
            .iter()
            .enumerate()
            .filter_map(|(row, task)| {
                self.bar_geometry(task).map(|geometry| BarLayout {
                    task_id: task.id.clone(),
                    row,
                    is_child: task.is_child(),
                    geometry,
                })
            })
            .collect();
        TimelineLayout {
            bars,
            rows: tasks.len(),
        }
    }

    /// Header units: hours in day view, days in week view.
    pub fn scale_units(&self, now: NaiveDateTime) -> Vec<ScaleUnit> {
        let pph = self.pixels_per_hour();
        match self.view_mode {
            ViewMode::Day => (0..24)
                .map(|hour| {
                    let at = self.range_start + Duration::hours(hour);
                    ScaleUnit {
                        label: format!("{}:00", at.hour()),
                        x: hour as f32 * pph,
                        width: pph,
                        is_current: at.date() == now.date() && at.hour() == now.hour(),
                    }
                })
                .collect(),
            ViewMode::Week => (0..7)
                .map(|day| {
                    let at = self.range_start + Duration::days(day);
                    ScaleUnit {
                        label: at.format("%m-%d").to_string(),
                        x: day as f32 * 24.0 * pph,
                        width: 24.0 * pph,
                        is_current: at.date() == now.date(),
                    }
                })
                .collect(),
        }
    }

    /// Axis ticks: hourly in day view with a major tick every 6 hours,
    /// daily (all major) in week view.
    pub fn ticks(&self) -> Vec<Tick> {
        let pph = self.pixels_per_hour();
        let (interval, major_every) = match self.view_mode {
            ViewMode::Day => (1, 6),
            ViewMode::Week => (24, 24),
        };
        (0..=self.view_mode.hours())
            .step_by(interval as usize)
            .map(|hour| Tick {
                x: hour as f32 * pph,
                major: hour % major_every == 0,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarGeometry {
    pub left: f32,
    pub width: f32,
    pub duration_hours: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarLayout {
    pub task_id: TaskId,
    pub row: usize,
    pub is_child: bool,
    pub geometry: BarGeometry,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimelineLayout {
    pub bars: Vec<BarLayout>,
    /// Number of task rows, including tasks whose bars were skipped.
    pub rows: usize,
}

impl TimelineLayout {
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScaleUnit {
    pub label: String,
    pub x: f32,
    pub width: f32,
    pub is_current: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub x: f32,
    pub major: bool,
}

pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::TaskDraft;
    use pretty_assertions::assert_eq;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        day().and_hms_opt(h, m, 0).unwrap()
    }

    fn viewport() -> TimelineViewport {
        TimelineViewport::new(TimelineConfig::default(), day())
    }

    fn task(start: NaiveDateTime, end: NaiveDateTime) -> Task {
        Task::from_draft(TaskDraft::new("t", start, end))
    }

    #[test]
    fn range_starts_at_midnight() {
        let vp = viewport();
        assert_eq!(vp.range_start, at(0, 0));
        assert_eq!(vp.range_end(), at(0, 0) + Duration::hours(24));
        assert_eq!(vp.total_width(), 2400.0);
    }

    #[test]
    fn task_at_range_start_has_zero_offset() {
        let vp = viewport();
        let geometry = vp.bar_geometry(&task(at(0, 0), at(3, 0))).unwrap();
        assert_eq!(geometry.left, 0.0);
        assert_eq!(geometry.width, 300.0);
    }

    #[test]
    fn doubling_zoom_doubles_offset_and_width() {
        let mut vp = viewport();
        let t = task(at(2, 0), at(4, 0));
        let before = vp.bar_geometry(&t).unwrap();
        vp.set_zoom(200);
        let after = vp.bar_geometry(&t).unwrap();
        assert_eq!(after.left, before.left * 2.0);
        assert_eq!(after.width, before.width * 2.0);
    }

    #[test]
    fn short_tasks_get_minimum_width() {
        let vp = viewport();
        let geometry = vp.bar_geometry(&task(at(9, 0), at(9, 10))).unwrap();
        assert_eq!(geometry.width, 80.0);
    }

    #[test]
    fn bars_within_margin_are_kept_and_beyond_are_skipped() {
        let vp = viewport();
        // Ends 12h before the range: inside the 24h margin.
        let near = task(at(0, 0) - Duration::hours(14), at(0, 0) - Duration::hours(12));
        assert!(vp.bar_geometry(&near).is_some());
        // Ends 30h before the range.
        let far = task(at(0, 0) - Duration::hours(32), at(0, 0) - Duration::hours(30));
        assert!(vp.bar_geometry(&far).is_none());
        // Starts 50h after the range start (26h past the end).
        let late = task(at(0, 0) + Duration::hours(50), at(0, 0) + Duration::hours(51));
        assert!(vp.bar_geometry(&late).is_none());
    }

    #[test]
    fn zoom_is_clamped_and_stepped() {
        let mut vp = viewport();
        assert_eq!(vp.zoom_in(), 125);
        assert_eq!(vp.set_zoom(500), 200);
        assert!(!vp.can_zoom_in());
        assert_eq!(vp.zoom_in(), 200);
        assert_eq!(vp.set_zoom(0), 50);
        assert_eq!(vp.zoom_out(), 50);
        assert!(!vp.can_zoom_out());
    }

    #[test]
    fn week_view_spans_168_hours() {
        let mut vp = viewport();
        vp.set_view_mode(ViewMode::Week);
        assert_eq!(vp.range_end(), at(0, 0) + Duration::days(7));
        let t = task(at(0, 0) + Duration::days(5), at(0, 0) + Duration::days(6));
        let geometry = vp.bar_geometry(&t).unwrap();
        assert_eq!(geometry.left, 120.0 * 100.0);
    }

    #[test]
    fn now_marker_only_inside_range() {
        let vp = viewport();
        assert_eq!(vp.now_marker_x(at(6, 30)), Some(650.0));
        assert_eq!(vp.now_marker_x(at(0, 0) - Duration::minutes(1)), None);
        assert_eq!(vp.now_marker_x(at(0, 0) + Duration::hours(25)), None);
    }

    #[test]
    fn navigation_moves_range() {
        let mut vp = viewport();
        vp.step(true);
        assert_eq!(vp.range_start, at(0, 0) + Duration::days(1));
        vp.set_view_mode(ViewMode::Week);
        vp.step(false);
        assert_eq!(vp.range_start, at(0, 0) - Duration::days(6));
        vp.go_to_today(day());
        assert_eq!(vp.range_start, at(0, 0));
    }

    #[test]
    fn layout_keeps_repository_rows() {
        let vp = viewport();
        let far = task(at(0, 0) + Duration::days(10), at(0, 0) + Duration::days(11));
        let near = task(at(9, 0), at(10, 0));
        let layout = vp.layout(&[far, near.clone()]);

        assert_eq!(layout.rows, 2);
        assert_eq!(layout.bars.len(), 1);
        assert_eq!(layout.bars[0].task_id, near.id);
        assert_eq!(layout.bars[0].row, 1);
        assert!(vp.layout(&[]).is_empty());
    }

    #[test]
    fn day_scale_labels_hours_and_flags_current() {
        let vp = viewport();
        let units = vp.scale_units(at(13, 45));
        assert_eq!(units.len(), 24);
        assert_eq!(units[13].label, "13:00");
        assert_eq!(units[13].x, 1300.0);
        let current: Vec<_> = units.iter().filter(|u| u.is_current).collect();
        assert_eq!(current.len(), 1);
    }

    #[test]
    fn week_scale_labels_days() {
        let mut vp = viewport();
        vp.set_view_mode(ViewMode::Week);
        let units = vp.scale_units(at(0, 0) + Duration::days(2));
        assert_eq!(units.len(), 7);
        assert_eq!(units[0].label, "01-15");
        assert_eq!(units[1].width, 2400.0);
        assert!(units[2].is_current);
    }

    #[test]
    fn ticks_mark_major_intervals() {
        let mut vp = viewport();
        let ticks = vp.ticks();
        assert_eq!(ticks.len(), 25);
        assert_eq!(ticks.iter().filter(|t| t.major).count(), 5);
        vp.set_view_mode(ViewMode::Week);
        let ticks = vp.ticks();
        assert_eq!(ticks.len(), 8);
        assert!(ticks.iter().all(|t| t.major));
    }
}
