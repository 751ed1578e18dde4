//! Pointer gestures on task bars, translated into interval patches.
//!
//! Only one gesture is active at a time. A move is measured from the press
//! position, so the bar tracks the pointer exactly. A resize is measured
//! incrementally: the anchor resets after every accepted step.

use chrono::{Duration, NaiveDateTime};

use super::task::{duration_from_hours, Task, TaskId, TaskPatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeEdge {
    Start,
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    Move {
        task_id: TaskId,
        anchor_x: f32,
        original_start: NaiveDateTime,
    },
    Resize {
        task_id: TaskId,
        edge: ResizeEdge,
        anchor_x: f32,
    },
}

impl Gesture {
    pub fn task_id(&self) -> &str {
        match self {
            Gesture::Move { task_id, .. } | Gesture::Resize { task_id, .. } => task_id,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GestureState {
    active: Option<Gesture>,
}

impl GestureState {
    pub fn active(&self) -> Option<&Gesture> {
        self.active.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Begin moving `task`. Ignored while another gesture is in progress.
    pub fn begin_move(&mut self, task: &Task, pointer_x: f32) -> bool {
        if self.active.is_some() {
            return false;
        }
        self.active = Some(Gesture::Move {
            task_id: task.id.clone(),
            anchor_x: pointer_x,
            original_start: task.start,
        });
        true
    }

    /// Begin resizing one edge of `task`. Ignored while another gesture is in progress.
    pub fn begin_resize(&mut self, task: &Task, edge: ResizeEdge, pointer_x: f32) -> bool {
        if self.active.is_some() {
            return false;
        }
        self.active = Some(Gesture::Resize {
            task_id: task.id.clone(),
            edge,
            anchor_x: pointer_x,
        });
        true
    }

    /// Translate a pointer position into an interval patch for `task`.
    ///
    /// Returns `None` when nothing should change: no active gesture for this
    /// task, zero movement, or a resize that would leave `start >= end`.
    pub fn pointer_moved(&mut self, pointer_x: f32, task: &Task, pixels_per_hour: f32) -> Option<TaskPatch> {
        let gesture = self.active.as_mut()?;
        if gesture.task_id() != task.id || pixels_per_hour <= 0.0 {
            return None;
        }

        match gesture {
            Gesture::Move {
                anchor_x,
                original_start,
                ..
            } => {
                let delta_hours = ((pointer_x - *anchor_x) / pixels_per_hour) as f64;
                let new_start = *original_start + duration_from_hours(delta_hours);
                if new_start == task.start {
                    return None;
                }
                let new_end = new_start + task.duration();
                Some(TaskPatch::interval(new_start, new_end))
            }
            Gesture::Resize { edge, anchor_x, .. } => {
                let delta_hours = ((pointer_x - *anchor_x) / pixels_per_hour) as f64;
                let delta = duration_from_hours(delta_hours);
                if delta == Duration::zero() {
                    return None;
                }
                let patch = match edge {
                    ResizeEdge::Start => {
                        let new_start = task.start + delta;
                        if new_start >= task.end {
                            return None;
                        }
                        TaskPatch::start(new_start)
                    }
                    ResizeEdge::End => {
                        let new_end = task.end + delta;
                        if new_end <= task.start {
                            return None;
                        }
                        TaskPatch::end(new_end)
                    }
                };
                *anchor_x = pointer_x;
                Some(patch)
            }
        }
    }

    /// Pointer released: the only way a gesture ends.
    pub fn release(&mut self) -> Option<Gesture> {
        self.active.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::TaskDraft;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    const PPH: f32 = 100.0;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn task() -> Task {
        Task::from_draft(TaskDraft::new("t", at(9, 0), at(10, 0)))
    }

    #[test]
    fn move_shifts_both_ends_and_keeps_duration() {
        let mut t = task();
        let mut gestures = GestureState::default();
        assert!(gestures.begin_move(&t, 500.0));

        let patch = gestures.pointer_moved(650.0, &t, PPH).unwrap();
        assert_eq!(patch, TaskPatch::interval(at(10, 30), at(11, 30)));
        t.apply(patch);

        // Cumulative from the press, not from the last step.
        let patch = gestures.pointer_moved(450.0, &t, PPH).unwrap();
        assert_eq!(patch, TaskPatch::interval(at(8, 30), at(9, 30)));
    }

    #[test]
    fn move_without_motion_produces_nothing() {
        let t = task();
        let mut gestures = GestureState::default();
        gestures.begin_move(&t, 500.0);
        assert_eq!(gestures.pointer_moved(500.0, &t, PPH), None);
    }

    #[test]
    fn resize_end_is_incremental() {
        let mut t = task();
        let mut gestures = GestureState::default();
        gestures.begin_resize(&t, ResizeEdge::End, 1000.0);

        let patch = gestures.pointer_moved(1050.0, &t, PPH).unwrap();
        assert_eq!(patch, TaskPatch::end(at(10, 30)));
        t.apply(patch);

        let patch = gestures.pointer_moved(1100.0, &t, PPH).unwrap();
        assert_eq!(patch, TaskPatch::end(at(11, 0)));
        t.apply(patch);
        assert_eq!(t.start, at(9, 0));
    }

    #[test]
    fn resize_start_past_end_is_rejected() {
        let t = task();
        let mut gestures = GestureState::default();
        gestures.begin_resize(&t, ResizeEdge::Start, 900.0);

        assert_eq!(gestures.pointer_moved(1000.0, &t, PPH), None);
        assert_eq!(gestures.pointer_moved(1100.0, &t, PPH), None);
        // Anchor did not move, so a smaller step from the press still applies.
        let patch = gestures.pointer_moved(930.0, &t, PPH).unwrap();
        assert_eq!(patch, TaskPatch::start(at(9, 18)));
    }

    #[test]
    fn resize_end_before_start_is_rejected() {
        let t = task();
        let mut gestures = GestureState::default();
        gestures.begin_resize(&t, ResizeEdge::End, 1000.0);
        assert_eq!(gestures.pointer_moved(890.0, &t, PPH), None);
        assert_eq!(gestures.pointer_moved(900.0, &t, PPH), None);
    }

    #[test]
    fn gestures_are_mutually_exclusive() {
        let t = task();
        let other = Task::from_draft(TaskDraft::new("o", at(12, 0), at(13, 0)));
        let mut gestures = GestureState::default();
        assert!(gestures.begin_move(&t, 0.0));
        assert!(!gestures.begin_resize(&t, ResizeEdge::End, 0.0));
        assert!(!gestures.begin_move(&other, 0.0));

        // Moving the pointer over another task does not touch it.
        assert_eq!(gestures.pointer_moved(100.0, &other, PPH), None);

        let ended = gestures.release().unwrap();
        assert_eq!(ended.task_id(), t.id);
        assert!(!gestures.is_active());
        assert_eq!(gestures.pointer_moved(100.0, &t, PPH), None);
    }

    #[test]
    fn fractional_pixels_land_on_whole_seconds() {
        use chrono::Timelike;

        let t = task();
        let mut gestures = GestureState::default();
        gestures.begin_move(&t, 100.0);
        let patch = gestures.pointer_moved(137.3, &t, PPH).unwrap();
        let start = patch.start.unwrap();
        assert_eq!(start.nanosecond(), 0);
        assert_eq!(start, at(9, 22) + Duration::seconds(23));
    }

    #[test]
    fn move_respects_zoom() {
        let t = task();
        let mut gestures = GestureState::default();
        gestures.begin_move(&t, 0.0);
        let patch = gestures.pointer_moved(100.0, &t, 200.0).unwrap();
        assert_eq!(patch.start, Some(at(9, 0) + Duration::minutes(30)));
    }
}
