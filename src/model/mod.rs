pub mod gesture;
pub mod repository;
pub mod task;
pub mod timeline;

pub use gesture::{GestureState, ResizeEdge};
pub use repository::{TaskChange, TaskRepository};
pub use task::{Task, TaskDraft, TaskId, TaskPatch, TaskPriority};
pub use timeline::{TimelineLayout, TimelineViewport, ViewMode};
