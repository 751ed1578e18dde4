pub mod dialogs;
pub mod task_form;
pub mod task_list;
pub mod theme;
pub mod timeline_view;
pub mod toolbar;
