pub mod google_calendar;
pub mod ics_export;
pub mod store;

pub use google_calendar::build_google_calendar_link;
pub use ics_export::{export_all, export_file_name, write_ics};
pub use store::{FileStore, Store};
