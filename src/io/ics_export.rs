use std::path::Path;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::error::ExportError;
use crate::model::task::{Task, TaskPriority};

const CRLF: &str = "\r\n";
const UID_DOMAIN: &str = "timelineplanner.local";

/// Export tasks as an iCalendar document, reading task times as local time.
pub fn export_all(tasks: &[Task]) -> Result<String, ExportError> {
    export_all_in(tasks, &Local, Utc::now())
}

/// Export tasks as an iCalendar document.
///
/// Task times are interpreted in `tz` and written as UTC. `stamp` becomes
/// every event's `DTSTAMP`.
pub fn export_all_in<Tz: TimeZone>(
    tasks: &[Task],
    tz: &Tz,
    stamp: DateTime<Utc>,
) -> Result<String, ExportError> {
    if tasks.is_empty() {
        return Err(ExportError::NoTasks);
    }

    let mut lines: Vec<String> = vec![
        "BEGIN:VCALENDAR".into(),
        "VERSION:2.0".into(),
        "PRODID:-//Timeline Planner//EN".into(),
        "CALSCALE:GREGORIAN".into(),
        "METHOD:PUBLISH".into(),
        "X-WR-CALNAME:Timeline Planner".into(),
    ];
    for task in tasks {
        push_event(&mut lines, task, tz, &stamp);
    }
    lines.push("END:VCALENDAR".into());

    let mut doc = lines.join(CRLF);
    doc.push_str(CRLF);
    Ok(doc)
}

fn push_event<Tz: TimeZone>(lines: &mut Vec<String>, task: &Task, tz: &Tz, stamp: &DateTime<Utc>) {
    lines.push("BEGIN:VEVENT".into());
    lines.push(format!("UID:{}@{}", task.id, UID_DOMAIN));
    lines.push(format!("DTSTAMP:{}", format_utc(stamp)));
    lines.push(format!("DTSTART:{}", format_utc(&to_utc(task.start, tz))));
    lines.push(format!("DTEND:{}", format_utc(&to_utc(task.end, tz))));
    lines.push(format!("SUMMARY:{}", escape_text(&task.name)));
    if let Some(description) = &task.description {
        lines.push(format!("DESCRIPTION:{}", escape_text(description)));
    }
    lines.push(format!("PRIORITY:{}", ics_priority(task.priority)));
    if !task.color.is_empty() {
        lines.push(format!("CATEGORIES:{}", task.priority.as_str()));
    }
    lines.push("STATUS:CONFIRMED".into());
    lines.push("END:VEVENT".into());
}

/// RFC 5545 priority: 1 is highest, 9 lowest.
pub fn ics_priority(priority: TaskPriority) -> u8 {
    match priority {
        TaskPriority::Urgent => 1,
        TaskPriority::High => 3,
        TaskPriority::Medium => 5,
        TaskPriority::Low => 9,
    }
}

/// Interpret a naive wall-clock time in `tz` and convert it to UTC.
///
/// Ambiguous times (DST fall-back) take the earlier instant; times that do
/// not exist (DST spring-forward gap) are read as if they were UTC.
pub fn to_utc<Tz: TimeZone>(time: NaiveDateTime, tz: &Tz) -> DateTime<Utc> {
    tz.from_local_datetime(&time)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&time))
}

/// `YYYYMMDDTHHMMSSZ`
pub fn format_utc(time: &DateTime<Utc>) -> String {
    time.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Escape backslash, semicolon, comma and newlines in a TEXT value.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            other => out.push(other),
        }
    }
    out
}

/// `timeline-tasks-YYYYMMDD.ics`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("timeline-tasks-{}.ics", date.format("%Y%m%d"))
}

/// Write an exported document to disk.
pub fn write_ics(contents: &str, path: &Path) -> Result<(), ExportError> {
    std::fs::write(path, contents).map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::TaskDraft;
    use chrono::FixedOffset;
    use pretty_assertions::assert_eq;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn stamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap()
    }

    fn standup() -> Task {
        let mut task = Task::from_draft(TaskDraft::new("Standup", at(9, 0), at(9, 30)));
        task.id = "abc123".into();
        task
    }

    #[test]
    fn empty_list_aborts() {
        assert!(matches!(
            export_all_in(&[], &Utc, stamp()),
            Err(ExportError::NoTasks)
        ));
    }

    #[test]
    fn single_event_block() {
        let doc = export_all_in(&[standup()], &Utc, stamp()).unwrap();
        let lines: Vec<&str> = doc.split("\r\n").collect();

        assert_eq!(
            lines,
            vec![
                "BEGIN:VCALENDAR",
                "VERSION:2.0",
                "PRODID:-//Timeline Planner//EN",
                "CALSCALE:GREGORIAN",
                "METHOD:PUBLISH",
                "X-WR-CALNAME:Timeline Planner",
                "BEGIN:VEVENT",
                "UID:abc123@timelineplanner.local",
                "DTSTAMP:20240110T080000Z",
                "DTSTART:20240115T090000Z",
                "DTEND:20240115T093000Z",
                "SUMMARY:Standup",
                "PRIORITY:5",
                "CATEGORIES:medium",
                "STATUS:CONFIRMED",
                "END:VEVENT",
                "END:VCALENDAR",
                "",
            ]
        );
    }

    #[test]
    fn local_times_are_converted_to_utc() {
        let tz = FixedOffset::east_opt(8 * 3600).unwrap();
        let doc = export_all_in(&[standup()], &tz, stamp()).unwrap();
        assert!(doc.contains("DTSTART:20240115T010000Z\r\n"));
        assert!(doc.contains("DTEND:20240115T013000Z\r\n"));
    }

    #[test]
    fn description_and_priority_are_written() {
        let mut task = standup();
        task.description = Some("Agenda: a, b; c\\d\nnext".into());
        task.priority = TaskPriority::Urgent;
        let doc = export_all_in(&[task], &Utc, stamp()).unwrap();

        assert!(doc.contains("DESCRIPTION:Agenda: a\\, b\\; c\\\\d\\nnext\r\n"));
        assert!(doc.contains("PRIORITY:1\r\n"));
        assert!(doc.contains("CATEGORIES:urgent\r\n"));
    }

    #[test]
    fn one_event_per_task() {
        let mut second = standup();
        second.id = "def456".into();
        let doc = export_all_in(&[standup(), second], &Utc, stamp()).unwrap();
        assert_eq!(doc.matches("BEGIN:VEVENT").count(), 2);
        assert!(doc.contains("UID:def456@timelineplanner.local"));
    }

    #[test]
    fn priority_mapping() {
        assert_eq!(ics_priority(TaskPriority::Urgent), 1);
        assert_eq!(ics_priority(TaskPriority::High), 3);
        assert_eq!(ics_priority(TaskPriority::Medium), 5);
        assert_eq!(ics_priority(TaskPriority::Low), 9);
    }

    #[test]
    fn file_name_uses_export_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(export_file_name(date), "timeline-tasks-20240307.ics");
    }

    #[test]
    fn writes_document_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.ics");
        write_ics("BEGIN:VCALENDAR\r\n", &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "BEGIN:VCALENDAR\r\n");
    }
}
