use chrono::{Local, TimeZone};
use url::Url;

use super::ics_export::{format_utc, to_utc};
use crate::model::task::Task;

const RENDER_URL: &str = "https://calendar.google.com/calendar/render";

/// Google Calendar "add event" link for a task, reading its times as local time.
pub fn build_google_calendar_link(task: &Task) -> String {
    build_google_calendar_link_in(task, &Local)
}

pub fn build_google_calendar_link_in<Tz: TimeZone>(task: &Task, tz: &Tz) -> String {
    let dates = format!(
        "{}/{}",
        format_utc(&to_utc(task.start, tz)),
        format_utc(&to_utc(task.end, tz))
    );
    let params = [
        ("action", "TEMPLATE"),
        ("text", task.name.as_str()),
        ("dates", dates.as_str()),
        ("details", task.description.as_deref().unwrap_or("")),
        ("location", ""),
    ];
    match Url::parse_with_params(RENDER_URL, &params) {
        Ok(url) => url.into(),
        Err(e) => {
            log::error!("failed to build calendar link: {}", e);
            RENDER_URL.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::TaskDraft;
    use chrono::{NaiveDate, Utc};
    use pretty_assertions::assert_eq;

    fn task() -> Task {
        let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        Task::from_draft(
            TaskDraft::new(
                "Team sync & planning",
                day.and_hms_opt(9, 0, 0).unwrap(),
                day.and_hms_opt(9, 30, 0).unwrap(),
            )
            .with_description("Room 4"),
        )
    }

    #[test]
    fn link_encodes_all_parameters() {
        let link = build_google_calendar_link_in(&task(), &Utc);
        assert_eq!(
            link,
            "https://calendar.google.com/calendar/render?action=TEMPLATE\
             &text=Team+sync+%26+planning\
             &dates=20240115T090000Z%2F20240115T093000Z\
             &details=Room+4\
             &location="
        );
    }

    #[test]
    fn missing_description_is_empty_details() {
        let mut t = task();
        t.description = None;
        let link = build_google_calendar_link_in(&t, &Utc);
        let url = Url::parse(&link).unwrap();
        let details: Vec<_> = url
            .query_pairs()
            .filter(|(k, _)| k == "details")
            .map(|(_, v)| v.into_owned())
            .collect();
        assert_eq!(details, vec![String::new()]);
    }
}
