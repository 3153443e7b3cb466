use crate::core::plan::RoutineItem;
use chrono::{DateTime, Days, Local, NaiveTime};

const PRODID: &str = "-//lifecoach//coaching routine//EN";
/// RFC 5545 content lines should stay within 75 octets; fold at char
/// boundaries so multi-byte text never splits mid-codepoint.
const FOLD_OCTETS: usize = 75;

/// Render routine items as an iCalendar document. Every event lands on the
/// local calendar day after `generated_at`, at the item's `HH:MM` start.
/// Items whose time does not parse are dropped individually; one bad entry
/// never sinks the export.
pub fn export_routine(items: &[RoutineItem], generated_at: DateTime<Local>) -> String {
    let day = generated_at.date_naive() + Days::new(1);
    let stamp = generated_at
        .with_timezone(&chrono::Utc)
        .format("%Y%m%dT%H%M%SZ")
        .to_string();

    let mut out = String::new();
    push_line(&mut out, "BEGIN:VCALENDAR");
    push_line(&mut out, "VERSION:2.0");
    push_line(&mut out, &format!("PRODID:{PRODID}"));

    for (index, item) in items.iter().enumerate() {
        let Some(start) = parse_start_time(&item.time) else {
            tracing::warn!(
                activity = %item.activity,
                time = %item.time,
                "dropping routine item with unparseable start time"
            );
            continue;
        };

        let begin = day.and_time(start);
        push_line(&mut out, "BEGIN:VEVENT");
        push_line(
            &mut out,
            &format!("UID:{}-{index}@lifecoach", day.format("%Y%m%d")),
        );
        push_line(&mut out, &format!("DTSTAMP:{stamp}"));
        push_line(&mut out, &format!("DTSTART:{}", begin.format("%Y%m%dT%H%M%S")));
        push_line(&mut out, &format!("DURATION:PT{}M", item.duration_or_default()));
        push_line(&mut out, &format!("SUMMARY:{}", escape_text(&item.activity)));
        if !item.notes.is_empty() {
            push_line(&mut out, &format!("DESCRIPTION:{}", escape_text(&item.notes)));
        }
        push_line(&mut out, "END:VEVENT");
    }

    push_line(&mut out, "END:VCALENDAR");
    out
}

fn parse_start_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").ok()
}

/// TEXT escaping per RFC 5545 §3.3.11.
fn escape_text(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Append a content line with CRLF termination, folding over-long lines onto
/// space-prefixed continuations.
fn push_line(out: &mut String, line: &str) {
    let mut budget = FOLD_OCTETS;
    let mut used = 0;
    for c in line.chars() {
        let octets = c.len_utf8();
        if used + octets > budget {
            out.push_str("\r\n ");
            budget = FOLD_OCTETS - 1;
            used = 0;
        }
        out.push(c);
        used += octets;
    }
    out.push_str("\r\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(activity: &str, time: &str, duration_minutes: Option<u32>, notes: &str) -> RoutineItem {
        RoutineItem {
            activity: activity.to_string(),
            time: time.to_string(),
            duration_minutes,
            notes: notes.to_string(),
        }
    }

    fn generated_at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 8, 6, 21, 30, 0).unwrap()
    }

    #[test]
    fn event_lands_on_the_day_after_generation() {
        let ics = export_routine(&[item("Meditate", "07:00", Some(10), "")], generated_at());

        assert!(ics.contains("DTSTART:20260807T070000\r\n"));
        assert!(ics.contains("DURATION:PT10M\r\n"));
        assert!(ics.contains("SUMMARY:Meditate\r\n"));
    }

    #[test]
    fn unparseable_time_drops_only_that_item() {
        let ics = export_routine(
            &[
                item("명상", "07:00", Some(10), "호흡에 집중"),
                item("독서", "sometime", Some(20), ""),
                item("운동", "18:30", None, ""),
            ],
            generated_at(),
        );

        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 2);
        assert!(ics.contains("DTSTART:20260807T183000\r\n"));
        assert!(!ics.contains("독서"));
    }

    #[test]
    fn missing_duration_defaults_to_thirty_minutes() {
        let ics = export_routine(&[item("산책", "12:00", None, "")], generated_at());
        assert!(ics.contains("DURATION:PT30M\r\n"));
    }

    #[test]
    fn text_fields_are_escaped() {
        let ics = export_routine(
            &[item("Plan; review, reset", "09:00", Some(15), "first\nsecond")],
            generated_at(),
        );

        assert!(ics.contains("SUMMARY:Plan\\; review\\, reset\r\n"));
        assert!(ics.contains("DESCRIPTION:first\\nsecond\r\n"));
    }

    #[test]
    fn document_is_wrapped_in_a_calendar_envelope() {
        let ics = export_routine(&[], generated_at());
        assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"));
        assert!(ics.ends_with("END:VCALENDAR\r\n"));
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 0);
    }

    #[test]
    fn long_lines_fold_onto_continuations() {
        let notes = "a".repeat(200);
        let ics = export_routine(&[item("Deep work", "10:00", Some(90), &notes)], generated_at());

        let folded = ics
            .lines()
            .any(|line| line.starts_with(' ') && line.trim_start().starts_with('a'));
        assert!(folded, "expected a folded continuation line");
    }
}
