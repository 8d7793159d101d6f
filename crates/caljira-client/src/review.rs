//! Interactive review of worklog candidates.

use std::io;

use caljira_core::{InvalidLookback, LogEntry, LookbackDays, TaggedItem};
use caljira_providers::TrackerCredentials;
use tracing::debug;

use crate::prompt::{Prompter, strip_line_ending};

pub const LOOKBACK_PROMPT: &str = "How many days should I go back?: ";
pub const REVIEW_PROMPT: &str = "Do you want to review entries? [yes]/no: ";
pub const USERNAME_PROMPT: &str = "Please enter your JIRA username: ";
pub const PASSWORD_PROMPT: &str = "Please enter your JIRA password: ";
pub const INVALID_NUMBER: &str = "invalid number";

/// Parses the lookback answer.
pub fn parse_lookback(input: &str) -> Result<LookbackDays, InvalidLookback> {
    LookbackDays::parse(input)
}

/// Returns true for an empty answer or exactly `yes`.
pub fn parse_yes(input: &str) -> bool {
    matches!(strip_line_ending(input), "" | "yes")
}

/// Asks how far back to look. Invalid answers fall back to the default.
pub fn ask_lookback(prompter: &mut dyn Prompter) -> io::Result<LookbackDays> {
    let answer = prompter.ask(LOOKBACK_PROMPT)?;
    match parse_lookback(&answer) {
        Ok(days) => Ok(days),
        Err(e) => {
            debug!("{}", e);
            prompter.say(INVALID_NUMBER)?;
            Ok(LookbackDays::DEFAULT)
        }
    }
}

/// Asks whether each entry should be confirmed before submission.
pub fn ask_review(prompter: &mut dyn Prompter) -> io::Result<bool> {
    Ok(parse_yes(&prompter.ask(REVIEW_PROMPT)?))
}

/// The per-item confirmation question.
pub fn confirmation_prompt(entry: &LogEntry) -> String {
    format!(
        "Log {} minutes against {} for \"{}\"? [yes]/no: ",
        entry.minutes, entry.ticket_id, entry.summary
    )
}

/// Turns tagged items into log entries, asking for each one when `review` is on.
///
/// Declined items are dropped. Order is kept.
pub fn review_items(
    items: &[TaggedItem],
    review: bool,
    prompter: &mut dyn Prompter,
) -> io::Result<Vec<LogEntry>> {
    let mut accepted = Vec::with_capacity(items.len());
    for item in items {
        let entry = item.to_log_entry();
        if review && !parse_yes(&prompter.ask(&confirmation_prompt(&entry))?) {
            debug!("skipping {} for {:?}", entry.ticket_id, entry.summary);
            continue;
        }
        accepted.push(entry);
    }
    Ok(accepted)
}

/// Asks for whichever tracker credentials are not configured.
pub fn collect_credentials(
    prompter: &mut dyn Prompter,
    username: Option<String>,
    password: Option<String>,
) -> io::Result<TrackerCredentials> {
    let username = match username {
        Some(u) => u,
        None => prompter.ask(USERNAME_PROMPT)?,
    };
    let password = match password {
        Some(p) => p,
        None => prompter.ask_masked(PASSWORD_PROMPT)?,
    };
    Ok(TrackerCredentials::new(username, password))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompter;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, minute, 0).unwrap()
    }

    fn item(ticket: &str, summary: &str, minutes: i64) -> TaggedItem {
        let start = at(10, 0);
        TaggedItem::new(
            format!("ev-{}", ticket),
            summary,
            start,
            start + chrono::Duration::minutes(minutes),
            vec![ticket.to_string()],
        )
        .unwrap()
    }

    #[test]
    fn lookback_answers() {
        assert_eq!(parse_lookback("14").unwrap().get(), 14);
        assert_eq!(parse_lookback("1").unwrap().get(), 1);
        assert_eq!(parse_lookback("40").unwrap().get(), 40);
        assert!(parse_lookback("0").is_err());
        assert!(parse_lookback("41").is_err());
        assert!(parse_lookback("abc").is_err());
        assert!(parse_lookback("").is_err());
    }

    #[test]
    fn invalid_lookback_reports_and_defaults() {
        let mut prompter = ScriptedPrompter::new(["99"]);
        let days = ask_lookback(&mut prompter).unwrap();
        assert_eq!(days, LookbackDays::DEFAULT);
        assert_eq!(prompter.questions, vec![LOOKBACK_PROMPT]);
        assert_eq!(prompter.messages, vec![INVALID_NUMBER]);

        let mut prompter = ScriptedPrompter::new(["3"]);
        assert_eq!(ask_lookback(&mut prompter).unwrap().get(), 3);
        assert!(prompter.messages.is_empty());
    }

    #[test]
    fn yes_answers() {
        assert!(parse_yes(""));
        assert!(parse_yes("yes"));
        assert!(parse_yes("yes\n"));
        assert!(parse_yes("yes\r\n"));
        assert!(!parse_yes("no"));
        assert!(!parse_yes("y"));
        assert!(!parse_yes("YES"));
        assert!(!parse_yes(" yes"));
    }

    #[test]
    fn review_drops_declined_items() {
        let items = vec![
            item("A-1", "first", 30),
            item("B-2", "second", 45),
            item("C-3", "third", 90),
        ];
        let mut prompter = ScriptedPrompter::new(["", "no", "yes"]);
        let entries = review_items(&items, true, &mut prompter).unwrap();

        let tickets: Vec<_> = entries.iter().map(|e| e.ticket_id.as_str()).collect();
        assert_eq!(tickets, vec!["A-1", "C-3"]);
        assert_eq!(
            prompter.questions[0],
            "Log 30 minutes against A-1 for \"first\"? [yes]/no: "
        );
        assert_eq!(prompter.questions.len(), 3);
    }

    #[test]
    fn fractional_minutes_are_shown_as_is() {
        let start = at(10, 0);
        let half = TaggedItem::new(
            "ev",
            "short",
            start,
            start + chrono::Duration::seconds(90),
            vec!["A-1".to_string()],
        )
        .unwrap();
        assert_eq!(
            confirmation_prompt(&half.to_log_entry()),
            "Log 1.5 minutes against A-1 for \"short\"? [yes]/no: "
        );
    }

    #[test]
    fn no_review_accepts_everything_silently() {
        let items = vec![item("A-1", "first", 30), item("B-2", "second", 45)];
        let mut prompter = ScriptedPrompter::default();
        let entries = review_items(&items, false, &mut prompter).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(prompter.questions.is_empty());
    }

    #[test]
    fn review_uses_first_ticket() {
        let start = at(10, 0);
        let multi = TaggedItem::new(
            "ev",
            "pairing",
            start,
            start + chrono::Duration::minutes(60),
            vec!["A-1".to_string(), "B-2".to_string()],
        )
        .unwrap();
        let entries = review_items(&[multi], false, &mut ScriptedPrompter::default()).unwrap();
        assert_eq!(entries[0].ticket_id, "A-1");
        assert_eq!(entries[0].minutes, 60.0);
    }

    #[test]
    fn credentials_prompt_username_then_masked_password() {
        let mut prompter = ScriptedPrompter::new(["alice", "hunter2"]);
        let creds = collect_credentials(&mut prompter, None, None).unwrap();
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.password(), "hunter2");
        assert_eq!(prompter.questions, vec![USERNAME_PROMPT, PASSWORD_PROMPT]);
        assert_eq!(prompter.masked, vec![false, true]);
    }

    #[test]
    fn configured_credentials_skip_prompts() {
        let mut prompter = ScriptedPrompter::new(["s3cret"]);
        let creds = collect_credentials(&mut prompter, Some("bob".to_string()), None).unwrap();
        assert_eq!(creds.username, "bob");
        assert_eq!(creds.password(), "s3cret");
        assert_eq!(prompter.questions, vec![PASSWORD_PROMPT]);

        let mut prompter = ScriptedPrompter::default();
        collect_credentials(
            &mut prompter,
            Some("bob".to_string()),
            Some("pw".to_string()),
        )
        .unwrap();
        assert!(prompter.questions.is_empty());
    }
}
