//! Ticket reference extraction.
//!
//! Calendar events are linked to tracker tickets by writing a reference of
//! the form `#PROJ-123` in the event description or in the user's own
//! attendee note.
//!
//! # Example
//!
//! ```
//! use caljira_core::tag::extract_ticket_ids;
//!
//! let ids = extract_ticket_ids("Sprint planning #SLPDEV-42 and #OPS-7");
//! assert_eq!(ids, vec!["SLPDEV-42", "OPS-7"]);
//! ```

use std::sync::LazyLock;

use regex::Regex;

/// Regex for ticket references: `#`, a project key, `-`, an issue number.
static TICKET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#([A-Za-z]+-\d+)").expect("Invalid ticket regex"));

/// Extracts every ticket reference in `text`, in order of appearance.
///
/// The leading `#` is stripped. Duplicates are kept.
pub fn extract_ticket_ids(text: &str) -> Vec<String> {
    TICKET_REGEX
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}
