//! Identity resolution: name split, guessed address, dedup decision.

use byline_common::{name_key, Lead, Outlet};

use crate::ledger::LedgerSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Duplicate,
    Blacklisted,
}

/// A lead that survived dedup, with its fallback address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub first_name: String,
    pub last_name: String,
    pub guessed_email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Skip(SkipReason),
    Proceed(Identity),
}

/// Split an author name: first token, then the rest joined by single spaces.
pub fn split_name(author_name: &str) -> (String, String) {
    let mut tokens = author_name.split_whitespace();
    let first = tokens.next().unwrap_or_default().to_string();
    let last = tokens.collect::<Vec<_>>().join(" ");
    (first, last)
}

/// `<first initial>.<last name, spaces removed>@<domain>`, all lowercase.
///
/// Single-word names have no last name to pair the initial with, so the
/// whole first name becomes the local part: `cher@domain`.
pub fn guess_email(first_name: &str, last_name: &str, domain: &str) -> String {
    let last: String = last_name
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();

    if last.is_empty() {
        return format!("{}@{}", first_name.to_lowercase(), domain);
    }

    let initial: String = first_name.chars().take(1).collect::<String>().to_lowercase();
    format!("{initial}.{last}@{domain}")
}

/// Decide what to do with `lead`, marking the name known unless it was a duplicate.
pub fn resolve(lead: &Lead, outlet: &Outlet, snapshot: &mut LedgerSnapshot) -> Resolution {
    let key = name_key(&lead.author_name);
    if key.is_empty() || snapshot.is_known(&key) {
        return Resolution::Skip(SkipReason::Duplicate);
    }

    let (first_name, last_name) = split_name(&lead.author_name);
    let guessed_email = guess_email(&first_name, &last_name, &outlet.domain());

    snapshot.mark_known(key);

    if snapshot.is_blacklisted(&guessed_email) {
        return Resolution::Skip(SkipReason::Blacklisted);
    }

    Resolution::Proceed(Identity {
        first_name,
        last_name,
        guessed_email,
    })
}
