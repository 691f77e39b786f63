//! Lead extraction: feed payload in, one [`Lead`] per (author, article) out.

use std::sync::LazyLock;

use feed_rs::model::{Entry, Person};
use feed_rs::parser::ParseFeedError;
use regex::Regex;

use byline_common::Lead;

/// Bylines join names with commas or a whitespace-delimited "and".
static AUTHOR_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*,\s*|\s+and\s+").expect("valid author separator regex"));

/// Split a byline such as `"A, B and C"` into individual names.
pub fn split_authors(byline: &str) -> Vec<String> {
    AUTHOR_SEPARATOR
        .split(byline.trim())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}

/// Parse a feed and yield its leads in feed order.
///
/// Items without an author, a link or a title yield nothing. Pure: no I/O
/// beyond reading `payload`.
pub fn extract_leads(payload: &[u8]) -> Result<impl Iterator<Item = Lead>, ParseFeedError> {
    let feed = feed_rs::parser::parse(payload)?;
    Ok(feed.entries.into_iter().flat_map(leads_for_entry))
}

fn leads_for_entry(entry: Entry) -> Vec<Lead> {
    let link = entry
        .links
        .first()
        .map(|l| l.href.trim().to_string())
        .filter(|href| !href.is_empty());
    let title = entry
        .title
        .as_ref()
        .map(|t| t.content.trim().to_string())
        .filter(|t| !t.is_empty());

    let (Some(article_url), Some(article_title)) = (link, title) else {
        return Vec::new();
    };

    bylines(&entry.authors)
        .into_iter()
        .flat_map(split_authors)
        .map(|author_name| Lead {
            author_name,
            article_url: article_url.clone(),
            article_title: article_title.clone(),
        })
        .collect()
}

/// feed-rs files RSS `<author>` as a person literally named "author" with the
/// element text in `email`. Named people (`dc:creator`, Atom) win over those.
const RSS_AUTHOR_ROLE: &str = "author";

fn bylines(authors: &[Person]) -> Vec<&str> {
    let (contacts, named): (Vec<&Person>, Vec<&Person>) = authors
        .iter()
        .partition(|person| person.name == RSS_AUTHOR_ROLE && person.email.is_some());

    if !named.is_empty() {
        return named.iter().map(|person| person.name.as_str()).collect();
    }
    contacts
        .iter()
        .filter_map(|person| person.email.as_deref())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rss(items: &str) -> Vec<u8> {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel>
    <title>News Example</title>
    <link>https://news.example/</link>
    <description>Latest</description>
    {items}
  </channel>
</rss>"#
        )
        .into_bytes()
    }

    #[test]
    fn splits_commas_and_conjunction() {
        assert_eq!(
            split_authors("Jane Doe, John Smith and Ana Lopez"),
            vec!["Jane Doe", "John Smith", "Ana Lopez"]
        );
    }

    #[test]
    fn conjunction_is_case_insensitive_and_needs_whitespace() {
        assert_eq!(split_authors("Jane Doe AND John Smith"), vec!["Jane Doe", "John Smith"]);
        assert_eq!(split_authors("Sandra Anderson"), vec!["Sandra Anderson"]);
    }

    #[test]
    fn blank_names_are_dropped() {
        assert_eq!(split_authors("Jane Doe, ,  "), vec!["Jane Doe"]);
        assert!(split_authors("   ").is_empty());
    }

    #[test]
    fn multi_author_item_yields_one_lead_per_author() {
        let payload = rss(
            r#"<item>
                 <title>Story</title>
                 <link>https://news.example/a1</link>
                 <dc:creator>A Writer, B Writer and C Writer</dc:creator>
               </item>"#,
        );

        let leads: Vec<Lead> = extract_leads(&payload).unwrap().collect();
        let names: Vec<&str> = leads.iter().map(|l| l.author_name.as_str()).collect();
        assert_eq!(names, vec!["A Writer", "B Writer", "C Writer"]);
        assert!(leads.iter().all(|l| l.article_url == "https://news.example/a1"));
        assert!(leads.iter().all(|l| l.article_title == "Story"));
    }

    #[test]
    fn items_missing_author_link_or_title_are_skipped() {
        let payload = rss(
            r#"<item>
                 <title>No byline</title>
                 <link>https://news.example/a1</link>
               </item>
               <item>
                 <link>https://news.example/a2</link>
                 <dc:creator>Jane Doe</dc:creator>
               </item>
               <item>
                 <title>Kept</title>
                 <link>https://news.example/a3</link>
                 <dc:creator>John Smith</dc:creator>
               </item>"#,
        );

        let leads: Vec<Lead> = extract_leads(&payload).unwrap().collect();
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].author_name, "John Smith");
        assert_eq!(leads[0].article_url, "https://news.example/a3");
    }

    #[test]
    fn leads_follow_feed_order() {
        let payload = rss(
            r#"<item>
                 <title>First</title>
                 <link>https://news.example/1</link>
                 <dc:creator>Jane Doe</dc:creator>
               </item>
               <item>
                 <title>Second</title>
                 <link>https://news.example/2</link>
                 <dc:creator>John Smith</dc:creator>
               </item>"#,
        );

        let titles: Vec<String> = extract_leads(&payload)
            .unwrap()
            .map(|l| l.article_title)
            .collect();
        assert_eq!(titles, vec!["First", "Second"]);
    }

    #[test]
    fn rss_author_element_is_read_as_a_byline() {
        let payload = rss(
            r#"<item>
                 <title>Story</title>
                 <link>https://news.example/a1</link>
                 <author>Jane Doe and John Smith</author>
               </item>"#,
        );

        let names: Vec<String> = extract_leads(&payload)
            .unwrap()
            .map(|l| l.author_name)
            .collect();
        assert_eq!(names, vec!["Jane Doe", "John Smith"]);
    }

    #[test]
    fn dc_creator_wins_over_rss_author() {
        let payload = rss(
            r#"<item>
                 <title>Story</title>
                 <link>https://news.example/a1</link>
                 <dc:creator>Jane Doe</dc:creator>
                 <author>desk@news.example (News Desk)</author>
               </item>"#,
        );

        let names: Vec<String> = extract_leads(&payload)
            .unwrap()
            .map(|l| l.author_name)
            .collect();
        assert_eq!(names, vec!["Jane Doe"]);
    }

    #[test]
    fn atom_authors_are_read() {
        let payload = br#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom News</title>
  <id>urn:uuid:60a76c80-d399-11d9-b93C-0003939e0af6</id>
  <updated>2024-01-01T00:00:00Z</updated>
  <entry>
    <title>Atom Story</title>
    <link href="https://atom.example/s1"/>
    <id>urn:uuid:1225c695-cfb8-4ebb-aaaa-80da344efa6a</id>
    <updated>2024-01-01T00:00:00Z</updated>
    <author><name>Jane Doe and John Smith</name></author>
  </entry>
</feed>"#;

        let leads: Vec<Lead> = extract_leads(payload).unwrap().collect();
        assert_eq!(leads.len(), 2);
        assert_eq!(leads[1].author_name, "John Smith");
        assert_eq!(leads[1].article_url, "https://atom.example/s1");
    }

    #[test]
    fn garbage_payload_is_a_parse_error() {
        assert!(extract_leads(b"<html><body>not a feed</body></html>").is_err());
    }
}
