use std::fmt;
use std::str::FromStr;

// --- Editions ---

/// Blacklist file shared by every edition.
pub const BLACKLIST_FILE: &str = "blacklist_emails.txt";

/// Regional edition. Selects the outlet catalogue, ledger files and sheet tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Edition {
    #[default]
    Canada,
    UnitedKingdom,
}

/// Which record column receives an outlet's region tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationColumn {
    City,
    Region,
}

impl Edition {
    pub fn slug(&self) -> &'static str {
        match self {
            Edition::Canada => "ca",
            Edition::UnitedKingdom => "uk",
        }
    }

    pub fn country(&self) -> &'static str {
        match self {
            Edition::Canada => "Canada",
            Edition::UnitedKingdom => "UK",
        }
    }

    pub fn verified_file(&self) -> &'static str {
        match self {
            Edition::Canada => "master_journalist_list.csv",
            Edition::UnitedKingdom => "master_list_uk.csv",
        }
    }

    pub fn pending_file(&self) -> &'static str {
        match self {
            Edition::Canada => "pending_verification.csv",
            Edition::UnitedKingdom => "pending_verification_uk.csv",
        }
    }

    /// Worksheet (tab) that mirrors the verified ledger.
    pub fn worksheet(&self) -> &'static str {
        match self {
            Edition::Canada => "master_list",
            Edition::UnitedKingdom => "master_list_uk",
        }
    }

    pub fn location_column(&self) -> LocationColumn {
        match self {
            Edition::Canada => LocationColumn::Region,
            Edition::UnitedKingdom => LocationColumn::City,
        }
    }
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Edition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ca" | "canada" => Ok(Edition::Canada),
            "uk" | "gb" | "united-kingdom" => Ok(Edition::UnitedKingdom),
            other => Err(format!("unknown edition: {other} (expected ca or uk)")),
        }
    }
}

// --- Outlets ---

/// A news outlet in the source registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outlet {
    pub name: String,
    pub base_url: String,
    pub region: String,
    pub feed_url: String,
}

impl Outlet {
    pub fn new(name: &str, base_url: &str, region: &str, feed_url: &str) -> Self {
        Self {
            name: name.to_string(),
            base_url: base_url.to_string(),
            region: region.to_string(),
            feed_url: feed_url.to_string(),
        }
    }

    /// Bare mail domain for guessed addresses, e.g. `example.com`.
    pub fn domain(&self) -> String {
        bare_domain(&self.base_url)
    }
}

/// Strip scheme, path and a leading `www.` from a URL.
pub fn bare_domain(base_url: &str) -> String {
    let host = match url::Url::parse(base_url) {
        Ok(parsed) => parsed.host_str().map(str::to_string),
        Err(_) => None,
    }
    .unwrap_or_else(|| {
        let without_scheme = base_url
            .split_once("://")
            .map_or(base_url, |(_, rest)| rest);
        without_scheme
            .split('/')
            .next()
            .unwrap_or_default()
            .to_string()
    });

    let host = host.to_ascii_lowercase();
    host.strip_prefix("www.").map(str::to_string).unwrap_or(host)
}

// --- Leads ---

/// A candidate (author, article) pair pulled from a feed item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lead {
    pub author_name: String,
    pub article_url: String,
    pub article_title: String,
}

/// Dedup key for a person: lowercase, whitespace collapsed to single spaces.
pub fn name_key(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

// --- Journalist records ---

/// One row of the verified or pending ledger.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JournalistRecord {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub city: String,
    pub region: String,
    pub country: String,
    pub phone: String,
    pub outlet_name: String,
    pub title: String,
    pub topics: String,
    pub social_handle: String,
    pub source_url: String,
}

impl JournalistRecord {
    /// Persisted column header, in row order.
    pub const COLUMNS: [&'static str; 12] = [
        "First_Name",
        "Last_Name",
        "Email",
        "City",
        "State",
        "Country",
        "phone",
        "publications",
        "title",
        "topics",
        "twitter",
        "source_url",
    ];

    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.first_name.clone(),
            self.last_name.clone(),
            self.email.clone(),
            self.city.clone(),
            self.region.clone(),
            self.country.clone(),
            self.phone.clone(),
            self.outlet_name.clone(),
            self.title.clone(),
            self.topics.clone(),
            self.social_handle.clone(),
            self.source_url.clone(),
        ]
    }

    /// Build a record from a stored row. Missing trailing fields read as empty.
    /// Returns `None` when the row has no email.
    pub fn from_row<'a>(fields: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        let mut it = fields.into_iter().map(|f| f.trim().to_string());
        let mut next = || it.next().unwrap_or_default();

        let record = Self {
            first_name: next(),
            last_name: next(),
            email: next(),
            city: next(),
            region: next(),
            country: next(),
            phone: next(),
            outlet_name: next(),
            title: next(),
            topics: next(),
            social_handle: next(),
            source_url: next(),
        };

        if record.email.is_empty() {
            return None;
        }
        Some(record)
    }
}

// --- Verification ---

/// Definitive answer from the email-verification service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Invalid,
    Unknown,
    Risky,
}

impl Verdict {
    /// Map the service's `result` string. Unrecognised values count as unknown.
    pub fn parse(result: &str) -> Self {
        match result.trim().to_ascii_lowercase().as_str() {
            "valid" => Verdict::Valid,
            "invalid" => Verdict::Invalid,
            "risky" => Verdict::Risky,
            _ => Verdict::Unknown,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::Valid => "valid",
            Verdict::Invalid => "invalid",
            Verdict::Unknown => "unknown",
            Verdict::Risky => "risky",
        };
        f.write_str(s)
    }
}
