use crate::error::{ContribError, Result};
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;
use std::path::PathBuf;

pub const SCHEMA_VERSION: u32 = 1;

pub const TOTAL_ROW: &str = "[total]";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySelection {
    pub path: PathBuf,
    pub included: bool,
}

impl RepositorySelection {
    pub fn included(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            included: true,
        }
    }

    pub fn display_name(&self) -> String {
        self.path.display().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorGroup {
    pub display_name: String,
    pub aliases: Vec<String>,
}

impl AuthorGroup {
    pub fn new(aliases: Vec<String>) -> Option<Self> {
        let display_name = aliases.first()?.clone();
        Some(Self {
            display_name,
            aliases,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub since: NaiveDate,
    pub until: NaiveDate,
}

impl DateWindow {
    pub fn parse(since: &str, until: &str) -> Result<Self> {
        let since_input = since.trim();
        let since = parse_day(since_input).ok_or_else(|| {
            ContribError::Config(format!(
                "Invalid since date '{since_input}': expected YYYY-MM-DD"
            ))
        })?;

        let until_input = until.trim();
        let until = if until_input.is_empty() {
            Local::now().date_naive()
        } else {
            parse_day(until_input).ok_or_else(|| {
                ContribError::Config(format!(
                    "Invalid until date '{until_input}': expected YYYY-MM-DD"
                ))
            })?
        };

        Ok(Self { since, until })
    }

    pub fn since_arg(&self) -> String {
        self.since.format("%Y-%m-%d").to_string()
    }

    pub fn until_arg(&self) -> String {
        self.until.format("%Y-%m-%d").to_string()
    }
}

fn parse_day(input: &str) -> Option<NaiveDate> {
    let mut parts = input.split('-');
    let (year, month, day) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let digits = |s: &str, min: usize, max: usize| {
        (min..=max).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
    };
    if !(digits(year, 4, 4) && digits(month, 1, 2) && digits(day, 2, 2)) {
        return None;
    }

    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

/// Lines added, removed and net as reported by the log query.
///
/// `net` is kept exactly as produced and is not required to equal `added - removed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionTriple {
    pub added: i64,
    pub removed: i64,
    pub net: i64,
}

impl ContributionTriple {
    pub fn new(added: i64, removed: i64, net: i64) -> Self {
        Self {
            added,
            removed,
            net,
        }
    }
}

impl AddAssign for ContributionTriple {
    fn add_assign(&mut self, other: Self) {
        self.added = self.added.saturating_add(other.added);
        self.removed = self.removed.saturating_add(other.removed);
        self.net = self.net.saturating_add(other.net);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorContribution {
    pub author: String,
    #[serde(flatten)]
    pub stats: ContributionTriple,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryContribution {
    pub repository: String,
    pub authors: Vec<AuthorContribution>,
}

impl RepositoryContribution {
    pub fn get(&self, author: &str) -> Option<&ContributionTriple> {
        self.authors
            .iter()
            .find(|a| a.author == author)
            .map(|a| &a.stats)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub since: String,
    pub until: String,
    pub authors: Vec<AuthorGroup>,
    pub repositories: Vec<RepositoryContribution>,
    pub totals: Vec<AuthorContribution>,
    pub pairs_total: usize,
    pub pairs_skipped: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributionRow {
    pub repository: String,
    pub author: String,
    #[serde(flatten)]
    pub stats: ContributionTriple,
}
