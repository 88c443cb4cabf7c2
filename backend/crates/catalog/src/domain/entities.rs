//! Domain Entities

use serde::{Deserialize, Serialize};
use std::fmt;

use super::keys;
use super::value_objects::{Barcode, ProductName};

/// Stable identifier of a moderation queue entry
///
/// Content-addressed: the first 16 hex characters of SHA-256 over the
/// queue member `barcode:name`, so it survives reordering of the queue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ReportId(String);

impl ReportId {
    const LEN: usize = 16;

    pub fn for_member(member: &str) -> Self {
        let mut digest = platform::crypto::sha256_hex(member.as_bytes());
        digest.truncate(Self::LEN);
        Self(digest)
    }

    /// Accept an identifier received from a moderator request
    pub fn parse(raw: &str) -> Option<Self> {
        (raw.len() == Self::LEN && raw.chars().all(|c| c.is_ascii_hexdigit()))
            .then(|| Self(raw.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One outstanding entry of the moderation queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub id: ReportId,
    /// Display position at read time, not an identifier
    pub position: usize,
    pub barcode: String,
    pub name: String,
    /// Queue member, `barcode:name`
    pub member: String,
    pub report_count: i64,
}

impl ReportEntry {
    /// Build an entry from a raw queue member, `None` if it has no `:`
    pub fn from_member(position: usize, member: String, report_count: i64) -> Option<Self> {
        let (barcode, name) = keys::split_report_member(&member)?;
        Some(Self {
            id: ReportId::for_member(&member),
            position,
            barcode: barcode.to_string(),
            name: name.to_string(),
            member: member.clone(),
            report_count,
        })
    }
}

/// Moderator decision on a reported name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Confirm the report; the name is buried at the removed score
    Remove,
    /// Clear the report; the name restarts at a small positive score
    Dismiss,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Remove => f.write_str("remove"),
            Resolution::Dismiss => f.write_str("dismiss"),
        }
    }
}

/// One admitted pair of a bulk submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionEntry {
    pub barcode: Barcode,
    pub name: ProductName,
}

impl SubmissionEntry {
    /// Escape and bound a raw pair; `None` if either side is out of bounds
    pub fn sanitize(barcode: &str, name: &str) -> Option<Self> {
        Some(Self {
            barcode: Barcode::sanitized(barcode)?,
            name: ProductName::sanitized(name)?,
        })
    }
}

/// Tally of a bulk submission
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BulkOutcome {
    /// Pairs stored as new ranked names
    pub inserted: usize,
    /// Valid pairs whose name already existed
    pub existing: usize,
    /// Pairs rejected by sanitization
    pub skipped: usize,
}

/// Product as published by an external product feed
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedItem {
    #[serde(default)]
    pub brand: String,
    pub name: String,
    /// Groups of barcodes; only the first group is authoritative
    #[serde(rename = "EAN", default)]
    pub ean: Vec<Vec<String>>,
}

impl FeedItem {
    /// Display name, prefixed by the brand when one is set
    pub fn display_name(&self) -> String {
        if self.brand.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.brand, self.name)
        }
    }
}

/// A barcode with its visible names, highest score first
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductRecord {
    pub barcode: String,
    pub names: Vec<String>,
}

/// Popularity entry of the `hits` counter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopBarcode {
    pub barcode: String,
    pub hits: i64,
    pub names: Vec<String>,
}

/// Aggregate usage counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UsageTotals {
    pub barcodes: u64,
    pub users: u64,
    pub active_users: u64,
    pub votes: u64,
    pub reports: u64,
}
