//! Value Objects
//!
//! Barcodes, names and client identifiers arrive untrusted. Two admission
//! paths exist: single actions (lookup/vote/report) only check the shape the
//! HTTP layer promises, bulk submissions are HTML-escaped and length-bounded.

use crate::error::{CatalogError, CatalogResult};
use std::fmt;

/// Score added by one accepted vote
pub const VOTE_WEIGHT: i64 = 1;
/// Score removed by the first report of a client against a name
pub const REPORT_PENALTY: i64 = -2;
/// Score of a name whose removal a moderator confirmed
pub const REMOVED_SCORE: i64 = -100;
/// Score of a name whose reports a moderator dismissed
pub const DISMISSED_SCORE: i64 = 1;
/// Score of a freshly submitted name
pub const SUBMITTED_SCORE: i64 = 1;
/// Lowest score still returned by lookups
pub const VISIBLE_MIN_SCORE: i64 = -1;

/// Accepted lengths for bulk submissions, counted after escaping
const SUBMITTED_BARCODE_LEN: std::ops::RangeInclusive<usize> = 5..=29;
const SUBMITTED_NAME_LEN: std::ops::RangeInclusive<usize> = 3..=49;

/// Minimum lengths for single actions
const ACTION_BARCODE_MIN_LEN: usize = 5;
const ACTION_NAME_MIN_LEN: usize = 2;

/// Separator of moderation queue members, never part of a barcode
const BARCODE_FORBIDDEN: char = ':';

/// Length of the opaque client installation identifier
pub const CLIENT_UUID_LEN: usize = 32;

/// Escape the five HTML-significant characters
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&#39;"),
            '"' => out.push_str("&#34;"),
            _ => out.push(c),
        }
    }
    out
}

/// EAN/UPC-like product identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Barcode(String);

impl Barcode {
    /// Admit a barcode for a single action
    pub fn parse(raw: &str) -> CatalogResult<Self> {
        if raw.chars().count() < ACTION_BARCODE_MIN_LEN {
            return Err(CatalogError::InvalidInput(format!(
                "barcode must have at least {ACTION_BARCODE_MIN_LEN} characters"
            )));
        }
        if raw.contains(BARCODE_FORBIDDEN) {
            return Err(CatalogError::InvalidInput(format!(
                "barcode must not contain '{BARCODE_FORBIDDEN}'"
            )));
        }
        Ok(Self(raw.to_string()))
    }

    /// Wrap a barcode read back from the store
    pub(crate) fn from_stored(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Admit a barcode from a bulk submission, `None` when out of bounds
    pub fn sanitized(raw: &str) -> Option<Self> {
        if raw.contains(BARCODE_FORBIDDEN) {
            return None;
        }
        let escaped = escape_html(raw);
        SUBMITTED_BARCODE_LEN
            .contains(&escaped.chars().count())
            .then_some(Self(escaped))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Barcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Candidate product name for a barcode
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductName(String);

impl ProductName {
    /// Admit a name for a single action
    pub fn parse(raw: &str) -> CatalogResult<Self> {
        if raw.chars().count() < ACTION_NAME_MIN_LEN {
            return Err(CatalogError::InvalidInput(format!(
                "name must have at least {ACTION_NAME_MIN_LEN} characters"
            )));
        }
        Ok(Self(raw.to_string()))
    }

    pub(crate) fn from_stored(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Admit a name from a bulk submission, `None` when out of bounds
    pub fn sanitized(raw: &str) -> Option<Self> {
        let escaped = escape_html(raw);
        SUBMITTED_NAME_LEN
            .contains(&escaped.chars().count())
            .then_some(Self(escaped))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Network address a request is attributed to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientAddress(String);

impl ClientAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque installation identifier supplied by the client
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientUuid(String);

impl ClientUuid {
    pub fn parse(raw: &str) -> CatalogResult<Self> {
        if raw.chars().count() != CLIENT_UUID_LEN {
            return Err(CatalogError::InvalidInput(format!(
                "uuid must have exactly {CLIENT_UUID_LEN} characters"
            )));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Who submitted a batch: a client uuid or an importer name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginTag(String);

impl OriginTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&ClientUuid> for OriginTag {
    fn from(uuid: &ClientUuid) -> Self {
        Self(uuid.as_str().to_string())
    }
}
