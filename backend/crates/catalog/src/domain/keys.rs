//! Store key namespaces
//!
//! These names are a stable contract: export tooling and operators read
//! the store directly.
//!
//! ```text
//! barcode:<code>                    sorted set name -> score
//! hits                              sorted set barcode -> lookups
//! vote:<client>:<barcode>:<name>    counter, vote dedup guard
//! report:<client>:<barcode>:<name>  counter, report dedup guard
//! reported:<barcode>                sorted set name -> reports
//! reports                           sorted set "barcode:name" -> reports
//! requests:<client>                 counter, expires at midnight
//! requests_upload:<client>          counter, expires at midnight
//! users                             set of client uuids
//! users:active:<uuid>               marker, 30 day expiry
//! log:uuid:<barcode>:<name>         origin of a bulk submission, 4 day expiry
//! ```

use platform::rate_limit::RequestClass;

use super::value_objects::{Barcode, ClientAddress, ClientUuid, ProductName};

pub const BARCODE_PREFIX: &str = "barcode:";
pub const VOTE_PREFIX: &str = "vote:";
pub const REPORT_PREFIX: &str = "report:";
pub const ACTIVE_USER_PREFIX: &str = "users:active:";

pub const HITS: &str = "hits";
pub const REPORTS: &str = "reports";
pub const USERS: &str = "users";

pub fn barcode(code: &Barcode) -> String {
    format!("{BARCODE_PREFIX}{code}")
}

pub fn vote_guard(client: &ClientAddress, code: &Barcode, name: &ProductName) -> String {
    format!("{VOTE_PREFIX}{client}:{code}:{name}")
}

pub fn report_guard(client: &ClientAddress, code: &Barcode, name: &ProductName) -> String {
    format!("{REPORT_PREFIX}{client}:{code}:{name}")
}

pub fn reported(code: &Barcode) -> String {
    format!("reported:{code}")
}

/// Member of the global moderation queue
pub fn report_member(code: &Barcode, name: &ProductName) -> String {
    format!("{code}:{name}")
}

/// Split a queue member on its first `:`; names may contain colons, barcodes not
pub fn split_report_member(member: &str) -> Option<(&str, &str)> {
    member.split_once(':')
}

pub fn rate_counter(class: RequestClass, client: &ClientAddress) -> String {
    format!("{}:{client}", class.key_prefix())
}

pub fn active_user(uuid: &ClientUuid) -> String {
    format!("{ACTIVE_USER_PREFIX}{}", uuid.as_str())
}

pub fn provenance(code: &Barcode, name: &ProductName) -> String {
    format!("log:uuid:{code}:{name}")
}

/// Strip the namespace from a `barcode:<code>` key
pub fn barcode_from_key(key: &str) -> Option<&str> {
    key.strip_prefix(BARCODE_PREFIX)
}
