//! Request option flags (`?options=skipduplicates,...`)

use std::collections::BTreeSet;

pub const OPT_SKIP_DUPLICATES: &str = "skipduplicates";

/// Lower-cased option flags of one request. Unknown flags are kept and
/// handed on to interpreters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    flags: BTreeSet<String>,
}

impl RequestOptions {
    pub fn parse(raw: Option<&str>) -> Self {
        let flags = raw
            .unwrap_or_default()
            .to_lowercase()
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|flag| !flag.is_empty())
            .map(str::to_string)
            .collect();
        Self { flags }
    }

    pub fn contains(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    /// Duplicate (channel, timestamp) rows are ignored instead of failing the insert
    pub fn skip_duplicates(&self) -> bool {
        self.contains(OPT_SKIP_DUPLICATES)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.flags.iter().map(String::as_str)
    }
}
