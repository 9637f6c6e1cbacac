//! `KEY[;qualifier]:VALUE` line mapping for venue vCards.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// Captures the key and value of one vCard line, skipping any qualifier.
static VCARD_LINE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^;:]+)(?:;[^:]*)?:(.*)$").expect("Invalid vCard line regex"));

/// Property key to first-seen value for one venue vCard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VCardFieldMap {
    fields: HashMap<String, String>,
}

impl VCardFieldMap {
    /// Returns the value recorded for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Returns the value for `key` if it is present and not blank.
    pub fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.trim().is_empty())
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no line was mapped.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Maps vCard property lines to a [`VCardFieldMap`].
///
/// The qualifier segment (`;TYPE=work` and the like) is ignored, lines that
/// do not look like `KEY:VALUE` are skipped, and the first occurrence of a
/// key wins.
pub fn map_vcard_lines<I, S>(lines: I) -> VCardFieldMap
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut fields = HashMap::new();
    for line in lines {
        let Some(caps) = VCARD_LINE_REGEX.captures(line.as_ref()) else {
            continue;
        };
        fields
            .entry(caps[1].to_string())
            .or_insert_with(|| caps[2].to_string());
    }
    VCardFieldMap { fields }
}
