//! Embedded `VVENUE` blocks.
//!
//! Some feeds (Eventful, Upcoming and their imitators) attach venue data to a
//! calendar as a non-standard `VVENUE` component whose body is vCard-style
//! lines. Events point at a venue through a `VVENUE=<uid>` parameter on their
//! `LOCATION` property.
//!
//! The grammar parser has no model for this extension, so venue blocks are
//! recovered by scanning the normalized document text directly. The two
//! passes over the text share nothing except the UID used for lookup.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::grammar::{GrammarError, GrammarParser};
use crate::vcard::{VCardFieldMap, map_vcard_lines};

/// Matches one `BEGIN:VVENUE` ... `END:VVENUE` region.
static VVENUE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ms)^BEGIN:VVENUE$.*?^END:VVENUE$").expect("Invalid VVENUE regex")
});

/// Captures a block's `UID` line.
static UID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^UID:(.+)$").expect("Invalid UID regex"));

/// The raw text of one `VVENUE` region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueBlock {
    text: String,
}

impl VenueBlock {
    /// Wraps a matched region.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The block exactly as it appeared in the document.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The block's identifier, or `None` if it has no `UID` line.
    pub fn uid(&self) -> Option<&str> {
        UID_REGEX
            .captures(&self.text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Parses the block's vCard body and maps its lines.
    ///
    /// The `VVENUE` envelope is read as a `VCARD` envelope so that the
    /// grammar parser's vCard mode accepts it; every property survives the
    /// trip, including `X-` extensions. Returns `Ok(None)` when the block
    /// holds no venue region or the vCard parser rejects it.
    ///
    /// # Errors
    ///
    /// Propagates [`GrammarError::Internal`] from the parser.
    pub fn vcard_fields(
        &self,
        parser: &dyn GrammarParser,
    ) -> Result<Option<VCardFieldMap>, GrammarError> {
        let Some(region) = VVENUE_REGEX.find(&self.text) else {
            return Ok(None);
        };

        let card = vvenue_as_vcard(region.as_str());
        match parser.parse_vcard(&card) {
            Ok(tree) => Ok(Some(map_vcard_lines(tree.serialize_properties()))),
            Err(GrammarError::Rejected(reason)) => {
                warn!(uid = ?self.uid(), %reason, "Venue block is not a readable vCard");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

/// Extracts every `VVENUE` region from normalized document text.
pub fn extract_venue_blocks(text: &str) -> Vec<VenueBlock> {
    let blocks: Vec<VenueBlock> = VVENUE_REGEX
        .find_iter(text)
        .map(|m| VenueBlock::new(m.as_str()))
        .collect();

    debug!(count = blocks.len(), "Extracted venue blocks");
    blocks
}

/// Returns the first block whose UID equals `uid`.
pub fn find_venue_block<'a>(blocks: &'a [VenueBlock], uid: &str) -> Option<&'a VenueBlock> {
    blocks.iter().find(|block| block.uid() == Some(uid))
}

/// Swaps the `VVENUE` envelope lines for `VCARD` ones.
fn vvenue_as_vcard(region: &str) -> String {
    let body = region
        .strip_prefix("BEGIN:VVENUE")
        .and_then(|rest| rest.strip_suffix("END:VVENUE"))
        .unwrap_or(region);
    format!("BEGIN:VCARD{body}END:VCARD\n")
}
