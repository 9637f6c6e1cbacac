//! Document-level parsing with the recoverable/fatal split.
//!
//! Third-party feeds are frequently broken. A document the grammar parser
//! rejects as malformed yields no calendars and the import carries on with
//! nothing to do. Any other parser failure is a bug or an environment
//! problem and is returned to the caller.

use tracing::warn;

use crate::error::{ImportError, ImportResult};
use crate::grammar::{CalendarTree, GrammarError, GrammarParser};

/// Parses normalized text into calendars.
///
/// # Errors
///
/// Returns an [`ImportErrorCode::ParseFailed`](crate::ImportErrorCode::ParseFailed)
/// error when the parser fails for a reason other than a malformed document.
pub fn parse_document(parser: &dyn GrammarParser, text: &str) -> ImportResult<Vec<CalendarTree>> {
    match parser.parse_calendar(text) {
        Ok(calendars) => Ok(calendars),
        Err(GrammarError::Rejected(reason)) => {
            warn!(%reason, "Calendar document rejected, importing nothing from it");
            Ok(Vec::new())
        }
        Err(err) => Err(grammar_failure(err)),
    }
}

/// Converts an unrecoverable grammar failure into an import error.
pub(crate) fn grammar_failure(err: GrammarError) -> ImportError {
    ImportError::parse(err.to_string()).with_source(err)
}
