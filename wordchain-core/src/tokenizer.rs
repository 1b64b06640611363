//! Token rules shared by ingestion and generation.
//!
//! A token is a run of characters between the delimiters space, tab and
//! newline. Punctuation is never split off: `hello.` is one token, and it
//! ends a sentence because its last character is a terminator.

/// Reserved predecessor key under which sentence starters are recorded.
///
/// It ends in `$`, a terminator, so a chain whose cursor holds it is at a
/// sentence boundary.
pub const SENTINEL: &str = "__$";

/// Characters that end a sentence when they end a token.
pub const TERMINATORS: &str = ".!?$";

const DELIMITERS: [char; 3] = [' ', '\t', '\n'];

/// Returns `true` if the last character of `s` is one of [`TERMINATORS`].
///
/// The empty string never ends a sentence.
pub fn ends_with_punctuation(s: &str) -> bool {
	s.chars().next_back().is_some_and(|c| TERMINATORS.contains(c))
}

/// Splits a line into tokens, left to right.
///
/// - An empty line yields nothing
/// - Leading and trailing whitespace is trimmed first
/// - Adjacent delimiters yield empty pieces, which callers discard
pub fn tokenize(line: &str) -> impl Iterator<Item = &str> {
	let trimmed = if line.is_empty() { None } else { Some(line.trim()) };
	trimmed.into_iter().flat_map(|l| l.split(DELIMITERS))
}

/// Returns `true` if ingesting `line` leaves the cursor at a sentence boundary.
///
/// Lines that yield no token (blank or whitespace-only) return `None`: they
/// leave the cursor where it was.
pub(crate) fn line_ends_sentence(line: &str) -> Option<bool> {
	tokenize(line)
		.filter(|t| !t.is_empty())
		.last()
		.map(ends_with_punctuation)
}
