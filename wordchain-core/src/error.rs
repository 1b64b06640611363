use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by [`Chain`](crate::Chain) ingestion and generation.
///
/// All errors surface synchronously at the call site. Ingestion that
/// happened before a `SourceUnavailable` failure is kept in the chain.
#[derive(Debug, Error)]
pub enum ChainError {
	/// The input could not be opened or read.
	#[error("cannot read source{}: {source}", display_path(.path))]
	SourceUnavailable {
		path: Option<PathBuf>,
		#[source]
		source: io::Error,
	},

	/// No sentence-starter has been recorded yet.
	#[error("chain is untrained: no sentence starter recorded")]
	Untrained,

	/// Generation reached a token without successors, or hit the token cap.
	#[error("dead end after token {token:?}")]
	DeadEnd { token: String },
}

fn display_path(path: &Option<PathBuf>) -> String {
	match path {
		Some(p) => format!(" {}", p.display()),
		None => String::new(),
	}
}

impl ChainError {
	pub(crate) fn source_unavailable(path: Option<PathBuf>, source: io::Error) -> Self {
		ChainError::SourceUnavailable { path, source }
	}
}
