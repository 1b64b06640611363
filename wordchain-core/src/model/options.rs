use serde::Deserialize;

/// What generation does when the current token has no successors.
///
/// # Variants
/// - `Strict`: fail with [`ChainError::DeadEnd`](crate::ChainError::DeadEnd).
/// - `Salvage`: treat the token as the end of the sentence and return it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeadEndPolicy {
	#[default]
	Strict,
	Salvage,
}

/// Default cap on the number of tokens in one generated sentence.
pub const DEFAULT_MAX_TOKENS: usize = 1024;

/// Generation parameters of a [`Chain`](crate::Chain).
///
/// # Invariants
/// - `max_tokens == 0` disables the cap
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainOptions {
	/// Dead-end handling, `Strict` by default.
	pub dead_end: DeadEndPolicy,

	/// Maximum number of tokens in a sentence. Reaching it without a
	/// terminator fails with `DeadEnd` whatever the policy.
	pub max_tokens: usize,
}

impl Default for ChainOptions {
	fn default() -> Self {
		Self { dead_end: DeadEndPolicy::Strict, max_tokens: DEFAULT_MAX_TOKENS }
	}
}

impl ChainOptions {
	/// Returns `true` if a sentence of `count` tokens reached the cap.
	pub(crate) fn cap_reached(&self, count: usize) -> bool {
		self.max_tokens != 0 && count >= self.max_tokens
	}
}
