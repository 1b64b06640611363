use rand::Rng;

/// Represents the successors of one predecessor token.
///
/// A `Successors` bag stores, in ingestion order, every token observed
/// immediately after its predecessor. Duplicates are never collapsed: a
/// token seen three times appears three times.
///
/// ## Responsibilities:
/// - Accumulate successors during ingestion
/// - Pick a successor uniformly over the bag (frequency-weighted over tokens)
/// - Merge with the bag of the same predecessor from another chain
///
/// ## Invariants
/// - Insertion order is preserved, including across merges
/// - Once created by ingestion, the bag is non-empty
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Successors {
	tokens: Vec<String>,
}

impl Successors {
	/// Creates a new empty bag.
	pub fn new() -> Self {
		Self::default()
	}

	/// Records one more occurrence of `token`.
	pub fn push(&mut self, token: &str) {
		self.tokens.push(token.to_owned());
	}

	/// Picks a successor uniformly at random over the bag.
	///
	/// Returns `None` if the bag is empty.
	pub fn pick<R: Rng>(&self, rng: &mut R) -> Option<&str> {
		if self.tokens.is_empty() {
			return None;
		}
		let index = rng.random_range(0..self.tokens.len());
		Some(self.tokens[index].as_str())
	}

	/// Appends every token of `other` after this bag's tokens.
	pub fn merge(&mut self, other: &Self) {
		self.tokens.extend(other.tokens.iter().cloned());
	}

	/// Returns the recorded tokens in ingestion order.
	pub fn as_slice(&self) -> &[String] {
		&self.tokens
	}

	pub fn len(&self) -> usize {
		self.tokens.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tokens.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::rngs::StdRng;
	use rand::SeedableRng;

	fn bag(tokens: &[&str]) -> Successors {
		let mut successors = Successors::new();
		for token in tokens {
			successors.push(token);
		}
		successors
	}

	#[test]
	fn keeps_duplicates_in_order() {
		let successors = bag(&["x", "x", "y"]);
		assert_eq!(successors.as_slice(), &["x", "x", "y"]);
		assert_eq!(successors.len(), 3);
	}

	#[test]
	fn pick_on_empty_bag() {
		let mut rng = StdRng::seed_from_u64(1);
		assert_eq!(Successors::new().pick(&mut rng), None);
	}

	#[test]
	fn pick_single() {
		let mut rng = StdRng::seed_from_u64(1);
		let successors = bag(&["only"]);
		for _ in 0..10 {
			assert_eq!(successors.pick(&mut rng), Some("only"));
		}
	}

	#[test]
	fn pick_is_frequency_weighted() {
		let mut rng = StdRng::seed_from_u64(42);
		let successors = bag(&["x", "x", "y"]);
		let draws = 30_000;
		let x = (0..draws).filter(|_| successors.pick(&mut rng) == Some("x")).count();
		let ratio = x as f64 / draws as f64;
		assert!((ratio - 2.0 / 3.0).abs() < 0.02, "ratio = {ratio}");
	}

	#[test]
	fn merge_appends() {
		let mut left = bag(&["a", "b"]);
		left.merge(&bag(&["b", "c"]));
		assert_eq!(left.as_slice(), &["a", "b", "b", "c"]);
	}
}
