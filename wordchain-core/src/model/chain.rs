use std::collections::HashMap;
use std::fmt;
use std::io::BufRead;
use std::path::Path;
use std::sync::mpsc;
use std::thread;

use log::{debug, trace, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::options::{ChainOptions, DeadEndPolicy};
use super::successors::Successors;
use crate::error::ChainError;
use crate::io::{get_filename, list_files, open_corpus};
use crate::tokenizer::{ends_with_punctuation, line_ends_sentence, tokenize, SENTINEL};

/// A first-order word-level Markov chain.
///
/// The chain maps every token seen as a predecessor to the bag of tokens
/// that followed it. Tokens that open a sentence are recorded under the
/// reserved [`SENTINEL`] key, which is also the initial value of the
/// ingestion cursor (`prev`): because the sentinel ends in `$`, the first
/// word ever ingested is treated as a sentence starter.
///
/// # Responsibilities
/// - Ingest words, lines, readers, files and directories
/// - Track sentence boundaries through the `prev` cursor
/// - Generate sentences by walking successor bags until a terminator
/// - Merge with chains built from later parts of the same stream
///
/// # Invariants
/// - `successors` always contains `SENTINEL`
/// - Every bag created by ingestion is non-empty
/// - The RNG is created once and only replaced through `reseed`
#[derive(Debug)]
pub struct Chain {
	/// Mapping from a predecessor token to its successors.
	successors: HashMap<String, Successors>,

	/// Most recently ingested token, or `SENTINEL` before the first one.
	prev: String,

	/// Number of non-empty tokens ingested (merges included).
	words: usize,

	rng: StdRng,

	options: ChainOptions,
}

impl Default for Chain {
	fn default() -> Self {
		Self::new()
	}
}

impl Chain {
	/// Creates an empty chain seeded from the operating system's entropy.
	pub fn new() -> Self {
		Self::with_options(ChainOptions::default(), None)
	}

	/// Creates an empty chain with a deterministic RNG.
	///
	/// Two chains with the same seed fed the same input generate the same
	/// sentences in the same order.
	pub fn with_seed(seed: u64) -> Self {
		Self::with_options(ChainOptions::default(), Some(seed))
	}

	/// Creates an empty chain with explicit generation options.
	///
	/// `seed` of `None` seeds from the operating system.
	pub fn with_options(options: ChainOptions, seed: Option<u64>) -> Self {
		let rng = match seed {
			Some(seed) => StdRng::seed_from_u64(seed),
			None => StdRng::from_os_rng(),
		};
		Self::with_rng(options, rng)
	}

	/// Partial chains only ingest; their RNG is never drawn from.
	fn partial() -> Self {
		Self::with_rng(ChainOptions::default(), StdRng::seed_from_u64(0))
	}

	fn with_rng(options: ChainOptions, rng: StdRng) -> Self {
		let mut successors = HashMap::new();
		successors.insert(SENTINEL.to_owned(), Successors::new());
		Self { successors, prev: SENTINEL.to_owned(), words: 0, rng, options }
	}

	/// Replaces the RNG with one seeded from `seed`.
	pub fn reseed(&mut self, seed: u64) {
		self.rng = StdRng::seed_from_u64(seed);
	}

	/// Returns the generation options used by `generate_sentence`.
	pub fn options(&self) -> &ChainOptions {
		&self.options
	}

	pub fn set_options(&mut self, options: ChainOptions) {
		self.options = options;
	}

	/// Adds a single token to the chain.
	///
	/// - Empty tokens are ignored
	/// - If the cursor is at a sentence boundary, the token becomes a
	///   sentence starter (recorded under `SENTINEL`)
	/// - Otherwise it is recorded as a successor of the cursor
	///
	/// The token then becomes the new cursor.
	pub fn add_word(&mut self, word: &str) {
		if word.is_empty() {
			return;
		}

		let key = if ends_with_punctuation(&self.prev) { SENTINEL } else { self.prev.as_str() };
		match self.successors.get_mut(key) {
			Some(successors) => successors.push(word),
			None => {
				let mut successors = Successors::new();
				successors.push(word);
				self.successors.insert(key.to_owned(), successors);
			}
		}

		self.prev.clear();
		self.prev.push_str(word);
		self.words += 1;
	}

	/// Splits a line on spaces, tabs and newlines and adds every token in order.
	///
	/// Empty lines are ignored. Punctuation stays attached to its word.
	pub fn add_line(&mut self, line: &str) {
		for word in tokenize(line) {
			self.add_word(word);
		}
	}

	/// Adds every line of `source`, in order.
	///
	/// # Errors
	/// Returns `SourceUnavailable` if a line cannot be read. Lines read before
	/// the failure stay in the chain.
	pub fn add_from_source<R: BufRead>(&mut self, source: R) -> Result<(), ChainError> {
		let before = self.words;
		let mut lines = 0usize;
		for line in source.lines() {
			let line = line.map_err(|e| {
				warn!("read failed after {} lines: {}", lines, e);
				ChainError::source_unavailable(None, e)
			})?;
			self.add_line(&line);
			lines += 1;
		}
		debug!("ingested {} lines ({} tokens)", lines, self.words - before);
		Ok(())
	}

	/// Opens a text file and adds all its lines.
	///
	/// The file is closed on every exit path.
	///
	/// # Errors
	/// Returns `SourceUnavailable` carrying the path if the file cannot be
	/// opened or read.
	pub fn add_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ChainError> {
		let path = path.as_ref();
		debug!("ingesting {}", path.display());

		let reader = open_corpus(path).map_err(|e| {
			warn!("cannot open {}: {}", path.display(), e);
			ChainError::source_unavailable(Some(path.to_path_buf()), e)
		})?;

		self.add_from_source(reader).map_err(|e| match e {
			ChainError::SourceUnavailable { source, .. } => {
				ChainError::source_unavailable(Some(path.to_path_buf()), source)
			}
			other => other,
		})
	}

	/// Adds every file of `dir` with the given extension, in file-name order.
	///
	/// Returns the names (file stems) of the ingested corpora.
	///
	/// # Errors
	/// Returns `SourceUnavailable` if the directory cannot be listed or a
	/// file cannot be read. Files ingested before the failure stay in the chain.
	pub fn add_from_dir<P: AsRef<Path>>(&mut self, dir: P, extension: &str) -> Result<Vec<String>, ChainError> {
		let dir = dir.as_ref();
		let unavailable = |e: std::io::Error| ChainError::source_unavailable(Some(dir.to_path_buf()), e);

		let mut names = Vec::new();
		for file in list_files(dir, extension).map_err(unavailable)? {
			let full_path = dir.join(&file);
			self.add_from_file(&full_path)?;
			names.push(get_filename(&full_path).map_err(unavailable)?);
		}

		Ok(names)
	}

	/// Adds lines in parallel and returns once all of them are in the chain.
	///
	/// The lines are split into sentence-aligned chunks, each chunk is
	/// ingested into a partial chain on its own thread, and the partial
	/// chains are merged back in order. The resulting table and cursor are
	/// the same as calling `add_line` on every line in order.
	///
	/// # Notes
	/// - A cursor left mid-sentence is first advanced sequentially to the
	///   next sentence boundary.
	/// - The number of chunks is derived from the CPU count.
	pub fn add_lines_parallel(&mut self, lines: &[String]) {
		let mut start = 0;
		while start < lines.len() && !ends_with_punctuation(&self.prev) {
			self.add_line(&lines[start]);
			start += 1;
		}

		let rest = &lines[start..];
		if rest.is_empty() {
			return;
		}

		let chunk_size = rest.len().div_ceil(num_cpus::get() * 8);
		let chunks = sentence_aligned_chunks(rest, chunk_size);
		if chunks.len() == 1 {
			rest.iter().for_each(|line| self.add_line(line));
			return;
		}
		debug!("ingesting {} lines in {} chunks", rest.len(), chunks.len());

		let mut partials = thread::scope(|scope| {
			let (tx, rx) = mpsc::channel();
			for (index, chunk) in chunks.iter().enumerate() {
				let tx = tx.clone();
				scope.spawn(move || {
					let mut partial = Chain::partial();
					for line in *chunk {
						partial.add_line(line);
					}
					// The receiver outlives every worker of the scope
					let _ = tx.send((index, partial));
				});
			}
			drop(tx);
			rx.iter().collect::<Vec<_>>()
		});
		partials.sort_by_key(|(index, _)| *index);

		for (_, partial) in partials {
			self.merge(&partial);
			if partial.words > 0 {
				self.prev = partial.prev;
			}
		}
	}

	/// Merges another chain into this one.
	///
	/// Every successor bag of `other` is appended after the bag of the same
	/// predecessor in `self`; missing predecessors are cloned. The cursor of
	/// `self` is left unchanged.
	///
	/// Merging chains built from consecutive, sentence-aligned parts of a
	/// stream, in order, yields the table that sequential ingestion builds.
	pub fn merge(&mut self, other: &Self) {
		for (key, successors) in &other.successors {
			if let Some(existing) = self.successors.get_mut(key) {
				existing.merge(successors);
			} else {
				self.successors.insert(key.clone(), successors.clone());
			}
		}
		self.words += other.words;
	}

	/// Generates one sentence using the chain's own options.
	///
	/// See [`Chain::generate_sentence_with`].
	pub fn generate_sentence(&mut self) -> Result<String, ChainError> {
		let options = self.options;
		self.generate_sentence_with(&options)
	}

	/// Generates one sentence by walking successor bags from `SENTINEL`.
	///
	/// Each step picks uniformly over the bag of the current token, so
	/// tokens seen more often are picked more often. Tokens are joined with
	/// single spaces and the walk stops after the first token that ends
	/// with a terminator.
	///
	/// # Errors
	/// - `Untrained` if no sentence starter was recorded
	/// - `DeadEnd` if the current token has no successor under the `Strict`
	///   policy, or if `options.max_tokens` tokens were emitted without a
	///   terminator
	pub fn generate_sentence_with(&mut self, options: &ChainOptions) -> Result<String, ChainError> {
		if !self.is_trained() {
			return Err(ChainError::Untrained);
		}

		let mut sentence = String::new();
		let mut current: &str = SENTINEL;
		let mut count = 0usize;

		loop {
			let next = match self.successors.get(current).and_then(|s| s.pick(&mut self.rng)) {
				Some(next) => next,
				None => match options.dead_end {
					DeadEndPolicy::Strict => {
						warn!("dead end after {:?}", current);
						return Err(ChainError::DeadEnd { token: current.to_owned() });
					}
					DeadEndPolicy::Salvage => {
						debug!("salvaging sentence at dead end {:?}", current);
						return Ok(sentence);
					}
				},
			};

			if !sentence.is_empty() {
				sentence.push(' ');
			}
			sentence.push_str(next);
			count += 1;

			if ends_with_punctuation(next) {
				trace!("generated {} tokens: {}", count, sentence);
				return Ok(sentence);
			}
			if options.cap_reached(count) {
				warn!("no terminator after {} tokens", count);
				return Err(ChainError::DeadEnd { token: next.to_owned() });
			}
			current = next;
		}
	}

	/// Generates `count` sentences in order, stopping at the first error.
	pub fn generate_sentences(&mut self, count: usize) -> Result<Vec<String>, ChainError> {
		(0..count).map(|_| self.generate_sentence()).collect()
	}

	/// Returns the successors recorded after `token`, in ingestion order.
	pub fn successors(&self, token: &str) -> Option<&[String]> {
		self.successors.get(token).map(Successors::as_slice)
	}

	/// Returns the recorded sentence starters, in ingestion order.
	pub fn starters(&self) -> &[String] {
		self.successors(SENTINEL).unwrap_or_default()
	}

	/// Returns the ingestion cursor.
	pub fn prev(&self) -> &str {
		&self.prev
	}

	/// Returns `true` once at least one sentence starter is recorded.
	pub fn is_trained(&self) -> bool {
		!self.starters().is_empty()
	}

	/// Returns the number of predecessor entries, `SENTINEL` included.
	pub fn predecessor_count(&self) -> usize {
		self.successors.len()
	}

	/// Returns the number of tokens ingested so far.
	pub fn word_count(&self) -> usize {
		self.words
	}

	/// Returns a human-readable dump of the successor table.
	///
	/// One entry per line, `SENTINEL` first then by key.
	pub fn debug_dump(&self) -> String {
		self.to_string()
	}
}

impl fmt::Display for Chain {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut keys: Vec<&String> = self.successors.keys().filter(|k| *k != SENTINEL).collect();
		keys.sort();

		for key in std::iter::once(SENTINEL).chain(keys.into_iter().map(String::as_str)) {
			let tokens = self.successors(key).unwrap_or_default();
			writeln!(f, "{} => [{}]", key, tokens.join(", "))?;
		}
		Ok(())
	}
}

/// Splits `lines` into chunks of at least `chunk_size` lines, each starting
/// at a sentence boundary.
///
/// `lines` must itself start at a sentence boundary.
fn sentence_aligned_chunks(lines: &[String], chunk_size: usize) -> Vec<&[String]> {
	let mut chunks = Vec::new();
	let mut start = 0;
	let mut at_boundary = true;

	for (index, line) in lines.iter().enumerate() {
		if at_boundary && index - start >= chunk_size {
			chunks.push(&lines[start..index]);
			start = index;
		}
		if let Some(ends) = line_ends_sentence(line) {
			at_boundary = ends;
		}
	}
	if start < lines.len() {
		chunks.push(&lines[start..]);
	}

	chunks
}
