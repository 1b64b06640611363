use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::{env, fs, io};

/// Opens a corpus file for buffered line reading.
///
/// The handle is dropped, and the file closed, as soon as the reader is.
pub(crate) fn open_corpus<P: AsRef<Path>>(filename: P) -> io::Result<BufReader<File>> {
	Ok(BufReader::new(File::open(filename)?))
}

/// Reads a text file and returns all its lines as a `Vec<String>`.
///
/// - Reads the entire file into memory
/// - Splits on `\n` / `\r\n`
pub fn read_file<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	let mut contents = String::new();
	File::open(filename)?.read_to_string(&mut contents)?;
	Ok(contents.lines().map(str::to_owned).collect())
}

/// Extracts the base filename without extension.
///
/// Examples:
/// - `"./data/alice.txt"` → `"alice"`
/// - `"alice.txt"` → `"alice"`
pub fn get_filename<P: AsRef<Path>>(input_path: P) -> io::Result<String> {
	let stem = input_path
		.as_ref()
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no filename"))?;

	Ok(stem.to_string_lossy().to_string())
}

/// Normalize a folder path.
///
/// - `"."` or `"./"` resolves to the current working directory
/// - Other paths are returned as-is (not canonicalized)
pub fn normalize_folder(input: &str) -> PathBuf {
	if input == "." || input == "./" {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		PathBuf::from(input)
	}
}

/// Lists all files with a given extension in a directory.
///
/// Returns file names only (no paths), sorted so that ingestion order
/// does not depend on the platform's directory iteration order.
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<String>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let entry = entry?;
		let path = entry.path();

		if path.is_file() && path.extension() == Some(std::ffi::OsStr::new(extension)) {
			if let Some(name) = path.file_name() {
				files.push(name.to_string_lossy().to_string());
			}
		}
	}

	files.sort();
	Ok(files)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reads_lines() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("corpus.txt");
		fs::write(&path, "One.\r\n\nTwo three.\n").unwrap();
		assert_eq!(read_file(&path).unwrap(), vec!["One.", "", "Two three."]);
	}

	#[test]
	fn filename_without_extension() {
		assert_eq!(get_filename("./data/alice.txt").unwrap(), "alice");
		assert_eq!(get_filename("alice.txt").unwrap(), "alice");
		assert!(get_filename("/").is_err());
	}

	#[test]
	fn normalize_current_dir() {
		assert_eq!(normalize_folder("corpora"), PathBuf::from("corpora"));
		assert!(normalize_folder("./").is_absolute());
	}

	#[test]
	fn lists_only_matching_files_sorted() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("b.txt"), "B.").unwrap();
		fs::write(dir.path().join("a.txt"), "A.").unwrap();
		fs::write(dir.path().join("notes.md"), "skip").unwrap();
		fs::create_dir(dir.path().join("nested.txt")).unwrap();

		let files = list_files(dir.path(), "txt").unwrap();
		assert_eq!(files, vec!["a.txt".to_owned(), "b.txt".to_owned()]);
	}

	#[test]
	fn missing_dir_is_an_error() {
		let dir = tempfile::tempdir().unwrap();
		assert!(list_files(dir.path().join("absent"), "txt").is_err());
	}
}
