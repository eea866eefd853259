use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::io;

use crate::tokens::SCOPE_DELIMITER;

/// Reads a message history file, one message per line.
///
/// - Reads the entire file into memory
/// - Splits on `\n` / `\r\n`
/// - Drops empty lines (messages without text content)
pub fn read_messages<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	let mut contents = String::new();
	File::open(filename)?.read_to_string(&mut contents)?;
	Ok(contents.lines().filter(|line| !line.is_empty()).map(str::to_owned).collect())
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `data/general.txt` + `"bin"` → `data/general.bin`
pub fn build_output_path<P: AsRef<Path>>(
	input_path: P,
	output_extension: &str,
) -> io::Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Input path has no filename"))?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(output_extension);

	Ok(output)
}

/// Extracts the base filename without extension, to be used as a scope.
///
/// Examples:
/// - `"./data/general.txt"` → `"general"`
/// - `"general.txt"` → `"general"`
/// - `"a:b.txt"` → error, the scope delimiter would make its keys ambiguous
pub fn get_filename<P: AsRef<Path>>(input_path: P) -> io::Result<String> {
	let stem = input_path
		.as_ref()
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no filename"))?
		.to_string_lossy();

	if stem.contains(SCOPE_DELIMITER) {
		return Err(io::Error::new(
			io::ErrorKind::InvalidInput,
			format!("{stem:?} contains the scope delimiter {SCOPE_DELIMITER:?}"),
		));
	}
	Ok(stem.into_owned())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn output_path_swaps_extension() {
		assert_eq!(build_output_path("data/general.txt", "bin").unwrap(), PathBuf::from("data/general.bin"));
		assert_eq!(build_output_path("general", "bin").unwrap(), PathBuf::from("general.bin"));
	}

	#[test]
	fn filename_is_the_stem() {
		assert_eq!(get_filename("./data/general.txt").unwrap(), "general");
	}

	#[test]
	fn filename_with_scope_delimiter_is_refused() {
		let err = get_filename("data/guild:general.txt").unwrap_err();
		assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
	}

	#[test]
	fn empty_lines_are_dropped() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("history.txt");
		std::fs::write(&path, "hello there\r\n\nsecond line\n").unwrap();
		assert_eq!(read_messages(&path).unwrap(), vec!["hello there", "second line"]);
	}
}
