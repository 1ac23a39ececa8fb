use std::io::{self, BufRead};

use serde::{Deserialize, Serialize};

/// Delimiters of the story body inside a raw text resource.
///
/// Defaults follow the Project Gutenberg layout:
/// `*** START OF THE PROJECT GUTENBERG EBOOK ... ***` /
/// `*** END OF THE PROJECT GUTENBERG EBOOK ... ***`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct Markers {
	/// Prefix identifying a comment/meta line.
	pub comment: String,
	/// Substring of the comment line that opens the body.
	pub start: String,
	/// Substring of the comment line that closes the body.
	pub end: String,
}

impl Default for Markers {
	fn default() -> Self {
		Self { comment: "***".to_owned(), start: "START".to_owned(), end: "END".to_owned() }
	}
}

/// Extracts the body of one corpus unit.
///
/// # Behavior
/// - Lines starting with `markers.comment` are never captured. If such a
///   line contains `markers.start`, capturing begins; otherwise if it
///   contains `markers.end`, reading stops.
/// - Every other line read while capturing is appended, followed by a space.
/// - End of stream without an end marker just ends the unit.
///
/// Returns an empty string when no start marker was found.
pub fn extract_body<R: BufRead>(mut reader: R, markers: &Markers) -> io::Result<String> {
	let mut out = String::new();
	let mut in_story = false;
	let mut buf = Vec::new();

	while let Some(line) = next_line(&mut reader, &mut buf)? {
		if line.starts_with(&markers.comment) {
			if line.contains(&markers.start) {
				in_story = true;
			} else if line.contains(&markers.end) {
				break;
			}
		} else if in_story {
			out.push_str(&line);
			out.push(' ');
		}
	}

	Ok(out)
}

/// Reads a whole corpus unit, line breaks folded into spaces.
pub fn read_all<R: BufRead>(mut reader: R) -> io::Result<String> {
	let mut out = String::new();
	let mut buf = Vec::new();
	while let Some(line) = next_line(&mut reader, &mut buf)? {
		out.push_str(&line);
		out.push(' ');
	}
	Ok(out)
}

/// Reads the next line without its `\n` or `\r\n` ending.
///
/// Bytes that are not valid UTF-8 become U+FFFD instead of failing the
/// whole unit: old corpus files are often Latin-1. Only real I/O errors
/// are returned.
fn next_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<Option<String>> {
	buf.clear();
	if reader.read_until(b'\n', buf)? == 0 {
		return Ok(None);
	}
	if buf.last() == Some(&b'\n') {
		buf.pop();
		if buf.last() == Some(&b'\r') {
			buf.pop();
		}
	}
	Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

#[cfg(test)]
mod tests {
	use super::*;

	const BOOK: &str = "\
Title: A Christmas Carol
Release date: whenever
*** START OF THE PROJECT GUTENBERG EBOOK ***
Marley was dead:
to begin with.
*** this is only a comment ***
There is no doubt whatever about that.
*** END OF THE PROJECT GUTENBERG EBOOK ***
Licence boilerplate.
";

	#[test]
	fn captures_between_markers() {
		let body = extract_body(BOOK.as_bytes(), &Markers::default()).unwrap();
		assert_eq!(body, "Marley was dead: to begin with. There is no doubt whatever about that. ");
	}

	#[test]
	fn missing_start_marker_gives_empty_body() {
		let text = "just some text\nwith no markers\n";
		assert_eq!(extract_body(text.as_bytes(), &Markers::default()).unwrap(), "");
	}

	#[test]
	fn missing_end_marker_reads_to_eof() {
		let text = "*** START ***\none\ntwo";
		assert_eq!(extract_body(text.as_bytes(), &Markers::default()).unwrap(), "one two ");
	}

	#[test]
	fn custom_markers() {
		let markers = Markers { comment: "#".to_owned(), start: "begin".to_owned(), end: "stop".to_owned() };
		let text = "skip\n# begin\nkeep\n# stop\nskip";
		assert_eq!(extract_body(text.as_bytes(), &markers).unwrap(), "keep ");
	}

	#[test]
	fn read_all_folds_lines() {
		assert_eq!(read_all("a\nb\r\nc".as_bytes()).unwrap(), "a b c ");
	}

	#[test]
	fn invalid_utf8_is_replaced_not_fatal() {
		// "café" in Latin-1
		let text: &[u8] = b"*** START ***\ncaf\xe9 au lait\nmerci\n*** END ***\n";
		let body = extract_body(text, &Markers::default()).unwrap();
		assert_eq!(body, "caf\u{FFFD} au lait merci ");
		assert_eq!(read_all(&b"caf\xe9\r\nnoir"[..]).unwrap(), "caf\u{FFFD} noir ");
	}

	#[test]
	fn read_errors_are_still_reported() {
		struct Broken;
		impl io::Read for Broken {
			fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
				Err(io::Error::other("disk on fire"))
			}
		}
		let reader = io::BufReader::new(Broken);
		assert_eq!(read_all(reader).unwrap_err().kind(), io::ErrorKind::Other);
	}
}
