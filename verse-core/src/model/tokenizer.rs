//! Word/punctuation tokenization and the reverse join used to render lines.

/// Punctuation that attaches to the token before it when rendering.
const CLOSING: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}', '”', '’', '…'];

/// Straight quote: opens or closes depending on where it sits.
const STRAIGHT_QUOTE: &str = "\"";

/// Punctuation that attaches to the token after it when rendering.
const OPENING: &[char] = &['(', '[', '{', '“', '‘'];

/// Tokens that may end a line.
const SENTENCE_END: &[&str] = &[".", "!", "?", "…"];

/// Splits prose into word and punctuation tokens.
///
/// - Splits on any whitespace
/// - Leading and trailing punctuation of each chunk becomes one token per character
/// - Interior punctuation stays in the word (`snicker-snack`, `’Twas`, `don't`)
pub fn tokenize(text: &str) -> Vec<String> {
	let mut tokens = Vec::new();

	for chunk in text.split_whitespace() {
		let chars: Vec<char> = chunk.chars().collect();

		let start = chars.iter().position(|c| c.is_alphanumeric());
		let Some(start) = start else {
			// Only punctuation: "--", "!”"
			tokens.extend(chars.iter().map(|c| c.to_string()));
			continue;
		};
		// Safe: at least one alphanumeric character exists
		let end = chars.iter().rposition(|c| c.is_alphanumeric()).unwrap_or(start);

		// Keep a leading apostrophe glued to its word ("’Twas")
		let start = if start > 0 && is_apostrophe(chars[start - 1]) { start - 1 } else { start };

		tokens.extend(chars[..start].iter().map(|c| c.to_string()));
		tokens.push(chars[start..=end].iter().collect());
		tokens.extend(chars[end + 1..].iter().map(|c| c.to_string()));
	}

	tokens
}

/// Joins tokens back into a single line of text.
///
/// Closing punctuation hugs the previous token, opening punctuation hugs the
/// next one. Everything else is separated by one space.
///
/// A straight `"` has no direction of its own. Once one quote of the line
/// has been placed, the next one does the opposite; the first one opens when
/// it starts the line or follows a word and precedes one, and closes otherwise.
pub fn untokenize<S: AsRef<str>>(tokens: &[S]) -> String {
	let mut line = String::new();
	let mut glue_next = true;
	let mut quote_open: Option<bool> = None;

	for (i, token) in tokens.iter().enumerate() {
		let token = token.as_ref();
		let (opening, closing) = if token == STRAIGHT_QUOTE {
			let opens = match quote_open {
				Some(open) => !open,
				None => straight_quote_opens(tokens, i),
			};
			quote_open = Some(opens);
			(opens, !opens)
		} else {
			(is_single(token, OPENING), is_single(token, CLOSING))
		};

		if !glue_next && !closing {
			line.push(' ');
		}
		line.push_str(token);
		glue_next = opening;
	}

	line
}

/// Direction of the first straight quote of a line, from its neighbours.
fn straight_quote_opens<S: AsRef<str>>(tokens: &[S], i: usize) -> bool {
	let Some(previous) = i.checked_sub(1).map(|p| tokens[p].as_ref()) else {
		return true;
	};
	let next_is_word = tokens.get(i + 1).is_some_and(|t| t.as_ref().chars().any(char::is_alphanumeric));
	let after_text = previous.chars().any(char::is_alphanumeric) || previous == ":" || is_single(previous, OPENING);
	after_text && next_is_word
}

fn is_single(token: &str, set: &[char]) -> bool {
	let mut chars = token.chars();
	matches!((chars.next(), chars.next()), (Some(c), None) if set.contains(&c))
}

/// Whether `token` terminates a sentence.
pub fn is_sentence_end(token: &str) -> bool {
	SENTENCE_END.contains(&token)
}

fn is_apostrophe(c: char) -> bool {
	c == '\'' || c == '’'
}
