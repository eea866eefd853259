/// Separator between tokens inside a message and inside a stored chain.
pub const TOKEN_SEPARATOR: &str = " ";

/// Delimiter between the scope and the chain in a store key.
pub const SCOPE_DELIMITER: &str = ":";

/// Start-of-text sentinel, prepended to every message.
pub const START_TOKEN: &str = "\x02";

/// End-of-text sentinel, appended to every message.
pub const END_TOKEN: &str = "\x03";

/// Splits a message into its tokens.
///
/// An empty message has no token. Otherwise consecutive separators produce
/// empty tokens, exactly like a plain split.
pub fn split(message: &str) -> Vec<&str> {
	if message.is_empty() {
		return Vec::new();
	}
	message.split(TOKEN_SEPARATOR).collect()
}

/// Joins tokens with the separator.
pub fn join<S: AsRef<str>>(tokens: &[S]) -> String {
	let mut out = String::new();
	for (i, token) in tokens.iter().enumerate() {
		if i > 0 {
			out.push_str(TOKEN_SEPARATOR);
		}
		out.push_str(token.as_ref());
	}
	out
}

/// Builds the store key of a chain (or a context) within a scope.
///
/// Example: `("g1", "hello there")` → `"g1:hello there"`
pub fn scoped_key(scope: &str, chain: &str) -> String {
	let mut key = String::with_capacity(scope.len() + SCOPE_DELIMITER.len() + chain.len());
	key.push_str(scope);
	key.push_str(SCOPE_DELIMITER);
	key.push_str(chain);
	key
}

/// Extracts every chain of a message.
///
/// The message is bounded by the start and end sentinels, then every
/// contiguous sub-sequence of 2 to `max_save_order + 1` tokens is emitted,
/// anchored at every position. Shorter chains starting mid-sentence are kept
/// so that short contexts can be looked up during generation.
///
/// # Example
/// `"a b"` with `max_save_order = 2` gives
/// `["\x02 a", "\x02 a b", "a b", "a b \x03", "b \x03"]`.
pub fn chains(message: &str, max_save_order: usize) -> Vec<String> {
	let mut tokens = Vec::with_capacity(message.len() / 4 + 2);
	tokens.push(START_TOKEN);
	tokens.extend(split(message));
	tokens.push(END_TOKEN);

	let mut result = Vec::new();
	for start in 0..tokens.len() - 1 {
		for len in 2..=max_save_order + 1 {
			let end = start + len;
			if end > tokens.len() {
				break;
			}
			result.push(join(&tokens[start..end]));
		}
	}
	result
}
