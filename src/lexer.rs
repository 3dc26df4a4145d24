//! Splitting an input line into whitespace-delimited tokens.

/// Characters that separate tokens. Matches the delimiter set of classic
/// teaching shells: space, tab, carriage return, newline and the bell
/// character.
const DELIMITERS: &[char] = &[' ', '\t', '\r', '\n', '\x07'];

/// Split a line into tokens.
///
/// Any run of delimiter characters separates two tokens; leading and trailing
/// delimiters are ignored, so a line consisting only of whitespace yields an
/// empty vector. There is no quoting or escaping: a space inside what a user
/// might intend as a quoted string still splits it.
///
/// The returned vector grows geometrically as tokens are collected. Running
/// out of memory while growing it aborts the process through the global
/// allocation-failure handler, which is the only fatal path in the
/// interpreter.
pub fn split_into_tokens(line: &str) -> Vec<String> {
    line.split(DELIMITERS)
        .filter(|part| !part.is_empty())
        .map(str::to_owned)
        .collect()
}
