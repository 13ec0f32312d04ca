/// Length of the longest common prefix of two slices.
pub(crate) fn common_prefix_len<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

/// Number of tab characters after the last newline in `s`.
///
/// Line-terminator lexemes carry the following line's leading whitespace, so
/// this is the tab count of the last physical line the lexeme touched.
pub(crate) fn trailing_tabs(s: &str) -> usize {
    let last_line = s.rsplit('\n').next().unwrap_or(s);
    last_line.matches('\t').count()
}
