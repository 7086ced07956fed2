// src/parser.rs

/// Forward-only character scanner over a borrowed string.
///
/// Positions are byte offsets that always sit on a char boundary, so slices
/// taken with [`Scanner::slice`] never split a code point.
pub struct Scanner<'a> {
    s: &'a str,
    i: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    /// `i` must be a char boundary of `s`.
    pub fn starting_at(s: &'a str, i: usize) -> Self {
        Self { s, i: i.min(s.len()) }
    }

    pub fn pos(&self) -> usize {
        self.i
    }

    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.s[start..end]
    }

    pub fn rest(&self) -> &'a str {
        &self.s[self.i..]
    }

    pub fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn peek_str(&self, lit: &str) -> bool {
        self.rest().starts_with(lit)
    }

    /// Advances past the next char, if any.
    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.i += c.len_utf8();
        Some(c)
    }

    pub fn consume_str(&mut self, lit: &str) -> bool {
        if self.peek_str(lit) {
            self.i += lit.len();
            true
        } else {
            false
        }
    }

    /// Returns the first literal in `candidates` found at the cursor, without
    /// consuming it. Callers order candidates longest first.
    pub fn peek_any<'c>(&self, candidates: &[&'c str]) -> Option<&'c str> {
        candidates.iter().copied().find(|lit| self.peek_str(lit))
    }

    /// Consumes a parenthesised group starting at the cursor and returns its
    /// inner text. Nested pairs are kept in the output. `None` when the cursor
    /// is not on `(` or the group never closes; the cursor is left untouched
    /// in both cases.
    pub fn capture_group(&mut self) -> Option<&'a str> {
        if self.peek_char() != Some('(') {
            return None;
        }
        let start = self.i + 1;
        let mut depth = 0usize;
        for (offset, c) in self.rest().char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        let end = self.i + offset;
                        self.i = end + 1;
                        return Some(&self.s[start..end]);
                    }
                }
                _ => {}
            }
        }
        None
    }

    pub fn eof(&self) -> bool {
        self.i >= self.s.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_respects_multibyte_chars() {
        let mut sc = Scanner::new("é=1");
        assert_eq!(sc.bump(), Some('é'));
        assert!(sc.peek_str("="));
        assert_eq!(sc.slice(0, sc.pos()), "é");
    }

    #[test]
    fn capture_group_keeps_nested_parentheses() {
        let mut sc = Scanner::new("(a = (b)) tail");
        assert_eq!(sc.capture_group(), Some("a = (b)"));
        assert_eq!(sc.rest(), " tail");
    }

    #[test]
    fn capture_group_unclosed_leaves_cursor() {
        let mut sc = Scanner::new("(a = b");
        assert_eq!(sc.capture_group(), None);
        assert_eq!(sc.pos(), 0);
    }

    #[test]
    fn peek_any_prefers_first_candidate() {
        let sc = Scanner::new(">= 3");
        assert_eq!(sc.peek_any(&[">=", ">"]), Some(">="));
    }
}
