//! Character cursor over a voice substring.

/// A forward-only cursor over a string slice.
///
/// Positions reported by [`Reader::index`] are in characters, which is what lex
/// errors carry.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    input: &'a str,
    position: usize,
    index: usize,
}

impl<'a> Reader<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            position: 0,
            index: 0,
        }
    }

    /// Look `n` characters ahead without moving.
    pub fn peek(&self, n: usize) -> Option<char> {
        self.input[self.position..].chars().nth(n)
    }

    pub fn next_char(&mut self) -> Option<char> {
        let c = self.input[self.position..].chars().next()?;
        self.position += c.len_utf8();
        self.index += 1;
        Some(c)
    }

    /// Consume characters while `pred` holds and return how many were consumed.
    pub fn skip_while(&mut self, pred: impl Fn(char) -> bool) -> usize {
        let mut count = 0;
        while let Some(c) = self.peek(0) {
            if !pred(c) {
                break;
            }
            self.next_char();
            count += 1;
        }
        count
    }

    /// Scan ahead to the next `delimiter`, consuming it.
    ///
    /// Returns the text before the delimiter, or `None` (without moving) if the
    /// delimiter never appears.
    pub fn scan_to(&mut self, delimiter: char) -> Option<&'a str> {
        let rest = &self.input[self.position..];
        let offset = rest.find(delimiter)?;
        let consumed = &rest[..offset];
        self.position += offset + delimiter.len_utf8();
        self.index += consumed.chars().count() + 1;
        Some(consumed)
    }

    pub fn is_eos(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Characters consumed so far.
    pub fn index(&self) -> usize {
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peek_does_not_advance() {
        let reader = Reader::new("12");
        assert_eq!(reader.peek(0), Some('1'));
        assert_eq!(reader.peek(1), Some('2'));
        assert_eq!(reader.peek(2), None);
        assert_eq!(reader.index(), 0);
    }

    #[test]
    fn test_next_and_eos() {
        let mut reader = Reader::new("ab");
        assert_eq!(reader.next_char(), Some('a'));
        assert_eq!(reader.next_char(), Some('b'));
        assert!(reader.is_eos());
        assert_eq!(reader.next_char(), None);
        assert_eq!(reader.index(), 2);
    }

    #[test]
    fn test_scan_to_consumes_delimiter() {
        let mut reader = Reader::new("VOL=1}23");
        assert_eq!(reader.scan_to('}'), Some("VOL=1"));
        assert_eq!(reader.index(), 6);
        assert_eq!(reader.next_char(), Some('2'));
    }

    #[test]
    fn test_scan_to_missing_delimiter() {
        let mut reader = Reader::new("VOL=1");
        assert_eq!(reader.scan_to('}'), None);
        assert_eq!(reader.index(), 0);
    }

    #[test]
    fn test_skip_while_counts() {
        let mut reader = Reader::new("~~~1");
        assert_eq!(reader.skip_while(|c| c == '~'), 3);
        assert_eq!(reader.peek(0), Some('1'));
    }

    #[test]
    fn test_index_counts_characters_not_bytes() {
        let mut reader = Reader::new("é1");
        reader.next_char();
        assert_eq!(reader.index(), 1);
        assert_eq!(reader.next_char(), Some('1'));
    }
}
