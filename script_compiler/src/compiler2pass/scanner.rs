//! Scan state and the character-level primitives used by pass 1

use super::types::TokenInstruction;

/// Everything a rule path can change while it is being tried.
///
/// One `ScanState` lives for one pass-1 run and is passed down every call.
#[derive(Debug, Clone)]
pub struct ScanState<'s> {
    source: &'s str,
    /// Byte offset of the next unread character
    pub char_pos: usize,
    /// 1-based line of `char_pos`
    pub line: u32,
    pub active_contexts: u32,
    pub tokens: Vec<TokenInstruction>,
    pub constants: Vec<f32>,
    pub(super) depth: usize,
    furthest: (usize, u32),
}

/// Rollback point taken on entry to a rule path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    token_count: usize,
    constant_count: usize,
    char_pos: usize,
    line: u32,
}

impl<'s> ScanState<'s> {
    pub fn new(source: &'s str, active_contexts: u32) -> Self {
        Self {
            source,
            char_pos: 0,
            line: 1,
            active_contexts,
            tokens: Vec::new(),
            constants: Vec::new(),
            depth: 0,
            furthest: (0, 1),
        }
    }

    pub fn source(&self) -> &'s str {
        self.source
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            token_count: self.tokens.len(),
            constant_count: self.constants.len(),
            char_pos: self.char_pos,
            line: self.line,
        }
    }

    /// Drop everything accepted since `snapshot` and rewind the cursor.
    /// Active contexts are left as they are.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        self.tokens.truncate(snapshot.token_count);
        self.constants.truncate(snapshot.constant_count);
        self.char_pos = snapshot.char_pos;
        self.line = snapshot.line;
    }

    /// Furthest `(char_pos, line)` at which a terminal was tried
    pub fn furthest(&self) -> (usize, u32) {
        self.furthest
    }

    pub(super) fn note_attempt(&mut self) {
        if self.char_pos >= self.furthest.0 {
            self.furthest = (self.char_pos, self.line);
        }
    }

    fn bytes(&self) -> &'s [u8] {
        self.source.as_bytes()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes().get(self.char_pos).copied()
    }

    /// Skip whitespace, line ends and comments. True when a printable
    /// character is left under the cursor.
    pub fn position_to_next_symbol(&mut self) -> bool {
        loop {
            self.skip_whitespace();
            self.skip_eol();
            self.skip_comments();

            match self.peek() {
                None => return false,
                Some(byte) if byte > b' ' => return true,
                Some(_) => {}
            }
        }
    }

    /// Spaces, tabs and other non-printing bytes that do not end a line
    fn skip_whitespace(&mut self) {
        while let Some(byte) = self.peek() {
            if byte > b' ' || byte == b'\n' || byte == b'\r' {
                break;
            }
            self.char_pos += 1;
        }
    }

    /// One line end; `\r\n` and `\n\r` count as a single line
    fn skip_eol(&mut self) {
        let Some(first) = self.peek() else {
            return;
        };
        if first != b'\n' && first != b'\r' {
            return;
        }

        self.line += 1;
        self.char_pos += 1;

        if let Some(second) = self.peek() {
            if (second == b'\n' || second == b'\r') && second != first {
                self.char_pos += 1;
            }
        }
    }

    fn at_comment(&self) -> bool {
        let rest = &self.bytes()[self.char_pos.min(self.source.len())..];
        rest.starts_with(b"//") || rest.starts_with(b";") || rest.starts_with(b"#")
    }

    /// `//`, `;` and `#` each run to the end of the line
    fn skip_comments(&mut self) {
        if self.at_comment() {
            self.find_end_of_line();
        }
    }

    /// Move to the next `\n`, or to the end of source when there is none
    fn find_end_of_line(&mut self) {
        self.char_pos = self.bytes()[self.char_pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(self.source.len(), |offset| self.char_pos + offset);
    }

    /// Numeric literal under the cursor: optional `-`, digits with at most one
    /// `.`, and at least one digit. Returns the value and its length in bytes.
    pub fn is_float_value(&self) -> Option<(f32, usize)> {
        let rest = &self.bytes()[self.char_pos..];
        let mut len = usize::from(rest.first() == Some(&b'-'));
        let mut digits = 0;
        let mut seen_dot = false;

        while let Some(&byte) = rest.get(len) {
            match byte {
                b'0'..=b'9' => digits += 1,
                b'.' if !seen_dot => seen_dot = true,
                _ => break,
            }
            len += 1;
        }

        if digits == 0 {
            return None;
        }

        let text = &self.source[self.char_pos..self.char_pos + len];
        text.parse::<f32>().ok().map(|value| (value, len))
    }

    /// Literal `text` starts at the cursor
    pub fn is_symbol(&self, text: &str) -> bool {
        !text.is_empty() && self.source[self.char_pos..].starts_with(text)
    }
}
