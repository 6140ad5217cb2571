//! Locates a previously generated `#[cfg(test)] mod tests { ... }` block.
//!
//! Braces are counted by a small tagged-state scanner rather than a regex so
//! nested blocks inside the module are handled, and braces inside string
//! literals or comments are ignored.

pub const TEST_ATTRIBUTE: &str = "#[cfg(test)]";
pub const TEST_MODULE: &str = "mod tests";

/// Line range of a stale test block, as zero-based line indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestBlock {
    /// `start..=end` holds the whole block, attribute line included.
    Closed { start: usize, end: usize },
    /// The marker was found but its opening brace never balances.
    Unterminated { start: usize },
}

pub fn find_test_block<S: AsRef<str>>(lines: &[S]) -> Option<TestBlock> {
    let start = find_test_marker(lines)?;
    let mut scanner = DelimiterScanner::default();
    for (index, line) in lines.iter().enumerate().skip(start) {
        if scanner.feed_line(line.as_ref()) {
            return Some(TestBlock::Closed { start, end: index });
        }
    }
    Some(TestBlock::Unterminated { start })
}

fn find_test_marker<S: AsRef<str>>(lines: &[S]) -> Option<usize> {
    lines.iter().enumerate().find_map(|(index, line)| {
        let rest = line.as_ref().trim().strip_prefix(TEST_ATTRIBUTE)?;
        let rest = rest.trim();
        if declares_test_module(rest) {
            return Some(index);
        }
        let next_declares = rest.is_empty()
            && lines
                .get(index + 1)
                .is_some_and(|next| declares_test_module(next.as_ref().trim()));
        next_declares.then_some(index)
    })
}

fn declares_test_module(text: &str) -> bool {
    text.strip_prefix(TEST_MODULE).is_some_and(|rest| {
        rest.chars()
            .next()
            .is_none_or(|next| next.is_whitespace() || next == '{')
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ScanState {
    #[default]
    Code,
    StringLiteral,
    LineComment,
    BlockComment { depth: usize },
}

/// Brace-depth counter fed one line at a time.
#[derive(Debug, Default)]
struct DelimiterScanner {
    state: ScanState,
    depth: usize,
    opened: bool,
}

impl DelimiterScanner {
    /// Returns `true` on the line where the first opened brace is balanced again.
    ///
    /// Closing braces seen before anything was opened are ignored, so the
    /// block can only end after its own opening brace.
    fn feed_line(&mut self, line: &str) -> bool {
        let mut chars = line.chars().peekable();
        while let Some(current) = chars.next() {
            match self.state {
                ScanState::Code => match current {
                    '/' if chars.peek() == Some(&'/') => {
                        chars.next();
                        self.state = ScanState::LineComment;
                    }
                    '/' if chars.peek() == Some(&'*') => {
                        chars.next();
                        self.state = ScanState::BlockComment { depth: 1 };
                    }
                    '"' => self.state = ScanState::StringLiteral,
                    '{' => {
                        self.depth += 1;
                        self.opened = true;
                    }
                    '}' if self.depth > 0 => {
                        self.depth -= 1;
                        if self.depth == 0 && self.opened {
                            return true;
                        }
                    }
                    _ => {}
                },
                ScanState::StringLiteral => match current {
                    '\\' => {
                        chars.next();
                    }
                    '"' => self.state = ScanState::Code,
                    _ => {}
                },
                ScanState::LineComment => {}
                ScanState::BlockComment { depth } => {
                    if current == '*' && chars.peek() == Some(&'/') {
                        chars.next();
                        self.state = if depth == 1 {
                            ScanState::Code
                        } else {
                            ScanState::BlockComment { depth: depth - 1 }
                        };
                    } else if current == '/' && chars.peek() == Some(&'*') {
                        chars.next();
                        self.state = ScanState::BlockComment { depth: depth + 1 };
                    }
                }
            }
        }
        if self.state == ScanState::LineComment {
            self.state = ScanState::Code;
        }
        false
    }
}
