use super::OutputLine;
use crate::error::{Error, Result};
use std::collections::VecDeque;
use tracing::debug;

/// Longest run of lines tried as a repeating pattern
const MAX_PATTERN_LINES: usize = 5;
/// Lines held back while no pattern is forming
const WINDOW_LINES: usize = 10;

#[derive(Debug)]
struct Pattern {
    lines: Vec<OutputLine>,
    repeats: usize,
}

enum Match {
    Full,
    Partial,
    Mismatch,
}

impl Pattern {
    fn matches(&self, buffer: &[OutputLine]) -> Match {
        if buffer.len() > self.lines.len() || buffer != &self.lines[..buffer.len()] {
            Match::Mismatch
        } else if buffer.len() == self.lines.len() {
            Match::Full
        } else {
            Match::Partial
        }
    }

    /// Header comment, one aligned comment per further line, then the
    /// repeated bytes.
    fn collapse(self) -> Vec<OutputLine> {
        debug!(
            lines = self.lines.len(),
            repeats = self.repeats,
            "collapsed repeated lines"
        );
        let prefix = format!("[{}x]", self.repeats);
        let padding = " ".repeat(prefix.len());

        let mut collapsed = Vec::with_capacity(self.lines.len() + 1);
        for (idx, line) in self.lines.iter().enumerate() {
            let marker = if idx == 0 { &prefix } else { &padding };
            collapsed.push(OutputLine::comment_only(format!(
                "{} {}",
                marker,
                line.comment().unwrap_or_default()
            )));
        }

        let bytes: Vec<u8> = self
            .lines
            .iter()
            .flat_map(|line| line.bytes().unwrap_or_default().iter().copied())
            .collect();
        collapsed.push(OutputLine::new(bytes.repeat(self.repeats), None));
        collapsed
    }
}

fn detect(buffer: &[OutputLine]) -> Option<Pattern> {
    let n = buffer.len();
    if n < 3 {
        return None;
    }

    for len in (2..=MAX_PATTERN_LINES).rev() {
        if n < len * 2 {
            continue;
        }
        let pattern = &buffer[n - len..];
        if pattern == &buffer[n - len * 2..n - len] && pattern.iter().all(OutputLine::is_repeatable)
        {
            return Some(Pattern {
                lines: pattern.to_vec(),
                repeats: 2,
            });
        }
    }

    let last = &buffer[n - 1];
    if last.is_repeatable() && *last == buffer[n - 2] && *last == buffer[n - 3] {
        return Some(Pattern {
            lines: vec![last.clone()],
            repeats: 3,
        });
    }
    None
}

// ----------------------------------------------------------------------------

/// Streaming collapse of consecutive repeats into one annotated copy.
///
/// Holds at most `WINDOW_LINES` undecided lines. When the upstream fails,
/// everything already decided or buffered is delivered before the error.
pub struct CollapseRepeats<I> {
    lines: I,
    buffer: Vec<OutputLine>,
    pattern: Option<Pattern>,
    ready: VecDeque<OutputLine>,
    error: Option<Error>,
    finished: bool,
}

impl<I> CollapseRepeats<I> {
    pub fn new(lines: I) -> Self {
        CollapseRepeats {
            lines,
            buffer: Vec::new(),
            pattern: None,
            ready: VecDeque::new(),
            error: None,
            finished: false,
        }
    }

    fn push(&mut self, line: OutputLine) {
        self.buffer.push(line);

        if let Some(pattern) = &mut self.pattern {
            match pattern.matches(&self.buffer) {
                Match::Full => {
                    self.buffer.clear();
                    pattern.repeats += 1;
                    return;
                }
                Match::Partial => return,
                Match::Mismatch => {}
            }
            if let Some(pattern) = self.pattern.take() {
                self.ready.extend(pattern.collapse());
            }
        }

        match detect(&self.buffer) {
            Some(pattern) => {
                let occurrence = pattern.lines.len() * pattern.repeats;
                let before = self.buffer.len() - occurrence;
                self.ready.extend(self.buffer.drain(..before));
                self.buffer.clear();
                self.pattern = Some(pattern);
            }
            None if self.buffer.len() >= WINDOW_LINES => {
                let oldest = self.buffer.remove(0);
                self.ready.push_back(oldest);
            }
            None => {}
        }
    }

    fn flush(&mut self) {
        if let Some(pattern) = self.pattern.take() {
            self.ready.extend(pattern.collapse());
        }
        self.ready.extend(self.buffer.drain(..));
    }
}

impl<I: Iterator<Item = Result<OutputLine>>> Iterator for CollapseRepeats<I> {
    type Item = Result<OutputLine>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(line) = self.ready.pop_front() {
                return Some(Ok(line));
            }
            if self.finished {
                return self.error.take().map(Err);
            }
            match self.lines.next() {
                Some(Ok(line)) => self.push(line),
                Some(Err(err)) => {
                    self.flush();
                    self.error = Some(err);
                    self.finished = true;
                }
                None => {
                    self.flush();
                    self.finished = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputLines;

    fn op(bytes: &[u8], comment: &str) -> OutputLine {
        OutputLine::new(bytes.to_vec(), Some(comment.to_string()))
    }

    fn collapse(lines: Vec<OutputLine>) -> Vec<OutputLine> {
        lines
            .into_iter()
            .map(Ok)
            .collapse_repeats()
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn single_line_three_times() {
        let a = op(&[0x01], "x");
        let out = collapse(vec![a.clone(), a.clone(), a]);
        assert_eq!(
            out,
            vec![
                OutputLine::comment_only("[3x] x"),
                OutputLine::new(vec![0x01, 0x01, 0x01], None),
            ]
        );
    }

    #[test]
    fn single_line_twice_is_kept() {
        let a = op(&[0x01], "x");
        let out = collapse(vec![a.clone(), a.clone()]);
        assert_eq!(out, vec![a.clone(), a]);
    }

    #[test]
    fn two_line_pattern() {
        let b = op(&[0xB0], "b");
        let c = op(&[0xC0, 0xC1], "c");
        let out = collapse(vec![b.clone(), c.clone(), b, c]);
        assert_eq!(
            out,
            vec![
                OutputLine::comment_only("[2x] b"),
                OutputLine::comment_only("     c"),
                OutputLine::new(vec![0xB0, 0xC0, 0xC1, 0xB0, 0xC0, 0xC1], None),
            ]
        );
    }

    #[test]
    fn pattern_keeps_growing_and_stops_on_mismatch() {
        let b = op(&[0xB0], "b");
        let c = op(&[0xC0], "c");
        let d = op(&[0xD0], "d");
        let lines = vec![
            b.clone(),
            c.clone(),
            b.clone(),
            c.clone(),
            b.clone(),
            c.clone(),
            b.clone(),
            d.clone(),
        ];
        let out = collapse(lines);
        assert_eq!(
            out,
            vec![
                OutputLine::comment_only("[3x] b"),
                OutputLine::comment_only("     c"),
                OutputLine::new(vec![0xB0, 0xC0, 0xB0, 0xC0, 0xB0, 0xC0], None),
                b,
                d,
            ]
        );
    }

    #[test]
    fn leading_lines_are_emitted_before_pattern() {
        let head = op(&[0x00], "head");
        let a = op(&[0x01], "x");
        let out = collapse(vec![head.clone(), a.clone(), a.clone(), a.clone(), a]);
        assert_eq!(
            out,
            vec![
                head,
                OutputLine::comment_only("[4x] x"),
                OutputLine::new(vec![0x01; 4], None),
            ]
        );
    }

    #[test]
    fn lines_without_comment_or_bytes_never_collapse() {
        let bare = OutputLine::new(vec![0x01], None);
        let note = OutputLine::comment_only("note");
        let lines = vec![
            bare.clone(),
            bare.clone(),
            bare.clone(),
            note.clone(),
            note.clone(),
            note.clone(),
        ];
        assert_eq!(collapse(lines.clone()), lines);

        let mixed = vec![
            op(&[0x01], "x"),
            bare.clone(),
            op(&[0x01], "x"),
            bare.clone(),
        ];
        assert_eq!(collapse(mixed.clone()), mixed);
    }

    #[test]
    fn five_line_block_three_times() {
        let block: Vec<OutputLine> = (0..5u8).map(|i| op(&[i], &format!("c{i}"))).collect();
        let lines: Vec<OutputLine> = block.iter().cycle().take(15).cloned().collect();
        let out = collapse(lines);
        assert_eq!(
            out,
            vec![
                OutputLine::comment_only("[3x] c0"),
                OutputLine::comment_only("     c1"),
                OutputLine::comment_only("     c2"),
                OutputLine::comment_only("     c3"),
                OutputLine::comment_only("     c4"),
                OutputLine::new([0, 1, 2, 3, 4].repeat(3), None),
            ]
        );
    }

    #[test]
    fn longer_pattern_is_found_before_single_lines() {
        let a = op(&[0xA0], "a");
        let b = op(&[0xB0], "b");
        let lines = vec![a.clone(), a.clone(), b.clone(), a.clone(), a, b];
        let out = collapse(lines);
        assert_eq!(
            out,
            vec![
                OutputLine::comment_only("[2x] a"),
                OutputLine::comment_only("     a"),
                OutputLine::comment_only("     b"),
                OutputLine::new(vec![0xA0, 0xA0, 0xB0, 0xA0, 0xA0, 0xB0], None),
            ]
        );
    }

    #[test]
    fn window_evicts_oldest_line() {
        let lines: Vec<OutputLine> = (0..25u8).map(|i| op(&[i], "distinct")).collect();
        let mut collapser = CollapseRepeats::new(lines.clone().into_iter().map(Ok));
        for _ in 0..5 {
            collapser.next();
        }
        assert!(collapser.buffer.len() <= WINDOW_LINES);
        let rest: Vec<OutputLine> = collapser.map(|l| l.unwrap()).collect();
        assert_eq!(rest, lines[5..].to_vec());
    }

    #[test]
    fn error_surfaces_after_buffered_output() {
        let a = op(&[0x01], "x");
        let head = op(&[0x02], "head");
        let input: Vec<Result<OutputLine>> = vec![
            Ok(head.clone()),
            Ok(a.clone()),
            Ok(a.clone()),
            Ok(a.clone()),
            Err(Error::UndefinedReference("missing".to_string())),
            Ok(head.clone()),
        ];
        let mut out = input.into_iter().collapse_repeats();
        assert_eq!(out.next().unwrap().unwrap(), head);
        assert_eq!(
            out.next().unwrap().unwrap(),
            OutputLine::comment_only("[3x] x")
        );
        assert_eq!(
            out.next().unwrap().unwrap(),
            OutputLine::new(vec![0x01; 3], None)
        );
        assert!(matches!(out.next(), Some(Err(Error::UndefinedReference(_)))));
        assert!(out.next().is_none());
    }
}
