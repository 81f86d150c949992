use super::OutputLine;
use crate::error::Result;
use color_print::cformat;
use std::collections::VecDeque;

pub const HEADER: &str = "addr  bytes  cycles op";

/// Visible column where comments start on lines that carry bytes
const COMMENT_COLUMN: usize = 13;

pub fn header(ansi: bool) -> String {
    if ansi {
        cformat!("<cyan>{}</>", HEADER)
    } else {
        HEADER.to_string()
    }
}

/// One listing line: `AAAA: BBBB...` then `// comment` padded to a column.
pub fn format_line(address: usize, line: &OutputLine, ansi: bool) -> String {
    let mut text = String::new();
    let mut width = 0;

    if let Some(bytes) = line.bytes() {
        let addr = format!("{:04X}", address);
        let hex: String = bytes.iter().map(|b| format!("{:02X}", b)).collect();
        width = addr.len() + 2 + hex.len();
        if ansi {
            text.push_str(&cformat!("<yellow>{}</>", addr));
        } else {
            text.push_str(&addr);
        }
        text.push_str(": ");
        text.push_str(&hex);
    }

    if let Some(comment) = line.comment().filter(|c| !c.is_empty()) {
        if width > 0 {
            text.push_str(&" ".repeat(COMMENT_COLUMN.saturating_sub(width)));
        }
        if ansi {
            text.push_str(&cformat!("<green>// {}</>", comment));
        } else {
            text.push_str("// ");
            text.push_str(comment);
        }
    }
    text
}

fn highlight(text: &str, ansi: bool) -> String {
    if ansi {
        cformat!("<bg:red>{}</>", text)
    } else {
        text.to_string()
    }
}

// ----------------------------------------------------------------------------

/// Listing lines paired with the address of their first byte.
pub struct Addressed<I> {
    lines: I,
    address: usize,
    ansi: bool,
}

impl<I> Addressed<I> {
    pub fn new(lines: I, ansi: bool) -> Self {
        Addressed {
            lines,
            address: 0,
            ansi,
        }
    }
}

impl<I: Iterator<Item = Result<OutputLine>>> Iterator for Addressed<I> {
    type Item = Result<(usize, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = match self.lines.next()? {
            Ok(line) => line,
            Err(err) => return Some(Err(err)),
        };
        let address = self.address;
        self.address += line.len();
        Some(Ok((address, format_line(address, &line, self.ansi))))
    }
}

/// Header followed by one text line per output line.
pub struct Listing<I> {
    lines: Addressed<I>,
    header: bool,
}

impl<I> Listing<I> {
    pub fn new(lines: I, ansi: bool) -> Self {
        Listing {
            lines: Addressed::new(lines, ansi),
            header: false,
        }
    }
}

impl<I: Iterator<Item = Result<OutputLine>>> Iterator for Listing<I> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.header {
            self.header = true;
            return Some(Ok(header(self.lines.ansi)));
        }
        self.lines.next().map(|item| item.map(|(_, text)| text))
    }
}

/// Header plus at most `max_lines - 1` listing lines around `address`.
///
/// The line holding `address` is highlighted (ANSI only) and the window
/// stops pulling once enough lines after it have been collected.
pub fn debug_window<I>(lines: I, address: usize, max_lines: usize, ansi: bool) -> Result<Vec<String>>
where
    I: IntoIterator<Item = Result<OutputLine>>,
{
    let keep = max_lines.saturating_sub(1);
    let mut window: VecDeque<String> = VecDeque::with_capacity(keep + 1);
    let mut lines_after: Option<usize> = None;

    for item in Addressed::new(lines.into_iter(), ansi) {
        let (line_address, text) = item?;

        if lines_after.is_none() && line_address > address {
            if let Some(last) = window.back_mut() {
                *last = highlight(last, ansi);
            }
            lines_after = Some((keep / 2).max(keep.saturating_sub(window.len() + 1)));
        }

        if let Some(after) = lines_after.as_mut() {
            if *after == 0 {
                break;
            }
            *after -= 1;
        }

        window.push_back(text);
        if window.len() > keep {
            window.pop_front();
        }
    }

    Ok(std::iter::once(header(ansi)).chain(window).collect())
}
