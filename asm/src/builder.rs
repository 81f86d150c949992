use crate::assembly::Assembly;
use crate::calc::Calc;
use crate::error::{Error, Result};
use crate::fragment::Fragment;
use crate::layout::Layout;
use crate::line::Line;
use crate::reference::Reference;

// Composite helpers, all expressed with `add_lines` and `define`.

impl Assembly {
    pub fn add_line(self, line: Line) -> Self {
        self.add_lines([line])
    }

    pub fn add_bytes(self, bytes: impl Into<Vec<u8>>) -> Self {
        self.add_line(Line::new(vec![Fragment::bytes(bytes)]))
    }

    pub fn add_bytes_with(self, bytes: impl Into<Vec<u8>>, comment: impl Into<String>) -> Self {
        self.add_line(Line::with_comment(vec![Fragment::bytes(bytes)], comment))
    }

    /// One line of little-endian words, e.g. a jump table.
    pub fn add_words<I, C>(self, words: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Calc>,
    {
        let calcs: Vec<Calc> = words.into_iter().map(Into::into).collect();
        let comment = format!(
            "dw {}",
            calcs.iter().map(Calc::to_string).collect::<Vec<_>>().join(", ")
        );
        let fragments = calcs.into_iter().map(Fragment::word).collect();
        self.add_line(Line::with_comment(fragments, comment))
    }

    /// Bitmap rows as data words, 16 pixels per word, leftmost pixel in
    /// bit 0. Any character but a space sets a pixel.
    pub fn add_bitmap<S: AsRef<str>>(self, rows: &[S]) -> Result<Self> {
        let mut lines = Vec::with_capacity(rows.len());
        for row in rows {
            let row = row.as_ref();
            let pixels: Vec<char> = row.chars().collect();
            if pixels.len() % 16 != 0 {
                return Err(Error::InvalidStructure(format!(
                    "bitmap row `{}` is {} pixels wide, not a multiple of 16",
                    row,
                    pixels.len()
                )));
            }
            let bytes: Vec<u8> = pixels
                .chunks(16)
                .flat_map(|chunk| {
                    let word = chunk
                        .iter()
                        .rev()
                        .fold(0u16, |word, c| word << 1 | u16::from(*c != ' '));
                    word.to_le_bytes()
                })
                .collect();
            lines.push(Line::with_comment(vec![Fragment::bytes(bytes)], format!("|{}|", row)));
        }
        Ok(self.add_lines(lines))
    }

    /// Comment only lines; an empty string leaves a blank separator.
    pub fn add_block_comment<I, S>(self, comments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_lines(comments.into_iter().map(Line::comment_only))
    }

    /// Names the reference in a comment line (when labelled), then defines it.
    pub fn label(self, reference: &Reference) -> Result<Self> {
        let asm = match reference.label() {
            Some(label) => self.add_block_comment([format!("{}:", label)]),
            None => self,
        };
        asm.define(reference)
    }

    pub fn define_with<F>(self, reference: &Reference, append: F) -> Result<Self>
    where
        F: FnOnce(Self) -> Result<Self>,
    {
        append(self.label(reference)?)
    }

    pub fn append<F>(self, append: F) -> Result<Self>
    where
        F: FnOnce(Self) -> Result<Self>,
    {
        append(self)
    }

    /// Runs `append` `times` times, passing the iteration index.
    pub fn repeat<F>(self, times: usize, mut append: F) -> Result<Self>
    where
        F: FnMut(usize, Self) -> Result<Self>,
    {
        if times < 1 {
            return Err(Error::InvalidRepeat(times));
        }
        (0..times).try_fold(self, |asm, idx| append(idx, asm))
    }

    /// Wraps a block between `name` and `end name` marker comments.
    pub fn block<F>(self, name: &str, append: F) -> Result<Self>
    where
        F: FnOnce(Self) -> Result<Self>,
    {
        append(self.add_block_comment([name.to_string()]))
            .map(|asm| asm.add_block_comment([format!("end {}", name)]))
    }

    /// Blank separated, labelled block starting at `reference`.
    pub fn routine<F>(self, reference: &Reference, append: F) -> Result<Self>
    where
        F: FnOnce(Self) -> Result<Self>,
    {
        let name = reference.to_string();
        let asm = self
            .add_block_comment([String::new(), format!("{} routine:", name)])
            .define(reference)?;
        Ok(append(asm)?.add_block_comment([String::new()]))
    }

    /// Block whose start is a fresh reference handed to `append`, so the
    /// body can branch back to it.
    pub fn loop_block<F>(self, append: F) -> Result<Self>
    where
        F: FnOnce(&Reference, Self) -> Result<Self>,
    {
        let start = Reference::labelled("loop");
        let asm = self.label(&start)?;
        append(&start, asm).map(|asm| asm.add_block_comment(["end loop"]))
    }

    /// Lays out a global variable area at the current address.
    ///
    /// With a fill byte every leaf gets `fill` bytes up to the next leaf;
    /// without one only address comments are written and no space is taken.
    pub fn define_globals(self, reference: &Reference, layout: &Layout, fill: Option<u8>) -> Result<Self> {
        let base = self.total_bytes();
        let root = reference.label().unwrap_or_default();
        let entries: Vec<(usize, String)> = layout.offsets.paths(base, root).into_iter().collect();
        let end = base + layout.total_bytes;

        let lines: Vec<Line> = entries
            .iter()
            .enumerate()
            .map(|(idx, (addr, path))| match fill {
                None => Line::comment_only(format!("{:04X}: {}", addr, path)),
                Some(fill) => {
                    let next = entries.get(idx + 1).map_or(end, |(next, _)| *next);
                    Line::with_comment(vec![Fragment::bytes(vec![fill; next - addr])], path.clone())
                }
            })
            .collect();

        Ok(self.label(reference)?.add_lines(lines))
    }
}
