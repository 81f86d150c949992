pub mod collapse;
pub mod hex;
pub mod listing;

use crate::error::Result;
use collapse::CollapseRepeats;
use hex::IntelHex;
use listing::Listing;

/// A resolved line: concrete bytes (never an empty vector) and a comment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutputLine {
    bytes: Option<Vec<u8>>,
    comment: Option<String>,
}

impl OutputLine {
    pub fn new(bytes: Vec<u8>, comment: Option<String>) -> Self {
        OutputLine {
            bytes: if bytes.is_empty() { None } else { Some(bytes) },
            comment,
        }
    }

    pub fn comment_only(comment: impl Into<String>) -> Self {
        OutputLine {
            bytes: None,
            comment: Some(comment.into()),
        }
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn len(&self) -> usize {
        self.bytes.as_ref().map_or(0, Vec::len)
    }

    /// No bytes and no (or a blank) comment: a separator.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_none() && self.comment.as_deref().map_or(true, str::is_empty)
    }

    /// Only lines with both bytes and a comment may anchor a repeat.
    pub(crate) fn is_repeatable(&self) -> bool {
        self.bytes.is_some() && self.comment.as_deref().map_or(false, |c| !c.is_empty())
    }
}

// ----------------------------------------------------------------------------

/// Adapters over a stream of resolved lines.
pub trait OutputLines: Iterator<Item = Result<OutputLine>> + Sized {
    fn collapse_repeats(self) -> CollapseRepeats<Self> {
        CollapseRepeats::new(self)
    }

    fn into_intel_hex(self) -> IntelHex<Self> {
        IntelHex::new(self)
    }

    fn into_listing(self, ansi: bool) -> Listing<Self> {
        Listing::new(self, ansi)
    }

    /// Flat byte image of the whole stream.
    fn into_image(self) -> Result<Vec<u8>> {
        let mut image = Vec::new();
        for line in self {
            if let Some(bytes) = line?.bytes() {
                image.extend_from_slice(bytes);
            }
        }
        Ok(image)
    }
}

impl<I: Iterator<Item = Result<OutputLine>>> OutputLines for I {}
