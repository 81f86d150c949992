use crate::fragment::Fragment;

/// Ordered fragments plus an optional comment.
#[derive(Debug, Clone, Default)]
pub struct Line {
    fragments: Vec<Fragment>,
    comment: Option<String>,
}

impl Line {
    pub fn new(fragments: Vec<Fragment>) -> Self {
        Line {
            fragments,
            comment: None,
        }
    }

    pub fn with_comment(fragments: Vec<Fragment>, comment: impl Into<String>) -> Self {
        Line {
            fragments,
            comment: Some(comment.into()),
        }
    }

    pub fn comment_only(comment: impl Into<String>) -> Self {
        Line::with_comment(vec![], comment)
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Sum of the declared fragment lengths.
    pub fn len(&self) -> usize {
        self.fragments.iter().map(Fragment::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
