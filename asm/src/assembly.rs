use crate::error::{Error, Result};
use crate::line::Line;
use crate::output::OutputLine;
use crate::reference::Reference;
use crate::resolve::Assemble;
use indexmap::IndexMap;
use std::rc::Rc;
use tracing::trace;

/// Immutable program layout.
///
/// Every operation takes the program by value and returns its successor.
/// Lines and addresses are shared between clones and copied on write, so a
/// snapshot kept with `clone()` stays valid and cheap.
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    lines: Rc<Vec<Line>>,
    total_bytes: usize,
    addresses: Rc<IndexMap<Reference, usize>>,
}

impl Assembly {
    pub fn new() -> Self {
        Assembly::default()
    }

    /// Cumulative length of every line appended so far.
    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn address_of(&self, reference: &Reference) -> Option<usize> {
        self.addresses.get(reference).copied()
    }

    pub fn add_lines<I>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = Line>,
    {
        let store = Rc::make_mut(&mut self.lines);
        for line in lines {
            self.total_bytes += line.len();
            store.push(line);
        }
        self
    }

    /// Assigns `reference` the current byte count as its address.
    pub fn define(mut self, reference: &Reference) -> Result<Self> {
        if self.addresses.contains_key(reference) {
            return Err(Error::ReferenceAlreadyDefined(reference.to_string()));
        }
        trace!(%reference, address = self.total_bytes, "defined reference");
        Rc::make_mut(&mut self.addresses).insert(reference.clone(), self.total_bytes);
        Ok(self)
    }

    /// Creates a fresh, undefined reference and hands it to `build`.
    pub fn declare<F>(self, label: &str, build: F) -> Result<Self>
    where
        F: FnOnce(Self, Reference) -> Result<Self>,
    {
        build(self, Reference::labelled(label))
    }

    /// Lazy resolution into output lines. See [`Assemble`].
    pub fn assemble(&self) -> Assemble {
        Assemble::new(Rc::clone(&self.lines), Rc::clone(&self.addresses))
    }

    /// Resolves every line, including the unused reference check.
    pub fn assemble_all(&self) -> Result<Vec<OutputLine>> {
        self.assemble().collect()
    }
}
