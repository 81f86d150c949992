use crate::error::{Error, Result};
use crate::fragment::Fragment;
use crate::line::Line;
use crate::output::OutputLine;
use crate::reference::Reference;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::rc::Rc;
use tracing::{debug, trace};

/// Current view of references, handed to every deferred fragment.
pub struct References<'a> {
    addresses: &'a IndexMap<Reference, usize>,
    used: &'a mut HashSet<Reference>,
    line_address: usize,
}

impl<'a> References<'a> {
    pub(crate) fn new(
        addresses: &'a IndexMap<Reference, usize>,
        used: &'a mut HashSet<Reference>,
        line_address: usize,
    ) -> Self {
        References {
            addresses,
            used,
            line_address,
        }
    }

    /// Address assigned to `reference`. Marks it as used.
    pub fn address(&mut self, reference: &Reference) -> Result<usize> {
        match self.addresses.get(reference) {
            Some(&addr) => {
                self.used.insert(reference.clone());
                Ok(addr)
            }
            None => Err(Error::UndefinedReference(reference.to_string())),
        }
    }

    /// Address of the line being resolved.
    pub fn current_line_address(&self) -> usize {
        self.line_address
    }
}

// ----------------------------------------------------------------------------

/// Lazy, single pass resolution of a finished program into output lines.
///
/// The unused reference check runs once every line has been pulled; a
/// consumer that stops early never sees it.
pub struct Assemble {
    lines: Rc<Vec<Line>>,
    addresses: Rc<IndexMap<Reference, usize>>,
    used: HashSet<Reference>,
    next: usize,
    address: usize,
    last_empty: bool,
    finished: bool,
}

impl Assemble {
    pub(crate) fn new(lines: Rc<Vec<Line>>, addresses: Rc<IndexMap<Reference, usize>>) -> Self {
        debug!(
            lines = lines.len(),
            references = addresses.len(),
            "resolving program"
        );
        Assemble {
            lines,
            addresses,
            used: HashSet::new(),
            next: 0,
            address: 0,
            // Start as if a blank line was already emitted
            last_empty: true,
            finished: false,
        }
    }

    fn unused(&self) -> Vec<String> {
        self.addresses
            .keys()
            .filter(|r| !self.used.contains(*r))
            .map(|r| r.to_string())
            .collect()
    }
}

impl Iterator for Assemble {
    type Item = Result<OutputLine>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let lines = Rc::clone(&self.lines);
        while let Some(line) = lines.get(self.next) {
            self.next += 1;

            let output = match resolve_line(line, &self.addresses, &mut self.used, self.address) {
                Ok(output) => output,
                Err(err) => {
                    self.finished = true;
                    return Some(Err(err));
                }
            };
            trace!(address = self.address, bytes = output.len(), "resolved line");
            self.address += output.len();

            let empty = output.is_empty();
            let skip = empty && self.last_empty;
            self.last_empty = empty;
            if !skip {
                return Some(Ok(output));
            }
        }

        self.finished = true;
        let unused = self.unused();
        debug!(bytes = self.address, unused = unused.len(), "resolved program");
        if unused.is_empty() {
            None
        } else {
            Some(Err(Error::UnusedReferences(unused)))
        }
    }
}

fn resolve_line(
    line: &Line,
    addresses: &IndexMap<Reference, usize>,
    used: &mut HashSet<Reference>,
    line_address: usize,
) -> Result<OutputLine> {
    let mut bytes = Vec::with_capacity(line.len());
    for fragment in line.fragments() {
        match fragment {
            Fragment::Fixed(fixed) => bytes.extend_from_slice(fixed),
            Fragment::Deferred { .. } => {
                let mut refs = References::new(addresses, used, line_address);
                bytes.extend(fragment.calculate(&mut refs)?);
            }
        }
    }
    Ok(OutputLine::new(bytes, line.comment().map(str::to_string)))
}
