use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

/// Symbolic address token.
///
/// Compared by identity: two references created separately are never equal,
/// even when they carry the same label. Cloning keeps the identity.
#[derive(Clone)]
pub struct Reference {
    id: usize,
    label: Option<Rc<str>>,
}

impl Reference {
    pub fn new() -> Self {
        Reference {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            label: None,
        }
    }

    pub fn labelled(label: impl AsRef<str>) -> Self {
        Reference {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            label: Some(Rc::from(label.as_ref())),
        }
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

impl Default for Reference {
    fn default() -> Self {
        Reference::new()
    }
}

impl PartialEq for Reference {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Reference {}

impl Hash for Reference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{}", label),
            None => write!(f, "<anonymous #{}>", self.id),
        }
    }
}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reference({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_not_label() {
        let a = Reference::labelled("start");
        let b = Reference::labelled("start");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn display_falls_back_to_id() {
        let r = Reference::new();
        assert!(r.to_string().starts_with("<anonymous #"));
        assert_eq!(Reference::labelled("loop").to_string(), "loop");
    }
}
