use crate::error::{Error, Result};
use crate::reference::Reference;
use crate::resolve::References;
use std::fmt;
use std::ops::{Add, Sub};

/// Address arithmetic evaluated at resolve time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Calc {
    Lit(i64),
    Addr(Reference),
    /// Address of the line being resolved
    Here,
    Add(Box<Calc>, Box<Calc>),
    Sub(Box<Calc>, Box<Calc>),
}

impl Calc {
    pub fn eval(&self, refs: &mut References<'_>) -> Result<i64> {
        match self {
            Calc::Lit(value) => Ok(*value),
            Calc::Addr(reference) => Ok(refs.address(reference)? as i64),
            Calc::Here => Ok(refs.current_line_address() as i64),
            Calc::Add(lhs, rhs) => {
                let (lhs, rhs) = (lhs.eval(refs)?, rhs.eval(refs)?);
                lhs.checked_add(rhs)
                    .ok_or_else(|| self.overflow(lhs.saturating_add(rhs)))
            }
            Calc::Sub(lhs, rhs) => {
                let (lhs, rhs) = (lhs.eval(refs)?, rhs.eval(refs)?);
                lhs.checked_sub(rhs)
                    .ok_or_else(|| self.overflow(lhs.saturating_sub(rhs)))
            }
        }
    }

    fn overflow(&self, value: i64) -> Error {
        Error::OutOfRange {
            what: format!("`{}`", self),
            value,
            min: i64::MIN,
            max: i64::MAX,
        }
    }
}

impl fmt::Display for Calc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Calc::Lit(value) => write!(f, "{}", value),
            Calc::Addr(reference) => write!(f, "{}", reference),
            Calc::Here => write!(f, "$"),
            Calc::Add(lhs, rhs) => write!(f, "{}+{}", lhs, rhs),
            Calc::Sub(lhs, rhs) if matches!(**rhs, Calc::Add(..) | Calc::Sub(..)) => {
                write!(f, "{}-({})", lhs, rhs)
            }
            Calc::Sub(lhs, rhs) => write!(f, "{}-{}", lhs, rhs),
        }
    }
}

// ----------------------------------------------------------------------------

impl From<i64> for Calc {
    fn from(value: i64) -> Self {
        Calc::Lit(value)
    }
}

impl From<usize> for Calc {
    fn from(value: usize) -> Self {
        Calc::Lit(value as i64)
    }
}

impl From<Reference> for Calc {
    fn from(reference: Reference) -> Self {
        Calc::Addr(reference)
    }
}

impl From<&Reference> for Calc {
    fn from(reference: &Reference) -> Self {
        Calc::Addr(reference.clone())
    }
}

impl Add<i64> for Calc {
    type Output = Calc;
    fn add(self, rhs: i64) -> Calc {
        Calc::Add(Box::new(self), Box::new(Calc::Lit(rhs)))
    }
}

impl Sub<i64> for Calc {
    type Output = Calc;
    fn sub(self, rhs: i64) -> Calc {
        Calc::Sub(Box::new(self), Box::new(Calc::Lit(rhs)))
    }
}

impl Add<Calc> for Calc {
    type Output = Calc;
    fn add(self, rhs: Calc) -> Calc {
        Calc::Add(Box::new(self), Box::new(rhs))
    }
}

impl Sub<Calc> for Calc {
    type Output = Calc;
    fn sub(self, rhs: Calc) -> Calc {
        Calc::Sub(Box::new(self), Box::new(rhs))
    }
}

impl Add<i64> for &Reference {
    type Output = Calc;
    fn add(self, rhs: i64) -> Calc {
        Calc::from(self) + rhs
    }
}

impl Sub<i64> for &Reference {
    type Output = Calc;
    fn sub(self, rhs: i64) -> Calc {
        Calc::from(self) - rhs
    }
}
