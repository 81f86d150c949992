use crate::calc::Calc;
use crate::error::{Error, Result};
use crate::resolve::References;
use std::fmt;
use std::rc::Rc;

pub type Calculate = dyn Fn(&mut References<'_>) -> Result<Vec<u8>>;

/// Smallest byte producing unit of a line.
#[derive(Clone)]
pub enum Fragment {
    /// Bytes known at append time
    Fixed(Vec<u8>),
    /// `len` bytes computed once every reference has an address
    Deferred { len: usize, calculate: Rc<Calculate> },
}

impl Fragment {
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Fragment::Fixed(bytes.into())
    }

    pub fn deferred<F>(len: usize, calculate: F) -> Result<Self>
    where
        F: Fn(&mut References<'_>) -> Result<Vec<u8>> + 'static,
    {
        if len == 0 {
            return Err(Error::EmptyFragment);
        }
        Ok(Fragment::Deferred {
            len,
            calculate: Rc::new(calculate),
        })
    }

    /// Declared byte count, independent of any address.
    pub fn len(&self) -> usize {
        match self {
            Fragment::Fixed(bytes) => bytes.len(),
            Fragment::Deferred { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn calculate(&self, refs: &mut References<'_>) -> Result<Vec<u8>> {
        match self {
            Fragment::Fixed(bytes) => Ok(bytes.clone()),
            Fragment::Deferred { len, calculate } => {
                let bytes = calculate(refs)?;
                if bytes.len() != *len {
                    return Err(Error::ByteCountMismatch {
                        expected: *len,
                        actual: bytes.len(),
                    });
                }
                Ok(bytes)
            }
        }
    }
}

impl Fragment {
    /// Little-endian 16-bit word.
    pub fn word(calc: impl Into<Calc>) -> Self {
        let calc = calc.into();
        Fragment::Deferred {
            len: 2,
            calculate: Rc::new(move |refs| {
                let value = calc.eval(refs)?;
                check_range(&calc, value, i16::MIN as i64, u16::MAX as i64)?;
                Ok((value as u16).to_le_bytes().to_vec())
            }),
        }
    }

    /// Single byte, signed or unsigned.
    pub fn byte(calc: impl Into<Calc>) -> Self {
        let calc = calc.into();
        Fragment::Deferred {
            len: 1,
            calculate: Rc::new(move |refs| {
                let value = calc.eval(refs)?;
                check_range(&calc, value, i8::MIN as i64, u8::MAX as i64)?;
                Ok(vec![value as u8])
            }),
        }
    }

    /// Signed 8-bit offset from `here + bias` to `target`.
    pub fn relative(target: impl Into<Calc>, bias: i64) -> Self {
        let target = target.into();
        Fragment::Deferred {
            len: 1,
            calculate: Rc::new(move |refs| {
                let origin = refs.current_line_address() as i64 + bias;
                let offset = target.eval(refs)? - origin;
                check_range(&target, offset, i8::MIN as i64, i8::MAX as i64)?;
                Ok(vec![offset as i8 as u8])
            }),
        }
    }
}

fn check_range(calc: &Calc, value: i64, min: i64, max: i64) -> Result<()> {
    if value < min || value > max {
        return Err(Error::OutOfRange {
            what: format!("`{}`", calc),
            value,
            min,
            max,
        });
    }
    Ok(())
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fragment::Fixed(bytes) => f.debug_tuple("Fixed").field(bytes).finish(),
            Fragment::Deferred { len, .. } => f.debug_struct("Deferred").field("len", len).finish(),
        }
    }
}

impl From<Vec<u8>> for Fragment {
    fn from(bytes: Vec<u8>) -> Self {
        Fragment::Fixed(bytes)
    }
}

impl From<&[u8]> for Fragment {
    fn from(bytes: &[u8]) -> Self {
        Fragment::Fixed(bytes.to_vec())
    }
}
