//! Embedded assembler engine.
//!
//! Programs are built as immutable [`Assembly`] values from [`Line`]s of
//! [`Fragment`]s. Fragments that depend on addresses are deferred until
//! [`Assembly::assemble`], which resolves forward and backward
//! [`Reference`]s in a single lazy pass. The resolved stream can be
//! collapsed, listed or written as Intel hex through [`OutputLines`].

mod assembly;
mod builder;
mod calc;
mod error;
mod fragment;
mod layout;
mod line;
pub mod output;
mod reference;
mod resolve;

pub use assembly::Assembly;
pub use calc::Calc;
pub use error::{Error, Result};
pub use fragment::{Calculate, Fragment};
pub use layout::{Layout, Offsets, Schema};
pub use line::Line;
pub use output::{OutputLine, OutputLines};
pub use reference::Reference;
pub use resolve::{Assemble, References};
