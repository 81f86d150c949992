use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Byte sizes of a block of variables.
///
/// In JSON a leaf is a number, an array is a list and a struct is an object
/// whose key order is the declaration order: `{"head": {"x": 1, "y": 1}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Schema {
    Size(usize),
    Array(Vec<Schema>),
    Struct(IndexMap<String, Schema>),
}

/// Same shape as the schema it came from, leaves replaced by offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Offsets {
    Offset(usize),
    Array(Vec<Offsets>),
    Struct(IndexMap<String, Offsets>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub offsets: Offsets,
    pub total_bytes: usize,
}

impl Schema {
    pub fn array(len: usize, elem: Schema) -> Self {
        Schema::Array(vec![elem; len])
    }

    pub fn fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, Schema)>,
        S: Into<String>,
    {
        Schema::Struct(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Assigns offsets depth first in declaration order.
    pub fn layout(&self) -> Result<Layout> {
        let mut offset = 0;
        let offsets = self.assign(&mut offset, "")?;
        Ok(Layout {
            offsets,
            total_bytes: offset,
        })
    }

    fn assign(&self, offset: &mut usize, path: &str) -> Result<Offsets> {
        match self {
            Schema::Size(0) => Err(Error::InvalidLayout(format!(
                "`{}` has a size less than 1",
                display_path(path)
            ))),
            Schema::Size(size) => {
                let at = *offset;
                *offset += size;
                Ok(Offsets::Offset(at))
            }
            Schema::Array(elems) => elems
                .iter()
                .enumerate()
                .map(|(idx, elem)| elem.assign(offset, &format!("{}[{}]", path, idx)))
                .collect::<Result<Vec<_>>>()
                .map(Offsets::Array),
            Schema::Struct(fields) if fields.is_empty() => Err(Error::InvalidLayout(format!(
                "`{}` has no fields",
                display_path(path)
            ))),
            Schema::Struct(fields) => {
                let mut rets = IndexMap::new();
                for (name, field) in fields {
                    let offsets = field.assign(offset, &join(path, name))?;
                    rets.insert(name.clone(), offsets);
                }
                Ok(Offsets::Struct(rets))
            }
        }
    }
}

impl Layout {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ----------------------------------------------------------------------------

impl Offsets {
    /// Offset of a leaf, `None` for arrays and structs.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Offsets::Offset(at) => Some(*at),
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Offsets> {
        match self {
            Offsets::Struct(fields) => fields.get(name),
            _ => None,
        }
    }

    pub fn index(&self, idx: usize) -> Option<&Offsets> {
        match self {
            Offsets::Array(elems) => elems.get(idx),
            _ => None,
        }
    }

    /// Leaf offset by path, e.g. `head.x` or `cells[3].colour`.
    pub fn at(&self, path: &str) -> Option<usize> {
        let mut node = self;
        for segment in path.split('.').filter(|s| !s.is_empty()) {
            let (name, indices) = match segment.find('[') {
                Some(pos) => segment.split_at(pos),
                None => (segment, ""),
            };
            if !name.is_empty() {
                node = node.field(name)?;
            }
            for idx in indices.split('[').filter(|s| !s.is_empty()) {
                let idx = idx.strip_suffix(']')?.parse().ok()?;
                node = node.index(idx)?;
            }
        }
        node.offset()
    }

    /// Flattens into `base + offset -> path` pairs in declaration order.
    pub fn paths(&self, base: usize, root: &str) -> IndexMap<usize, String> {
        let mut paths = IndexMap::new();
        self.collect_paths(base, root.to_string(), &mut paths);
        paths
    }

    fn collect_paths(&self, base: usize, path: String, paths: &mut IndexMap<usize, String>) {
        match self {
            Offsets::Offset(at) => {
                paths.insert(base + at, path);
            }
            Offsets::Array(elems) => {
                for (idx, elem) in elems.iter().enumerate() {
                    elem.collect_paths(base, format!("{}[{}]", path, idx), paths);
                }
            }
            Offsets::Struct(fields) => {
                for (name, field) in fields {
                    field.collect_paths(base, join(&path, name), paths);
                }
            }
        }
    }
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "<root>"
    } else {
        path
    }
}
