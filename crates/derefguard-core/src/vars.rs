use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VarId(pub u32);

impl std::fmt::Display for VarId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarKind {
    Local,
    Param,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarInfo {
    pub name: String,
    pub kind: VarKind,
    pub is_pointer: bool,
}

impl VarInfo {
    pub fn new(name: impl Into<String>, kind: VarKind, is_pointer: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            is_pointer,
        }
    }
}

/// Read-only lookup table from variable identity to declaration metadata.
///
/// The classifier resolves expressions against this table instead of chasing
/// back-pointers into an AST, so the analysis never shares ownership with the
/// tree it inspects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeclMap {
    vars: IndexMap<VarId, VarInfo>,
}

impl DeclMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: VarId, info: VarInfo) {
        self.vars.insert(id, info);
    }

    pub fn get(&self, id: VarId) -> Option<&VarInfo> {
        self.vars.get(&id)
    }

    pub fn is_pointer(&self, id: VarId) -> bool {
        self.vars.get(&id).map(|v| v.is_pointer).unwrap_or(false)
    }

    /// Declared name, or the numeric identity when the variable is unknown.
    pub fn name_of(&self, id: VarId) -> String {
        self.vars
            .get(&id)
            .map(|v| v.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn iter(&self) -> impl Iterator<Item = (VarId, &VarInfo)> {
        self.vars.iter().map(|(id, info)| (*id, info))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
