use serde::{Deserialize, Serialize};
use std::fmt;

pub type CompactString = Box<str>;

pub fn compact_string(s: &str) -> CompactString {
    s.into()
}

/// Identity of a project in the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectId(CompactString);

/// Dot-separated name of a model object, e.g. `motor.products.Liability2024`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QualifiedName(CompactString);

/// Kind of model object a source file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    ProductComponent,
    ProductComponentType,
    PolicyComponentType,
    TableStructure,
    TableContents,
    EnumType,
    EnumContent,
    TestCase,
    TestCaseType,
}

/// How a source file changed since it was last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeltaKind {
    Added,
    Removed,
    Changed,
}

impl ProjectId {
    pub fn new(name: &str) -> Self {
        Self(compact_string(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl QualifiedName {
    /// Separator between package segments and the object name.
    pub const SEPARATOR: char = '.';

    pub fn new(name: &str) -> Self {
        Self(compact_string(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Final segment of the name (the name without its package).
    pub fn unqualified(&self) -> &str {
        match self.0.rfind(Self::SEPARATOR) {
            Some(pos) => &self.0[pos + 1..],
            None => &self.0,
        }
    }

    /// Package part of the name, empty for the default package.
    pub fn package(&self) -> &str {
        match self.0.rfind(Self::SEPARATOR) {
            Some(pos) => &self.0[..pos],
            None => "",
        }
    }
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::ProductComponent => "product_component",
            ObjectType::ProductComponentType => "product_component_type",
            ObjectType::PolicyComponentType => "policy_component_type",
            ObjectType::TableStructure => "table_structure",
            ObjectType::TableContents => "table_contents",
            ObjectType::EnumType => "enum_type",
            ObjectType::EnumContent => "enum_content",
            ObjectType::TestCase => "test_case",
            ObjectType::TestCaseType => "test_case_type",
        }
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ProjectId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<&str> for QualifiedName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
