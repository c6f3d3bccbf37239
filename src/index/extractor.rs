//! Key extraction strategies.
//!
//! A strategy names the object type an index covers and derives the index
//! key from one source file. `None` means the key cannot be derived and the
//! file stays out of every bucket.

use std::fmt;
use std::hash::Hash;

use crate::project::SourceFile;
use crate::types::{CompactString, ObjectType, compact_string};

pub trait KeyExtractor: Send + Sync + 'static {
    type Key: Clone + Eq + Hash + Ord + fmt::Debug + Send + Sync + 'static;

    /// Name used in log output.
    fn name(&self) -> &str;

    fn object_type(&self) -> ObjectType;

    fn extract(&self, file: &dyn SourceFile) -> Option<Self::Key>;
}

/// Key taken from a fixed property of the file's content.
///
/// Blank values count as not set. Read failures are logged and treated the
/// same way.
#[derive(Debug, Clone)]
pub struct PropertyKey {
    name: String,
    object_type: ObjectType,
    property: String,
}

impl PropertyKey {
    pub fn new(name: &str, object_type: ObjectType, property: &str) -> Self {
        Self {
            name: name.to_string(),
            object_type,
            property: property.to_string(),
        }
    }

    pub fn property(&self) -> &str {
        &self.property
    }
}

impl KeyExtractor for PropertyKey {
    type Key = CompactString;

    fn name(&self) -> &str {
        &self.name
    }

    fn object_type(&self) -> ObjectType {
        self.object_type
    }

    fn extract(&self, file: &dyn SourceFile) -> Option<Self::Key> {
        match file.property(&self.property) {
            Ok(Some(value)) => (!value.is_empty()).then(|| compact_string(&value)),
            Ok(None) => None,
            Err(e) => {
                crate::debug_event!(
                    "index",
                    "key skipped",
                    "{} for {}: {e}",
                    self.name,
                    file.qualified_name()
                );
                None
            }
        }
    }
}

/// Key taken from the final segment of the file's qualified name.
#[derive(Debug, Clone)]
pub struct UnqualifiedNameKey {
    object_type: ObjectType,
}

impl UnqualifiedNameKey {
    pub fn new(object_type: ObjectType) -> Self {
        Self { object_type }
    }
}

impl KeyExtractor for UnqualifiedNameKey {
    type Key = CompactString;

    fn name(&self) -> &str {
        "unqualified-name"
    }

    fn object_type(&self) -> ObjectType {
        self.object_type
    }

    fn extract(&self, file: &dyn SourceFile) -> Option<Self::Key> {
        let name = file.qualified_name().unqualified();
        (!name.is_empty()).then(|| compact_string(name))
    }
}

/// Strategy backed by a closure, for indexes defined by the host.
pub struct FnKey<K, F> {
    name: String,
    object_type: ObjectType,
    extract: F,
    _key: std::marker::PhantomData<fn() -> K>,
}

impl<K, F> FnKey<K, F>
where
    F: Fn(&dyn SourceFile) -> Option<K>,
{
    pub fn new(name: &str, object_type: ObjectType, extract: F) -> Self {
        Self {
            name: name.to_string(),
            object_type,
            extract,
            _key: std::marker::PhantomData,
        }
    }
}

impl<K, F> KeyExtractor for FnKey<K, F>
where
    K: Clone + Eq + Hash + Ord + fmt::Debug + Send + Sync + 'static,
    F: Fn(&dyn SourceFile) -> Option<K> + Send + Sync + 'static,
{
    type Key = K;

    fn name(&self) -> &str {
        &self.name
    }

    fn object_type(&self) -> ObjectType {
        self.object_type
    }

    fn extract(&self, file: &dyn SourceFile) -> Option<K> {
        (self.extract)(file)
    }
}
