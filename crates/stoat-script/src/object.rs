use std::fmt;

use stoat_core::{Labels, TensorBlock, TensorMap};

// ScriptObject — The opaque compiled-mode object representation
//
// The scripted runtime does not use the native stoat-core types directly.
// Instead it carries every user-defined type behind one generic wrapper,
// the way ahead-of-time compiled runtimes represent foreign objects
// uniformly. A ScriptObject pairs a payload with a TypeDescriptor that
// records which type the payload is.
//
// Consequence for callers: a compiled-mode TensorMap is NOT an instance of
// the dynamic-mode TensorMap type. Code that needs to work in both modes
// must resolve types through stoat's backend module, which knows about
// both representations.

/// Runtime type descriptor embedded in every [`ScriptObject`].
///
/// The qualified name is the full path of the wrapped type, e.g.
/// `"stoat::TensorMap"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    qualified_name: String,
}

impl TypeDescriptor {
    fn new(qualified_name: &str) -> Self {
        TypeDescriptor {
            qualified_name: qualified_name.to_string(),
        }
    }

    /// The full path of the wrapped type, e.g. `"stoat::TensorMap"`.
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// The unqualified type name, e.g. `"TensorMap"`.
    pub fn name(&self) -> &str {
        self.qualified_name
            .rsplit("::")
            .next()
            .unwrap_or(&self.qualified_name)
    }

    /// Whether the wrapped type belongs to the stoat family.
    pub fn is_stoat(&self) -> bool {
        self.qualified_name.starts_with("stoat::")
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified_name)
    }
}

/// The wrapped value inside a [`ScriptObject`].
#[derive(Debug, Clone, PartialEq)]
enum Payload {
    Labels(Labels),
    Block(TensorBlock),
    Map(TensorMap),
}

/// Generic opaque wrapper used by the compiled runtime for every stoat type.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptObject {
    descriptor: TypeDescriptor,
    payload: Payload,
}

impl ScriptObject {
    /// Wrap a set of labels.
    pub fn from_labels(labels: Labels) -> Self {
        ScriptObject {
            descriptor: TypeDescriptor::new("stoat::Labels"),
            payload: Payload::Labels(labels),
        }
    }

    /// Wrap a tensor block.
    pub fn from_block(block: TensorBlock) -> Self {
        ScriptObject {
            descriptor: TypeDescriptor::new("stoat::TensorBlock"),
            payload: Payload::Block(block),
        }
    }

    /// Wrap a tensor map.
    pub fn from_tensor_map(tensor: TensorMap) -> Self {
        ScriptObject {
            descriptor: TypeDescriptor::new("stoat::TensorMap"),
            payload: Payload::Map(tensor),
        }
    }

    /// The embedded runtime type descriptor.
    pub fn type_descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    /// The wrapped labels, if this object wraps labels.
    pub fn as_labels(&self) -> Option<&Labels> {
        match &self.payload {
            Payload::Labels(labels) => Some(labels),
            _ => None,
        }
    }

    /// The wrapped block, if this object wraps a block.
    pub fn as_block(&self) -> Option<&TensorBlock> {
        match &self.payload {
            Payload::Block(block) => Some(block),
            _ => None,
        }
    }

    /// The wrapped tensor map, if this object wraps one.
    pub fn as_tensor_map(&self) -> Option<&TensorMap> {
        match &self.payload {
            Payload::Map(tensor) => Some(tensor),
            _ => None,
        }
    }
}

impl fmt::Display for ScriptObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScriptObject({})", self.descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_names() {
        let labels = Labels::single();
        let obj = ScriptObject::from_labels(labels);

        let descriptor = obj.type_descriptor();
        assert_eq!(descriptor.qualified_name(), "stoat::Labels");
        assert_eq!(descriptor.name(), "Labels");
        assert!(descriptor.is_stoat());
    }

    #[test]
    fn test_payload_recovery() {
        let labels = Labels::single();
        let obj = ScriptObject::from_labels(labels.clone());

        assert_eq!(obj.as_labels(), Some(&labels));
        assert!(obj.as_tensor_map().is_none());
        assert!(obj.as_block().is_none());
    }
}
