use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use stoat_core::{bail, Error, Result, TensorMap};

use crate::object::ScriptObject;

// ScriptModule — Named, serializable compiled operations
//
// The compiled runtime does not call free functions: it calls modules. A
// ScriptModule is the compiled form of one tensor-map operation, and it can
// be saved to a byte stream and loaded back in another process, so that a
// program compiled once keeps working without the defining code around.
//
// WIRE FORMAT:
//
//   ┌──────────────┬──────────────────────┐
//   │ 8 bytes      │ N bytes              │
//   │ header size  │ JSON header (UTF-8)  │
//   │ (u64 LE)     │                      │
//   └──────────────┴──────────────────────┘
//
// JSON header example:
//   { "format": "stoat-script", "version": 1, "op": "detach" }

const FORMAT: &str = "stoat-script";
const FORMAT_VERSION: u32 = 1;

/// The operation a [`ScriptModule`] applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ScriptOp {
    /// Disable gradient tracking on every block of a tensor map.
    Detach,
    /// Enable gradient tracking on every block of a tensor map.
    RequiresGrad,
}

impl ScriptOp {
    fn name(self) -> &'static str {
        match self {
            ScriptOp::Detach => "detach",
            ScriptOp::RequiresGrad => "requires_grad",
        }
    }
}

#[derive(Serialize, Deserialize)]
struct ModuleHeader {
    format: String,
    version: u32,
    op: ScriptOp,
}

/// A compiled tensor-map operation that survives save/load round trips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptModule {
    op: ScriptOp,
}

impl ScriptModule {
    /// The compiled module for the operation with the given name.
    ///
    /// Known operations are `"detach"` and `"requires_grad"`; anything else
    /// is an `InvalidParameter` error.
    pub fn for_op(name: &str) -> Result<Self> {
        let op = match name {
            "detach" => ScriptOp::Detach,
            "requires_grad" => ScriptOp::RequiresGrad,
            _ => {
                return Err(Error::invalid_parameter(format!(
                    "unknown scripted operation: '{name}'"
                )))
            }
        };
        Ok(ScriptModule { op })
    }

    /// Name of the operation this module applies.
    pub fn op_name(&self) -> &'static str {
        self.op.name()
    }

    /// Apply the compiled operation to a script object.
    ///
    /// The object must wrap a tensor map.
    pub fn run(&self, object: &ScriptObject) -> Result<ScriptObject> {
        match self.op {
            ScriptOp::Detach => detach(object),
            ScriptOp::RequiresGrad => requires_grad(object, true),
        }
    }

    /// Serialize this module to a writer.
    pub fn save(&self, writer: &mut impl Write) -> Result<()> {
        let header = ModuleHeader {
            format: FORMAT.to_string(),
            version: FORMAT_VERSION,
            op: self.op,
        };
        let header_bytes = serde_json::to_vec(&header)
            .map_err(|e| Error::Serialization(format!("failed to encode module header: {e}")))?;

        let header_size = header_bytes.len() as u64;
        writer.write_all(&header_size.to_le_bytes()).map_err(io_err)?;
        writer.write_all(&header_bytes).map_err(io_err)?;
        Ok(())
    }

    /// Deserialize a module from a reader.
    pub fn load(reader: &mut impl Read) -> Result<Self> {
        let mut size_buf = [0u8; 8];
        reader.read_exact(&mut size_buf).map_err(io_err)?;
        let header_size = u64::from_le_bytes(size_buf) as usize;

        // Module headers are a handful of fields; anything larger is corrupt.
        if header_size > 65_536 {
            bail!("module header size {header_size} bytes is unreasonably large");
        }

        let mut header_bytes = vec![0u8; header_size];
        reader.read_exact(&mut header_bytes).map_err(io_err)?;

        let header: ModuleHeader = serde_json::from_slice(&header_bytes)
            .map_err(|e| Error::Serialization(format!("invalid module header: {e}")))?;

        if header.format != FORMAT {
            return Err(Error::Serialization(format!(
                "not a stoat-script module: format is '{}'",
                header.format
            )));
        }
        if header.version != FORMAT_VERSION {
            return Err(Error::Serialization(format!(
                "unsupported module format version: {}",
                header.version
            )));
        }

        Ok(ScriptModule { op: header.op })
    }
}

fn io_err(e: std::io::Error) -> Error {
    Error::msg(format!("IO error: {e}"))
}

// Scripted operations
//
// These are the compiled-mode counterparts of stoat::ops: same semantics,
// but over the opaque object representation instead of the native types.

fn tensor_map_payload<'a>(object: &'a ScriptObject, op: &str) -> Result<&'a TensorMap> {
    object.as_tensor_map().ok_or_else(|| {
        Error::invalid_parameter(format!(
            "{op} expects a TensorMap, got a {}",
            object.type_descriptor().name()
        ))
    })
}

/// Scripted detach: disable gradient tracking on every block.
pub fn detach(object: &ScriptObject) -> Result<ScriptObject> {
    let tensor = tensor_map_payload(object, "detach")?;
    Ok(ScriptObject::from_tensor_map(tensor.detach()))
}

/// Scripted requires_grad: set gradient tracking on every block.
pub fn requires_grad(object: &ScriptObject, requires_grad: bool) -> Result<ScriptObject> {
    let tensor = tensor_map_payload(object, "requires_grad")?;
    Ok(ScriptObject::from_tensor_map(tensor.tracked(requires_grad)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stoat_core::{DenseArray, Labels, TensorBlock};

    fn tensor_map() -> TensorMap {
        let values = DenseArray::from_vec(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2]).unwrap();
        let samples = Labels::new(["sample"], vec![0, 1]).unwrap();
        let properties = Labels::new(["property"], vec![0, 1]).unwrap();
        let block = TensorBlock::new(values, samples, vec![], properties).unwrap();
        TensorMap::new(Labels::single(), vec![block]).unwrap()
    }

    #[test]
    fn test_unknown_op_rejected() {
        let result = ScriptModule::for_op("transpose");
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_run_detach() {
        let tracked = ScriptObject::from_tensor_map(tensor_map().tracked(true));
        let module = ScriptModule::for_op("detach").unwrap();

        let detached = module.run(&tracked).unwrap();
        let tensor = detached.as_tensor_map().unwrap();
        assert!(tensor.blocks().iter().all(|b| !b.values().requires_grad()));
        // descriptor is preserved across the operation
        assert_eq!(detached.type_descriptor().name(), "TensorMap");
    }

    #[test]
    fn test_detach_rejects_non_tensor_map() {
        let labels = ScriptObject::from_labels(Labels::single());
        assert!(matches!(detach(&labels), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_save_load_round_trip() {
        let module = ScriptModule::for_op("requires_grad").unwrap();

        let mut buffer = Vec::new();
        module.save(&mut buffer).unwrap();

        let loaded = ScriptModule::load(&mut std::io::Cursor::new(&buffer)).unwrap();
        assert_eq!(loaded, module);
        assert_eq!(loaded.op_name(), "requires_grad");
    }

    #[test]
    fn test_load_rejects_foreign_format() {
        let header = br#"{"format":"other","version":1,"op":"detach"}"#;
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&(header.len() as u64).to_le_bytes());
        buffer.extend_from_slice(header);

        let result = ScriptModule::load(&mut std::io::Cursor::new(&buffer));
        assert!(matches!(result, Err(Error::Serialization(_))));
    }
}
