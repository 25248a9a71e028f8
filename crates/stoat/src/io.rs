use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use stoat_core::{bail, DenseArray, Error, Labels, Result, TensorBlock, TensorMap};

// IO — Tensor map serialization
//
// A tensor map is stored in a single flat file:
//
//   ┌──────────────┬──────────────────────┬───────────────────────┐
//   │ 8 bytes      │ N bytes              │ raw value bytes       │
//   │ header size  │ JSON header (UTF-8)  │ (f64, LE, contiguous) │
//   │ (u64 LE)     │                      │                       │
//   └──────────────┴──────────────────────┴───────────────────────┘
//
// The JSON header describes the keys, every block's labels and shape, and
// where each block's values live in the data section:
//
//   {
//     "format": "stoat",
//     "version": 1,
//     "keys": { "names": ["_"], "values": [0] },
//     "blocks": [
//       {
//         "shape": [2, 3],
//         "data_offsets": [0, 48],
//         "samples": { "names": ["sample"], "values": [0, 1] },
//         "components": [],
//         "properties": { "names": ["property"], "values": [0, 1, 2] },
//         "gradients": { "positions": { ... same layout ... } }
//       }
//     ]
//   }
//
// Gradient blocks nest recursively under their parameter name. All data
// offsets are byte ranges relative to the start of the data section.
//
// Loading reconstructs everything through the ordinary validating
// constructors, so a corrupt file is an error, never a panic or an
// inconsistent map. Loaded maps never track gradients (detached at rest).

const FORMAT: &str = "stoat";
const FORMAT_VERSION: u32 = 1;

// Header description

#[derive(Serialize, Deserialize)]
struct LabelsHeader {
    names: Vec<String>,
    values: Vec<i32>,
}

#[derive(Serialize, Deserialize)]
struct BlockHeader {
    shape: Vec<usize>,
    data_offsets: [u64; 2],
    samples: LabelsHeader,
    components: Vec<LabelsHeader>,
    properties: LabelsHeader,
    gradients: BTreeMap<String, BlockHeader>,
}

#[derive(Serialize, Deserialize)]
struct FileHeader {
    format: String,
    version: u32,
    keys: LabelsHeader,
    blocks: Vec<BlockHeader>,
}

fn labels_to_header(labels: &Labels) -> LabelsHeader {
    LabelsHeader {
        names: labels.names().to_vec(),
        values: labels.values().to_vec(),
    }
}

fn labels_from_header(header: &LabelsHeader) -> Result<Labels> {
    Labels::new(header.names.iter().map(String::as_str), header.values.clone())
}

// Writing

fn values_to_bytes(array: &DenseArray, all_data: &mut Vec<u8>) -> [u64; 2] {
    let start = all_data.len() as u64;
    for value in array.data() {
        all_data.extend_from_slice(&value.to_le_bytes());
    }
    [start, all_data.len() as u64]
}

fn block_to_header(block: &TensorBlock, all_data: &mut Vec<u8>) -> BlockHeader {
    let data_offsets = values_to_bytes(block.values(), all_data);
    BlockHeader {
        shape: block.values().shape().to_vec(),
        data_offsets,
        samples: labels_to_header(block.samples()),
        components: block.components().iter().map(labels_to_header).collect(),
        properties: labels_to_header(block.properties()),
        gradients: block
            .gradients()
            .map(|(name, gradient)| (name.to_string(), block_to_header(gradient, all_data)))
            .collect(),
    }
}

/// Write a tensor map to a writer.
pub fn save_buffer(writer: &mut impl Write, tensor: &TensorMap) -> Result<()> {
    let mut all_data = Vec::new();
    let header = FileHeader {
        format: FORMAT.to_string(),
        version: FORMAT_VERSION,
        keys: labels_to_header(tensor.keys()),
        blocks: tensor
            .blocks()
            .iter()
            .map(|block| block_to_header(block, &mut all_data))
            .collect(),
    };

    let header_bytes = serde_json::to_vec(&header)
        .map_err(|e| Error::Serialization(format!("failed to encode header: {e}")))?;

    let header_size = header_bytes.len() as u64;
    writer.write_all(&header_size.to_le_bytes()).map_err(io_err)?;
    writer.write_all(&header_bytes).map_err(io_err)?;
    writer.write_all(&all_data).map_err(io_err)?;
    Ok(())
}

/// Save a tensor map to a file.
pub fn save(path: impl AsRef<Path>, tensor: &TensorMap) -> Result<()> {
    let file = File::create(path.as_ref()).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    save_buffer(&mut writer, tensor)?;
    writer.flush().map_err(io_err)?;
    Ok(())
}

// Reading

fn values_from_bytes(data: &[u8], offsets: [u64; 2], shape: &[usize]) -> Result<DenseArray> {
    let [start, end] = offsets;
    if start > end || end as usize > data.len() {
        return Err(Error::Serialization(format!(
            "data offsets [{start}, {end}] are out of bounds for {} data bytes",
            data.len()
        )));
    }

    let raw = &data[start as usize..end as usize];
    if raw.len() % 8 != 0 {
        return Err(Error::Serialization(format!(
            "value byte range has length {}, not a multiple of 8",
            raw.len()
        )));
    }

    let values = raw
        .chunks_exact(8)
        .map(|chunk| {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(chunk);
            f64::from_le_bytes(bytes)
        })
        .collect();

    DenseArray::from_vec(values, shape.to_vec())
}

fn block_from_header(header: &BlockHeader, data: &[u8]) -> Result<TensorBlock> {
    let values = values_from_bytes(data, header.data_offsets, &header.shape)?;
    let samples = labels_from_header(&header.samples)?;
    let components = header
        .components
        .iter()
        .map(labels_from_header)
        .collect::<Result<Vec<_>>>()?;
    let properties = labels_from_header(&header.properties)?;

    let mut block = TensorBlock::new(values, samples, components, properties)?;
    for (parameter, gradient) in &header.gradients {
        block.add_gradient(parameter.as_str(), block_from_header(gradient, data)?)?;
    }
    Ok(block)
}

fn block_max_offset(block: &BlockHeader) -> u64 {
    let mut max = block.data_offsets[1];
    for gradient in block.gradients.values() {
        max = max.max(block_max_offset(gradient));
    }
    max
}

fn max_data_offset(blocks: &[BlockHeader]) -> u64 {
    blocks.iter().map(block_max_offset).max().unwrap_or(0)
}

/// Read a tensor map from a reader.
pub fn load_buffer(reader: &mut impl Read) -> Result<TensorMap> {
    let mut size_buf = [0u8; 8];
    reader.read_exact(&mut size_buf).map_err(io_err)?;
    let header_size = u64::from_le_bytes(size_buf) as usize;

    // Sanity check: header shouldn't be unreasonably large
    if header_size > 100_000_000 {
        bail!("header size {header_size} bytes is unreasonably large");
    }

    let mut header_bytes = vec![0u8; header_size];
    reader.read_exact(&mut header_bytes).map_err(io_err)?;

    let header: FileHeader = serde_json::from_slice(&header_bytes)
        .map_err(|e| Error::Serialization(format!("invalid JSON header: {e}")))?;

    if header.format != FORMAT {
        return Err(Error::Serialization(format!(
            "not a stoat tensor map: format is '{}'",
            header.format
        )));
    }
    if header.version != FORMAT_VERSION {
        return Err(Error::Serialization(format!(
            "unsupported format version: {}",
            header.version
        )));
    }

    let data_size = max_data_offset(&header.blocks) as usize;
    let mut data = vec![0u8; data_size];
    if data_size > 0 {
        reader.read_exact(&mut data).map_err(io_err)?;
    }

    let keys = labels_from_header(&header.keys)?;
    let blocks = header
        .blocks
        .iter()
        .map(|block| block_from_header(block, &data))
        .collect::<Result<Vec<_>>>()?;

    TensorMap::new(keys, blocks)
}

/// Load a tensor map from a file.
pub fn load(path: impl AsRef<Path>) -> Result<TensorMap> {
    let file = File::open(path.as_ref()).map_err(io_err)?;
    let mut reader = BufReader::new(file);
    load_buffer(&mut reader)
}

fn io_err(e: std::io::Error) -> Error {
    Error::msg(format!("IO error: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncated_input_is_an_error() {
        let result = load_buffer(&mut std::io::Cursor::new(&[1u8, 2, 3]));
        assert!(result.is_err());
    }

    #[test]
    fn test_foreign_format_rejected() {
        let header = br#"{"format":"other","version":1,"keys":{"names":[],"values":[]},"blocks":[]}"#;
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&(header.len() as u64).to_le_bytes());
        buffer.extend_from_slice(header);

        let result = load_buffer(&mut std::io::Cursor::new(&buffer));
        assert!(matches!(result, Err(Error::Serialization(_))));
    }

    #[test]
    fn test_unreasonable_header_size_rejected() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&u64::MAX.to_le_bytes());
        buffer.extend_from_slice(&[0u8; 16]);

        let result = load_buffer(&mut std::io::Cursor::new(&buffer));
        assert!(matches!(result, Err(Error::Msg(_))));
    }

    #[test]
    fn test_bad_offsets_rejected() {
        // valid header, but the data section is missing entirely
        let header = concat!(
            r#"{"format":"stoat","version":1,"#,
            r#""keys":{"names":["_"],"values":[0]},"#,
            r#""blocks":[{"shape":[1,1],"data_offsets":[0,8],"#,
            r#""samples":{"names":["sample"],"values":[0]},"components":[],"#,
            r#""properties":{"names":["property"],"values":[0]},"gradients":{}}]}"#
        );
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&(header.len() as u64).to_le_bytes());
        buffer.extend_from_slice(header.as_bytes());
        // data section truncated: only 4 of the 8 bytes announced
        buffer.extend_from_slice(&[0u8; 4]);

        let result = load_buffer(&mut std::io::Cursor::new(&buffer));
        assert!(result.is_err());
    }
}
