use std::collections::BTreeMap;
use std::fmt;

use crate::array::DenseArray;
use crate::error::{Error, Result};
use crate::labels::Labels;

// TensorBlock — Values plus the labels describing each axis
//
// A block is one dense piece of a tensor map. Its values array always has
// the shape:
//
//   [samples.count(), components[0].count(), ..., properties.count()]
//
// so a plain (no components) block is a 2-D samples x properties matrix.
// Construction validates this shape equation; everything downstream can
// rely on it.
//
// A block can also carry named gradient blocks ("positions", "strain", ...)
// holding explicit derivative values with respect to some parameter. The
// gradient blocks share the parent's properties, and gradient *tracking*
// (the requires_grad flag on the values) applies to them recursively.

/// One dense block of a tensor map: a value array and its axis labels.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorBlock {
    values: DenseArray,
    samples: Labels,
    components: Vec<Labels>,
    properties: Labels,
    gradients: BTreeMap<String, TensorBlock>,
}

impl TensorBlock {
    /// Create a block, validating that the values shape matches the labels.
    pub fn new(
        values: DenseArray,
        samples: Labels,
        components: Vec<Labels>,
        properties: Labels,
    ) -> Result<Self> {
        let mut expected = Vec::with_capacity(2 + components.len());
        expected.push(samples.count());
        for component in &components {
            expected.push(component.count());
        }
        expected.push(properties.count());

        if values.shape() != expected.as_slice() {
            return Err(Error::ShapeMismatch {
                expected,
                got: values.shape().to_vec(),
            });
        }

        Ok(TensorBlock {
            values,
            samples,
            components,
            properties,
            gradients: BTreeMap::new(),
        })
    }

    /// The block values.
    pub fn values(&self) -> &DenseArray {
        &self.values
    }

    /// Labels describing the first axis of the values.
    pub fn samples(&self) -> &Labels {
        &self.samples
    }

    /// Labels describing the middle axes of the values (may be empty).
    pub fn components(&self) -> &[Labels] {
        &self.components
    }

    /// Labels describing the last axis of the values.
    pub fn properties(&self) -> &Labels {
        &self.properties
    }

    // Gradients

    /// Attach a gradient block under the given parameter name.
    ///
    /// The gradient must have the same properties as this block, and the
    /// parameter name must not already be in use.
    pub fn add_gradient(&mut self, parameter: impl Into<String>, gradient: TensorBlock) -> Result<()> {
        let parameter = parameter.into();
        if self.gradients.contains_key(&parameter) {
            return Err(Error::invalid_parameter(format!(
                "gradient with respect to '{parameter}' already exists in this block"
            )));
        }
        if gradient.properties != self.properties {
            return Err(Error::invalid_parameter(format!(
                "gradient with respect to '{parameter}' must have the same properties as the block"
            )));
        }
        self.gradients.insert(parameter, gradient);
        Ok(())
    }

    /// The gradient block for the given parameter, if any.
    pub fn gradient(&self, parameter: &str) -> Option<&TensorBlock> {
        self.gradients.get(parameter)
    }

    /// Names of all parameters this block has gradients for.
    pub fn gradient_names(&self) -> impl Iterator<Item = &str> {
        self.gradients.keys().map(String::as_str)
    }

    /// Iterate over (parameter, gradient block) pairs.
    pub fn gradients(&self) -> impl Iterator<Item = (&str, &TensorBlock)> {
        self.gradients.iter().map(|(k, v)| (k.as_str(), v))
    }

    // Gradient tracking

    /// A block whose values (and every gradient's values, recursively) have
    /// the tracking flag set to `flag`. Storage and labels are shared.
    pub fn tracked(&self, flag: bool) -> Self {
        TensorBlock {
            values: self.values.tracked(flag),
            samples: self.samples.clone(),
            components: self.components.clone(),
            properties: self.properties.clone(),
            gradients: self
                .gradients
                .iter()
                .map(|(name, gradient)| (name.clone(), gradient.tracked(flag)))
                .collect(),
        }
    }

    /// A detached block: same data, no gradient tracking anywhere.
    pub fn detach(&self) -> Self {
        self.tracked(false)
    }
}

impl fmt::Display for TensorBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TensorBlock(samples={}, components={}, properties={}, gradients={})",
            self.samples.count(),
            self.components.len(),
            self.properties.count(),
            self.gradients.len(),
        )
    }
}
