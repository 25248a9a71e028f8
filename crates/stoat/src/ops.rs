use stoat_core::TensorMap;

// Operations — Gradient-tracking control over tensor maps
//
// These are the dynamic-mode operations; their scripted counterparts live
// in stoat-script and apply the same semantics to the opaque object
// representation. Both share the recursion in stoat-core, so the two modes
// can not drift apart.

/// A map whose every block value (and gradient block value, recursively)
/// has gradient tracking set to `requires_grad`.
///
/// The input map is unchanged; keys, labels and value storage are shared.
pub fn requires_grad(tensor: &TensorMap, requires_grad: bool) -> TensorMap {
    tensor.tracked(requires_grad)
}

/// A map with gradient tracking disabled everywhere.
///
/// Equivalent to `requires_grad(tensor, false)`.
pub fn detach(tensor: &TensorMap) -> TensorMap {
    tensor.detach()
}
