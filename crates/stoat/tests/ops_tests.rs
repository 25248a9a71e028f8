// Operation tests — detach and requires_grad over tensor maps

use stoat::ops::{detach, requires_grad};
use stoat::prelude::*;

// Helper: a two-block map where the first block carries a gradient

fn fixture() -> TensorMap {
    let samples = Labels::new(["sample"], vec![0, 1]).unwrap();
    let properties = Labels::new(["property"], vec![0, 1, 2]).unwrap();

    let values = DenseArray::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]).unwrap();
    let mut first = TensorBlock::new(
        values,
        samples.clone(),
        vec![],
        properties.clone(),
    )
    .unwrap();

    let gradient = TensorBlock::new(
        DenseArray::zeros(vec![2, 3]),
        samples.clone(),
        vec![],
        properties.clone(),
    )
    .unwrap();
    first.add_gradient("positions", gradient).unwrap();

    let second = TensorBlock::new(
        DenseArray::from_vec(vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0], vec![2, 3]).unwrap(),
        samples,
        vec![],
        properties,
    )
    .unwrap();

    let keys = Labels::new(["key"], vec![0, 1]).unwrap();
    TensorMap::new(keys, vec![first, second]).unwrap()
}

fn all_tracked(tensor: &TensorMap) -> bool {
    tensor.blocks().iter().all(|block| {
        block.values().requires_grad()
            && block.gradients().all(|(_, g)| g.values().requires_grad())
    })
}

fn none_tracked(tensor: &TensorMap) -> bool {
    tensor.blocks().iter().all(|block| {
        !block.values().requires_grad()
            && block.gradients().all(|(_, g)| !g.values().requires_grad())
    })
}

#[test]
fn test_requires_grad_tracks_everything() {
    let tensor = fixture();
    assert!(none_tracked(&tensor));

    let tracked = requires_grad(&tensor, true);
    assert!(all_tracked(&tracked));
    // the input map is unchanged
    assert!(none_tracked(&tensor));
}

#[test]
fn test_detach_untracks_everything() {
    let tracked = requires_grad(&fixture(), true);

    let detached = detach(&tracked);
    assert!(none_tracked(&detached));
    assert!(all_tracked(&tracked));
}

#[test]
fn test_metadata_is_preserved() {
    let tensor = fixture();
    let detached = detach(&requires_grad(&tensor, true));

    assert_eq!(detached.keys(), tensor.keys());
    for (original, result) in tensor.blocks().iter().zip(detached.blocks()) {
        assert_eq!(original.samples(), result.samples());
        assert_eq!(original.properties(), result.properties());
        assert_eq!(original.values(), result.values());
        assert_eq!(
            original.gradient_names().collect::<Vec<_>>(),
            result.gradient_names().collect::<Vec<_>>()
        );
    }
}

#[test]
fn test_storage_is_shared_not_copied() {
    let tensor = fixture();
    let tracked = requires_grad(&tensor, true);

    let original = tensor.block_by_id(0).unwrap().values().data();
    let result = tracked.block_by_id(0).unwrap().values().data();
    assert!(std::ptr::eq(original.as_ptr(), result.as_ptr()));
}

#[test]
fn test_detach_is_idempotent() {
    let tensor = fixture();
    let once = detach(&tensor);
    let twice = detach(&once);
    assert_eq!(once, twice);
}
