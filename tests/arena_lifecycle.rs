//! End-to-end coverage of the three arena types through the public API,
//! including interaction with a growth bounder and a custom sizer.

use bulk_arena::{FixedArena, GenericArena, Sizer, VariableArena};

#[test]
fn generic_arena_round_trips_large_element_runs() {
    let mut arena = GenericArena::<String>::new().unwrap();
    let values: Vec<String> = (0..2_000).map(|i| format!("row-{i}")).collect();
    for v in &values {
        arena.append(v.clone()).unwrap();
    }
    assert_eq!(arena.size(), values.len() as u64);

    let drained: Vec<String> = arena.drain().collect();
    assert_eq!(drained, values);
}

#[test]
fn fixed_arena_rejects_any_blob_not_matching_its_width() {
    let mut arena = FixedArena::new(4).unwrap();
    arena.append(&[1, 2, 3, 4]).unwrap();
    assert!(arena.append(&[1, 2, 3]).is_err());
    assert!(arena.append(&[1, 2, 3, 4, 5]).is_err());
}

#[test]
fn variable_arena_handles_a_realistic_mixed_length_workload() {
    let mut arena = VariableArena::new(4).unwrap();
    let blobs: Vec<Vec<u8>> = (0..500u32)
        .map(|i| vec![(i % 256) as u8; (i % 200) as usize])
        .collect();
    for b in &blobs {
        arena.append(b).unwrap();
    }
    let drained: Vec<Vec<u8>> = arena.drain().collect();
    assert_eq!(drained, blobs);
}

#[test]
fn a_growth_bounder_caps_how_large_new_chunks_can_be_requested() {
    let mut arena = GenericArena::<u8>::new().unwrap();
    let mut calls = 0u32;
    arena.set_growth_bounder(Box::new(move || {
        calls += 1;
        2
    }));
    for i in 0..10u8 {
        arena.append(i).unwrap();
    }
    let drained: Vec<u8> = arena.drain().collect();
    assert_eq!(drained, (0..10u8).collect::<Vec<_>>());
}

#[test]
fn a_custom_sizer_feeds_chunk_allocation_end_to_end() {
    let sizer = Sizer::expert(2.0, 4, 256, 17).unwrap();
    let mut arena = FixedArena::with_sizer(3, sizer).unwrap();
    for i in 0..50u8 {
        arena.append(&[i, i, i]).unwrap();
    }
    let drained: Vec<Vec<u8>> = arena.drain().collect();
    assert_eq!(drained.len(), 50);
    for (i, blob) in drained.iter().enumerate() {
        assert_eq!(blob, &vec![i as u8, i as u8, i as u8]);
    }
}
