use shroud_vm::opcodes::{Mnemonic, OpcodeTable, NUM_OPS};

#[test]
fn same_key_produces_identical_tables() {
    let a = OpcodeTable::new(b"abc");
    let b = OpcodeTable::new(b"abc");
    let values_a: Vec<u8> = a.entries().iter().map(|d| d.value).collect();
    let values_b: Vec<u8> = b.entries().iter().map(|d| d.value).collect();
    assert_eq!(values_a, values_b);
}

#[test]
fn different_keys_diverge() {
    let a = OpcodeTable::new(b"abc");
    let b = OpcodeTable::new(b"abd");
    let values_a: Vec<u8> = a.entries().iter().map(|d| d.value).collect();
    let values_b: Vec<u8> = b.entries().iter().map(|d| d.value).collect();
    assert_ne!(values_a, values_b);
}

#[test]
fn assigned_values_are_a_permutation_within_num_ops() {
    let table = OpcodeTable::new(b"some-key");
    let mut values: Vec<u8> = table.entries().iter().map(|d| d.value).collect();
    values.sort_unstable();
    values.dedup();
    assert_eq!(values.len(), NUM_OPS);
}

#[test]
fn empty_key_does_not_panic() {
    let table = OpcodeTable::new(b"");
    assert_eq!(table.entries().len(), NUM_OPS);
}

#[test]
fn find_round_trips_through_encoded_byte() {
    let table = OpcodeTable::new(b"roundtrip");
    let byte = table.encoded_byte(Mnemonic::Movi);
    assert_eq!(table.find(byte).unwrap().mnemonic, Mnemonic::Movi);
}

#[test]
fn unassigned_byte_values_find_nothing() {
    let table = OpcodeTable::new(b"key");
    let assigned: std::collections::HashSet<u8> =
        table.entries().iter().map(|d| d.value).collect();
    let unused = (0u8..=255).find(|b| !assigned.contains(b));
    if let Some(byte) = unused {
        assert!(table.find(byte).is_none());
    }
}
