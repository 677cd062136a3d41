use shroud_vm::AddressSpace;

#[test]
fn default_buffers_are_zeroed() {
    let address_space = AddressSpace::with_defaults();
    assert!(address_space.code().iter().all(|&b| b == 0));
    assert!(address_space.data().iter().all(|&b| b == 0));
    assert!(address_space.stack().iter().all(|&b| b == 0));
}

#[test]
fn insert_code_leaves_the_tail_zeroed() {
    let mut address_space = AddressSpace::with_defaults();
    assert!(address_space.insert_code(&[0x41, 0x42, 0x43]));
    assert_eq!(&address_space.code()[..3], &[0x41, 0x42, 0x43]);
    assert!(address_space.code()[3..].iter().all(|&b| b == 0));
}

#[test]
fn insert_rejects_oversized_input_and_leaves_buffer_untouched() {
    let mut address_space = AddressSpace::new(4, 4, 4);
    assert!(!address_space.insert_code(&[1, 2, 3, 4, 5]));
    assert!(address_space.code().iter().all(|&b| b == 0));
    assert!(address_space.insert_code(&[1, 2, 3, 4]));
}

/// Ports the operand-decoding scenario worked out from the string
/// `"OR OIIR ORII ORB OR OII"`.
#[test]
fn decodes_every_operand_form_from_a_shared_byte_string() {
    let mut address_space = AddressSpace::with_defaults();
    address_space.insert_code(b"OR OIIR ORII ORB OR OII");

    // reg->reg at offset 0: code[1] = 'R' = 0x52 -> (5, 2)
    assert_eq!(address_space.decode_reg_pair(0), Some((5, 2)));

    // imm->reg, immediate-first (STRI's shape) at offset 3: addr = code[4..6),
    // register byte at code[6].
    assert_eq!(address_space.decode_imm16_reg(3), Some((0x4949, b'R' as u8)));

    // imm->reg, register-first (MOVI's shape) at offset 8: register byte at
    // code[9], word at code[10..12).
    assert_eq!(
        address_space.decode_reg_imm16(8),
        Some((b'R' as u8, 0x4949))
    );

    // byte->reg at offset 13: dst at code[14], imm8 at code[15].
    assert_eq!(
        address_space.decode_reg_imm8(13),
        Some((b'R' as u8, b'B' as u8))
    );

    // reg-only at offset 17: code[18].
    assert_eq!(address_space.decode_reg(17), Some(b'R' as u8));

    // imm-only at offset 20: word at code[21..23).
    assert_eq!(address_space.decode_imm16(20), Some(0x4949));
}

#[test]
fn decode_fails_past_the_end_of_code() {
    let address_space = AddressSpace::new(4, 4, 4);
    assert_eq!(address_space.decode_reg_imm16(0), None);
    assert_eq!(address_space.decode_imm16(2), None);
}

#[test]
fn data_word_access_rejects_the_last_legal_span() {
    let mut address_space = AddressSpace::new(4, 4, 4);
    // datasize == 4: addr == 2 is the last two-byte span but still rejected
    // by the conservative `addr + 2 >= datasize` bound.
    assert_eq!(address_space.read_data_word(2), None);
    assert_eq!(address_space.read_data_word(1), Some(0));
    assert!(address_space.write_data_word(1, 0xBEEF).is_some());
    assert_eq!(address_space.read_data_word(1), Some(0xBEEF));
}
