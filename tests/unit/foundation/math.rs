use super::*;

#[test]
fn fnv_split_writes_match_single_write() {
    let mut a = Fnv1a64::new(Fnv1a64::OFFSET_BASIS);
    a.write_bytes(b"kinetype");
    let mut b = Fnv1a64::new(Fnv1a64::OFFSET_BASIS);
    b.write_bytes(b"kine");
    b.write_bytes(b"type");
    assert_eq!(a.finish(), b.finish());
}

#[test]
fn mul_div255_rounds_to_nearest() {
    assert_eq!(mul_div255_u16(255, 255), 255);
    assert_eq!(mul_div255_u16(0, 255), 0);
    assert_eq!(mul_div255_u16(128, 255), 128);
    assert_eq!(mul_div255_u16(255, 128), 128);
    assert_eq!(mul_div255_u16(1, 127), 0);
    assert_eq!(mul_div255_u16(2, 128), 1);
}

#[test]
fn unit_hash_is_deterministic_and_in_range() {
    for i in 0..64u64 {
        let a = unit_hash(7, &[i, 3, 9]);
        let b = unit_hash(7, &[i, 3, 9]);
        assert_eq!(a, b);
        assert!((0.0..1.0).contains(&a));
    }
    assert_ne!(unit_hash(7, &[1, 2]), unit_hash(8, &[1, 2]));
}
