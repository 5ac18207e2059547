//! Tests for the packet buffer and its backing pool.
//!
//! Covers:
//! - headroom push / pull round-trips
//! - append bounds against the slot capacity
//! - pool exhaustion and slot recycling on drop

use ember_lib::testing::TestResult;
use ember_lib::{assert_eq_test, assert_test, pass};

use crate::packetbuf::{HEADROOM, PacketBuf};
use crate::pool::{BUF_SIZE, PACKET_POOL, POOL_SIZE};

// =============================================================================
// Helpers
// =============================================================================

/// Ensure the global packet pool is initialized.
fn ensure_pool_init() {
    PACKET_POOL.init();
}

// =============================================================================
// Headroom push / pull
// =============================================================================

pub fn test_push_pull_roundtrip() -> TestResult {
    ensure_pool_init();

    let mut pkt = PacketBuf::alloc().expect("pool should have capacity");
    assert_test!(pkt.is_empty(), "fresh TX buffer starts empty");

    let payload = [0xAB_u8; 32];
    assert_test!(pkt.append(&payload).is_ok());
    assert_eq_test!(pkt.len(), 32);

    let header = [0x11, 0x22, 0x33, 0x44];
    {
        let slot = pkt.push_header(4).expect("headroom should fit 4 bytes");
        slot.copy_from_slice(&header);
    }
    assert_eq_test!(pkt.len(), 36);
    assert_eq_test!(&pkt.payload()[..4], &header[..]);

    let pulled = pkt.pull_header(4).expect("pull of pushed header");
    assert_eq_test!(pulled, &header[..]);
    assert_eq_test!(pkt.len(), 32);
    assert_eq_test!(pkt.payload()[0], 0xAB);

    pass!()
}

pub fn test_headroom_exhaustion() -> TestResult {
    ensure_pool_init();

    let mut pkt = PacketBuf::alloc().expect("pool should have capacity");
    assert_test!(
        pkt.push_header(HEADROOM as usize).is_ok(),
        "full headroom is reservable"
    );
    assert_test!(
        pkt.push_header(1).is_err(),
        "headroom past the reserve must fail"
    );

    pass!()
}

pub fn test_append_bounds() -> TestResult {
    ensure_pool_init();

    let mut pkt = PacketBuf::alloc().expect("pool should have capacity");
    let chunk = [0u8; 512];
    let mut appended = 0usize;
    loop {
        let room = BUF_SIZE - HEADROOM as usize - appended;
        let take = room.min(chunk.len());
        if take == 0 {
            break;
        }
        assert_test!(pkt.append(&chunk[..take]).is_ok());
        appended += take;
    }
    assert_eq_test!(appended, BUF_SIZE - HEADROOM as usize);
    assert_test!(pkt.append(&chunk[..1]).is_err(), "tailroom exhausted");

    pass!()
}

pub fn test_from_raw_copy_layout() -> TestResult {
    ensure_pool_init();

    let wire = [0xC3_u8; 60];
    let pkt = PacketBuf::from_raw_copy(&wire).expect("pool should have capacity");
    assert_eq_test!(pkt.len(), wire.len());
    assert_eq_test!(pkt.payload(), &wire[..]);

    pass!()
}

// =============================================================================
// Pool accounting
// =============================================================================

pub fn test_pool_exhaustion_and_recycle() -> TestResult {
    ensure_pool_init();

    let free_before = PACKET_POOL.available();
    {
        let mut held: [Option<PacketBuf>; POOL_SIZE] = [const { None }; POOL_SIZE];
        let mut taken = 0usize;
        for slot in held.iter_mut() {
            match PacketBuf::alloc() {
                Some(pkt) => {
                    *slot = Some(pkt);
                    taken += 1;
                }
                None => break,
            }
        }
        assert_eq_test!(taken, free_before, "every free slot is allocatable");
        assert_test!(
            PacketBuf::alloc().is_none(),
            "exhausted pool must refuse allocation"
        );
        // `held` drops here, returning every slot.
    }
    assert_eq_test!(
        PACKET_POOL.available(),
        free_before,
        "drop returns slots to the pool"
    );

    pass!()
}

// =============================================================================
// Test suite registration
// =============================================================================

ember_lib::define_test_suite!(
    packetbuf,
    [
        test_push_pull_roundtrip,
        test_headroom_exhaustion,
        test_append_bounds,
        test_from_raw_copy_layout,
        test_pool_exhaustion_and_recycle,
    ]
);
