//! Scenario: Full reconciliation restores the window invariant
//!
//! # Invariants under test
//!
//! 1. After a full pass, `hidden(i) == (i < max(0, L - N))` for every (L, N).
//! 2. A second full pass with no log change produces no transitions.
//! 3. N = 0 never hides and shows every hidden index.
//! 4. N >= L never hides.
//! 5. N = L - 1 on a fresh visible log hides exactly index 0.
//! 6. The checkpoint advances even when nothing changed.
//! 7. An absent log aborts without touching the store.
//! 8. Skip distance changes cost only, never the outcome.

use vwk_window::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn conv() -> ConversationId {
    ConversationId::new("char-aqua")
}

fn store_with(window: usize, checkpoint: usize) -> MemoryConfigStore {
    let mut store = MemoryConfigStore::new();
    store.set(&conv(), window, checkpoint);
    store
}

fn expected_flags(len: usize, window: usize) -> Vec<Option<bool>> {
    let boundary = WindowConfig::new(window, 0).visible_start(len);
    (0..len).map(|i| Some(i < boundary)).collect()
}

/// Deterministic pseudo-random flags (xorshift) so tests stay reproducible.
fn scrambled(len: usize, seed: u64) -> Vec<bool> {
    let mut x = seed.max(1);
    (0..len)
        .map(|_| {
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            x % 3 == 0
        })
        .collect()
}

// ---------------------------------------------------------------------------
// 1. Invariant across lengths, windows and starting states
// ---------------------------------------------------------------------------

#[test]
fn full_pass_establishes_invariant_for_any_start_state() {
    for len in 0..24 {
        for window in 0..27 {
            for seed in [1_u64, 7, 42] {
                let mut store = store_with(window, 0);
                let mut log = MemoryLog::from_flags(scrambled(len, seed));

                reconcile_full(&mut store, &conv(), Some(&mut log), DEFAULT_SKIP_DISTANCE)
                    .expect("log is present");

                assert_eq!(
                    log.entries(),
                    expected_flags(len, window).as_slice(),
                    "len={len} window={window} seed={seed}"
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// 2. Idempotence
// ---------------------------------------------------------------------------

#[test]
fn second_full_pass_is_empty() {
    let mut store = store_with(3, 0);
    let mut log = MemoryLog::from_flags(scrambled(40, 9));

    let first = reconcile_full(&mut store, &conv(), Some(&mut log), DEFAULT_SKIP_DISTANCE).unwrap();
    assert!(!first.is_noop());

    let second = reconcile_full(&mut store, &conv(), Some(&mut log), DEFAULT_SKIP_DISTANCE).unwrap();
    assert!(second.is_noop(), "second pass must be empty: {second:?}");
    assert_eq!(second.checkpoint_len, 40);
    assert_eq!(log.persist_requests(), 1, "no-op pass must not persist");
}

// ---------------------------------------------------------------------------
// 3-5. Window boundaries
// ---------------------------------------------------------------------------

#[test]
fn zero_window_shows_everything_hidden() {
    let mut store = store_with(0, 6);
    let mut log = MemoryLog::from_flags(vec![true, false, true, true, false, false]);

    let out = reconcile_full(&mut store, &conv(), Some(&mut log), DEFAULT_SKIP_DISTANCE).unwrap();

    assert!(out.to_hide.is_empty());
    assert_eq!(out.to_show, vec![0, 2, 3]);
    assert!(log.hidden_indices().is_empty());
}

#[test]
fn window_covering_log_never_hides() {
    for window in [5, 6, 100] {
        let mut store = store_with(window, 0);
        let mut log = MemoryLog::from_flags(vec![true, false, false, true, false]);

        let out =
            reconcile_full(&mut store, &conv(), Some(&mut log), DEFAULT_SKIP_DISTANCE).unwrap();

        assert!(out.to_hide.is_empty(), "window={window}");
        assert_eq!(out.to_show, vec![0, 3], "window={window}");
    }
}

#[test]
fn window_one_short_of_length_hides_index_zero() {
    let mut store = store_with(7, 0);
    let mut log = MemoryLog::visible(8);

    let out = reconcile_full(&mut store, &conv(), Some(&mut log), DEFAULT_SKIP_DISTANCE).unwrap();

    assert_eq!(out.to_hide, vec![0]);
    assert!(out.to_show.is_empty());
}

#[test]
fn five_messages_window_two_hides_first_three() {
    let mut store = store_with(2, 0);
    let mut log = MemoryLog::visible(5);

    let out = reconcile_full(&mut store, &conv(), Some(&mut log), DEFAULT_SKIP_DISTANCE).unwrap();

    assert_eq!(out.to_hide, vec![0, 1, 2]);
    assert!(out.to_show.is_empty());
    assert_eq!(out.checkpoint_len, 5);
    assert_eq!(store.get(&conv()), WindowConfig::new(2, 5));
    assert_eq!(log.hidden_indices(), vec![0, 1, 2]);
}

// ---------------------------------------------------------------------------
// 6. Checkpoint advances on a no-op
// ---------------------------------------------------------------------------

#[test]
fn fast_exit_still_advances_checkpoint() {
    let mut store = store_with(0, 2);
    let mut log = MemoryLog::visible(9);

    let out = reconcile_full(&mut store, &conv(), Some(&mut log), DEFAULT_SKIP_DISTANCE).unwrap();

    assert!(out.is_noop());
    assert_eq!(store.get(&conv()).checkpoint_len, 9);
    assert_eq!(log.persist_requests(), 0);
}

#[test]
fn first_access_creates_default_record() {
    let mut store = MemoryConfigStore::new();
    let mut log = MemoryLog::visible(3);

    reconcile_full(&mut store, &conv(), Some(&mut log), DEFAULT_SKIP_DISTANCE).unwrap();

    assert_eq!(store.get(&conv()), WindowConfig::new(0, 3));
}

// ---------------------------------------------------------------------------
// 7. Absent log
// ---------------------------------------------------------------------------

#[test]
fn absent_log_aborts_without_store_update() {
    let mut store = store_with(2, 11);

    let err = reconcile_full::<_, MemoryLog>(&mut store, &conv(), None, DEFAULT_SKIP_DISTANCE)
        .expect_err("absent log must abort");

    assert_eq!(
        err,
        ReconcileError::LogUnavailable {
            conversation: conv()
        }
    );
    assert_eq!(store.get(&conv()), WindowConfig::new(2, 11));
}

// ---------------------------------------------------------------------------
// 8. Skip distance is a cost knob only
// ---------------------------------------------------------------------------

#[test]
fn skip_distance_does_not_change_outcome() {
    let flags = scrambled(200, 1234);
    let mut reference: Option<ReconcileOutcome> = None;

    for skip in [0, 1, 2, 5, 10, 64, usize::MAX] {
        let mut store = store_with(37, 0);
        let mut log = MemoryLog::from_flags(flags.clone());
        let out = reconcile_full(&mut store, &conv(), Some(&mut log), skip).unwrap();

        match &reference {
            None => reference = Some(out),
            Some(r) => assert_eq!(&out, r, "skip={skip} diverged"),
        }
    }
}

#[test]
fn missing_entries_are_left_untouched() {
    let mut store = store_with(2, 0);
    let mut log = MemoryLog::from_entries(vec![Some(false), None, Some(false), Some(true), None]);

    let out = reconcile_full(&mut store, &conv(), Some(&mut log), DEFAULT_SKIP_DISTANCE).unwrap();

    assert_eq!(out.to_hide, vec![0, 2]);
    assert_eq!(out.to_show, vec![3]);
    assert_eq!(
        log.entries(),
        &[Some(true), None, Some(true), Some(false), None]
    );
}
