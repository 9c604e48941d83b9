//! Tests for TimeManager

use ledger_simulator_core::TimeManager;

#[test]
fn test_time_manager_new() {
    let time = TimeManager::new();
    assert_eq!(time.current_tick(), 0);
    assert_eq!(time.elapsed_ticks(), 0);
}

#[test]
fn test_advance_tick() {
    let mut time = TimeManager::new();

    time.advance_tick();
    assert_eq!(time.current_tick(), 1);

    time.advance_tick();
    assert_eq!(time.current_tick(), 2);
    assert_eq!(time.elapsed_ticks(), 2);
}

#[test]
fn test_starting_at_counts_elapsed_from_start() {
    let mut time = TimeManager::starting_at(40);
    assert_eq!(time.current_tick(), 40);
    assert_eq!(time.elapsed_ticks(), 0);

    for _ in 0..5 {
        time.advance_tick();
    }
    assert_eq!(time.current_tick(), 45);
    assert_eq!(time.elapsed_ticks(), 5);
}
