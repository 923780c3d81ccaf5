//! Architecture boundary tests: run with `cargo test -p firmware --test arch_boundaries`
// Architecture test file: expect/unwrap/panic are intentional test mechanisms.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
//!
//! Layering rules:
//!   Rule 1: platform (HAL) must not depend on firmware (engine)
//!   Rule 2: the interrupt path must not await, allocate or block
//!
//! Rule 2 is checked on the source text: the completion handlers are the
//! functions between `pub fn on_result_ready` and `pub fn execute_callbacks`
//! in `analog/unit.rs`, plus `ScanWake::give_from_isr`.

/// Extract the text between two markers, panicking with a useful message if
/// either is missing.
fn section<'a>(source: &'a str, start: &str, end: &str) -> &'a str {
    let from = source
        .find(start)
        .unwrap_or_else(|| panic!("marker `{start}` not found"));
    let to = source[from..]
        .find(end)
        .unwrap_or_else(|| panic!("marker `{end}` not found after `{start}`"));
    &source[from..from + to]
}

#[test]
fn platform_does_not_depend_on_firmware() {
    let manifest = include_str!("../../platform/Cargo.toml");
    assert!(
        !manifest.contains("firmware"),
        "platform/Cargo.toml must not reference the firmware crate"
    );
}

#[test]
fn platform_exposes_peripheral_trait_without_std() {
    // Compiles only if the trait and buffers are reachable from the root.
    fn _bound<P: platform::AnalogPeripheral>() {}
    let _ = core::mem::size_of::<platform::SequenceBuffer>();
    let _ = core::mem::size_of::<platform::ResultBuffer>();
}

#[test]
fn completion_handlers_are_isr_safe() {
    let unit_rs = include_str!("../src/analog/unit.rs");
    let handlers = section(unit_rs, "pub fn on_result_ready", "pub fn execute_callbacks");
    for forbidden in [".await", "Box::", "Vec::", "Timer", "block_on", "callback("] {
        assert!(
            !handlers.contains(forbidden),
            "completion handlers must not use `{forbidden}`"
        );
    }
}

#[test]
fn wake_give_is_lock_free() {
    let wake_rs = include_str!("../src/analog/wake.rs");
    let give = section(wake_rs, "pub fn give_from_isr", "pub fn try_take");
    for forbidden in ["lock(", ".await", "Mutex"] {
        assert!(
            !give.contains(forbidden),
            "give_from_isr must not use `{forbidden}`"
        );
    }
}

#[test]
fn scheduler_never_holds_a_lock_across_await() {
    let scheduler_rs = include_str!("../src/analog/scheduler.rs");
    let run = section(scheduler_rs, "pub async fn run_iteration", "pub async fn run(");
    assert!(!run.contains(".lock("), "run_iteration must not take blocking locks");
}
