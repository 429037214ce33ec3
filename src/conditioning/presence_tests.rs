use super::*;
use crate::hal::sim::{ScriptedIdentity, StubClock};

const CYCLE: Duration = Duration::from_millis(100);
const TIMEOUT: Duration = Duration::from_millis(1000);

/// Helper to create a toggle sharing a virtual clock with the test
fn create_toggle(mode: ToggleMode) -> (PresenceToggle<StubClock>, StubClock) {
    let clock = StubClock::new();
    (PresenceToggle::new(clock.clone(), mode, TIMEOUT), clock)
}

/// Run one cycle per entry, advancing the clock by `CYCLE` after each,
/// and count how many times the output changed
fn run_and_count_flips(
    toggle: &mut PresenceToggle<StubClock>,
    clock: &StubClock,
    matches: &[bool],
) -> usize {
    let mut flips = 0;
    for &m in matches {
        let before = toggle.current_state();
        toggle.update(m);
        if toggle.current_state() != before {
            flips += 1;
        }
        clock.advance(CYCLE);
    }
    flips
}

#[test]
fn test_initial_state_is_off() {
    let (toggle, _) = create_toggle(ToggleMode::MomentaryOn);
    assert!(!toggle.current_state());
    assert!(!toggle.is_present());
}

#[test]
fn test_latched_toggle_flips_twice_across_removal_gap() {
    let (mut toggle, clock) = create_toggle(ToggleMode::LatchedToggle);

    // true x3, then 1200 ms of no tag, then true again
    let mut matches = vec![true, true, true];
    matches.extend(std::iter::repeat(false).take(12));
    matches.push(true);

    let flips = run_and_count_flips(&mut toggle, &clock, &matches);

    assert_eq!(flips, 2, "expected exactly two flips");
    assert!(!toggle.current_state());
    assert!(toggle.is_present());
}

#[test]
fn test_latched_toggle_survives_removal() {
    let (mut toggle, clock) = create_toggle(ToggleMode::LatchedToggle);

    assert_eq!(
        toggle.update(true),
        Some(PresenceEvent::Arrived { state: true })
    );

    clock.advance(Duration::from_millis(1001));
    assert_eq!(
        toggle.update(false),
        Some(PresenceEvent::Removed { state: true })
    );
    assert!(toggle.current_state(), "latch must survive removal");
    assert!(!toggle.is_present());
}

#[test]
fn test_sustained_contact_does_not_retrigger() {
    let (mut toggle, clock) = create_toggle(ToggleMode::LatchedToggle);

    let flips = run_and_count_flips(&mut toggle, &clock, &[true; 50]);

    assert_eq!(flips, 1);
    assert!(toggle.current_state());
}

#[test]
fn test_intermittent_reads_within_timeout_hold_presence() {
    let (mut toggle, clock) = create_toggle(ToggleMode::LatchedToggle);

    // Tag read every 900 ms: never absent longer than the timeout
    let mut pattern = Vec::new();
    for _ in 0..5 {
        pattern.push(true);
        pattern.extend(std::iter::repeat(false).take(8));
    }
    let flips = run_and_count_flips(&mut toggle, &clock, &pattern);

    assert_eq!(flips, 1);
    assert!(toggle.is_present());
}

#[test]
fn test_momentary_on_follows_presence() {
    let (mut toggle, clock) = create_toggle(ToggleMode::MomentaryOn);

    toggle.update(true);
    assert!(toggle.current_state());

    // Exactly at the timeout the tag still counts as present
    clock.advance(TIMEOUT);
    assert_eq!(toggle.update(false), None);
    assert!(toggle.current_state());

    clock.advance(Duration::from_millis(1));
    assert_eq!(
        toggle.update(false),
        Some(PresenceEvent::Removed { state: false })
    );
    assert!(!toggle.current_state());

    // Next arrival switches ON again
    clock.advance(CYCLE);
    assert_eq!(
        toggle.update(true),
        Some(PresenceEvent::Arrived { state: true })
    );
}

#[test]
fn test_momentary_on_same_sequence_differs_from_latched() {
    let (mut toggle, clock) = create_toggle(ToggleMode::MomentaryOn);

    let mut matches = vec![true, true, true];
    matches.extend(std::iter::repeat(false).take(12));
    matches.push(true);

    // ON, OFF at removal, ON again
    let flips = run_and_count_flips(&mut toggle, &clock, &matches);
    assert_eq!(flips, 3);
    assert!(toggle.current_state());
}

#[test]
fn test_authorized_identity_exact_match() {
    let identity = AuthorizedIdentity::new(vec![0xDE, 0xAD, 0xBE, 0xEF]);
    assert!(identity.matches(&[0xDE, 0xAD, 0xBE, 0xEF]));
    assert!(!identity.matches(&[0xDE, 0xAD, 0xBE]));
    assert!(!identity.matches(&[0xDE, 0xAD, 0xBE, 0xEF, 0x00]));
    assert!(!identity.matches(&[0xDE, 0xAD, 0xBE, 0xEE]));
    assert!(!identity.matches(&[]));
}

#[test]
fn test_tag_toggle_ignores_unknown_tags() {
    let clock = StubClock::new();
    let reader = ScriptedIdentity::new(vec![
        Some(vec![0x01, 0x02, 0x03, 0x04]),
        None,
        Some(vec![0xDE, 0xAD, 0xBE, 0xEF]),
    ]);
    let config = PresenceConfig {
        mode: ToggleMode::LatchedToggle,
        ..PresenceConfig::default()
    };
    let mut tag = TagToggle::from_config(reader, clock.clone(), &config);

    assert_eq!(tag.update(), None);
    clock.advance(CYCLE);
    assert_eq!(tag.update(), None);
    clock.advance(CYCLE);
    assert_eq!(tag.update(), Some(PresenceEvent::Arrived { state: true }));
    assert!(tag.current_state());
    assert_eq!(tag.toggle().mode(), ToggleMode::LatchedToggle);
}
