#![allow(non_snake_case)]

use super::*;
use test_case::test_case;

// ============================================================================
// Parameterized valid transitions
// ============================================================================

#[test_case(ClientState::Uninitialized, ClientState::Ready)]
#[test_case(ClientState::Ready, ClientState::Checking)]
#[test_case(ClientState::Checking, ClientState::Downloading)]
#[test_case(ClientState::Checking, ClientState::Ready)]
#[test_case(ClientState::Downloading, ClientState::Ready)]
fn ClientState___valid_transitions___allowed(from: ClientState, to: ClientState) {
    assert!(
        from.can_transition_to(to),
        "{:?} should transition to {:?}",
        from,
        to
    );
}

// ============================================================================
// Parameterized invalid transitions
// ============================================================================

#[test_case(ClientState::Uninitialized, ClientState::Checking)]
#[test_case(ClientState::Uninitialized, ClientState::Downloading)]
#[test_case(ClientState::Ready, ClientState::Downloading)]
#[test_case(ClientState::Ready, ClientState::Uninitialized)]
#[test_case(ClientState::Ready, ClientState::Ready)]
#[test_case(ClientState::Checking, ClientState::Checking)]
#[test_case(ClientState::Downloading, ClientState::Checking)]
#[test_case(ClientState::Downloading, ClientState::Uninitialized)]
fn ClientState___invalid_transitions___not_allowed(from: ClientState, to: ClientState) {
    assert!(
        !from.can_transition_to(to),
        "{:?} should not transition to {:?}",
        from,
        to
    );
}

#[test_case(ClientState::Uninitialized, false)]
#[test_case(ClientState::Ready, false)]
#[test_case(ClientState::Checking, true)]
#[test_case(ClientState::Downloading, true)]
fn ClientState___is_checking___only_during_checks(state: ClientState, expected: bool) {
    assert_eq!(state.is_checking(), expected);
}

#[test]
fn ClientState___default___is_uninitialized() {
    let state = ClientState::default();

    assert_eq!(state, ClientState::Uninitialized);
    assert!(!state.is_initialized());
}

#[test]
fn ClientState___display___matches_variant_name() {
    assert_eq!(ClientState::Downloading.to_string(), "Downloading");
}

#[test]
fn ClientState___description___not_empty() {
    for state in [
        ClientState::Uninitialized,
        ClientState::Ready,
        ClientState::Checking,
        ClientState::Downloading,
    ] {
        assert!(!state.description().is_empty());
    }
}

#[test]
fn ClientState___serde___uses_snake_case() {
    let json = serde_json::to_string(&ClientState::Downloading).unwrap();

    assert_eq!(json, "\"downloading\"");
}
