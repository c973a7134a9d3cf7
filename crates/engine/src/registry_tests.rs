// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::test_bus;
use sqk_core::AgentType;
use std::time::Duration;

fn registry() -> (crate::test_helpers::TestBus, SpecialistRegistry<sqk_core::FakeClock>) {
    let t = test_bus();
    let registry = SpecialistRegistry::new(t.bus.clone(), t.clock.clone(), 45_000);
    (t, registry)
}

#[test]
fn register_and_list() {
    let (_t, registry) = registry();

    let a = registry.register("backend-alpha", AgentType::Backend, vec!["rust".to_string()]).unwrap();
    registry.register("frontend-bravo", AgentType::Frontend, Vec::new()).unwrap();

    assert_eq!(registry.list().len(), 2);
    let loaded = registry.get(a.id.as_str()).unwrap();
    assert_eq!(loaded.capabilities, vec!["rust".to_string()]);
}

#[test]
fn heartbeat_updates_last_seen() {
    let (t, registry) = registry();
    let a = registry.register("backend-alpha", AgentType::Backend, Vec::new()).unwrap();

    t.clock.advance(Duration::from_secs(10));
    assert!(registry.update_heartbeat(&a.id).unwrap());

    let loaded = registry.get(a.id.as_str()).unwrap();
    assert_eq!(loaded.last_seen_epoch_ms, t.clock.epoch_ms());
}

#[test]
fn heartbeat_for_unknown_specialist_is_false() {
    let (_t, registry) = registry();
    assert!(!registry.update_heartbeat(&sqk_core::SpecialistId::from_string("spc-ghost")).unwrap());
}

#[test]
fn sweep_flags_stale_specialists_once() {
    let (t, registry) = registry();
    let a = registry.register("backend-alpha", AgentType::Backend, Vec::new()).unwrap();
    registry.register("backend-bravo", AgentType::Backend, Vec::new()).unwrap();

    t.clock.advance(Duration::from_secs(46));
    let flagged = registry.sweep_missed_heartbeats().unwrap();
    assert_eq!(flagged.len(), 2);

    // Second sweep with no fresh beats flags nothing new
    assert!(registry.sweep_missed_heartbeats().unwrap().is_empty());

    // A fresh heartbeat clears the flag within one sweep
    registry.update_heartbeat(&a.id).unwrap();
    assert!(!registry.get(a.id.as_str()).unwrap().unhealthy);
    assert!(registry.sweep_missed_heartbeats().unwrap().is_empty());
}

#[test]
fn terminate_clears_assignment() {
    let (_t, registry) = registry();
    let a = registry.register("backend-alpha", AgentType::Backend, Vec::new()).unwrap();

    assert!(registry.terminate(&a.id, Some("operator request".to_string()), true).unwrap());

    let loaded = registry.get(a.id.as_str()).unwrap();
    assert_eq!(loaded.status, sqk_core::SpecialistStatus::Inactive);
    assert!(loaded.current_sortie.is_none());
}

#[test]
fn health_classification_follows_heartbeats() {
    let (t, registry) = registry();
    let a = registry.register("backend-alpha", AgentType::Backend, Vec::new()).unwrap();

    let now = t.clock.epoch_ms();
    let healthy =
        crate::health::specialist_health(&t.bus.state.lock(), a.id.as_str(), now, 45_000).unwrap();
    assert!(healthy.healthy);

    t.clock.advance(Duration::from_secs(46));
    let now = t.clock.epoch_ms();
    let stale =
        crate::health::specialist_health(&t.bus.state.lock(), a.id.as_str(), now, 45_000).unwrap();
    assert!(!stale.healthy);
}
