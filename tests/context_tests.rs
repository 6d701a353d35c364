//! Simulation context integration tests.
//!
//! Triggers on the bus and telegrams in the dispatcher advancing off the
//! same clock.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rust_gamebus::context::SimulationContext;
use rust_gamebus::core::{BusConfig, EntityId, SimTime, SimulationConfig};
use rust_gamebus::events::{Event, EventTypeConfig, EventTypeId};
use rust_gamebus::messaging::MessageType;
use rust_gamebus::triggers::EventTrigger;

const PATROL: EventTypeId = EventTypeId::new(1);
const REPORT: MessageType = MessageType::new(1);

const GUARD: EntityId = EntityId(10);
const CAPTAIN: EntityId = EntityId(11);

/// A guard's patrol trigger schedules a report to the captain; the
/// report arrives two seconds of simulation time later.
#[test]
fn test_trigger_then_telegram() {
    let config = SimulationConfig::new()
        .with_bus(BusConfig::new().with_event_type(EventTypeConfig::new(PATROL, "Patrol")));
    let mut ctx = SimulationContext::from_config(config);
    let reports = Arc::new(AtomicU32::new(0));

    let counter = reports.clone();
    ctx.dispatcher_mut()
        .add_listener_fn(CAPTAIN, Some(REPORT), move |_, telegram| {
            counter.fetch_add(1, Ordering::SeqCst);
            telegram.sender() == GUARD
        })
        .unwrap();

    let patrol_events = Arc::new(AtomicU32::new(0));
    let seen = patrol_events.clone();
    ctx.bus_mut().subscribe_fn(PATROL, move |_, _| {
        seen.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    ctx.bus_mut()
        .add_trigger(EventTrigger::repeating(|| Event::for_entity(PATROL, GUARD), Duration::from_secs(3), 2).unwrap());

    let mut delivered = 0;
    for _ in 0..10 {
        // Guard reacts to its own patrol events by messaging the captain
        let fired_before = patrol_events.load(Ordering::SeqCst);
        delivered += ctx.update(Duration::from_secs(1)).unwrap();
        if patrol_events.load(Ordering::SeqCst) > fired_before {
            ctx.dispatcher_mut()
                .dispatch_message(Duration::from_secs(2), GUARD, CAPTAIN, REPORT, None);
        }
    }

    assert_eq!(patrol_events.load(Ordering::SeqCst), 2);
    assert_eq!(reports.load(Ordering::SeqCst), 2);
    assert_eq!(delivered, 2);
    assert_eq!(ctx.now(), SimTime::from_secs(10));
    assert_eq!(ctx.bus().trigger_count(), 0);
    assert_eq!(ctx.bus().config().event_name(PATROL), Some("Patrol"));
}

/// Two contexts never see each other's handlers or telegrams.
#[test]
fn test_contexts_are_independent() {
    let mut a = SimulationContext::new();
    let mut b = SimulationContext::new();

    a.bus_mut().subscribe_fn(PATROL, |_, _| Ok(()));
    a.dispatcher_mut()
        .dispatch_message(Duration::from_secs(1), GUARD, CAPTAIN, REPORT, None);
    b.update(Duration::from_secs(5)).unwrap();

    assert!(!b.bus().has_handlers(PATROL));
    assert_eq!(b.dispatcher().pending_count(), 0);
    assert_eq!(a.dispatcher().pending_count(), 1);
    assert_eq!(a.now(), SimTime::ZERO);
}
