use beaconsat::announcer::{Announcer, DeliveryReport};
use beaconsat::events::{BeaconEvent, BeaconEventKind, BeaconListener, BeaconSnapshot};
use beaconsat::{BeaconId, BeaconState, Heading, ListenerError, ListenerResult};
use std::sync::{Arc, Mutex};

fn snapshot() -> BeaconSnapshot {
    BeaconSnapshot {
        id: BeaconId::numbered(1),
        x: 10,
        y: 400,
        heading: Heading::Right,
        state: BeaconState::Collecting,
        memory: 0,
        max_memory: 100,
    }
}

fn move_event() -> BeaconEvent {
    BeaconEvent::Move(snapshot())
}

type Log = Arc<Mutex<Vec<&'static str>>>;

struct Tagged {
    tag: &'static str,
    log: Log,
}

impl BeaconListener for Tagged {
    fn on_beacon_move(&self, _beacon: &BeaconSnapshot) -> ListenerResult {
        self.log.lock().unwrap().push(self.tag);
        Ok(())
    }
}

fn tagged(tag: &'static str, log: &Log) -> Arc<dyn BeaconListener> {
    Arc::new(Tagged { tag, log: Arc::clone(log) })
}

#[test]
fn test_delivery_follows_subscription_order() {
    let announcer = Announcer::<BeaconEvent>::new();
    let log: Log = Arc::default();
    announcer.subscribe(BeaconEventKind::Move, tagged("first", &log));
    announcer.subscribe(BeaconEventKind::Move, tagged("second", &log));
    announcer.subscribe(BeaconEventKind::Move, tagged("third", &log));

    let report = announcer.publish(&move_event());

    assert_eq!(report, DeliveryReport { delivered: 3, failed: 0 });
    assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
}

#[test]
fn test_duplicate_subscription_delivers_once_per_registration() {
    let announcer = Announcer::<BeaconEvent>::new();
    let log: Log = Arc::default();
    let listener = tagged("dup", &log);
    announcer.subscribe(BeaconEventKind::Move, Arc::clone(&listener));
    announcer.subscribe(BeaconEventKind::Move, Arc::clone(&listener));

    announcer.publish(&move_event());

    assert_eq!(log.lock().unwrap().len(), 2);
    assert_eq!(announcer.subscriber_count(BeaconEventKind::Move), 2);
}

#[test]
fn test_unsubscribe_removes_every_registration_and_cleans_index() {
    let announcer = Announcer::<BeaconEvent>::new();
    let log: Log = Arc::default();
    let listener = tagged("gone", &log);
    announcer.subscribe(BeaconEventKind::Move, Arc::clone(&listener));
    announcer.subscribe(BeaconEventKind::Move, Arc::clone(&listener));
    assert!(announcer.is_registered(BeaconEventKind::Move));

    let removed = announcer.unsubscribe(BeaconEventKind::Move, &listener);

    assert_eq!(removed, 2);
    assert!(!announcer.is_registered(BeaconEventKind::Move));
    assert_eq!(announcer.publish(&move_event()), DeliveryReport::default());
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn test_unsubscribe_keeps_other_listeners() {
    let announcer = Announcer::<BeaconEvent>::new();
    let log: Log = Arc::default();
    let leaving = tagged("leaving", &log);
    announcer.subscribe(BeaconEventKind::Move, Arc::clone(&leaving));
    announcer.subscribe(BeaconEventKind::Move, tagged("staying", &log));

    assert_eq!(announcer.unsubscribe(BeaconEventKind::Move, &leaving), 1);
    announcer.publish(&move_event());

    assert_eq!(*log.lock().unwrap(), vec!["staying"]);
    assert!(announcer.is_registered(BeaconEventKind::Move));
}

#[test]
fn test_publish_without_subscribers_is_silent() {
    let announcer = Announcer::<BeaconEvent>::new();
    let report = announcer.publish(&BeaconEvent::StateChange {
        beacon: snapshot(),
        previous: BeaconState::Collecting,
        new_state: BeaconState::Rising,
    });
    assert_eq!(report.attempted(), 0);
}

/// Unsubscribes itself on its first delivery.
struct OneShot {
    announcer: Arc<Announcer<BeaconEvent>>,
    me: Mutex<Option<Arc<dyn BeaconListener>>>,
    received: Mutex<u32>,
}

impl BeaconListener for OneShot {
    fn on_beacon_move(&self, _beacon: &BeaconSnapshot) -> ListenerResult {
        *self.received.lock().unwrap() += 1;
        if let Some(me) = self.me.lock().unwrap().take() {
            self.announcer.unsubscribe(BeaconEventKind::Move, &me);
        }
        Ok(())
    }
}

#[test]
fn test_self_unsubscribing_listener_still_receives_current_event() {
    let announcer = Arc::new(Announcer::<BeaconEvent>::new());
    let one_shot = Arc::new(OneShot {
        announcer: Arc::clone(&announcer),
        me: Mutex::new(None),
        received: Mutex::new(0),
    });
    let as_listener: Arc<dyn BeaconListener> = one_shot.clone();
    *one_shot.me.lock().unwrap() = Some(Arc::clone(&as_listener));

    let log: Log = Arc::default();
    announcer.subscribe(BeaconEventKind::Move, as_listener);
    announcer.subscribe(BeaconEventKind::Move, tagged("after", &log));

    let report = announcer.publish(&move_event());
    assert_eq!(report.delivered, 2);
    assert_eq!(*one_shot.received.lock().unwrap(), 1);
    assert_eq!(*log.lock().unwrap(), vec!["after"]);

    announcer.publish(&move_event());
    assert_eq!(*one_shot.received.lock().unwrap(), 1);
    assert_eq!(*log.lock().unwrap(), vec!["after", "after"]);
}

/// Subscribes a new listener while being delivered to.
struct Recruiter {
    announcer: Arc<Announcer<BeaconEvent>>,
    recruit: Arc<dyn BeaconListener>,
}

impl BeaconListener for Recruiter {
    fn on_beacon_move(&self, _beacon: &BeaconSnapshot) -> ListenerResult {
        self.announcer.subscribe(BeaconEventKind::Move, Arc::clone(&self.recruit));
        Ok(())
    }
}

#[test]
fn test_listener_subscribed_during_publish_waits_for_next_publish() {
    let announcer = Arc::new(Announcer::<BeaconEvent>::new());
    let log: Log = Arc::default();
    let recruiter: Arc<dyn BeaconListener> = Arc::new(Recruiter {
        announcer: Arc::clone(&announcer),
        recruit: tagged("recruit", &log),
    });
    announcer.subscribe(BeaconEventKind::Move, recruiter);

    let report = announcer.publish(&move_event());
    assert_eq!(report.delivered, 1);
    assert!(log.lock().unwrap().is_empty());
    assert_eq!(announcer.subscriber_count(BeaconEventKind::Move), 2);

    announcer.publish(&move_event());
    assert_eq!(*log.lock().unwrap(), vec!["recruit"]);
}

struct Failing;

impl BeaconListener for Failing {
    fn on_beacon_move(&self, _beacon: &BeaconSnapshot) -> ListenerResult {
        Err(ListenerError::ResourceUnavailable("sprite sheet missing".into()))
    }
}

#[test]
fn test_failing_listener_does_not_abort_delivery() {
    let announcer = Announcer::<BeaconEvent>::new();
    let log: Log = Arc::default();
    announcer.subscribe(BeaconEventKind::Move, Arc::new(Failing));
    announcer.subscribe(BeaconEventKind::Move, tagged("survivor", &log));

    let report = announcer.publish(&move_event());

    assert_eq!(report, DeliveryReport { delivered: 1, failed: 1 });
    assert_eq!(*log.lock().unwrap(), vec!["survivor"]);
}

#[test]
fn test_event_kinds_route_to_matching_capability() {
    let announcer = Announcer::<BeaconEvent>::new();
    let log: Log = Arc::default();
    announcer.subscribe(BeaconEventKind::StateChange, tagged("mover", &log));

    // Tagged only implements the move capability; a state change reaches
    // the default no-op method.
    let report = announcer.publish(&BeaconEvent::StateChange {
        beacon: snapshot(),
        previous: BeaconState::Rising,
        new_state: BeaconState::Synchronizing,
    });
    assert_eq!(report.delivered, 1);
    assert!(log.lock().unwrap().is_empty());

    assert_eq!(announcer.publish(&move_event()).attempted(), 0);
}
