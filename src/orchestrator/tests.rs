use super::*;

const WINDOW: u64 = 3_000;

/// Drives one tick the way the runtime does, announcing immediately.
fn tick(o: &mut Orchestrator, attached: bool, session: bool, now: u64) -> Step {
    let step = o.step(attached, session);
    if step.announce {
        o.announced(now);
    }
    o.settle(now);
    step
}

#[test]
fn test_pure_transitions() {
    assert_eq!(CommState::Disconnected.on_link(false, false), CommState::Attaching);
    assert_eq!(CommState::Attaching.on_link(true, false), CommState::SessionPending);
    assert_eq!(CommState::SessionPending.on_link(true, true), CommState::Announcing);
    assert_eq!(CommState::Ready.on_link(true, true), CommState::Ready);
    assert_eq!(CommState::Ready.on_link(true, false), CommState::SessionPending);
    assert_eq!(CommState::Ready.on_link(false, true), CommState::Attaching);
    assert_eq!(
        CommState::Announcing.on_announced(100, WINDOW),
        CommState::Flushing { until: 3_100 }
    );
    assert_eq!(CommState::Ready.on_announced(100, WINDOW), CommState::Ready);
    assert_eq!(
        CommState::Flushing { until: 3_100 }.on_clock(3_099),
        CommState::Flushing { until: 3_100 }
    );
    assert_eq!(CommState::Flushing { until: 3_100 }.on_clock(3_100), CommState::Ready);
}

#[test]
fn test_session_active_and_suppression() {
    assert!(!CommState::SessionPending.session_active());
    assert!(CommState::Announcing.session_active());
    assert!(CommState::Flushing { until: 10 }.session_active());
    assert!(CommState::Ready.session_active());

    assert!(CommState::Flushing { until: 10 }.suppresses_inbound(9));
    assert!(!CommState::Flushing { until: 10 }.suppresses_inbound(10));
    assert!(!CommState::Ready.suppresses_inbound(0));
}

#[test]
fn test_full_sequence() {
    let mut o = Orchestrator::new(WINDOW);
    assert_eq!(o.state(), CommState::Disconnected);

    let step = tick(&mut o, false, false, 0);
    assert_eq!(step, Step::default());
    assert_eq!(o.state(), CommState::Attaching);

    let step = tick(&mut o, true, false, 100);
    assert!(step.attached);
    assert!(!step.announce);
    assert_eq!(o.state(), CommState::SessionPending);
    assert!(!o.session_active());

    let step = tick(&mut o, true, true, 200);
    assert!(step.announce);
    assert_eq!(o.state(), CommState::Flushing { until: 3_200 });
    assert!(o.session_active());
    assert!(o.suppresses_inbound(200));
    assert!(!o.became_ready());

    tick(&mut o, true, true, 3_199);
    assert!(!o.became_ready());

    tick(&mut o, true, true, 3_200);
    assert_eq!(o.state(), CommState::Ready);
    assert!(o.became_ready());
    assert!(!o.became_ready());
}

#[test]
fn test_became_ready_once_per_cycle() {
    let mut o = Orchestrator::new(WINDOW);
    let mut edges = 0;
    let mut now = 0;
    for _ in 0..20 {
        tick(&mut o, true, true, now);
        if o.became_ready() {
            edges += 1;
        }
        now += 500;
    }
    assert_eq!(edges, 1);

    // Session drops, then comes back.
    tick(&mut o, true, false, now);
    assert_eq!(o.state(), CommState::SessionPending);
    assert!(!o.became_ready());
    for _ in 0..20 {
        now += 500;
        tick(&mut o, true, true, now);
        if o.became_ready() {
            edges += 1;
        }
    }
    assert_eq!(edges, 2);
}

#[test]
fn test_unread_edge_expires_next_tick() {
    let mut o = Orchestrator::new(0);
    tick(&mut o, true, true, 0);
    assert_eq!(o.state(), CommState::Ready);
    tick(&mut o, true, true, 1);
    assert!(!o.became_ready());
}

#[test]
fn test_fully_ready_needs_confirmation() {
    let mut o = Orchestrator::new(WINDOW);
    tick(&mut o, true, true, 0);
    tick(&mut o, true, true, WINDOW);
    assert_eq!(o.state(), CommState::Ready);
    assert!(!o.is_fully_ready());

    o.confirm_ready();
    assert!(o.is_fully_ready());

    // Sticky while the session holds.
    tick(&mut o, true, true, WINDOW + 10_000);
    assert!(o.is_fully_ready());

    // A drop clears it, and so does the confirmation.
    tick(&mut o, false, false, WINDOW + 20_000);
    assert!(!o.is_fully_ready());
    tick(&mut o, true, true, WINDOW + 30_000);
    tick(&mut o, true, true, 2 * WINDOW + 30_000);
    assert_eq!(o.state(), CommState::Ready);
    assert!(!o.is_fully_ready());
}

#[test]
fn test_restart_forgets_everything() {
    let mut o = Orchestrator::new(WINDOW);
    tick(&mut o, true, true, 0);
    tick(&mut o, true, true, WINDOW);
    o.confirm_ready();
    o.restart();
    assert_eq!(o.state(), CommState::Disconnected);
    assert!(!o.is_fully_ready());
    assert!(!o.session_active());

    // Linked and in session right away: announces again.
    let step = tick(&mut o, true, true, 2 * WINDOW);
    assert!(step.attached);
    assert!(step.announce);
}
