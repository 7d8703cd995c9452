//! Battle lifecycle events, the publisher that fans them out, and a
//! recording subscriber.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use serde::Serialize;

use crate::battle::BattleResult;
use crate::buff::BuffKind;
use crate::combatant::CombatantId;
use crate::damage::DamageType;
use crate::error::{CombatError, CombatResult};
use crate::status::StatusKind;

/// Something that happened during a battle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BattleEvent {
    /// A round began.
    RoundStarted {
        /// Round number, starting at 1.
        round: u32,
    },
    /// Every queued turn of a round has been handled.
    RoundEnded {
        /// Round number.
        round: u32,
    },
    /// The initiative queue for a round was built.
    TurnOrderBuilt {
        /// Round number.
        round: u32,
        /// Ids in acting order.
        order: Vec<CombatantId>,
    },
    /// An actor was handed its turn.
    TurnStarted {
        /// Who is acting.
        actor: CombatantId,
    },
    /// An actor's turn finished.
    TurnEnded {
        /// Who acted.
        actor: CombatantId,
    },
    /// A living actor lost its turn to a blocking status.
    TurnSkipped {
        /// Who was skipped.
        actor: CombatantId,
    },
    /// Damage landed on a target.
    DamageDealt {
        /// Who was hit.
        target: CombatantId,
        /// Damage after modifiers, including any absorbed part.
        amount: i32,
        /// Part of `amount` soaked by shields.
        absorbed: i32,
        /// Attack type of the hit.
        damage_type: DamageType,
    },
    /// A target regained hit points.
    Healed {
        /// Who was healed.
        target: CombatantId,
        /// Hit points actually restored.
        amount: i32,
    },
    /// A combatant dropped to zero hp.
    CombatantDefeated {
        /// Who fell.
        id: CombatantId,
    },
    /// A status was applied or refreshed.
    StatusApplied {
        /// Who received it.
        target: CombatantId,
        /// Which status.
        status: StatusKind,
        /// Rounds left after applying.
        remaining: u32,
    },
    /// A status ran out.
    StatusExpired {
        /// Who lost it.
        target: CombatantId,
        /// Which status.
        status: StatusKind,
    },
    /// A buff was applied or refreshed.
    BuffApplied {
        /// Who received it.
        target: CombatantId,
        /// Which buff.
        buff: BuffKind,
        /// Rounds left after applying.
        remaining: u32,
    },
    /// A buff changed hp at round end.
    BuffTicked {
        /// Who was affected.
        target: CombatantId,
        /// Which buff.
        buff: BuffKind,
        /// Signed hp change.
        delta: i32,
    },
    /// A buff ran out.
    BuffExpired {
        /// Who lost it.
        target: CombatantId,
        /// Which buff.
        buff: BuffKind,
    },
    /// The battle reached a terminal result.
    BattleEnded {
        /// Victory or defeat, from the friends' side.
        result: BattleResult,
    },
}

impl BattleEvent {
    /// Stable snake_case name of the event.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RoundStarted { .. } => "round_started",
            Self::RoundEnded { .. } => "round_ended",
            Self::TurnOrderBuilt { .. } => "turn_order_built",
            Self::TurnStarted { .. } => "turn_started",
            Self::TurnEnded { .. } => "turn_ended",
            Self::TurnSkipped { .. } => "turn_skipped",
            Self::DamageDealt { .. } => "damage_dealt",
            Self::Healed { .. } => "healed",
            Self::CombatantDefeated { .. } => "combatant_defeated",
            Self::StatusApplied { .. } => "status_applied",
            Self::StatusExpired { .. } => "status_expired",
            Self::BuffApplied { .. } => "buff_applied",
            Self::BuffTicked { .. } => "buff_ticked",
            Self::BuffExpired { .. } => "buff_expired",
            Self::BattleEnded { .. } => "battle_ended",
        }
    }

    /// Check whether a given combatant is involved in this event.
    pub fn involves(&self, id: CombatantId) -> bool {
        match self {
            Self::TurnStarted { actor } | Self::TurnEnded { actor } | Self::TurnSkipped { actor } => {
                *actor == id
            }
            Self::DamageDealt { target, .. }
            | Self::Healed { target, .. }
            | Self::StatusApplied { target, .. }
            | Self::StatusExpired { target, .. }
            | Self::BuffApplied { target, .. }
            | Self::BuffTicked { target, .. }
            | Self::BuffExpired { target, .. } => *target == id,
            Self::CombatantDefeated { id: who } => *who == id,
            Self::TurnOrderBuilt { order, .. } => order.contains(&id),
            Self::RoundStarted { .. } | Self::RoundEnded { .. } | Self::BattleEnded { .. } => false,
        }
    }
}

impl fmt::Display for BattleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoundStarted { round } => write!(f, "=== round {round} start ==="),
            Self::RoundEnded { round } => write!(f, "=== round {round} end ==="),
            Self::TurnOrderBuilt { order, .. } => {
                let ids: Vec<String> = order.iter().map(ToString::to_string).collect();
                write!(f, "turn order: {}", ids.join(" > "))
            }
            Self::TurnStarted { actor } => write!(f, "{actor} takes the turn"),
            Self::TurnEnded { actor } => write!(f, "{actor} ends the turn"),
            Self::TurnSkipped { actor } => write!(f, "{actor} cannot act"),
            Self::DamageDealt {
                target,
                amount,
                absorbed,
                damage_type,
            } => {
                if *absorbed > 0 {
                    write!(
                        f,
                        "{target} takes {amount} {damage_type} damage ({absorbed} absorbed)"
                    )
                } else {
                    write!(f, "{target} takes {amount} {damage_type} damage")
                }
            }
            Self::Healed { target, amount } => write!(f, "{target} heals {amount}"),
            Self::CombatantDefeated { id } => write!(f, "{id} is defeated"),
            Self::StatusApplied {
                target,
                status,
                remaining,
            } => write!(f, "{target} is {status} ({remaining} rounds)"),
            Self::StatusExpired { target, status } => write!(f, "{target} is no longer {status}"),
            Self::BuffApplied {
                target,
                buff,
                remaining,
            } => write!(f, "{target} gains {buff} ({remaining} rounds)"),
            Self::BuffTicked {
                target,
                buff,
                delta,
            } => write!(f, "{buff} changes {target} by {delta:+}"),
            Self::BuffExpired { target, buff } => write!(f, "{buff} fades from {target}"),
            Self::BattleEnded { result } => write!(f, "battle ended: {result}"),
        }
    }
}

/// Receives published events.
///
/// Errors and panics are contained by the publisher and never reach the
/// battle.
pub trait Subscriber {
    /// Handle one event.
    fn on_event(&mut self, event: &BattleEvent) -> CombatResult<()>;
}

impl<F> Subscriber for F
where
    F: FnMut(&BattleEvent) -> CombatResult<()>,
{
    fn on_event(&mut self, event: &BattleEvent) -> CombatResult<()> {
        self(event)
    }
}

/// Handle returned by [`EventPublisher::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Fire-and-forget broadcast to subscribers, in subscription order.
#[derive(Default)]
pub struct EventPublisher {
    subscribers: Vec<(SubscriptionId, Box<dyn Subscriber>)>,
    next_id: u64,
    failures: u64,
}

impl fmt::Debug for EventPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventPublisher")
            .field("subscribers", &self.subscribers.len())
            .field("failures", &self.failures)
            .finish()
    }
}

impl EventPublisher {
    /// Create a publisher with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber. It receives every event published from now on.
    pub fn subscribe<S: Subscriber + 'static>(&mut self, subscriber: S) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    /// Remove a subscriber. Returns true if it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        before != self.subscribers.len()
    }

    /// Deliver an event to every subscriber.
    ///
    /// A subscriber that errors or panics is logged and skipped; the rest
    /// still receive the event.
    pub fn publish(&mut self, event: &BattleEvent) {
        for (id, subscriber) in &mut self.subscribers {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| subscriber.on_event(event)));
            let failure = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => err,
                Err(_) => CombatError::Subscriber("subscriber panicked".into()),
            };
            self.failures += 1;
            tracing::warn!(
                subscription = id.0,
                event = event.kind(),
                error = %failure,
                "event subscriber failed"
            );
        }
    }

    /// Number of registered subscribers.
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// True if nobody is subscribed.
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// How many deliveries have failed so far.
    pub fn failures(&self) -> u64 {
        self.failures
    }
}

/// An event as recorded by [`EventLog`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggedEvent {
    /// Delivery order, starting at 0.
    pub seq: u64,
    /// Round in progress when the event was published (0 before the first).
    pub round: u32,
    /// The event itself.
    pub event: BattleEvent,
}

/// Accumulates events during a battle.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<LoggedEvent>,
    max_events: usize,
    next_seq: u64,
    round: u32,
}

impl EventLog {
    /// Create a new event log with the given maximum capacity (0 = unlimited).
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Vec::new(),
            max_events,
            next_seq: 0,
            round: 0,
        }
    }

    /// Append an event, dropping the oldest events if the log exceeds its capacity.
    pub fn push(&mut self, event: BattleEvent) {
        if let BattleEvent::RoundStarted { round } = event {
            self.round = round;
        }
        self.events.push(LoggedEvent {
            seq: self.next_seq,
            round: self.round,
            event,
        });
        self.next_seq += 1;
        if self.max_events > 0 && self.events.len() > self.max_events {
            let drain_count = self.events.len() - self.max_events;
            self.events.drain(..drain_count);
        }
    }

    /// Return a slice of all recorded events.
    pub fn events(&self) -> &[LoggedEvent] {
        &self.events
    }

    /// Return all events involving the given combatant.
    pub fn events_for(&self, id: CombatantId) -> Vec<&LoggedEvent> {
        self.events.iter().filter(|e| e.event.involves(id)).collect()
    }

    /// Return all events with the given [`BattleEvent::kind`] name.
    pub fn events_of_kind(&self, kind: &str) -> Vec<&LoggedEvent> {
        self.events
            .iter()
            .filter(|e| e.event.kind() == kind)
            .collect()
    }

    /// Return all events recorded during the given round.
    pub fn events_in_round(&self, round: u32) -> Vec<&LoggedEvent> {
        self.events.iter().filter(|e| e.round == round).collect()
    }

    /// Event names in delivery order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.iter().map(|e| e.event.kind()).collect()
    }

    /// Return the number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Return `true` if no events have been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Remove all recorded events.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

/// Cloneable handle to an [`EventLog`] that can be subscribed while the
/// caller keeps reading it.
#[derive(Debug, Clone, Default)]
pub struct SharedEventLog(Rc<RefCell<EventLog>>);

impl SharedEventLog {
    /// Wrap a fresh log with the given capacity (0 = unlimited).
    pub fn new(max_events: usize) -> Self {
        Self(Rc::new(RefCell::new(EventLog::new(max_events))))
    }

    /// Borrow the log for reading.
    pub fn borrow(&self) -> Ref<'_, EventLog> {
        self.0.borrow()
    }
}

impl Subscriber for SharedEventLog {
    fn on_event(&mut self, event: &BattleEvent) -> CombatResult<()> {
        let mut log = self
            .0
            .try_borrow_mut()
            .map_err(|e| CombatError::Subscriber(e.to_string()))?;
        log.push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn damage(target: u32, amount: i32) -> BattleEvent {
        BattleEvent::DamageDealt {
            target: CombatantId(target),
            amount,
            absorbed: 0,
            damage_type: DamageType::Physical,
        }
    }

    #[test]
    fn publish_in_subscription_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut publisher = EventPublisher::new();
        for tag in ["first", "second", "third"] {
            let seen = Rc::clone(&seen);
            publisher.subscribe(move |_: &BattleEvent| -> CombatResult<()> {
                seen.borrow_mut().push(tag);
                Ok(())
            });
        }
        publisher.publish(&BattleEvent::RoundStarted { round: 1 });
        assert_eq!(*seen.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn failing_subscriber_is_isolated() {
        let log = SharedEventLog::new(0);
        let mut publisher = EventPublisher::new();
        publisher.subscribe(|_: &BattleEvent| -> CombatResult<()> {
            Err(CombatError::Subscriber("boom".into()))
        });
        publisher.subscribe(|_: &BattleEvent| -> CombatResult<()> { panic!("kaboom") });
        publisher.subscribe(log.clone());

        publisher.publish(&BattleEvent::RoundStarted { round: 1 });
        publisher.publish(&BattleEvent::RoundEnded { round: 1 });

        assert_eq!(log.borrow().len(), 2);
        assert_eq!(publisher.failures(), 4);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let log = SharedEventLog::new(0);
        let mut publisher = EventPublisher::new();
        let id = publisher.subscribe(log.clone());
        publisher.publish(&BattleEvent::RoundStarted { round: 1 });
        assert!(publisher.unsubscribe(id));
        assert!(!publisher.unsubscribe(id));
        publisher.publish(&BattleEvent::RoundEnded { round: 1 });
        assert_eq!(log.borrow().len(), 1);
        assert!(publisher.is_empty());
    }

    #[test]
    fn log_tracks_rounds_and_filters() {
        let mut log = EventLog::new(0);
        log.push(BattleEvent::RoundStarted { round: 1 });
        log.push(damage(0, 3));
        log.push(BattleEvent::RoundStarted { round: 2 });
        log.push(damage(1, 4));
        log.push(damage(0, 5));

        assert_eq!(log.events_in_round(1).len(), 2);
        assert_eq!(log.events_in_round(2).len(), 3);
        assert_eq!(log.events_for(CombatantId(0)).len(), 2);
        assert_eq!(log.events_of_kind("damage_dealt").len(), 3);
        assert_eq!(log.events()[4].seq, 4);
    }

    #[test]
    fn log_max_events_trims() {
        let mut log = EventLog::new(2);
        for i in 0..5 {
            log.push(damage(0, i));
        }
        assert_eq!(log.len(), 2);
        // Oldest events were dropped, newest remain
        assert_eq!(log.events()[0].seq, 3);
        assert_eq!(log.events()[1].seq, 4);
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn involves_matches_participants() {
        let a = CombatantId(0);
        let b = CombatantId(1);
        assert!(damage(0, 1).involves(a));
        assert!(!damage(0, 1).involves(b));
        let order = BattleEvent::TurnOrderBuilt {
            round: 1,
            order: vec![a, b],
        };
        assert!(order.involves(b));
        assert!(!BattleEvent::RoundStarted { round: 1 }.involves(a));
    }

    #[test]
    fn serializes_with_kind_tag() {
        let json = serde_json::to_value(damage(2, 7)).unwrap();
        assert_eq!(json["kind"], "damage_dealt");
        assert_eq!(json["target"], 2);
        assert_eq!(json["damage_type"], "Physical");
        let ended = serde_json::to_value(BattleEvent::BattleEnded {
            result: BattleResult::Victory,
        })
        .unwrap();
        assert_eq!(ended["result"], "victory");
    }

    #[test]
    fn display_is_readable() {
        assert_eq!(damage(1, 6).to_string(), "#1 takes 6 Physical damage");
        let tick = BattleEvent::BuffTicked {
            target: CombatantId(0),
            buff: BuffKind::Poison,
            delta: -4,
        };
        assert_eq!(tick.to_string(), "Poison changes #0 by -4");
    }
}
