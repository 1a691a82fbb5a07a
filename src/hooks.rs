//! Lifecycle notifications to dependent subsystems.
//!
//! The sequencer calls [`LifecycleNotifier::notify`] at fixed transition
//! points and does not proceed until it returns. Subscribers own their own
//! error handling.

use alloc::vec::Vec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HookEvent {
    /// Before the first rails come up; initialize the PMIC.
    PreInit,
    /// S5 -> S3, rails are up.
    Startup,
    /// Entering S0.
    Resume,
    /// Leaving S0, before rails are removed.
    Suspend,
    /// S3 -> S5, before rails are removed.
    Shutdown,
}

pub trait LifecycleNotifier {
    fn notify(&mut self, event: HookEvent);
}

pub trait HookSubscriber {
    fn on_hook(&self, event: HookEvent);
}

pub const HOOK_PRIO_FIRST: u8 = 1;
pub const HOOK_PRIO_DEFAULT: u8 = 128;
pub const HOOK_PRIO_LAST: u8 = 255;

struct Subscription<'a> {
    event: HookEvent,
    priority: u8,
    subscriber: &'a dyn HookSubscriber,
}

/// Subscribers grouped by event, delivered in priority order.
///
/// Lower priority values run first; equal priorities run in registration
/// order.
#[derive(Default)]
pub struct HookRegistry<'a> {
    subscriptions: Vec<Subscription<'a>>,
}

impl<'a> HookRegistry<'a> {
    pub const fn new() -> Self {
        Self {
            subscriptions: Vec::new(),
        }
    }

    pub fn register(&mut self, event: HookEvent, priority: u8, subscriber: &'a dyn HookSubscriber) {
        let position = self
            .subscriptions
            .iter()
            .position(|s| s.priority > priority)
            .unwrap_or(self.subscriptions.len());
        self.subscriptions.insert(
            position,
            Subscription {
                event,
                priority,
                subscriber,
            },
        );
    }

    pub fn subscribers(&self, event: HookEvent) -> usize {
        self.subscriptions.iter().filter(|s| s.event == event).count()
    }
}

impl LifecycleNotifier for HookRegistry<'_> {
    fn notify(&mut self, event: HookEvent) {
        debug!("Hook {:?}", event);
        for subscription in self.subscriptions.iter().filter(|s| s.event == event) {
            subscription.subscriber.on_hook(event);
        }
    }
}

impl<N: LifecycleNotifier + ?Sized> LifecycleNotifier for &mut N {
    fn notify(&mut self, event: HookEvent) {
        (**self).notify(event)
    }
}
