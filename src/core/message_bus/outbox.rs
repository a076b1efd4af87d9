//=========================================================================
// Outbox
//=========================================================================
//
// Type-keyed notification queues.
//
// Architecture:
//   Core systems → publish<M>() → HashMap<TypeId, Vec<M>>
//                                      ↓
//   Presentation layer ← read<M>() / drain<M>()
//                                      ↓
//   Game::tick ───────→ clear_all() at tick start
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::TypeId;
use std::collections::HashMap;

use log::error;

//=== Internal Dependencies ===============================================

use super::message_queue::MessageQueue;

//=== Message Trait =======================================================

/// Marker trait for types that can be published through the outbox.
pub trait Message: 'static {}

impl<T: 'static> Message for T {}

//=== Outbox ==============================================================

/// Per-type notification queues, cleared every tick.
#[derive(Default)]
pub struct Outbox {
    queues: HashMap<TypeId, Box<dyn MessageQueue>>,
}

impl std::fmt::Debug for Outbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Outbox")
            .field("queues", &self.queues.len())
            .field("pending", &self.pending())
            .finish()
    }
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    //--- Publishing -------------------------------------------------------

    /// Appends a message to the queue for its type.
    pub fn publish<M: Message>(&mut self, msg: M) {
        let queue = self
            .queues
            .entry(TypeId::of::<M>())
            .or_insert_with(|| Box::new(Vec::<M>::new()));

        match queue.as_any_mut().downcast_mut::<Vec<M>>() {
            Some(queue) => queue.push(msg),
            None => error!(
                "Outbox queue type mismatch for {}",
                std::any::type_name::<M>()
            ),
        }
    }

    //--- Consuming --------------------------------------------------------

    /// Messages of type `M` published this tick, oldest first.
    pub fn read<M: Message>(&self) -> &[M] {
        self.queues
            .get(&TypeId::of::<M>())
            .and_then(|q| q.as_any().downcast_ref::<Vec<M>>())
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Removes and returns the messages of type `M`.
    pub fn drain<M: Message>(&mut self) -> Vec<M> {
        self.queues
            .get_mut(&TypeId::of::<M>())
            .and_then(|q| q.as_any_mut().downcast_mut::<Vec<M>>())
            .map(std::mem::take)
            .unwrap_or_default()
    }

    pub fn count<M: Message>(&self) -> usize {
        self.read::<M>().len()
    }

    /// Total messages pending across every type.
    pub fn pending(&self) -> usize {
        self.queues.values().map(|q| q.len()).sum()
    }

    /// Clears every queue, keeping allocations for the next tick.
    pub fn clear_all(&mut self) {
        for queue in self.queues.values_mut() {
            queue.clear_queue();
        }
    }
}

//=========================================================================
// Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Clone)]
    struct LineShown(String);

    #[derive(Debug, PartialEq, Clone)]
    struct Unlocked(Vec<String>);

    #[test]
    fn new_outbox_is_empty() {
        let outbox = Outbox::new();
        assert_eq!(outbox.count::<LineShown>(), 0);
        assert_eq!(outbox.pending(), 0);
    }

    #[test]
    fn publish_keeps_order_per_type() {
        let mut outbox = Outbox::new();
        outbox.publish(LineShown("one".into()));
        outbox.publish(Unlocked(vec!["weaving".into()]));
        outbox.publish(LineShown("two".into()));

        assert_eq!(
            outbox.read::<LineShown>(),
            &[LineShown("one".into()), LineShown("two".into())]
        );
        assert_eq!(outbox.count::<Unlocked>(), 1);
        assert_eq!(outbox.pending(), 3);
    }

    #[test]
    fn drain_empties_only_that_type() {
        let mut outbox = Outbox::new();
        outbox.publish(LineShown("one".into()));
        outbox.publish(Unlocked(vec![]));

        let lines = outbox.drain::<LineShown>();
        assert_eq!(lines.len(), 1);
        assert_eq!(outbox.count::<LineShown>(), 0);
        assert_eq!(outbox.count::<Unlocked>(), 1);
    }

    #[test]
    fn clear_all_resets_every_queue() {
        let mut outbox = Outbox::new();
        outbox.publish(LineShown("one".into()));
        outbox.publish(Unlocked(vec![]));

        outbox.clear_all();
        assert_eq!(outbox.pending(), 0);

        outbox.publish(LineShown("again".into()));
        assert_eq!(outbox.count::<LineShown>(), 1);
    }
}
