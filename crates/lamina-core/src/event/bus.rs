// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

/// A thread-safe, unbounded event channel.
///
/// Producers, typically a window thread, publish through cloned senders; the
/// owner of the bus drains the receiver on its own thread.
#[derive(Debug)]
pub struct EventBus<T: Send + 'static> {
    sender: flume::Sender<T>,
    receiver: flume::Receiver<T>,
}

impl<T: Send + 'static> EventBus<T> {
    /// Creates a bus with an unbounded channel.
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        log::debug!("EventBus<{}> initialized.", std::any::type_name::<T>());
        Self { sender, receiver }
    }

    /// Sends an event, logging an error if the receiving side is gone.
    pub fn publish(&self, event: T) {
        if let Err(e) = self.sender.send(event) {
            log::error!("Failed to send event: {e}. Receiver likely disconnected.");
        }
    }

    /// A new sender for another producer.
    pub fn sender(&self) -> flume::Sender<T> {
        self.sender.clone()
    }

    /// The receiving end, for the owner of the bus.
    pub fn receiver(&self) -> &flume::Receiver<T> {
        &self.receiver
    }

    /// Takes every event queued so far without blocking.
    pub fn drain(&self) -> flume::TryIter<'_, T> {
        self.receiver.try_iter()
    }
}

impl<T: Send + 'static> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[derive(Debug, Clone, PartialEq)]
    enum Probe {
        Resized(u32, u32),
        Closed,
    }

    #[test]
    fn drain_returns_events_in_order() {
        let bus = EventBus::new();
        bus.publish(Probe::Resized(800, 600));
        bus.publish(Probe::Closed);

        let events: Vec<_> = bus.drain().collect();

        assert_eq!(events, vec![Probe::Resized(800, 600), Probe::Closed]);
        assert!(bus.receiver().is_empty());
    }

    #[test]
    fn drain_on_empty_bus_yields_nothing() {
        let bus = EventBus::<Probe>::new();
        assert_eq!(bus.drain().count(), 0);
    }

    #[test]
    fn events_cross_threads() {
        let bus = EventBus::new();
        let sender = bus.sender();

        let handle = thread::spawn(move || {
            for i in 0..4 {
                sender.send(Probe::Resized(i, i)).expect("receiver is alive");
            }
        });
        handle.join().expect("producer thread panicked");

        assert_eq!(bus.drain().count(), 4);
    }
}
