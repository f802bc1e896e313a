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

//! Keyboard and mouse input delivered to explicit subscribers.
//!
//! The window layer publishes [`InputEvent`]s through a sender obtained from
//! [`InputEvents::sender`]. Whoever owns the [`InputEvents`] calls
//! [`InputEvents::pump`] once per frame, which hands every queued event to the
//! subscribers in subscription order.

use crate::event::EventBus;
use serde::{Deserialize, Serialize};

/// A key, identified by the character it produces or its role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// A printable key, as its upper-case character.
    Char(char),
    /// Escape.
    Escape,
    /// Enter / Return.
    Enter,
    /// Space bar.
    Space,
    /// Any other key, by virtual key code.
    Other(u32),
}

/// Whether a key or button went down or up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyAction {
    /// Released.
    Up,
    /// Pressed.
    Down,
}

/// A key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyEvent {
    /// The key.
    pub key: Key,
    /// What happened to it.
    pub action: KeyAction,
}

/// A mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    /// Left button.
    Left,
    /// Right button.
    Right,
    /// Middle button.
    Middle,
}

/// An input event published by the window layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// A key went down or up.
    Key(KeyEvent),
    /// A mouse button went down or up.
    MouseButton {
        /// The button.
        button: MouseButton,
        /// What happened to it.
        action: KeyAction,
    },
    /// The cursor moved, in client-area pixels.
    MouseMoved {
        /// Horizontal position.
        x: f32,
        /// Vertical position.
        y: f32,
    },
}

/// Identifies a subscription so it can be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&InputEvent) + Send>;

/// The input event queue and the list of its subscribers.
pub struct InputEvents {
    bus: EventBus<InputEvent>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_id: u64,
}

impl InputEvents {
    /// An empty queue with no subscriber.
    pub fn new() -> Self {
        Self {
            bus: EventBus::new(),
            subscribers: Vec::new(),
            next_id: 0,
        }
    }

    /// A sender for the window layer.
    pub fn sender(&self) -> flume::Sender<InputEvent> {
        self.bus.sender()
    }

    /// Queues an event from the owning thread.
    pub fn publish(&self, event: InputEvent) {
        self.bus.publish(event);
    }

    /// Registers `callback` for every event delivered from now on.
    pub fn subscribe(&mut self, callback: impl FnMut(&InputEvent) + Send + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Registers `callback` for key events only.
    pub fn subscribe_keys(
        &mut self,
        mut callback: impl FnMut(&KeyEvent) + Send + 'static,
    ) -> SubscriptionId {
        self.subscribe(move |event| {
            if let InputEvent::Key(key) = event {
                callback(key);
            }
        })
    }

    /// Removes a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Delivers every queued event to every subscriber and returns how many
    /// events were delivered.
    pub fn pump(&mut self) -> usize {
        let mut delivered = 0;
        for event in self.bus.drain() {
            for (_, subscriber) in self.subscribers.iter_mut() {
                subscriber(&event);
            }
            delivered += 1;
        }
        if delivered > 0 {
            log::trace!("Delivered {delivered} input events.");
        }
        delivered
    }
}

impl Default for InputEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InputEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputEvents")
            .field("subscribers", &self.subscribers.len())
            .field("queued", &self.bus.receiver().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn key(c: char, action: KeyAction) -> InputEvent {
        InputEvent::Key(KeyEvent {
            key: Key::Char(c),
            action,
        })
    }

    #[test]
    fn pump_delivers_to_subscribers_in_order() {
        let mut input = InputEvents::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let first = seen.clone();
        let second = seen.clone();
        input.subscribe(move |_| first.lock().unwrap().push(1));
        input.subscribe(move |_| second.lock().unwrap().push(2));

        input.publish(key('W', KeyAction::Down));
        assert_eq!(input.pump(), 1);

        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn unsubscribed_callback_is_not_called() {
        let mut input = InputEvents::new();
        let count = Arc::new(Mutex::new(0));
        let counter = count.clone();
        let id = input.subscribe(move |_| *counter.lock().unwrap() += 1);

        assert!(input.unsubscribe(id));
        assert!(!input.unsubscribe(id));
        input.publish(key('A', KeyAction::Up));
        input.pump();

        assert_eq!(*count.lock().unwrap(), 0);
        assert_eq!(input.subscriber_count(), 0);
    }

    #[test]
    fn key_subscribers_skip_mouse_events() {
        let mut input = InputEvents::new();
        let keys = Arc::new(Mutex::new(Vec::new()));
        let sink = keys.clone();
        input.subscribe_keys(move |event| sink.lock().unwrap().push(*event));

        let sender = input.sender();
        sender
            .send(InputEvent::MouseMoved { x: 1.0, y: 2.0 })
            .unwrap();
        sender.send(key('W', KeyAction::Up)).unwrap();
        assert_eq!(input.pump(), 2);

        assert_eq!(
            *keys.lock().unwrap(),
            vec![KeyEvent {
                key: Key::Char('W'),
                action: KeyAction::Up
            }]
        );
    }
}
