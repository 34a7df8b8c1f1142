use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Relay state of every room the server knows about, keyed by room id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rooms(BTreeMap<String, bool>);

impl Rooms {
    pub fn get(&self, id: &str) -> Option<bool> {
        self.0.get(id).copied()
    }

    /// Unknown rooms are reported as off.
    pub fn is_on(&self, id: &str) -> bool {
        self.get(id).unwrap_or(false)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    /// Sets a known room. Returns false, leaving the rooms untouched, for unknown ids.
    pub fn set(&mut self, id: &str, on: bool) -> bool {
        match self.0.get_mut(id) {
            Some(state) => {
                *state = on;
                true
            }
            None => false,
        }
    }

    /// Enables `id` and disables every other room.
    pub fn set_active_only(&mut self, id: &str) -> bool {
        if !self.contains(id) {
            return false;
        }
        for (room, state) in self.0.iter_mut() {
            *state = room == id;
        }
        true
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(id, on)| (id.as_str(), *on))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, bool)> for Rooms {
    fn from_iter<T: IntoIterator<Item = (S, bool)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(id, on)| (id.into(), on)).collect())
    }
}
