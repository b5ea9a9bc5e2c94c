//! The boundary between scripts and the game world.
//!
//! Built-ins such as `$MOVE()` and `$OUTPUT()` act on the world only through
//! [`World`]. The engine that owns rooms and items implements it; scripts never
//! see anything else.

use std::collections::{HashMap, HashSet};

use log::debug;

/// World operations reachable from `TunaScript`.
///
/// Labels arrive upper-cased. Each method reports success as a boolean, which
/// becomes the value of the built-in call.
pub trait World {
    /// Whether the player is carrying the item with this label.
    fn in_inventory(&self, label: &str) -> bool;

    /// Move the labelled item or NPC to `dest`.
    fn move_to(&mut self, label: &str, dest: &str) -> bool;

    /// Show text to the player.
    fn output(&mut self, text: &str) -> bool;
}

/// A world held entirely in memory.
///
/// Carried items live in `inventory`; everything else that has been moved
/// lives in `locations`. Output is appended to `output` in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryWorld {
    pub inventory: HashSet<String>,
    pub locations: HashMap<String, String>,
    pub output: Vec<String>,
}

impl MemoryWorld {
    /// Destination label meaning "carried by the player".
    pub const INVENTORY: &'static str = "@INVEN";

    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the given items already carried.
    pub fn with_inventory<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        MemoryWorld {
            inventory: items.into_iter().map(|s| s.as_ref().to_uppercase()).collect(),
            ..Self::default()
        }
    }

    /// Where a moved item was last put, if anywhere.
    pub fn location_of(&self, label: &str) -> Option<&str> {
        let label = label.to_uppercase();
        if self.inventory.contains(&label) {
            return Some(Self::INVENTORY);
        }
        self.locations.get(&label).map(String::as_str)
    }

    /// Drain and return everything output so far.
    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }
}

impl World for MemoryWorld {
    fn in_inventory(&self, label: &str) -> bool {
        self.inventory.contains(label)
    }

    fn move_to(&mut self, label: &str, dest: &str) -> bool {
        debug!("moving {label} to {dest}");
        if dest == Self::INVENTORY {
            self.locations.remove(label);
            self.inventory.insert(label.to_string());
        } else {
            self.inventory.remove(label);
            self.locations.insert(label.to_string(), dest.to_string());
        }
        true
    }

    fn output(&mut self, text: &str) -> bool {
        self.output.push(text.to_string());
        true
    }
}
