//! Static button-to-key tables.
//!
//! Key maps are configuration, not calibration output: each player slot has a
//! fixed table chosen so the two players' key sets never overlap, and a
//! button missing from the table is decoded but emits nothing.

use super::{Button, BUTTON_COUNT};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Named non-printable keys the sink understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialKey {
    Enter,
    Space,
    Up,
    Down,
    Left,
    Right,
}

impl SpecialKey {
    pub fn name(self) -> &'static str {
        match self {
            SpecialKey::Enter => "enter",
            SpecialKey::Space => "space",
            SpecialKey::Up => "up",
            SpecialKey::Down => "down",
            SpecialKey::Left => "left",
            SpecialKey::Right => "right",
        }
    }
}

/// A host key symbol: either a printable character or a named special key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySym {
    Character(char),
    Special(SpecialKey),
}

impl fmt::Display for KeySym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySym::Character(c) => write!(f, "{}", c),
            KeySym::Special(s) => f.write_str(s.name()),
        }
    }
}

impl FromStr for KeySym {
    type Err = String;

    /// Parses the config form: a single printable character, or one of the
    /// special key names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enter" => return Ok(KeySym::Special(SpecialKey::Enter)),
            "space" => return Ok(KeySym::Special(SpecialKey::Space)),
            "up" => return Ok(KeySym::Special(SpecialKey::Up)),
            "down" => return Ok(KeySym::Special(SpecialKey::Down)),
            "left" => return Ok(KeySym::Special(SpecialKey::Left)),
            "right" => return Ok(KeySym::Special(SpecialKey::Right)),
            _ => {}
        }
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if !c.is_whitespace() => Ok(KeySym::Character(c)),
            _ => Err(format!("'{}' is not a key symbol", s)),
        }
    }
}

impl Serialize for KeySym {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for KeySym {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// Per-slot table from [`Button`] to the key it emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMap {
    keys: [Option<KeySym>; BUTTON_COUNT],
}

impl KeyMap {
    /// An empty map; every button is silently ignored.
    pub fn empty() -> Self {
        Self {
            keys: [None; BUTTON_COUNT],
        }
    }

    /// The built-in table for a player slot. Slot 0 gets the arrow cluster,
    /// slot 1 gets WASD; the two sets are disjoint so simultaneous two-player
    /// input never collides on a key.
    pub fn for_slot(slot: usize) -> Self {
        use SpecialKey::*;
        let mut map = Self::empty();
        match slot {
            0 => {
                map.set(Button::Up, KeySym::Special(Up));
                map.set(Button::Down, KeySym::Special(Down));
                map.set(Button::Left, KeySym::Special(Left));
                map.set(Button::Right, KeySym::Special(Right));
                map.set(Button::A, KeySym::Character('v'));
                map.set(Button::B, KeySym::Character('c'));
                map.set(Button::X, KeySym::Character('f'));
                map.set(Button::Y, KeySym::Character('x'));
                map.set(Button::L, KeySym::Character('1'));
                map.set(Button::R, KeySym::Character('2'));
                map.set(Button::Start, KeySym::Character('3'));
                map.set(Button::Select, KeySym::Character('4'));
            }
            _ => {
                map.set(Button::Up, KeySym::Character('w'));
                map.set(Button::Down, KeySym::Character('s'));
                map.set(Button::Left, KeySym::Character('a'));
                map.set(Button::Right, KeySym::Character('d'));
                map.set(Button::A, KeySym::Character('l'));
                map.set(Button::B, KeySym::Character('k'));
                map.set(Button::X, KeySym::Character('i'));
                map.set(Button::Y, KeySym::Character('j'));
                map.set(Button::L, KeySym::Character('q'));
                map.set(Button::R, KeySym::Character('e'));
                map.set(Button::Start, KeySym::Special(Enter));
                map.set(Button::Select, KeySym::Special(Space));
            }
        }
        map
    }

    pub fn set(&mut self, button: Button, key: KeySym) {
        self.keys[button.index()] = Some(key);
    }

    #[inline]
    pub fn key(&self, button: Button) -> Option<KeySym> {
        self.keys[button.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_tables_are_disjoint() {
        let p0 = KeyMap::for_slot(0);
        let p1 = KeyMap::for_slot(1);
        for &a in Button::ALL.iter() {
            for &b in Button::ALL.iter() {
                let (Some(k0), Some(k1)) = (p0.key(a), p1.key(b)) else {
                    continue;
                };
                assert_ne!(k0, k1, "{} and {} share {}", a, b, k0);
            }
        }
    }

    #[test]
    fn keysym_parses_both_forms() {
        assert_eq!("v".parse::<KeySym>().unwrap(), KeySym::Character('v'));
        assert_eq!(
            "enter".parse::<KeySym>().unwrap(),
            KeySym::Special(SpecialKey::Enter)
        );
        assert!("".parse::<KeySym>().is_err());
        assert!("not-a-key".parse::<KeySym>().is_err());
    }

    #[test]
    fn keysym_round_trips_through_serde() {
        for sym in [
            KeySym::Character('q'),
            KeySym::Special(SpecialKey::Space),
            KeySym::Special(SpecialKey::Left),
        ] {
            let json = serde_json::to_string(&sym).unwrap();
            let back: KeySym = serde_json::from_str(&json).unwrap();
            assert_eq!(back, sym);
        }
    }

    #[test]
    fn unmapped_button_yields_none() {
        let map = KeyMap::empty();
        assert_eq!(map.key(Button::A), None);
    }
}
