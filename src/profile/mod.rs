//! Learned button profiles.
//!
//! A profile is the product of calibration: for each of the twelve logical
//! gamepad buttons, one bit-level decode rule learned by diffing reports
//! against an idle baseline. Profiles are immutable once built and round-trip
//! through `profiles.json` (see [`store`]).

pub mod keymap;
pub mod store;

pub use keymap::{KeyMap, KeySym, SpecialKey};
pub use store::{ProfileError, ProfileStore};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The fixed set of logical buttons a profile covers.
///
/// The discriminant doubles as the index into the fixed-size arrays used for
/// per-button state, and the serde rename matches the persisted button name
/// exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Button {
    #[serde(rename = "up")]
    Up,
    #[serde(rename = "down")]
    Down,
    #[serde(rename = "left")]
    Left,
    #[serde(rename = "right")]
    Right,
    A,
    B,
    X,
    Y,
    L,
    R,
    #[serde(rename = "select")]
    Select,
    #[serde(rename = "start")]
    Start,
}

/// Number of logical buttons.
pub const BUTTON_COUNT: usize = 12;

impl Button {
    /// All buttons, in calibration prompt order.
    pub const ALL: [Button; BUTTON_COUNT] = [
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
        Button::A,
        Button::B,
        Button::X,
        Button::Y,
        Button::L,
        Button::R,
        Button::Select,
        Button::Start,
    ];

    /// Stable array index for this button.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Persisted/display name.
    pub fn name(self) -> &'static str {
        match self {
            Button::Up => "up",
            Button::Down => "down",
            Button::Left => "left",
            Button::Right => "right",
            Button::A => "A",
            Button::B => "B",
            Button::X => "X",
            Button::Y => "Y",
            Button::L => "L",
            Button::R => "R",
            Button::Select => "select",
            Button::Start => "start",
        }
    }
}

impl std::fmt::Display for Button {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One learned decode rule: which report byte to look at, what it reads when
/// the button is idle, and which bits flip on a press.
///
/// The decode predicate is `((report[index] ^ idle_value) & mask) == mask`.
/// `mask` is the XOR of the pressed byte against the idle byte at the moment
/// calibration first saw them differ, and is never zero in a valid profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonMapping {
    pub index: usize,
    pub idle_value: u8,
    pub mask: u8,
}

impl ButtonMapping {
    /// Apply the decode predicate to a full-length report byte.
    #[inline]
    pub fn is_pressed(&self, byte: u8) -> bool {
        ((byte ^ self.idle_value) & self.mask) == self.mask
    }
}

/// Immutable per-device mapping from every [`Button`] to its decode rule.
///
/// Serialized as a name-keyed map (the on-disk form the original profiles
/// file uses); deserialization re-validates that every button is present and
/// every mask is non-zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<Button, ButtonMapping>")]
#[serde(into = "BTreeMap<Button, ButtonMapping>")]
pub struct Profile {
    mappings: [ButtonMapping; BUTTON_COUNT],
}

impl Profile {
    #[inline]
    pub fn mapping(&self, button: Button) -> &ButtonMapping {
        &self.mappings[button.index()]
    }

    /// Largest report byte index any mapping references.
    pub fn max_index(&self) -> usize {
        self.mappings.iter().map(|m| m.index).max().unwrap_or(0)
    }
}

impl TryFrom<BTreeMap<Button, ButtonMapping>> for Profile {
    type Error = String;

    fn try_from(map: BTreeMap<Button, ButtonMapping>) -> Result<Self, Self::Error> {
        let mut builder = ProfileBuilder::new();
        for (button, mapping) in map {
            if mapping.mask == 0 {
                return Err(format!("button '{}' has a zero mask", button));
            }
            builder.insert(button, mapping);
        }
        builder
            .finish()
            .ok_or_else(|| "profile does not cover every button".to_string())
    }
}

impl From<Profile> for BTreeMap<Button, ButtonMapping> {
    fn from(profile: Profile) -> Self {
        Button::ALL
            .iter()
            .map(|&b| (b, *profile.mapping(b)))
            .collect()
    }
}

/// Accumulates mappings during calibration; yields a [`Profile`] only once
/// every button has one.
#[derive(Debug, Default)]
pub struct ProfileBuilder {
    slots: [Option<ButtonMapping>; BUTTON_COUNT],
}

impl ProfileBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, button: Button, mapping: ButtonMapping) {
        self.slots[button.index()] = Some(mapping);
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub fn finish(self) -> Option<Profile> {
        let mut mappings = [ButtonMapping {
            index: 0,
            idle_value: 0,
            mask: 0,
        }; BUTTON_COUNT];
        for (slot, out) in self.slots.iter().zip(mappings.iter_mut()) {
            *out = (*slot)?;
        }
        Some(Profile { mappings })
    }
}
