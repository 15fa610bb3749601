//! Source-positioned boolean pragmas.
//!
//! A pragma setting applies from its location onward, so the value at any
//! point in a file is the most recent setting at or before that point. The
//! store keeps every setting so the question can be asked after the fact,
//! for any node, in any order.

use std::collections::BTreeMap;

use crate::span::SourceLocation;

/// A known pragma flag and its value before any setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PragmaFlag {
    pub name: &'static str,
    pub default_value: bool,
}

pub const TOP_LEVEL_EVALUATION: PragmaFlag = PragmaFlag {
    name: "top-level evaluation",
    default_value: false,
};

pub const MUTABLE_GLOBAL_VARIABLES: PragmaFlag = PragmaFlag {
    name: "mutable global variables",
    default_value: false,
};

pub const FLAGS: [PragmaFlag; 2] = [TOP_LEVEL_EVALUATION, MUTABLE_GLOBAL_VARIABLES];

fn lookup_flag(name: &str) -> Option<PragmaFlag> {
    FLAGS.into_iter().find(|flag| flag.name == name)
}

/// All pragma settings seen in a compilation unit.
#[derive(Debug, Default)]
pub struct PragmaStore {
    settings: BTreeMap<&'static str, BTreeMap<SourceLocation, bool>>,
}

impl PragmaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `name = value` at `location`.
    ///
    /// Returns `false` (and logs) if `name` is not a known pragma.
    pub fn set_flag(&mut self, name: &str, value: bool, location: SourceLocation) -> bool {
        let Some(flag) = lookup_flag(name) else {
            log::error!("{location}: tried to set unknown pragma `{name}`");
            return false;
        };

        self.settings
            .entry(flag.name)
            .or_default()
            .insert(location, value);
        log::debug!(
            "{location}: pragma {} `{}`",
            if value { "enable" } else { "disable" },
            flag.name
        );
        true
    }

    /// Value of `name` in effect at `location`, or `None` for an unknown flag.
    pub fn check_flag(&self, name: &str, location: SourceLocation) -> Option<bool> {
        let flag = lookup_flag(name)?;
        let value = self
            .settings
            .get(flag.name)
            .and_then(|settings| settings.range(..=location).next_back())
            .map(|(_, &value)| value)
            .unwrap_or(flag.default_value);
        Some(value)
    }

    /// Number of explicit settings recorded.
    pub fn len(&self) -> usize {
        self.settings.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
