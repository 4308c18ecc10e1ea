//! Routing profile and avoid options shared by every routing-related crate.

use std::fmt;

use crate::{NavError, NavResult};

// ── RoutingProfile ────────────────────────────────────────────────────────────

/// The directions-provider profile used to compute a route.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum RoutingProfile {
    #[default]
    Driving,
    /// Driving with live-traffic weighting.
    DrivingTraffic,
    Cycling,
    Walking,
}

impl RoutingProfile {
    /// Provider identifier, used verbatim in request URLs.
    pub fn as_str(self) -> &'static str {
        match self {
            RoutingProfile::Driving        => "driving",
            RoutingProfile::DrivingTraffic => "driving-traffic",
            RoutingProfile::Cycling        => "cycling",
            RoutingProfile::Walking        => "walking",
        }
    }

    /// `true` for motorised profiles, the only ones where fuel use applies.
    #[inline]
    pub fn burns_fuel(self) -> bool {
        matches!(self, RoutingProfile::Driving | RoutingProfile::DrivingTraffic)
    }
}

impl fmt::Display for RoutingProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RoutingProfile {
    type Err = NavError;

    fn from_str(s: &str) -> NavResult<Self> {
        match s {
            "driving"         => Ok(RoutingProfile::Driving),
            "driving-traffic" => Ok(RoutingProfile::DrivingTraffic),
            "cycling"         => Ok(RoutingProfile::Cycling),
            "walking"         => Ok(RoutingProfile::Walking),
            other => Err(NavError::Parse(format!("unknown routing profile `{other}`"))),
        }
    }
}

// ── AvoidSet ──────────────────────────────────────────────────────────────────

/// One road class the traveler asked to avoid.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Avoid {
    Toll,
    Ferry,
    Unpaved,
}

impl Avoid {
    pub const ALL: [Avoid; 3] = [Avoid::Toll, Avoid::Ferry, Avoid::Unpaved];

    pub fn as_str(self) -> &'static str {
        match self {
            Avoid::Toll    => "toll",
            Avoid::Ferry   => "ferry",
            Avoid::Unpaved => "unpaved",
        }
    }

    #[inline]
    fn bit(self) -> u8 {
        match self {
            Avoid::Toll    => 0b001,
            Avoid::Ferry   => 0b010,
            Avoid::Unpaved => 0b100,
        }
    }
}

/// A set of [`Avoid`] options, stored as a 3-bit mask.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AvoidSet(u8);

impl AvoidSet {
    pub const EMPTY: AvoidSet = AvoidSet(0);

    pub fn new() -> Self {
        Self::EMPTY
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, avoid: Avoid) -> Self {
        self.insert(avoid);
        self
    }

    pub fn insert(&mut self, avoid: Avoid) {
        self.0 |= avoid.bit();
    }

    pub fn remove(&mut self, avoid: Avoid) {
        self.0 &= !avoid.bit();
    }

    /// Flip one option, as a settings toggle does.
    pub fn toggle(&mut self, avoid: Avoid) {
        self.0 ^= avoid.bit();
    }

    #[inline]
    pub fn contains(self, avoid: Avoid) -> bool {
        self.0 & avoid.bit() != 0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Avoid> {
        Avoid::ALL.into_iter().filter(move |a| self.contains(*a))
    }
}

impl fmt::Display for AvoidSet {
    /// Comma-separated list in the provider's `exclude=` syntax.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for a in self.iter() {
            if !first {
                f.write_str(",")?;
            }
            f.write_str(a.as_str())?;
            first = false;
        }
        Ok(())
    }
}
