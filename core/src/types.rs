//! Shared primitive types used across the entire simulation.
//!
//! RULE: stocks and resource flows are [`Quantity`] (unbounded).
//! Ticks and construct counts are plain bounded integers.
//! Never convert a Quantity into a bounded integer inside the engine.

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, AddAssign, Mul};

/// A simulation tick. All production and consumption math is tick-relative.
pub type Tick = u64;

/// A wall-clock sample in milliseconds, as delivered by the outside frame loop.
pub type TimeStamp = f64;

/// Construct counts (total, working, launched satellites, miners at work).
pub type Count = u64;

// ── Processor identity ─────────────────────────────────────────

/// Stable processor identifier of the form `"{tag}-{instance}"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessorId(String);

impl ProcessorId {
    pub fn new(tag: impl fmt::Display, instance: u32) -> Self {
        Self(format!("{tag}-{instance}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProcessorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProcessorId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ProcessorId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// ── Game vocabulary ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resource {
    Electricity,
    Ore,
    Metal,
    #[serde(rename = "satellite")]
    PackagedSatellite,
}

impl Resource {
    pub const ALL: [Resource; 4] = [
        Resource::Electricity,
        Resource::Ore,
        Resource::Metal,
        Resource::PackagedSatellite,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Resource::Electricity       => "electricity",
            Resource::Ore               => "ore",
            Resource::Metal             => "metal",
            Resource::PackagedSatellite => "satellite",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// A buildable unit type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Construct {
    Collector,
    Miner,
    Refiner,
    Factory,
    Launcher,
}

impl Construct {
    pub const ALL: [Construct; 5] = [
        Construct::Collector,
        Construct::Miner,
        Construct::Refiner,
        Construct::Factory,
        Construct::Launcher,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Construct::Collector => "collector",
            Construct::Miner     => "miner",
            Construct::Refiner   => "refiner",
            Construct::Factory   => "factory",
            Construct::Launcher  => "launcher",
        }
    }
}

impl fmt::Display for Construct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

// ── Quantity ───────────────────────────────────────────────────

/// An amount of a resource: electricity, ore, metal, packaged satellites,
/// stellar flux or planetary mass.
///
/// Late-game totals grow multiplicatively across many ticks, so the value is
/// an arbitrary-precision unsigned integer. It serializes as a decimal string
/// so that save files stay exact in any JSON reader.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity(BigUint);

impl Quantity {
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// `self - rhs`, or `None` when that would go negative.
    pub fn checked_sub(&self, rhs: &Quantity) -> Option<Quantity> {
        if self.0 >= rhs.0 {
            Some(Quantity(&self.0 - &rhs.0))
        } else {
            None
        }
    }

    /// `self - rhs`, clamped at zero.
    pub fn saturating_sub(&self, rhs: &Quantity) -> Quantity {
        self.checked_sub(rhs).unwrap_or_default()
    }

    /// Lossy view for display and ratios only.
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(f64::INFINITY)
    }

    /// `10^exponent * mantissa`, used for astronomical constants.
    pub fn scientific(mantissa: u64, exponent: u32) -> Self {
        Self(BigUint::from(mantissa) * BigUint::from(10u32).pow(exponent))
    }
}

impl From<u64> for Quantity {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Quantity {
    type Err = num_bigint::ParseBigIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<BigUint>().map(Quantity)
    }
}

impl Add for Quantity {
    type Output = Quantity;
    fn add(self, rhs: Quantity) -> Quantity {
        Quantity(self.0 + rhs.0)
    }
}

impl<'a> Add<&'a Quantity> for &'a Quantity {
    type Output = Quantity;
    fn add(self, rhs: &'a Quantity) -> Quantity {
        Quantity(&self.0 + &rhs.0)
    }
}

impl AddAssign<&Quantity> for Quantity {
    fn add_assign(&mut self, rhs: &Quantity) {
        self.0 += &rhs.0;
    }
}

impl AddAssign for Quantity {
    fn add_assign(&mut self, rhs: Quantity) {
        self.0 += rhs.0;
    }
}

impl Mul<Count> for &Quantity {
    type Output = Quantity;
    fn mul(self, rhs: Count) -> Quantity {
        Quantity(&self.0 * BigUint::from(rhs))
    }
}

impl Mul<&Quantity> for &Quantity {
    type Output = Quantity;
    fn mul(self, rhs: &Quantity) -> Quantity {
        Quantity(&self.0 * &rhs.0)
    }
}

impl std::iter::Sum for Quantity {
    fn sum<I: Iterator<Item = Quantity>>(iter: I) -> Self {
        iter.fold(Quantity::zero(), |acc, q| acc + q)
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_str_radix(10))
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct QuantityVisitor;

        impl de::Visitor<'_> for QuantityVisitor {
            type Value = Quantity;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer or a decimal string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Quantity, E> {
                Ok(Quantity::from(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Quantity, E> {
                u64::try_from(v)
                    .map(Quantity::from)
                    .map_err(|_| E::custom(format!("negative quantity {v}")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Quantity, E> {
                v.parse::<Quantity>()
                    .map_err(|e| E::custom(format!("invalid quantity {v:?}: {e}")))
            }
        }

        deserializer.deserialize_any(QuantityVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_serializes_as_decimal_string() {
        let q = Quantity::scientific(3301, 20);
        let json = serde_json::to_string(&q).unwrap();
        assert_eq!(json, "\"330100000000000000000000\"");
        let back: Quantity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, q);
    }

    #[test]
    fn quantity_accepts_plain_numbers() {
        let q: Quantity = serde_json::from_str("484").unwrap();
        assert_eq!(q, Quantity::from(484));
        assert!(serde_json::from_str::<Quantity>("-1").is_err());
    }

    #[test]
    fn checked_sub_never_goes_negative() {
        let a = Quantity::from(3);
        let b = Quantity::from(5);
        assert_eq!(a.checked_sub(&b), None);
        assert_eq!(b.checked_sub(&a), Some(Quantity::from(2)));
        assert_eq!(a.saturating_sub(&b), Quantity::zero());
    }

    #[test]
    fn processor_id_format() {
        assert_eq!(ProcessorId::new("power-grid", 0).as_str(), "power-grid-0");
    }
}
