//! ISMN quality flag alphabet and per-record flag sets
//!
//! The alphabet is closed: three plausibility codes (C01..C03), ten
//! dubious-observation codes (D01..D10) and the good marker (G). Each code
//! also has a stable numeric form 1..=14 used by consumers that store flags
//! as integers.

use serde::de::{SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Quality flag codes applied to individual observations.
///
/// Discriminants are the numeric alphabet (C01 = 1 .. G = 14, D08 = 11).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Flag {
    /// Observation below the plausible geophysical range
    C01 = 1,
    /// Observation above the plausible geophysical range
    C02 = 2,
    /// Soil moisture above the station saturation point
    C03 = 3,
    /// Negative in-situ soil temperature (frozen ground)
    D01 = 4,
    /// Negative in-situ air temperature
    D02 = 5,
    /// Negative GLDAS soil temperature
    D03 = 6,
    /// Soil moisture rise without in-situ precipitation
    D04 = 7,
    /// Soil moisture rise without GLDAS precipitation
    D05 = 8,
    /// Spike
    D06 = 9,
    /// Negative break (drop)
    D07 = 10,
    /// Positive break (jump)
    D08 = 11,
    /// Constant low values following a negative break
    D09 = 12,
    /// Saturated plateau
    D10 = 13,
    /// Good
    G = 14,
}

impl Flag {
    /// All codes in canonical order.
    pub const ALL: [Flag; 14] = [
        Flag::C01,
        Flag::C02,
        Flag::C03,
        Flag::D01,
        Flag::D02,
        Flag::D03,
        Flag::D04,
        Flag::D05,
        Flag::D06,
        Flag::D07,
        Flag::D08,
        Flag::D09,
        Flag::D10,
        Flag::G,
    ];

    /// Numeric code (1..=14, with D08 = 11).
    pub const fn number(self) -> u8 {
        self as u8
    }

    /// Alphabetic code ("C01".."G").
    pub const fn id(self) -> &'static str {
        match self {
            Flag::C01 => "C01",
            Flag::C02 => "C02",
            Flag::C03 => "C03",
            Flag::D01 => "D01",
            Flag::D02 => "D02",
            Flag::D03 => "D03",
            Flag::D04 => "D04",
            Flag::D05 => "D05",
            Flag::D06 => "D06",
            Flag::D07 => "D07",
            Flag::D08 => "D08",
            Flag::D09 => "D09",
            Flag::D10 => "D10",
            Flag::G => "G",
        }
    }

    /// Short human-readable description, for reporting tables.
    pub const fn description(self) -> &'static str {
        match self {
            Flag::C01 => "soil moisture below plausible range",
            Flag::C02 => "soil moisture above plausible range",
            Flag::C03 => "soil moisture above saturation point",
            Flag::D01 => "negative soil temperature (in situ)",
            Flag::D02 => "negative air temperature (in situ)",
            Flag::D03 => "negative soil temperature (GLDAS)",
            Flag::D04 => "rise in soil moisture without precipitation (in situ)",
            Flag::D05 => "rise in soil moisture without precipitation (GLDAS)",
            Flag::D06 => "spike",
            Flag::D07 => "negative break (drop)",
            Flag::D08 => "positive break (jump)",
            Flag::D09 => "constant low values following a negative break",
            Flag::D10 => "saturated plateau",
            Flag::G => "good",
        }
    }

    /// Parse a numeric code back into a flag.
    pub const fn from_number(number: u8) -> Option<Flag> {
        match number {
            1 => Some(Flag::C01),
            2 => Some(Flag::C02),
            3 => Some(Flag::C03),
            4 => Some(Flag::D01),
            5 => Some(Flag::D02),
            6 => Some(Flag::D03),
            7 => Some(Flag::D04),
            8 => Some(Flag::D05),
            9 => Some(Flag::D06),
            10 => Some(Flag::D07),
            11 => Some(Flag::D08),
            12 => Some(Flag::D09),
            13 => Some(Flag::D10),
            14 => Some(Flag::G),
            _ => None,
        }
    }
}

impl std::fmt::Display for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Set of quality flags on a single observation.
///
/// Backed by a `u16` bitset over the closed 14-code alphabet: O(1)
/// membership and union, `Copy`, and empty by default. The engine only ever
/// adds codes; nothing removes them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlagSet(u16);

impl FlagSet {
    pub const EMPTY: FlagSet = FlagSet(0);

    const fn bit(flag: Flag) -> u16 {
        1 << (flag.number() - 1)
    }

    /// Add a code to the set. Idempotent.
    pub fn insert(&mut self, flag: Flag) {
        self.0 |= Self::bit(flag);
    }

    pub const fn contains(self, flag: Flag) -> bool {
        self.0 & Self::bit(flag) != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Codes present in the set, in canonical order.
    pub fn iter(self) -> impl Iterator<Item = Flag> {
        Flag::ALL.into_iter().filter(move |f| self.contains(*f))
    }

    /// Rendered codes: alphabetic ("C01") or numeric ("1") alphabet.
    pub fn codes(self, numeric: bool) -> Vec<String> {
        self.iter()
            .map(|f| {
                if numeric {
                    f.number().to_string()
                } else {
                    f.id().to_string()
                }
            })
            .collect()
    }
}

impl FromIterator<Flag> for FlagSet {
    fn from_iter<I: IntoIterator<Item = Flag>>(iter: I) -> Self {
        let mut set = FlagSet::EMPTY;
        for flag in iter {
            set.insert(flag);
        }
        set
    }
}

impl std::fmt::Display for FlagSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, flag) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{flag}")?;
        }
        write!(f, "}}")
    }
}

// Serialized form is the list of alphabetic codes, matching the JSON view of
// a flagged record.
impl Serialize for FlagSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for flag in self.iter() {
            seq.serialize_element(flag.id())?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for FlagSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FlagSetVisitor;

        impl<'de> Visitor<'de> for FlagSetVisitor {
            type Value = FlagSet;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a sequence of flag codes")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<FlagSet, A::Error> {
                let mut set = FlagSet::EMPTY;
                while let Some(code) = seq.next_element::<String>()? {
                    let flag = Flag::ALL
                        .into_iter()
                        .find(|f| f.id() == code)
                        .or_else(|| code.parse::<u8>().ok().and_then(Flag::from_number))
                        .ok_or_else(|| serde::de::Error::custom(format!("unknown flag code '{code}'")))?;
                    set.insert(flag);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_seq(FlagSetVisitor)
    }
}
