//! Worst-case matching-time classification (spec §3, `Complexity`).

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde::Deserialize;

/// Worst-case time complexity of matching against a pathological input,
/// as a function of input length `n`.
///
/// Ordered from least to most severe: `Safe < Polynomial(2) < Polynomial(3)
/// < ... < Exponential`. The ordering drives `Diagnostics` tie-breaking when
/// both an EDA and an IDA witness are found in the same pattern (spec §4.5:
/// "EDA findings take precedence over IDA findings").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Complexity {
    /// Linear, or no super-linear blowup found.
    Safe,
    /// Polynomial of degree `k >= 2`, e.g. `k = 2` for `.*a.*a.*`.
    Polynomial(u32),
    /// Exponential in the length of the pump.
    Exponential,
}

impl Complexity {
    pub fn is_exponential(self) -> bool {
        matches!(self, Complexity::Exponential)
    }

    pub fn is_polynomial(self) -> bool {
        matches!(self, Complexity::Polynomial(_))
    }

    pub fn is_safe(self) -> bool {
        matches!(self, Complexity::Safe)
    }

    /// The canonical big-O label for this complexity, e.g. `"O(n^2)"`.
    pub fn summary(self) -> String {
        match self {
            Complexity::Safe => "O(n)".to_string(),
            Complexity::Polynomial(k) => format!("O(n^{k})"),
            Complexity::Exponential => "O(2^n)".to_string(),
        }
    }

    /// True for anything worse than `Safe`.
    pub fn is_vulnerable(self) -> bool {
        !self.is_safe()
    }

    fn rank(self) -> (u8, u32) {
        match self {
            Complexity::Safe => (0, 0),
            Complexity::Polynomial(k) => (1, k),
            Complexity::Exponential => (2, 0),
        }
    }
}

impl PartialOrd for Complexity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Complexity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Complexity::Safe => f.write_str("safe"),
            Complexity::Polynomial(k) => write!(f, "polynomial(degree={k})"),
            Complexity::Exponential => f.write_str("exponential"),
        }
    }
}

/// Hand-written so the wire form carries a `summary` field that has no
/// backing enum variant — `{type, degree, summary}` per the diagnostics
/// export contract (spec §6).
impl Serialize for Complexity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (ty, degree) = match self {
            Complexity::Safe => ("safe", None),
            Complexity::Polynomial(k) => ("polynomial", Some(*k)),
            Complexity::Exponential => ("exponential", None),
        };
        let mut state = serializer.serialize_struct("Complexity", 3)?;
        state.serialize_field("type", ty)?;
        state.serialize_field("degree", &degree)?;
        state.serialize_field("summary", &self.summary())?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for Complexity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ComplexityVisitor;

        impl<'de> Visitor<'de> for ComplexityVisitor {
            type Value = Complexity;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a complexity object with a `type` field")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Complexity, A::Error> {
                let mut ty: Option<String> = None;
                let mut degree: Option<Option<u32>> = None;
                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        "type" => ty = Some(map.next_value()?),
                        "degree" => degree = Some(map.next_value()?),
                        // `summary` is derived, not authoritative; ignore it on the way in.
                        _ => {
                            let _: de::IgnoredAny = map.next_value()?;
                        }
                    }
                }
                let ty = ty.ok_or_else(|| de::Error::missing_field("type"))?;
                match ty.as_str() {
                    "safe" => Ok(Complexity::Safe),
                    "exponential" => Ok(Complexity::Exponential),
                    "polynomial" => {
                        let k = degree
                            .flatten()
                            .ok_or_else(|| de::Error::missing_field("degree"))?;
                        Ok(Complexity::Polynomial(k))
                    }
                    other => Err(de::Error::unknown_variant(other, &["safe", "polynomial", "exponential"])),
                }
            }
        }

        deserializer.deserialize_map(ComplexityVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_matches_severity() {
        assert!(Complexity::Safe < Complexity::Polynomial(2));
        assert!(Complexity::Polynomial(2) < Complexity::Polynomial(3));
        assert!(Complexity::Polynomial(9) < Complexity::Exponential);
    }

    #[test]
    fn max_picks_worst() {
        let worst = [Complexity::Safe, Complexity::Polynomial(2), Complexity::Exponential]
            .into_iter()
            .max()
            .unwrap();
        assert_eq!(worst, Complexity::Exponential);
    }

    #[test]
    fn json_shape_matches_export_contract() {
        let json = serde_json::to_value(Complexity::Polynomial(2)).unwrap();
        assert_eq!(json["type"], "polynomial");
        assert_eq!(json["degree"], 2);
        assert_eq!(json["summary"], "O(n^2)");

        let json = serde_json::to_value(Complexity::Safe).unwrap();
        assert_eq!(json["type"], "safe");
        assert!(json["degree"].is_null());
        assert_eq!(json["summary"], "O(n)");

        let json = serde_json::to_value(Complexity::Exponential).unwrap();
        assert_eq!(json["summary"], "O(2^n)");
    }

    #[test]
    fn round_trips_through_json() {
        for c in [Complexity::Safe, Complexity::Polynomial(3), Complexity::Exponential] {
            let json = serde_json::to_string(&c).unwrap();
            let back: Complexity = serde_json::from_str(&json).unwrap();
            assert_eq!(c, back);
        }
    }
}
