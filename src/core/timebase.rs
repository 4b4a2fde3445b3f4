use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

pub type Tick = u64;
pub type TrackId = String;

/// Length of a timed entity on the timeline.
///
/// Poses may run without an end; clips always resolve to a finite length
/// before they reach the walker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Span {
    Finite(Tick),
    #[default]
    Unbounded,
}

impl Span {
    /// Number of ticks the walker has to simulate, if any.
    pub fn routable_ticks(self) -> Option<Tick> {
        match self {
            Span::Finite(0) | Span::Unbounded => None,
            Span::Finite(ticks) => Some(ticks),
        }
    }
}

impl From<Tick> for Span {
    fn from(ticks: Tick) -> Self {
        Span::Finite(ticks)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Span::Finite(ticks) => write!(f, "{ticks}"),
            Span::Unbounded => f.write_str("unbounded"),
        }
    }
}

impl Serialize for Span {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Span::Finite(ticks) => serializer.serialize_u64(*ticks),
            Span::Unbounded => serializer.serialize_str("unbounded"),
        }
    }
}

impl<'de> Deserialize<'de> for Span {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(SpanVisitor)
    }
}

/// Reads a clip length: same forms as `Span`, with "unbounded" meaning no
/// explicit length.
pub fn deserialize_clip_ticks<'de, D>(deserializer: D) -> Result<Option<Tick>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Span::deserialize(deserializer)? {
        Span::Finite(ticks) => Some(ticks),
        Span::Unbounded => None,
    })
}

struct SpanVisitor;

impl<'de> Visitor<'de> for SpanVisitor {
    type Value = Span;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a duration in whole ticks or \"unbounded\"")
    }

    fn visit_u64<E: de::Error>(self, ticks: u64) -> Result<Span, E> {
        Ok(Span::Finite(ticks))
    }

    // Non-positive lengths carry nothing to route.
    fn visit_i64<E: de::Error>(self, ticks: i64) -> Result<Span, E> {
        Ok(Span::Finite(ticks.max(0) as Tick))
    }

    fn visit_f64<E: de::Error>(self, ticks: f64) -> Result<Span, E> {
        if ticks.is_infinite() && ticks > 0.0 {
            return Ok(Span::Unbounded);
        }
        if !ticks.is_finite() || ticks.fract() != 0.0 {
            return Err(E::invalid_value(de::Unexpected::Float(ticks), &self));
        }
        Ok(Span::Finite(ticks.max(0.0).min(Tick::MAX as f64) as Tick))
    }

    fn visit_str<E: de::Error>(self, marker: &str) -> Result<Span, E> {
        match marker.trim().to_ascii_lowercase().as_str() {
            "unbounded" | "infinite" | "inf" => Ok(Span::Unbounded),
            _ => Err(E::invalid_value(de::Unexpected::Str(marker), &self)),
        }
    }

    fn visit_unit<E: de::Error>(self) -> Result<Span, E> {
        Ok(Span::Unbounded)
    }

    fn visit_none<E: de::Error>(self) -> Result<Span, E> {
        Ok(Span::Unbounded)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Span, D::Error> {
        deserializer.deserialize_any(SpanVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::{Span, Tick};

    #[derive(serde::Deserialize)]
    struct Holder {
        #[serde(default)]
        span: Span,
    }

    #[test]
    fn only_positive_finite_spans_are_routable() {
        assert_eq!(Span::Finite(12).routable_ticks(), Some(12));
        assert_eq!(Span::Finite(0).routable_ticks(), None);
        assert_eq!(Span::Unbounded.routable_ticks(), None);
    }

    #[test]
    fn span_parses_ticks_and_markers() {
        let h: Holder = toml::from_str("span = 24").unwrap();
        assert_eq!(h.span, Span::Finite(24));
        let h: Holder = toml::from_str("span = \"Infinite\"").unwrap();
        assert_eq!(h.span, Span::Unbounded);
        let h: Holder = toml::from_str("").unwrap();
        assert_eq!(h.span, Span::Unbounded);
    }

    #[test]
    fn negative_ticks_clamp_to_empty() {
        let h: Holder = serde_json::from_str(r#"{"span": -4}"#).unwrap();
        assert_eq!(h.span, Span::Finite(0));
        assert_eq!(h.span.routable_ticks(), None);
    }

    #[test]
    fn unknown_marker_is_rejected() {
        let parsed: Result<Holder, _> = serde_json::from_str(r#"{"span": "forever-ish"}"#);
        let err = parsed.err().unwrap().to_string();
        assert!(err.contains("whole ticks or \"unbounded\""), "{err}");
    }

    #[test]
    fn whole_number_floats_are_ticks() {
        let h: Holder = serde_json::from_str(r#"{"span": 4.0}"#).unwrap();
        assert_eq!(h.span, Span::Finite(4));
        let h: Holder = toml::from_str("span = -2.0").unwrap();
        assert_eq!(h.span, Span::Finite(0));
        let h: Holder = toml::from_str("span = inf").unwrap();
        assert_eq!(h.span, Span::Unbounded);
    }

    #[test]
    fn fractional_ticks_name_the_expected_shape() {
        let parsed: Result<Holder, _> = serde_json::from_str(r#"{"span": 4.5}"#);
        let err = parsed.err().unwrap().to_string();
        assert!(err.contains("floating point `4.5`"), "{err}");
        assert!(err.contains("whole ticks"), "{err}");
    }

    #[test]
    fn null_span_is_unbounded() {
        let h: Holder = serde_json::from_str(r#"{"span": null}"#).unwrap();
        assert_eq!(h.span, Span::Unbounded);
    }

    #[test]
    fn span_serializes_back_to_plain_ticks() {
        let t: Tick = 7;
        assert_eq!(serde_json::to_string(&Span::Finite(t)).unwrap(), "7");
        assert_eq!(
            serde_json::to_string(&Span::Unbounded).unwrap(),
            "\"unbounded\""
        );
    }
}
