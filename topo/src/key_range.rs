use std::cmp::Ordering;
use std::fmt;

use common::err::decode_error::ReError;
use serde::{Deserialize, Serialize};

/// An opaque byte string used for sharding (spec §3 "KeyspaceId"). Ordering
/// is lexicographic on the bytes; the big-endian u64 interpretation agrees
/// with that ordering because big-endian encoding preserves numeric order.
#[derive(Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct KeyspaceId(Vec<u8>);

impl KeyspaceId {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        KeyspaceId(bytes)
    }

    pub fn from_u64(v: u64) -> Self {
        KeyspaceId(v.to_be_bytes().to_vec())
    }

    pub fn from_hex(s: &str) -> Result<Self, ReError> {
        Ok(KeyspaceId(hex::decode(s)?))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Interpret the id as an unsigned 64-bit big-endian integer, zero-padded
    /// on the left (or truncated on the right) to 8 bytes.
    pub fn as_u64(&self) -> u64 {
        let mut buf = [0u8; 8];
        let n = self.0.len().min(8);
        buf[8 - n..].copy_from_slice(&self.0[self.0.len() - n..]);
        u64::from_be_bytes(buf)
    }
}

impl fmt::Debug for KeyspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyspaceId({})", hex::encode(&self.0))
    }
}

impl Ord for KeyspaceId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for KeyspaceId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Half-open `[start, end)` interval over `KeyspaceId`s. `start = None` means
/// `-inf`, `end = None` means `+inf` (spec §3 "KeyRange").
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct KeyRange {
    pub start: Option<KeyspaceId>,
    pub end: Option<KeyspaceId>,
}

impl KeyRange {
    pub fn full() -> Self {
        KeyRange { start: None, end: None }
    }

    pub fn new(start: Option<KeyspaceId>, end: Option<KeyspaceId>) -> Self {
        KeyRange { start, end }
    }

    pub fn contains(&self, k: &KeyspaceId) -> bool {
        let after_start = match &self.start {
            None => true,
            Some(s) => s <= k,
        };
        let before_end = match &self.end {
            None => true,
            Some(e) => k < e,
        };
        after_start && before_end
    }

    /// Two ranges intersect iff `(a.end = +inf || b.start < a.end) &&
    /// (b.end = +inf || a.start < b.end)` (spec §3).
    pub fn intersects(&self, other: &KeyRange) -> bool {
        let a_open_at_top = self.end.is_none()
            || other.start.as_ref().map_or(true, |bs| bs < self.end.as_ref().unwrap());
        let b_open_at_top = other.end.is_none()
            || self.start.as_ref().map_or(true, |as_| as_ < other.end.as_ref().unwrap());
        a_open_at_top && b_open_at_top
    }

    pub fn is_full(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// Parse a sharding spec grammar `spec := (hex | "") ("-" (hex | ""))+` into
/// the consecutive key ranges it denotes (spec §3, §6).
///
/// `"-40-80-c0-"` parses to `{[-inf,40), [40,80), [80,c0), [c0,+inf)}`.
/// Dashes may only be empty (denoting -inf/+inf) at the very start or end.
pub fn parse_sharding_spec(spec: &str) -> Result<Vec<KeyRange>, ReError> {
    if spec.is_empty() {
        return Err(ReError::InvalidArgument("sharding spec must not be empty".to_string()));
    }

    let parts: Vec<&str> = spec.split('-').collect();
    if parts.len() < 2 {
        return Err(ReError::InvalidArgument(format!(
            "sharding spec {:?} must contain at least one '-'",
            spec
        )));
    }

    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() && i != 0 && i != parts.len() - 1 {
            return Err(ReError::InvalidArgument(format!(
                "sharding spec {:?}: only the leading/trailing bound may be empty",
                spec
            )));
        }
    }

    let bounds: Vec<Option<KeyspaceId>> = parts
        .iter()
        .map(|p| if p.is_empty() { Ok(None) } else { KeyspaceId::from_hex(p).map(Some) })
        .collect::<Result<_, ReError>>()?;

    Ok(bounds.windows(2).map(|w| KeyRange::new(w[0].clone(), w[1].clone())).collect())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_three_way_split() {
        let ranges = parse_sharding_spec("-40-80-c0-").unwrap();
        assert_eq!(ranges.len(), 4);
        assert!(ranges[0].start.is_none());
        assert_eq!(ranges[0].end, Some(KeyspaceId::from_hex("40").unwrap()));
        assert_eq!(ranges[3].end, None);
    }

    #[test]
    fn partitions_whole_space_without_overlap() {
        let ranges = parse_sharding_spec("-40-80-c0-").unwrap();
        for w in ranges.windows(2) {
            assert_eq!(w[0].end, w[1].start);
        }
        assert!(ranges[0].start.is_none());
        assert!(ranges.last().unwrap().end.is_none());
        for i in 0..ranges.len() {
            for j in 0..ranges.len() {
                if i != j {
                    assert!(!ranges[i].intersects(&ranges[j]), "{} and {} overlap", i, j);
                }
            }
        }
    }

    #[test]
    fn contains_is_exclusive_on_upper_bound() {
        let ranges = parse_sharding_spec("-40-80-c0-").unwrap();
        let k60 = KeyspaceId::from_hex("60").unwrap();
        let matches: Vec<_> = ranges.iter().filter(|r| r.contains(&k60)).collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].start, Some(KeyspaceId::from_hex("40").unwrap()));

        let k40 = KeyspaceId::from_hex("40").unwrap();
        assert!(!ranges[0].contains(&k40));
        assert!(ranges[1].contains(&k40));
    }

    #[test]
    fn rejects_interior_empty_bound() {
        assert!(parse_sharding_spec("-40--80-").is_err());
    }

    #[test]
    fn rejects_spec_without_dash() {
        assert!(parse_sharding_spec("40").is_err());
    }

    #[test]
    fn big_endian_u64_interpretation_agrees_with_byte_order() {
        let a = KeyspaceId::from_u64(10);
        let b = KeyspaceId::from_u64(20);
        assert!(a < b);
        assert_eq!(a.as_u64(), 10);
    }
}
