use std::fmt::{Display, Formatter};

use serde::Serialize;

use common::err::decode_error::ReError;
use common::err::CResult;

/// MySQL server UUID, the source identifier half of a GTID.
///
/// ref: https://dev.mysql.com/doc/refman/8.0/en/replication-gtids-concepts.html
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Uuid {
    pub data: [u8; 16],
    pub uuid: String,
}

impl Uuid {
    pub fn parse(uuid: String) -> CResult<Uuid> {
        let hex: String = uuid.chars().filter(|c| *c != '-').collect();
        if hex.len() != 32 {
            return Err(ReError::String(format!("invalid server uuid: {}", uuid)));
        }

        let mut data = [0u8; 16];
        for i in 0..16 {
            data[i] = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                .map_err(|e| ReError::String(format!("invalid server uuid byte: {}", e)))?;
        }

        Ok(Uuid { data, uuid })
    }
}

impl Display for Uuid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.uuid)
    }
}

#[cfg(test)]
mod test {
    use super::Uuid;

    #[test]
    fn parse_roundtrips_through_display() {
        let s = "24bc7850-2c16-11e6-a073-0242ac110001";
        let uuid = Uuid::parse(s.to_string()).unwrap();
        assert_eq!(uuid.to_string(), s);
    }

    #[test]
    fn rejects_malformed_uuid() {
        assert!(Uuid::parse("not-a-uuid".to_string()).is_err());
    }
}
