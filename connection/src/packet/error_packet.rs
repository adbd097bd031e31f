use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

use common::err::CResult;

/// ERR_Packet, sent whenever a command fails.
///
/// ref: https://dev.mysql.com/doc/dev/mysql-server/latest/page_protocol_basic_err_packet.html
#[derive(Debug)]
pub struct ErrorPacket {
    pub error_code: u16,
    pub sql_state: String,
    pub error_message: String,
}

impl ErrorPacket {
    pub fn parse(packet: &[u8]) -> CResult<Self> {
        let mut cursor = Cursor::new(packet);

        let error_code = cursor.read_u16::<LittleEndian>()?;

        // optional '#' sql-state marker followed by a 5-char sql state, only
        // present when CLIENT_PROTOCOL_41 is set (always true for this client)
        let mut marker = [0u8; 1];
        std::io::Read::read_exact(&mut cursor, &mut marker)?;
        let sql_state = if marker[0] == b'#' {
            let mut state_bytes = [0u8; 5];
            std::io::Read::read_exact(&mut cursor, &mut state_bytes)?;
            String::from_utf8_lossy(&state_bytes).to_string()
        } else {
            cursor.set_position(cursor.position() - 1);
            String::new()
        };

        let mut remaining = Vec::new();
        std::io::Read::read_to_end(&mut cursor, &mut remaining)?;
        let error_message = String::from_utf8_lossy(&remaining).to_string();

        Ok(Self { error_code, sql_state, error_message })
    }
}
