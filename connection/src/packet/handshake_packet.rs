use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use binlog::utils::read_null_term_string_with_cursor;
use common::err::CResult;

use crate::declar::capability_flags;

/// Initial handshake packet (protocol version 10) sent by the server.
///
/// ref: https://dev.mysql.com/doc/dev/mysql-server/latest/page_protocol_connection_phase_packets_protocol_handshake_v10.html
#[derive(Debug, Clone)]
pub struct HandshakePacket {
    pub protocol_version: u8,
    pub server_version: String,
    pub connection_id: u32,
    pub scramble: String,
    pub server_capabilities: u64,
    pub server_collation: u8,
    pub status_flags: u16,
    pub auth_plugin_name: String,
}

impl HandshakePacket {
    pub fn parse(packet: &[u8]) -> CResult<Self> {
        let mut cursor = Cursor::new(packet);

        let protocol_version = cursor.read_u8()?;
        let server_version = read_null_term_string_with_cursor(&mut cursor)?;
        let connection_id = cursor.read_u32::<LittleEndian>()?;

        let mut scramble_part1 = [0u8; 8];
        cursor.read_exact(&mut scramble_part1)?;
        let _filler = cursor.read_u8()?;

        let capabilities_low = cursor.read_u16::<LittleEndian>()? as u64;
        let server_collation = cursor.read_u8()?;
        let status_flags = cursor.read_u16::<LittleEndian>()?;
        let capabilities_high = cursor.read_u16::<LittleEndian>()? as u64;
        let server_capabilities = capabilities_low | (capabilities_high << 16);

        let auth_data_len = cursor.read_u8()?;
        let mut reserved = [0u8; 10];
        cursor.read_exact(&mut reserved)?;

        let mut scramble = String::from_utf8_lossy(&scramble_part1).to_string();
        if server_capabilities & capability_flags::CLIENT_SECURE_CONNECTION != 0 {
            let part2_len = std::cmp::max(13, auth_data_len.saturating_sub(8) as usize);
            let mut scramble_part2 = vec![0u8; part2_len];
            cursor.read_exact(&mut scramble_part2)?;
            // part2 is NUL-terminated; drop the terminator before appending
            if let Some(&0) = scramble_part2.last() {
                scramble_part2.pop();
            }
            scramble.push_str(&String::from_utf8_lossy(&scramble_part2));
        }

        let auth_plugin_name = if server_capabilities & capability_flags::CLIENT_PLUGIN_AUTH != 0 {
            read_null_term_string_with_cursor(&mut cursor).unwrap_or_default()
        } else {
            String::new()
        };

        Ok(Self {
            protocol_version,
            server_version,
            connection_id,
            scramble,
            server_capabilities,
            server_collation,
            status_flags,
            auth_plugin_name,
        })
    }
}
