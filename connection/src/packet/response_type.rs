//! First byte of a generic response packet, used to pick which packet type
//! to parse next.
//!
//! ref: https://dev.mysql.com/doc/dev/mysql-server/latest/page_protocol_basic_response_packets.html

pub struct ResponseType;

impl ResponseType {
    pub const OK: u8 = 0x00;
    pub const AUTH_PLUGIN_SWITCH: u8 = 0xfe;
    pub const END_OF_FILE: u8 = 0xfe;
    pub const ERROR: u8 = 0xff;
}
