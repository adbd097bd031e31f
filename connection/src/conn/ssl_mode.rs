//! TLS negotiation policy for a tablet connection, mirroring the MySQL
//! client library's `--ssl-mode` levels.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum SslMode {
    Disabled = 0,
    Preferred = 1,
    Require = 2,
    VerifyCa = 3,
    VerifyIdentity = 4,
}
