//! MySQL authentication plugin names and the `AuthPlugin` they select.

pub const MY_SQL_NATIVE_PASSWORD: &str = "mysql_native_password";
pub const CACHING_SHA2_PASSWORD: &str = "caching_sha2_password";
pub const SHA256_PASSWORD: &str = "sha256_password";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPlugin {
    MySqlNativePassword,
    CachingSha2Password,
    Sha256Password,
}

impl AuthPlugin {
    pub fn name(&self) -> &'static str {
        match self {
            AuthPlugin::MySqlNativePassword => MY_SQL_NATIVE_PASSWORD,
            AuthPlugin::CachingSha2Password => CACHING_SHA2_PASSWORD,
            AuthPlugin::Sha256Password => SHA256_PASSWORD,
        }
    }
}
