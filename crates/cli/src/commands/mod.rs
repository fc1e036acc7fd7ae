//! CLI subcommands.

pub mod migrate;
pub mod seed;

use secrecy::SecretString;

/// Environment variable holding the storefront database URL.
pub const DATABASE_URL_VAR: &str = "EMPORIUM_DATABASE_URL";

/// Read the database URL, falling back to the conventional `DATABASE_URL`.
pub fn database_url() -> Option<SecretString> {
    dotenvy::dotenv().ok();

    std::env::var(DATABASE_URL_VAR)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .filter(|url| !url.trim().is_empty())
        .map(SecretString::from)
}
