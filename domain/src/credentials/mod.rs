//! Credential handling: token format rules and redaction.

pub mod token;

pub use token::{
    TokenError, TokenFormat, TokenRejection, TokenRule, TokenValidation, redact, scrub_secrets,
    validate_token,
};
