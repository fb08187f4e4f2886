//! Client error types.

use thiserror::Error;

use crate::config::ConfigError;

/// A checkout that cannot be submitted yet.
///
/// The display text is the message shown to the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("لطفا آدرس خود را وارد کنید")]
    MissingAddress,

    #[error("کد تایید اشتباه است")]
    WrongCode,

    #[error("لطفا تصویر رسید واریز را آپلود کنید")]
    MissingReceipt,
}

/// Errors surfaced by the client application.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Environment configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The storefront answered with an error status.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Input rejected before any request was sent.
    #[error(transparent)]
    Validation(#[from] CheckoutError),

    /// A device capability (location, file read, URL opening) failed.
    #[error("Platform error: {0}")]
    Platform(String),

    /// The action needs an admin session.
    #[error("admin session required")]
    NotAuthorized,

    /// The form the action belongs to is not open.
    #[error("{0} is not open")]
    NotOpen(&'static str),
}

impl ClientError {
    /// Whether the server refused the admin token.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status: 401, .. } | Self::NotAuthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages_are_customer_facing() {
        let err = ClientError::from(CheckoutError::MissingReceipt);
        assert_eq!(err.to_string(), "لطفا تصویر رسید واریز را آپلود کنید");
    }

    #[test]
    fn test_api_error_displays_server_message() {
        let err = ClientError::Api {
            status: 401,
            message: "نام کاربری یا رمز عبور اشتباه است".to_string(),
        };
        assert_eq!(err.to_string(), "نام کاربری یا رمز عبور اشتباه است");
        assert!(err.is_unauthorized());
    }
}
