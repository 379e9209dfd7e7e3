//! Payments
//!
//! - [`vietqr`]: bank transfer QR images, confirmed manually by staff
//! - [`paypal`]: PayPal REST v2 order create / capture
//! - [`evm`]: MetaMask transfers verified over JSON-RPC
//! - [`service`]: ties providers to orders and settles them
//!
//! Providers are called over plain REST with `reqwest`; no vendor SDKs.

pub mod evm;
pub mod paypal;
pub mod service;
pub mod vietqr;

use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Provider-side payment failure
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Network or decoding problem talking to the provider
    #[error("Payment provider unreachable: {0}")]
    Transport(String),

    /// The provider answered with an error
    #[error("Payment provider rejected the request: {0}")]
    Provider(String),

    /// The provider's answer does not match the order
    #[error("Payment verification failed: {0}")]
    Verification(String),

    /// Transaction known but not final yet
    #[error("Payment is still pending: {0}")]
    Pending(String),

    #[error("Invalid transaction hash")]
    InvalidTransactionHash,

    #[error("Payment method not configured: {0}")]
    NotConfigured(&'static str),
}

impl From<reqwest::Error> for PaymentError {
    fn from(err: reqwest::Error) -> Self {
        PaymentError::Transport(err.to_string())
    }
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        let code = match &err {
            PaymentError::Transport(_) | PaymentError::Provider(_) => {
                tracing::error!(error = %err, "Payment provider error");
                ErrorCode::PaymentProviderError
            }
            PaymentError::Verification(_) => {
                tracing::warn!(error = %err, "Payment rejected");
                ErrorCode::PaymentVerificationFailed
            }
            PaymentError::Pending(_) => ErrorCode::PaymentPending,
            PaymentError::InvalidTransactionHash => ErrorCode::InvalidTransactionHash,
            PaymentError::NotConfigured(_) => ErrorCode::PaymentNotConfigured,
        };
        AppError::with_message(code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err: AppError = PaymentError::Pending("0 confirmations".into()).into();
        assert_eq!(err.code, ErrorCode::PaymentPending);

        let err: AppError = PaymentError::Verification("amount".into()).into();
        assert_eq!(err.code, ErrorCode::PaymentVerificationFailed);

        let err: AppError = PaymentError::NotConfigured("paypal").into();
        assert_eq!(err.code, ErrorCode::PaymentNotConfigured);
    }
}
