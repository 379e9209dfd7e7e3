//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::RoleNotFound
            | Self::UserNotFound
            | Self::OrderNotFound
            | Self::ProductNotFound
            | Self::CategoryNotFound
            | Self::VoucherNotFound
            | Self::PageNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists
            | Self::RoleNameExists
            | Self::RoleInUse
            | Self::EmailExists
            | Self::OrderAlreadyPaid
            | Self::OrderCancelled
            | Self::InvalidOrderTransition
            | Self::OrderNotCancellable
            | Self::PaymentAlreadyProcessed
            | Self::ProductOutOfStock
            | Self::ProductSkuExists
            | Self::CategoryHasChildren
            | Self::CategoryHasProducts
            | Self::VoucherCodeExists => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated
            | Self::InvalidCredentials
            | Self::TokenExpired
            | Self::TokenInvalid
            | Self::AccountDisabled => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::PermissionDenied
            | Self::AdminRequired
            | Self::CannotModifyAdmin
            | Self::SystemRoleProtected => StatusCode::FORBIDDEN,

            // 402 Payment Required
            Self::PaymentVerificationFailed => StatusCode::PAYMENT_REQUIRED,

            // 202 Accepted: transaction seen but not final yet
            Self::PaymentPending => StatusCode::ACCEPTED,

            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,

            // 502 Bad Gateway (upstream provider failed)
            Self::PaymentProviderError => StatusCode::BAD_GATEWAY,

            // 503 Service Unavailable (transient errors, client can retry)
            Self::NetworkError | Self::TimeoutError => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::InternalError | Self::DatabaseError | Self::ConfigError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            // 400 Bad Request (default for validation/business errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_status() {
        assert_eq!(ErrorCode::NotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::VoucherNotFound.http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ErrorCode::CategoryNotFound.http_status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_conflict_status() {
        assert_eq!(
            ErrorCode::CategoryHasChildren.http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ErrorCode::ProductOutOfStock.http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(ErrorCode::RoleInUse.http_status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_auth_status() {
        assert_eq!(
            ErrorCode::TokenExpired.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ErrorCode::PermissionDenied.http_status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_payment_status() {
        assert_eq!(
            ErrorCode::PaymentVerificationFailed.http_status(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            ErrorCode::PaymentProviderError.http_status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(ErrorCode::PaymentPending.http_status(), StatusCode::ACCEPTED);
    }

    #[test]
    fn test_bad_request_status() {
        // Voucher rejections are plain business errors
        assert_eq!(
            ErrorCode::VoucherExpired.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::CategoryCycle.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::ValidationFailed.http_status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_internal_error_status() {
        assert_eq!(
            ErrorCode::DatabaseError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ErrorCode::TooManyRequests.http_status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }
}
