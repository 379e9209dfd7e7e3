//! Unified error codes for the shop
//!
//! Error codes are shared by the server and the storefront/admin clients.
//! They are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Account errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Catalog errors (products, categories)
//! - 7xxx: Voucher errors
//! - 8xxx: Content and settings errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so clients can switch on
/// them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,
    /// Too many requests
    TooManyRequests = 9,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Account is disabled
    AccountDisabled = 1005,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Admin role required
    AdminRequired = 2002,
    /// Cannot modify admin user
    CannotModifyAdmin = 2003,
    /// Role not found
    RoleNotFound = 2004,
    /// Role name already exists
    RoleNameExists = 2005,
    /// Role is still assigned to users
    RoleInUse = 2006,
    /// System roles cannot be changed or deleted
    SystemRoleProtected = 2007,

    // ==================== 3xxx: Account ====================
    /// User not found
    UserNotFound = 3001,
    /// Email already registered
    EmailExists = 3002,
    /// Password too short
    PasswordTooShort = 3003,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has no items
    OrderEmpty = 4002,
    /// Order has already been paid
    OrderAlreadyPaid = 4003,
    /// Order has been cancelled
    OrderCancelled = 4004,
    /// Order status change is not allowed
    InvalidOrderTransition = 4005,
    /// Item quantity out of range
    InvalidQuantity = 4006,
    /// Order can no longer be cancelled
    OrderNotCancellable = 4007,

    // ==================== 5xxx: Payment ====================
    /// Payment processing failed
    PaymentFailed = 5001,
    /// Payment method is disabled
    PaymentMethodDisabled = 5002,
    /// Payment method is not configured
    PaymentNotConfigured = 5003,
    /// Order was placed with a different payment method
    PaymentMethodMismatch = 5004,
    /// Payment could not be verified
    PaymentVerificationFailed = 5005,
    /// Payment is not confirmed yet
    PaymentPending = 5006,
    /// Payment reference was already used
    PaymentAlreadyProcessed = 5007,
    /// Transaction hash is malformed
    InvalidTransactionHash = 5008,
    /// Payment provider returned an error
    PaymentProviderError = 5009,

    // ==================== 6xxx: Catalog ====================
    /// Product not found
    ProductNotFound = 6001,
    /// Product is not for sale
    ProductInactive = 6002,
    /// Product is out of stock
    ProductOutOfStock = 6003,
    /// Product price is invalid
    ProductInvalidPrice = 6004,
    /// Product SKU already exists
    ProductSkuExists = 6005,
    /// Category not found
    CategoryNotFound = 6101,
    /// Category has child categories
    CategoryHasChildren = 6102,
    /// Category has products
    CategoryHasProducts = 6103,
    /// Category move would create a cycle
    CategoryCycle = 6104,
    /// Category tree would exceed the maximum depth
    CategoryTooDeep = 6105,

    // ==================== 7xxx: Voucher ====================
    /// Voucher not found
    VoucherNotFound = 7001,
    /// Voucher is inactive
    VoucherInactive = 7002,
    /// Voucher is not valid yet
    VoucherNotStarted = 7003,
    /// Voucher has expired
    VoucherExpired = 7004,
    /// Voucher usage limit reached
    VoucherUsageExhausted = 7005,
    /// Per-user voucher limit reached
    VoucherUserLimitReached = 7006,
    /// Order total is below the voucher minimum
    VoucherMinOrderNotMet = 7007,
    /// No cart item is eligible for the voucher
    VoucherProductNotApplicable = 7008,
    /// Voucher does not allow the chosen payment method
    VoucherPaymentMethodNotAllowed = 7009,
    /// Voucher code already exists
    VoucherCodeExists = 7010,

    // ==================== 8xxx: Content ====================
    /// Page not found
    PageNotFound = 8001,
    /// Site settings are invalid
    SettingsInvalid = 8101,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9003,
    /// Network error
    NetworkError = 9004,
    /// Timeout error
    TimeoutError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",
            ErrorCode::TooManyRequests => "Too many requests",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::TokenExpired => "Token has expired",
            ErrorCode::TokenInvalid => "Token is invalid",
            ErrorCode::AccountDisabled => "Account is disabled",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::AdminRequired => "Admin role required",
            ErrorCode::CannotModifyAdmin => "Cannot modify admin user",
            ErrorCode::RoleNotFound => "Role not found",
            ErrorCode::RoleNameExists => "Role name already exists",
            ErrorCode::RoleInUse => "Role is assigned to users",
            ErrorCode::SystemRoleProtected => "System roles cannot be changed",

            // Account
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::EmailExists => "Email is already registered",
            ErrorCode::PasswordTooShort => "Password is too short",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderEmpty => "Order has no items",
            ErrorCode::OrderAlreadyPaid => "Order has already been paid",
            ErrorCode::OrderCancelled => "Order has been cancelled",
            ErrorCode::InvalidOrderTransition => "Order status change is not allowed",
            ErrorCode::InvalidQuantity => "Item quantity is out of range",
            ErrorCode::OrderNotCancellable => "Order can no longer be cancelled",

            // Payment
            ErrorCode::PaymentFailed => "Payment failed",
            ErrorCode::PaymentMethodDisabled => "Payment method is disabled",
            ErrorCode::PaymentNotConfigured => "Payment method is not configured",
            ErrorCode::PaymentMethodMismatch => "Order uses a different payment method",
            ErrorCode::PaymentVerificationFailed => "Payment could not be verified",
            ErrorCode::PaymentPending => "Payment is not confirmed yet",
            ErrorCode::PaymentAlreadyProcessed => "Payment has already been processed",
            ErrorCode::InvalidTransactionHash => "Transaction hash is invalid",
            ErrorCode::PaymentProviderError => "Payment provider error",

            // Catalog
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::ProductInactive => "Product is not available",
            ErrorCode::ProductOutOfStock => "Product is out of stock",
            ErrorCode::ProductInvalidPrice => "Product price is invalid",
            ErrorCode::ProductSkuExists => "Product SKU already exists",
            ErrorCode::CategoryNotFound => "Category not found",
            ErrorCode::CategoryHasChildren => "Category has child categories",
            ErrorCode::CategoryHasProducts => "Category has products",
            ErrorCode::CategoryCycle => "Category cannot be moved under itself",
            ErrorCode::CategoryTooDeep => "Category tree is too deep",

            // Voucher
            ErrorCode::VoucherNotFound => "Voucher not found",
            ErrorCode::VoucherInactive => "Voucher is inactive",
            ErrorCode::VoucherNotStarted => "Voucher is not valid yet",
            ErrorCode::VoucherExpired => "Voucher has expired",
            ErrorCode::VoucherUsageExhausted => "Voucher usage limit reached",
            ErrorCode::VoucherUserLimitReached => "You have already used this voucher",
            ErrorCode::VoucherMinOrderNotMet => "Order total is below the voucher minimum",
            ErrorCode::VoucherProductNotApplicable => "Voucher does not apply to these products",
            ErrorCode::VoucherPaymentMethodNotAllowed => {
                "Voucher does not apply to this payment method"
            }
            ErrorCode::VoucherCodeExists => "Voucher code already exists",

            // Content
            ErrorCode::PageNotFound => "Page not found",
            ErrorCode::SettingsInvalid => "Site settings are invalid",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),
            9 => Ok(ErrorCode::TooManyRequests),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1005 => Ok(ErrorCode::AccountDisabled),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::AdminRequired),
            2003 => Ok(ErrorCode::CannotModifyAdmin),
            2004 => Ok(ErrorCode::RoleNotFound),
            2005 => Ok(ErrorCode::RoleNameExists),
            2006 => Ok(ErrorCode::RoleInUse),
            2007 => Ok(ErrorCode::SystemRoleProtected),

            // Account
            3001 => Ok(ErrorCode::UserNotFound),
            3002 => Ok(ErrorCode::EmailExists),
            3003 => Ok(ErrorCode::PasswordTooShort),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderEmpty),
            4003 => Ok(ErrorCode::OrderAlreadyPaid),
            4004 => Ok(ErrorCode::OrderCancelled),
            4005 => Ok(ErrorCode::InvalidOrderTransition),
            4006 => Ok(ErrorCode::InvalidQuantity),
            4007 => Ok(ErrorCode::OrderNotCancellable),

            // Payment
            5001 => Ok(ErrorCode::PaymentFailed),
            5002 => Ok(ErrorCode::PaymentMethodDisabled),
            5003 => Ok(ErrorCode::PaymentNotConfigured),
            5004 => Ok(ErrorCode::PaymentMethodMismatch),
            5005 => Ok(ErrorCode::PaymentVerificationFailed),
            5006 => Ok(ErrorCode::PaymentPending),
            5007 => Ok(ErrorCode::PaymentAlreadyProcessed),
            5008 => Ok(ErrorCode::InvalidTransactionHash),
            5009 => Ok(ErrorCode::PaymentProviderError),

            // Catalog
            6001 => Ok(ErrorCode::ProductNotFound),
            6002 => Ok(ErrorCode::ProductInactive),
            6003 => Ok(ErrorCode::ProductOutOfStock),
            6004 => Ok(ErrorCode::ProductInvalidPrice),
            6005 => Ok(ErrorCode::ProductSkuExists),
            6101 => Ok(ErrorCode::CategoryNotFound),
            6102 => Ok(ErrorCode::CategoryHasChildren),
            6103 => Ok(ErrorCode::CategoryHasProducts),
            6104 => Ok(ErrorCode::CategoryCycle),
            6105 => Ok(ErrorCode::CategoryTooDeep),

            // Voucher
            7001 => Ok(ErrorCode::VoucherNotFound),
            7002 => Ok(ErrorCode::VoucherInactive),
            7003 => Ok(ErrorCode::VoucherNotStarted),
            7004 => Ok(ErrorCode::VoucherExpired),
            7005 => Ok(ErrorCode::VoucherUsageExhausted),
            7006 => Ok(ErrorCode::VoucherUserLimitReached),
            7007 => Ok(ErrorCode::VoucherMinOrderNotMet),
            7008 => Ok(ErrorCode::VoucherProductNotApplicable),
            7009 => Ok(ErrorCode::VoucherPaymentMethodNotAllowed),
            7010 => Ok(ErrorCode::VoucherCodeExists),

            // Content
            8001 => Ok(ErrorCode::PageNotFound),
            8101 => Ok(ErrorCode::SettingsInvalid),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::ConfigError),
            9004 => Ok(ErrorCode::NetworkError),
            9005 => Ok(ErrorCode::TimeoutError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
