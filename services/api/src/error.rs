use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crm_core::error::{AppError, error_response};

/// CRM service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum CrmError {
    #[error("user not found")]
    UserNotFound,
    #[error("role not found")]
    RoleNotFound,
    #[error("viewing record not found")]
    RecordNotFound,
    #[error("api key not found")]
    ApiKeyNotFound,
    #[error("property not found")]
    PropertyNotFound,
    #[error("username already taken")]
    UsernameTaken,
    #[error("phone number already registered")]
    PhoneTaken,
    #[error("channel name already taken")]
    ChannelNameTaken,
    #[error("user still owns viewing records")]
    UserHasRecords,
    #[error("{0}")]
    Validation(String),
    #[error("cannot delete your own account")]
    CannotDeleteSelf,
    #[error("cannot deactivate or demote your own account")]
    CannotModifySelf,
    #[error("assigned agent must be an active staff member")]
    InvalidAgent,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("account is disabled")]
    AccountDisabled,
    #[error("unauthorized")]
    Unauthorized,
    #[error("missing api credentials")]
    MissingApiCredentials,
    #[error("request timestamp expired or invalid")]
    RequestExpired,
    #[error("duplicate request")]
    DuplicateRequest,
    #[error("invalid api key")]
    InvalidApiKey,
    #[error("invalid api secret")]
    InvalidApiSecret,
    #[error("forbidden")]
    Forbidden,
    #[error("too many requests")]
    TooManyRequests,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl CrmError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::RoleNotFound => "ROLE_NOT_FOUND",
            Self::RecordNotFound => "VIEWING_RECORD_NOT_FOUND",
            Self::ApiKeyNotFound => "API_KEY_NOT_FOUND",
            Self::PropertyNotFound => "PROPERTY_NOT_FOUND",
            Self::UsernameTaken => "USERNAME_TAKEN",
            Self::PhoneTaken => "PHONE_TAKEN",
            Self::ChannelNameTaken => "CHANNEL_NAME_TAKEN",
            Self::UserHasRecords => "USER_HAS_RECORDS",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::CannotDeleteSelf => "CANNOT_DELETE_SELF",
            Self::CannotModifySelf => "CANNOT_MODIFY_SELF",
            Self::InvalidAgent => "INVALID_AGENT",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::AccountDisabled => "ACCOUNT_DISABLED",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::MissingApiCredentials => "MISSING_API_CREDENTIALS",
            Self::RequestExpired => "REQUEST_EXPIRED",
            Self::DuplicateRequest => "DUPLICATE_REQUEST",
            Self::InvalidApiKey => "INVALID_API_KEY",
            Self::InvalidApiSecret => "INVALID_API_SECRET",
            Self::Forbidden => "FORBIDDEN",
            Self::TooManyRequests => "TOO_MANY_REQUESTS",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::UserNotFound
            | Self::RoleNotFound
            | Self::RecordNotFound
            | Self::ApiKeyNotFound
            | Self::PropertyNotFound => StatusCode::NOT_FOUND,
            Self::UsernameTaken
            | Self::PhoneTaken
            | Self::ChannelNameTaken
            | Self::UserHasRecords => StatusCode::CONFLICT,
            Self::Validation(_)
            | Self::CannotDeleteSelf
            | Self::CannotModifySelf
            | Self::InvalidAgent => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials
            | Self::AccountDisabled
            | Self::Unauthorized
            | Self::MissingApiCredentials
            | Self::RequestExpired
            | Self::DuplicateRequest
            | Self::InvalidApiKey
            | Self::InvalidApiSecret => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AppError> for CrmError {
    fn from(e: AppError) -> Self {
        match e {
            AppError::Unauthorized => Self::Unauthorized,
            AppError::Forbidden => Self::Forbidden,
            AppError::Internal(e) => Self::Internal(e),
        }
    }
}

impl IntoResponse for CrmError {
    fn into_response(self) -> Response {
        if let Self::Internal(ref e) = self {
            tracing::error!(error = ?e, kind = "INTERNAL", "internal error");
        }
        error_response(self.status(), self.kind(), self.to_string())
    }
}
