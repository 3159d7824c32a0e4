use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use enrollment_engine::{gateway::GatewayError, traits::PaymentGatewayError, CheckoutError, ReconcileError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("The service is temporarily unavailable. Please try again later. {0}")]
    ServiceUnavailable(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Invalid payment signature. {0}")]
    InvalidSignature(String),
    #[error("Malformed payment notification. {0}")]
    MalformedPayload(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    UnprocessableRequest(String),
    #[error("The payment gateway returned an error. {0}")]
    GatewayError(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidSignature(_) => StatusCode::BAD_REQUEST,
            Self::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::UnprocessableRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::GatewayError(_) => StatusCode::BAD_GATEWAY,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No access token was provided. Please sign in.")]
    MissingToken,
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("Access token is invalid or has expired. {0}")]
    ValidationError(String),
    #[error("Could not issue an access token. {0}")]
    CouldNotIssueToken(String),
}

impl From<PaymentGatewayError> for ServerError {
    fn from(e: PaymentGatewayError) -> Self {
        if e.is_transient() {
            Self::ServiceUnavailable(e.to_string())
        } else {
            Self::BackendError(e.to_string())
        }
    }
}

impl From<GatewayError> for ServerError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Unavailable(_) => Self::ServiceUnavailable(e.to_string()),
            GatewayError::Rejected(_) => Self::GatewayError(e.to_string()),
            GatewayError::Configuration(_) => Self::ConfigurationError(e.to_string()),
        }
    }
}

impl From<ReconcileError> for ServerError {
    fn from(e: ReconcileError) -> Self {
        match e {
            ReconcileError::Configuration(s) => Self::ConfigurationError(s),
            ReconcileError::InvalidSignature(s) => Self::InvalidSignature(s),
            ReconcileError::MalformedPayload(s) => Self::MalformedPayload(s),
            ReconcileError::UnknownOrder(_) => Self::NoRecordFound(e.to_string()),
            ReconcileError::OrderMismatch { .. } | ReconcileError::AmountMismatch { .. } => Self::Conflict(e.to_string()),
            ReconcileError::Database(e) => e.into(),
        }
    }
}

impl From<CheckoutError> for ServerError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::UnknownUser(_) | CheckoutError::ItemNotFound(_) | CheckoutError::OrderNotFound(_) => {
                Self::NoRecordFound(e.to_string())
            },
            CheckoutError::AlreadyEnrolled(_) => Self::Conflict(e.to_string()),
            CheckoutError::NotPayable(..) => Self::UnprocessableRequest(e.to_string()),
            CheckoutError::Gateway(e) => e.into(),
            CheckoutError::Database(e) => e.into(),
        }
    }
}
