use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use validator::{ValidationError, ValidationErrors};

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("validation error")]
    Validation(Option<ValidationErrors>),
    #[error("Unprocessable entity: {0}")]
    Unprocessable(String),
    #[error("Not found: `{0}`")]
    NotFound(String),
    #[error("Internal Server Error")]
    Server(#[from] anyhow::Error),
}

impl From<crate::Error> for HttpError {
    fn from(err: crate::Error) -> Self {
        match err {
            crate::Error::NotFound(resource) => Self::NotFound(resource),
            err => Self::Server(anyhow::Error::from(err)),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        if let Self::Server(err) = &self {
            error!("{:#?}", err);
        }

        match serde_json::to_vec(&self.body()) {
            Ok(body) => {
                let status = self.status_code();
                let header = [("content-type", "application/json")];
                (status, header, body).into_response()
            }
            Err(err) => {
                error!("{:#?}", err);
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                let header = [("content-type", "text/plain")];
                (status, header, format!("{err}")).into_response()
            }
        }
    }
}

impl HttpError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> Body {
        Body {
            message: format!("{self}"),
            errors: self.validation_errors(),
        }
    }

    fn validation_errors(&self) -> Vec<ValidationErrorContent> {
        match self {
            Self::Validation(Some(errors)) => ValidationErrorContent::from_errors(errors),
            _ => vec![],
        }
    }
}

#[derive(Debug, Serialize)]
struct Body {
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<ValidationErrorContent>,
}

#[derive(Debug, Serialize)]
struct ValidationErrorContent {
    field: String,
    messages: Vec<String>,
}

impl ValidationErrorContent {
    /// Request bodies are flat, so only field errors are reported.
    fn from_errors(errors: &ValidationErrors) -> Vec<Self> {
        let mut results: Vec<Self> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| Self {
                field: field.to_string(),
                messages: errs.iter().map(message).collect(),
            })
            .collect();
        // Field order of a HashMap is random.
        results.sort_by(|a, b| a.field.cmp(&b.field));
        results
    }
}

fn message(err: &ValidationError) -> String {
    if err.code == "required" {
        return err.code.to_string();
    }
    match err.message.as_ref() {
        Some(message) => message.to_string(),
        None => format!("Invalid value ({})", err.code),
    }
}
