//! Model validation filter.
//!
//! Runs after input binding and before the handler. A bound model's state is
//! an ordered list of fields, each with zero or more messages; any message
//! rejects the request with a structured 400.

use axum::{
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::observability::metrics;

/// Field key used for errors that concern the whole body.
pub const BODY_FIELD: &str = "$";

/// Validation state of one bound field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldState {
    pub field: String,
    pub errors: Vec<String>,
}

/// Validation state of a bound model, in binder order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelState {
    fields: Vec<FieldState>,
}

impl ModelState {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, field: &str) -> &mut FieldState {
        let index = match self.fields.iter().position(|f| f.field == field) {
            Some(index) => index,
            None => {
                self.fields.push(FieldState {
                    field: field.to_string(),
                    errors: Vec::new(),
                });
                self.fields.len() - 1
            }
        };
        &mut self.fields[index]
    }

    /// Record a field that bound without errors.
    pub fn mark_valid(&mut self, field: &str) {
        self.entry(field);
    }

    /// Append an error to a field, keeping the field's first position.
    pub fn add_error(&mut self, field: &str, message: impl Into<String>) {
        self.entry(field).errors.push(message.into());
    }

    pub fn is_valid(&self) -> bool {
        self.fields.iter().all(|f| f.errors.is_empty())
    }

    pub fn fields(&self) -> &[FieldState] {
        &self.fields
    }

    /// Fields with at least one error, in binder order.
    pub fn invalid_fields(&self) -> impl Iterator<Item = &FieldState> {
        self.fields.iter().filter(|f| !f.errors.is_empty())
    }
}

impl From<&ValidationErrors> for ModelState {
    /// Flatten validator errors into dotted and indexed field paths
    /// (`address.city`, `lines[1].quantity`).
    ///
    /// The result is never valid: a rejection that names no field is
    /// recorded against the body.
    fn from(errors: &ValidationErrors) -> Self {
        let mut state = ModelState::new();
        collect_errors(&mut state, "", errors);
        if state.is_valid() {
            state.add_error(BODY_FIELD, "The model failed validation.");
        }
        state
    }
}

/// Key the validator uses for struct-level (schema) errors.
const STRUCT_LEVEL: &str = "__all__";

fn collect_errors(state: &mut ModelState, prefix: &str, errors: &ValidationErrors) {
    let mut entries: Vec<_> = errors.errors().iter().collect();
    // Hash order from the validator is not meaningful.
    entries.sort_by(|a, b| a.0.cmp(b.0));

    for (field, kind) in entries {
        let field: &str = field;
        let path = match (prefix, field) {
            ("", STRUCT_LEVEL) => BODY_FIELD.to_string(),
            (prefix, STRUCT_LEVEL) => prefix.to_string(),
            ("", field) => field.to_string(),
            (prefix, field) => format!("{}.{}", prefix, field),
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for err in field_errors {
                    let message = match &err.message {
                        Some(message) => message.to_string(),
                        None if path == BODY_FIELD => {
                            format!("The model failed '{}' validation.", err.code)
                        }
                        None => format!("The {} field failed '{}' validation.", path, err.code),
                    };
                    state.add_error(&path, message);
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_errors(state, &path, nested),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_errors(state, &format!("{}[{}]", path, index), nested);
                }
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FieldErrors {
    pub field: String,
    pub message: Vec<String>,
}

/// 400 response for a model that failed validation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ValidationRejection {
    pub error: &'static str,
    pub message: &'static str,
    pub status_code: u16,
    pub errors: Vec<FieldErrors>,
}

impl IntoResponse for ValidationRejection {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(self)).into_response()
    }
}

impl ValidationRejection {
    /// Build the rejection for a state, listing only fields with errors.
    pub fn from_state(state: &ModelState) -> Self {
        let errors: Vec<_> = state
            .invalid_fields()
            .map(|f| FieldErrors {
                field: f.field.clone(),
                message: f.errors.clone(),
            })
            .collect();

        tracing::info!(fields = errors.len(), "Model validation failed");
        metrics::record_rejected("validation_failed");

        Self {
            error: "ValidationFailed",
            message: "One or more validation errors occurred.",
            status_code: StatusCode::BAD_REQUEST.as_u16(),
            errors,
        }
    }
}

/// The filter: reject if any field carries an error.
pub fn validate_model(state: &ModelState) -> Result<(), ValidationRejection> {
    if state.is_valid() {
        Ok(())
    } else {
        Err(ValidationRejection::from_state(state))
    }
}

/// JSON extractor that binds, validates and filters before the handler runs.
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidationRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let data = match Json::<T>::from_request(req, state).await {
            Ok(Json(data)) => data,
            Err(rejection) => {
                let mut model = ModelState::new();
                model.add_error(BODY_FIELD, rejection.body_text());
                return Err(ValidationRejection::from_state(&model));
            }
        };

        if let Err(errors) = data.validate() {
            return Err(ValidationRejection::from_state(&ModelState::from(&errors)));
        }

        Ok(ValidatedJson(data))
    }
}
