//! Errors raised while registering model type schemas or checking payloads
//! against them.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    /// No schema is registered under the model type name.
    #[error("no schema registered for model type '{0}'")]
    UnknownModel(String),

    /// The canonical attribute payload of `model` broke its schema. One entry
    /// per violation, as reported by the validator.
    #[error("payload of '{model}' does not match its schema: {}", errors.join("; "))]
    PayloadRejected { model: String, errors: Vec<String> },

    /// `schemars` output for the field struct could not be turned into JSON.
    #[error("could not generate a schema for '{model}': {reason}")]
    Generation { model: String, reason: String },

    /// The schema is not a usable JSON Schema document.
    #[error("schema for '{model}' does not compile: {reason}")]
    Compile { model: String, reason: String },
}
