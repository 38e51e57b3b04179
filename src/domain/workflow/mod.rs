//! Workflow definitions: ordered step specs plus metadata.

pub mod entity;
pub mod error;
pub mod repository;
pub mod step;

pub use entity::{Persona, Workflow, WorkflowId};
pub use error::WorkflowError;
pub use repository::WorkflowRepository;
pub use step::{
    PromptStep, StepSpec, TransformFunction, TransformStep, ValidateStep, ValidationRule,
};
