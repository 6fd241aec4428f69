// cacao_checkout/src/flow/step.rs

/// A named step in a pipeline.
///
/// An optional step with no handlers is skipped; a non-optional one is a setup error
/// reported as `FlowError::HandlerMissing` when the pipeline runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDef {
  pub name: String,
  pub optional: bool,
}

impl StepDef {
  pub fn new(name: impl Into<String>, optional: bool) -> Self {
    Self {
      name: name.into(),
      optional,
    }
  }
}
