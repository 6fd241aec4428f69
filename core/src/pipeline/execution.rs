// cacao_checkout/src/pipeline/execution.rs

//! `Pipeline::run`: executes steps in order, phase by phase.

use crate::error::FlowError;
use crate::flow::control::{FlowOutcome, StepControl};
use crate::flow::data::FlowData;
use crate::pipeline::definition::{Phase, Pipeline};
use tracing::{event, instrument, span, Instrument, Level};

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Runs every step against `data`.
  ///
  /// Returns `Completed` when all steps ran, `Stopped` when a handler asked to stop,
  /// or the first handler error. A non-optional step without handlers fails with
  /// `FlowError::HandlerMissing` converted into `Err`.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(pipeline = %self.name, num_steps = self.steps.len()),
    err(Display)
  )]
  pub async fn run(&self, data: FlowData<TData>) -> Result<FlowOutcome, Err> {
    event!(Level::DEBUG, "Pipeline execution starting.");

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();
      let step_span = span!(
        Level::INFO,
        "pipeline_step",
        step_name,
        step_index = step_idx,
        optional = step_def.optional
      );

      if self.handler_count(step_name) == 0 {
        if step_def.optional {
          event!(parent: &step_span, Level::DEBUG, "Optional step has no handlers, skipping.");
          continue;
        }
        event!(parent: &step_span, Level::ERROR, "Non-optional step has no handlers.");
        return Err(Err::from(FlowError::HandlerMissing {
          step_name: step_def.name.clone(),
        }));
      }

      for phase in Phase::ALL {
        let control = self
          .run_phase(phase, step_name, &data)
          .instrument(step_span.clone())
          .await?;
        if control == StepControl::Stop {
          return Ok(FlowOutcome::Stopped);
        }
      }
      event!(parent: &step_span, Level::DEBUG, "Step finished.");
    }

    event!(Level::DEBUG, "Pipeline execution completed.");
    Ok(FlowOutcome::Completed)
  }

  async fn run_phase(&self, phase: Phase, step_name: &str, data: &FlowData<TData>) -> Result<StepControl, Err> {
    let Some(handlers) = self.handlers(phase).get(step_name) else {
      return Ok(StepControl::Continue);
    };

    for (handler_idx, handler_fn) in handlers.iter().enumerate() {
      let handler_span = span!(Level::DEBUG, "handler", phase = phase.as_str(), handler_index = handler_idx);
      match handler_fn(data.clone()).instrument(handler_span).await {
        Ok(StepControl::Continue) => {}
        Ok(StepControl::Stop) => {
          event!(Level::INFO, phase = phase.as_str(), "Pipeline stopped by a handler.");
          return Ok(StepControl::Stop);
        }
        Err(e) => {
          event!(Level::ERROR, phase = phase.as_str(), error = %e, "Handler failed.");
          return Err(e);
        }
      }
    }
    Ok(StepControl::Continue)
  }
}
