use std::sync::{Mutex, MutexGuard};

use shared::protocol::{Prediction, PredictionOutcome, Probabilities};
use tracing::{error, info, warn};

pub mod chart;
pub mod error;
pub mod transport;
pub mod view;

pub use chart::{ChartInstance, ChartRenderer, ChartSlot, PieChartSpec};
pub use error::{ChartError, SubmitError, TransportError};
pub use transport::{HttpTransport, PredictionTransport};
pub use view::{SubmissionView, SubmitEvent};

use view::{SUBMITTING_LABEL, SUBMIT_LABEL, TRANSPORT_ALERT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiState {
    #[default]
    Idle,
    Submitting,
}

/// Drives one prediction request per form submission and owns the chart
/// shown for the latest successful result.
pub struct SubmissionController<T, V, R: ChartRenderer> {
    transport: T,
    view: V,
    chart: ChartSlot<R>,
    state: Mutex<UiState>,
}

impl<T, V, R> SubmissionController<T, V, R>
where
    T: PredictionTransport,
    V: SubmissionView,
    R: ChartRenderer,
{
    pub fn new(transport: T, view: V, renderer: R) -> Self {
        Self {
            transport,
            view,
            chart: ChartSlot::new(renderer),
            state: Mutex::new(UiState::Idle),
        }
    }

    pub fn state(&self) -> UiState {
        *lock_state(&self.state)
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn chart(&self) -> &ChartSlot<R> {
        &self.chart
    }

    /// Handles a form submission end to end.
    ///
    /// Failures are shown to the user through [`SubmissionView::alert`] before
    /// they are returned. A submission arriving while another is in flight is
    /// turned away with [`SubmitError::Busy`] and leaves the view alone.
    pub async fn on_submit(&self, event: &mut SubmitEvent) -> Result<Prediction, SubmitError> {
        event.prevent_default();
        let _submission = self.begin_submission()?;

        let outcome = match self.transport.predict(&event.fields).await {
            Ok(response) => response.into_outcome().map_err(TransportError::from),
            Err(err) => Err(err),
        };

        match outcome {
            Ok(PredictionOutcome::Accepted(prediction)) => {
                info!(
                    prediction = %prediction.label,
                    canceled = prediction.probabilities.canceled,
                    not_canceled = prediction.probabilities.not_canceled,
                    "prediction received"
                );
                match self.show_prediction(&prediction) {
                    Ok(()) => Ok(prediction),
                    Err(err) => {
                        error!(error = %err, form_id = %event.form_id, "failed to render prediction chart");
                        self.view.alert(TRANSPORT_ALERT);
                        Err(SubmitError::Chart(err))
                    }
                }
            }
            Ok(PredictionOutcome::Rejected { error }) => {
                warn!(%error, "prediction rejected by server");
                self.view.alert(&format!("Error: {error}"));
                Err(SubmitError::Validation(error))
            }
            Err(err) => {
                error!(error = %err, form_id = %event.form_id, "prediction request failed");
                self.view.alert(TRANSPORT_ALERT);
                Err(SubmitError::Transport(err))
            }
        }
    }

    /// Replaces the current chart with one built from `probabilities`.
    /// On failure the slot is left empty.
    pub fn render_chart(&self, probabilities: &Probabilities) -> Result<(), ChartError> {
        self.chart
            .replace(&PieChartSpec::for_probabilities(probabilities))
    }

    /// The result text stays revealed when the chart fails; the scroll is
    /// skipped.
    fn show_prediction(&self, prediction: &Prediction) -> Result<(), ChartError> {
        self.view.reveal_result();
        self.view.set_prediction(&prediction.label, prediction.style());
        self.render_chart(&prediction.probabilities)?;
        self.view.scroll_result_into_view();
        Ok(())
    }

    fn begin_submission(&self) -> Result<SubmissionGuard<'_, V>, SubmitError> {
        {
            let mut state = lock_state(&self.state);
            if *state == UiState::Submitting {
                warn!("ignoring submit while a prediction is in flight");
                return Err(SubmitError::Busy);
            }
            *state = UiState::Submitting;
        }

        self.view.set_submit_enabled(false);
        self.view.set_loader_visible(true);
        self.view.set_submit_label(SUBMITTING_LABEL);

        Ok(SubmissionGuard {
            state: &self.state,
            view: &self.view,
        })
    }
}

/// Restores the idle UI when a submission ends, however it ends.
struct SubmissionGuard<'a, V: SubmissionView> {
    state: &'a Mutex<UiState>,
    view: &'a V,
}

impl<V: SubmissionView> Drop for SubmissionGuard<'_, V> {
    fn drop(&mut self) {
        *lock_state(self.state) = UiState::Idle;
        self.view.set_submit_enabled(true);
        self.view.set_loader_visible(false);
        self.view.set_submit_label(SUBMIT_LABEL);
    }
}

fn lock_state(state: &Mutex<UiState>) -> MutexGuard<'_, UiState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
