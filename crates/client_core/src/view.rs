//! The page surface a submission drives. Implementations own the widgets;
//! the controller only toggles them.

use shared::protocol::{FormInput, PredictionStyle};

pub const FORM_ID: &str = "prediction-form";

pub const SUBMIT_LABEL: &str = "Predict Status";
pub const SUBMITTING_LABEL: &str = "Processing...";
pub const TRANSPORT_ALERT: &str = "An error occurred while connecting to the server.";

pub trait SubmissionView: Send + Sync {
    fn set_submit_enabled(&self, enabled: bool);
    fn set_submit_label(&self, label: &str);
    fn set_loader_visible(&self, visible: bool);
    fn reveal_result(&self);
    fn set_prediction(&self, text: &str, style: PredictionStyle);
    /// Brings the result region into view with a smooth scroll.
    fn scroll_result_into_view(&self);
    /// Blocking, user-facing message.
    fn alert(&self, message: &str);
}

/// A form submission as delivered by the view's event source.
#[derive(Debug, Clone)]
pub struct SubmitEvent {
    pub form_id: String,
    pub fields: FormInput,
    default_prevented: bool,
}

impl SubmitEvent {
    pub fn new(fields: FormInput) -> Self {
        Self {
            form_id: FORM_ID.to_string(),
            fields,
            default_prevented: false,
        }
    }

    /// Stops the host from performing its own form navigation.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}
