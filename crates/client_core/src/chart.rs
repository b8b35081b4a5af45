//! Pie chart description for prediction probabilities and the single-slot
//! ownership of whatever instance a renderer produces from it.

use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use serde_json::{json, Value};
use shared::protocol::Probabilities;
use tracing::debug;

use crate::error::ChartError;

pub const CHART_CANVAS_ID: &str = "predictionChart";

pub const NOT_CANCELED_LABEL: &str = "Not Canceled";
pub const CANCELED_LABEL: &str = "Canceled";
pub const NOT_CANCELED_COLOR: &str = "#22c55e";
pub const CANCELED_COLOR: &str = "#ef4444";
const SLICE_BORDER_COLOR: &str = "rgba(255, 255, 255, 0.1)";
const SLICE_BORDER_WIDTH: u32 = 2;
const LEGEND_LABEL_COLOR: &str = "#94a3b8";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LegendPosition {
    Top,
    Bottom,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: &'static str,
    /// Percentage, 0..=100.
    pub value: f64,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieChartSpec {
    pub slices: Vec<PieSlice>,
    pub border_color: &'static str,
    pub border_width: u32,
    pub responsive: bool,
    pub legend_position: LegendPosition,
    pub legend_label_color: &'static str,
}

impl PieChartSpec {
    /// Two slices, not-canceled first, probabilities scaled to percentages.
    /// Inputs are used as given; nothing checks that they sum to one.
    pub fn for_probabilities(probabilities: &Probabilities) -> Self {
        Self {
            slices: vec![
                PieSlice {
                    label: NOT_CANCELED_LABEL,
                    value: probabilities.not_canceled * 100.0,
                    color: NOT_CANCELED_COLOR,
                },
                PieSlice {
                    label: CANCELED_LABEL,
                    value: probabilities.canceled * 100.0,
                    color: CANCELED_COLOR,
                },
            ],
            border_color: SLICE_BORDER_COLOR,
            border_width: SLICE_BORDER_WIDTH,
            responsive: true,
            legend_position: LegendPosition::Bottom,
            legend_label_color: LEGEND_LABEL_COLOR,
        }
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.slices.iter().map(|slice| slice.label).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.slices.iter().map(|slice| slice.value).collect()
    }

    pub fn tooltip_label(&self, index: usize) -> Option<String> {
        self.slices
            .get(index)
            .map(|slice| format!("{}: {:.1}%", slice.label, slice.value))
    }

    /// Configuration object in the shape a Chart.js-style pie renderer takes.
    /// Tooltip text is precomputed since callbacks cannot cross this boundary.
    pub fn chart_config(&self) -> Value {
        let tooltips: Vec<String> = (0..self.slices.len())
            .filter_map(|index| self.tooltip_label(index))
            .collect();
        json!({
            "type": "pie",
            "data": {
                "labels": self.labels(),
                "datasets": [{
                    "data": self.values(),
                    "backgroundColor": self.slices.iter().map(|slice| slice.color).collect::<Vec<_>>(),
                    "borderColor": self.border_color,
                    "borderWidth": self.border_width,
                }],
            },
            "options": {
                "responsive": self.responsive,
                "plugins": {
                    "legend": {
                        "position": self.legend_position,
                        "labels": { "color": self.legend_label_color },
                    },
                    "tooltip": { "labels": tooltips },
                },
            },
        })
    }
}

/// A live chart bound to a render target. Must be torn down explicitly.
pub trait ChartInstance: Send {
    fn destroy(self);
}

pub trait ChartRenderer: Send + Sync {
    type Instance: ChartInstance;

    fn create(&self, canvas_id: &str, spec: &PieChartSpec) -> Result<Self::Instance, ChartError>;
}

/// Holds at most one chart instance for a canvas.
pub struct ChartSlot<R: ChartRenderer> {
    renderer: R,
    canvas_id: String,
    live: Mutex<Option<R::Instance>>,
}

impl<R: ChartRenderer> ChartSlot<R> {
    pub fn new(renderer: R) -> Self {
        Self::with_canvas(renderer, CHART_CANVAS_ID)
    }

    pub fn with_canvas(renderer: R, canvas_id: impl Into<String>) -> Self {
        Self {
            renderer,
            canvas_id: canvas_id.into(),
            live: Mutex::new(None),
        }
    }

    pub fn is_live(&self) -> bool {
        self.lock().is_some()
    }

    /// Destroys the current instance, if any, and then creates a new one.
    /// When creation fails the slot is left empty.
    pub fn replace(&self, spec: &PieChartSpec) -> Result<(), ChartError> {
        let mut live = self.lock();
        if let Some(previous) = live.take() {
            debug!(canvas = %self.canvas_id, "destroying previous chart");
            previous.destroy();
        }
        *live = Some(self.renderer.create(&self.canvas_id, spec)?);
        Ok(())
    }

    pub fn clear(&self) {
        if let Some(previous) = self.lock().take() {
            previous.destroy();
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<R::Instance>> {
        self.live.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::*;

    #[derive(Default, Clone)]
    struct CountingRenderer {
        created: Arc<AtomicUsize>,
        destroyed: Arc<AtomicUsize>,
    }

    impl CountingRenderer {
        fn attached(&self) -> usize {
            self.created.load(Ordering::SeqCst) - self.destroyed.load(Ordering::SeqCst)
        }
    }

    struct CountingInstance {
        destroyed: Arc<AtomicUsize>,
    }

    impl ChartInstance for CountingInstance {
        fn destroy(self) {
            self.destroyed.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl ChartRenderer for CountingRenderer {
        type Instance = CountingInstance;

        fn create(
            &self,
            canvas_id: &str,
            _spec: &PieChartSpec,
        ) -> Result<CountingInstance, ChartError> {
            assert_eq!(canvas_id, CHART_CANVAS_ID);
            self.created.fetch_add(1, Ordering::SeqCst);
            Ok(CountingInstance {
                destroyed: self.destroyed.clone(),
            })
        }
    }

    fn sample() -> Probabilities {
        Probabilities {
            canceled: 0.82,
            not_canceled: 0.18,
        }
    }

    #[test]
    fn scales_probabilities_to_percent_with_fixed_order_and_colors() {
        let spec = PieChartSpec::for_probabilities(&sample());
        assert_eq!(spec.labels(), vec!["Not Canceled", "Canceled"]);
        let values = spec.values();
        assert!((values[0] - 18.0).abs() < 1e-9);
        assert!((values[1] - 82.0).abs() < 1e-9);
        assert_eq!(spec.slices[0].color, "#22c55e");
        assert_eq!(spec.slices[1].color, "#ef4444");
        assert_eq!(spec.legend_position, LegendPosition::Bottom);
    }

    #[test]
    fn tooltip_shows_one_decimal_place() {
        let spec = PieChartSpec::for_probabilities(&sample());
        assert_eq!(spec.tooltip_label(0).as_deref(), Some("Not Canceled: 18.0%"));
        assert_eq!(spec.tooltip_label(1).as_deref(), Some("Canceled: 82.0%"));
        assert_eq!(spec.tooltip_label(2), None);

        let spec = PieChartSpec::for_probabilities(&Probabilities {
            canceled: 0.33333,
            not_canceled: 0.66667,
        });
        assert_eq!(spec.tooltip_label(1).as_deref(), Some("Canceled: 33.3%"));
    }

    #[test]
    fn chart_config_matches_pie_layout() {
        let config = PieChartSpec::for_probabilities(&sample()).chart_config();
        assert_eq!(config["type"], "pie");
        assert_eq!(config["data"]["labels"][1], "Canceled");
        assert_eq!(config["data"]["datasets"][0]["backgroundColor"][0], "#22c55e");
        assert_eq!(config["data"]["datasets"][0]["borderWidth"], 2);
        assert_eq!(config["options"]["plugins"]["legend"]["position"], "bottom");
        assert_eq!(
            config["options"]["plugins"]["tooltip"]["labels"][0],
            "Not Canceled: 18.0%"
        );
    }

    #[test]
    fn replacing_twice_leaves_one_instance_attached() {
        let renderer = CountingRenderer::default();
        let slot = ChartSlot::new(renderer.clone());
        let spec = PieChartSpec::for_probabilities(&sample());

        assert!(!slot.is_live());
        slot.replace(&spec).expect("first render");
        slot.replace(&spec).expect("second render");

        assert!(slot.is_live());
        assert_eq!(renderer.created.load(Ordering::SeqCst), 2);
        assert_eq!(renderer.destroyed.load(Ordering::SeqCst), 1);
        assert_eq!(renderer.attached(), 1);

        slot.clear();
        assert!(!slot.is_live());
        assert_eq!(renderer.attached(), 0);
    }
}
