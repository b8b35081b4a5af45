//! Terminal rendition of the prediction page: the result region and chart go
//! to stdout, alerts to stderr.

use std::{
    io::{self, Write},
    sync::{Arc, Mutex},
};

use client_core::{
    chart::PieChartSpec, ChartError, ChartInstance, ChartRenderer, SubmissionView,
};
use shared::protocol::PredictionStyle;
use tracing::{debug, warn};

pub type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

pub fn shared_writer(writer: impl Write + Send + 'static) -> SharedWriter {
    Arc::new(Mutex::new(Box::new(writer)))
}

fn write_line(writer: &SharedWriter, line: &str) -> io::Result<()> {
    let mut writer = writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    writeln!(writer, "{line}")?;
    writer.flush()
}

pub struct TerminalView {
    out: SharedWriter,
    err: SharedWriter,
}

impl TerminalView {
    pub fn new(out: SharedWriter, err: SharedWriter) -> Self {
        Self { out, err }
    }

    /// View updates cannot fail upward; a broken stream is logged and skipped.
    fn emit(&self, writer: &SharedWriter, stream: &'static str, line: &str) {
        if let Err(error) = write_line(writer, line) {
            warn!(stream, %error, "failed to write to terminal");
        }
    }
}

impl SubmissionView for TerminalView {
    fn set_submit_enabled(&self, enabled: bool) {
        debug!(enabled, "submit control");
    }

    fn set_submit_label(&self, label: &str) {
        debug!(label, "submit label");
    }

    fn set_loader_visible(&self, visible: bool) {
        if visible {
            self.emit(&self.err, "stderr", "Processing...");
        }
    }

    fn reveal_result(&self) {
        self.emit(&self.out, "stdout", "Prediction result");
    }

    fn set_prediction(&self, text: &str, style: PredictionStyle) {
        self.emit(
            &self.out,
            "stdout",
            &format!("  {text} [{}]", style.css_class()),
        );
    }

    fn scroll_result_into_view(&self) {
        debug!("scroll result into view");
    }

    fn alert(&self, message: &str) {
        self.emit(&self.err, "stderr", message);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ChartFormat {
    #[default]
    Bars,
    Json,
}

const BAR_WIDTH: usize = 40;

pub struct TerminalChartRenderer {
    out: SharedWriter,
    format: ChartFormat,
}

impl TerminalChartRenderer {
    pub fn new(out: SharedWriter, format: ChartFormat) -> Self {
        Self { out, format }
    }
}

pub struct TerminalChart {
    canvas_id: String,
}

impl ChartInstance for TerminalChart {
    fn destroy(self) {
        debug!(canvas = %self.canvas_id, "chart destroyed");
    }
}

impl ChartRenderer for TerminalChartRenderer {
    type Instance = TerminalChart;

    fn create(&self, canvas_id: &str, spec: &PieChartSpec) -> Result<TerminalChart, ChartError> {
        let lines = match self.format {
            ChartFormat::Bars => bar_lines(spec),
            ChartFormat::Json => vec![serde_json::to_string_pretty(&spec.chart_config())
                .map_err(|err| ChartError::Render(err.to_string()))?],
        };
        for line in lines {
            write_line(&self.out, &line).map_err(|err| ChartError::Render(err.to_string()))?;
        }
        Ok(TerminalChart {
            canvas_id: canvas_id.to_string(),
        })
    }
}

/// One proportional bar per slice, legend text below, matching the pie's
/// bottom legend.
fn bar_lines(spec: &PieChartSpec) -> Vec<String> {
    let mut lines: Vec<String> = spec
        .slices
        .iter()
        .map(|slice| format!("  {} {}", bar(slice.value), slice.label))
        .collect();
    lines.extend((0..spec.slices.len()).filter_map(|index| {
        spec.tooltip_label(index).map(|label| format!("  - {label}"))
    }));
    lines
}

fn bar(percent: f64) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}
