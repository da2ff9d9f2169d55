//! Text and JSON rendering of a finished compliance run

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use dlna_compliance::{Grade, SuiteReport, TestCategory, TestResult, TestStatus, TesterConfig};
use serde::Serialize;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const RED: &str = "\x1b[91m";
const GREEN: &str = "\x1b[92m";
const YELLOW: &str = "\x1b[93m";
const BLUE: &str = "\x1b[94m";
const CYAN: &str = "\x1b[96m";
const GRAY: &str = "\x1b[90m";

/// Longest message shown under a result row
const MESSAGE_WIDTH: usize = 60;

/// Rendering options, fixed for the lifetime of a renderer
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub use_colors: bool,
    /// Show the message of every result, not only FAIL and WARN
    pub verbose: bool,
}

/// Renders the console form of a run
pub struct TextRenderer {
    options: RenderOptions,
}

impl TextRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Title block printed before the run starts
    pub fn banner(&self, config: &TesterConfig, started: DateTime<Local>) -> String {
        let mut lines = vec![
            String::new(),
            self.header("DLNA/UPnP Media Server Compliance Tester"),
            format!(
                "Target: {}",
                self.format_with_color(&format!("{}:{}", config.host, config.port), BOLD)
            ),
            format!("Timeout: {}s", config.timeout.as_secs_f64()),
        ];
        if config.full_scan {
            lines.push(format!(
                "Mode: {} (max {} items)",
                self.format_with_color("Full Scan", YELLOW),
                config.max_items
            ));
        }
        lines.push(format!("Started: {}", started.format("%Y-%m-%d %H:%M:%S")));
        lines.push(String::new());
        lines.push("Running compliance tests...".to_string());
        lines.join("\n")
    }

    /// Device block, grouped results and the summary
    pub fn report(&self, report: &SuiteReport) -> String {
        let mut lines = Vec::new();

        if let Some(device) = &report.device {
            lines.push(String::new());
            lines.push(self.subheader("Device Information"));
            lines.push(format!(
                "  Name:         {}",
                self.format_with_color(&device.friendly_name, BOLD)
            ));
            lines.push(format!("  Manufacturer: {}", device.manufacturer));
            lines.push(format!("  Model:        {}", device.model_name));
            lines.push(format!("  Type:         {}", device.device_type));
        }

        lines.push(String::new());
        lines.push(self.subheader("Test Results"));
        for category in TestCategory::ALL {
            let results: Vec<&TestResult> = report.category(category).collect();
            if results.is_empty() {
                continue;
            }
            let passed = results.iter().filter(|r| r.passed()).count();
            lines.push(String::new());
            lines.push(format!(
                "  {} ({}/{} passed)",
                self.format_with_color(category.name(), BOLD),
                passed,
                results.len()
            ));
            for result in results {
                lines.extend(self.result_rows(result));
            }
        }

        lines.extend(self.summary(report));
        lines.join("\n")
    }

    fn result_rows(&self, result: &TestResult) -> Vec<String> {
        let color = status_color(result.status);
        let mut rows = vec![format!(
            "    {} {} {}",
            self.format_with_color(status_icon(result.status), color),
            self.format_with_color(&format!("[{}]", result.status), color),
            result.name
        )];

        if self.options.verbose || matches!(result.status, TestStatus::Fail | TestStatus::Warn) {
            rows.push(format!(
                "      {}",
                self.format_with_color(&clip_message(&result.message), GRAY)
            ));
        }
        rows
    }

    fn summary(&self, report: &SuiteReport) -> Vec<String> {
        let summary = &report.summary;
        let mut lines = vec![String::new(), self.header("Compliance Summary")];

        let stats: Vec<String> = [
            (summary.passed, "passed", GREEN),
            (summary.failed, "failed", RED),
            (summary.warned, "warnings", YELLOW),
            (summary.skipped, "skipped", GRAY),
        ]
        .into_iter()
        .filter(|(count, _, _)| *count > 0)
        .map(|(count, label, color)| self.format_with_color(&format!("{} {}", count, label), color))
        .collect();

        lines.push(format!("  Tests: {}", stats.join(", ")));
        lines.push(format!(
            "  Score: {:.1}/{:.1} ({:.1}%)",
            summary.score, summary.max_score, summary.percentage
        ));

        let grade = self.format_with_color(
            &format!("{:<2}", summary.grade.as_str()),
            &format!("{}{}", BOLD, grade_color(summary.grade)),
        );
        lines.push(String::new());
        lines.push("  ╔═══════════════════╗".to_string());
        lines.push(format!("  ║   GRADE: {}       ║", grade));
        lines.push("  ╚═══════════════════╝".to_string());

        lines.push(String::new());
        lines.push(self.format_with_color(
            &format!("  {}", interpretation(summary.grade)),
            grade_color(summary.grade),
        ));

        let critical: Vec<&TestResult> = report
            .results
            .iter()
            .filter(|r| r.status == TestStatus::Fail && r.weight >= 1.5)
            .collect();
        if !critical.is_empty() {
            lines.push(String::new());
            lines.push(self.format_with_color("  Critical issues:", &format!("{}{}", RED, BOLD)));
            for result in critical {
                lines.push(format!("    • {}: {}", result.name, result.message));
            }
        }

        lines.push(String::new());
        lines
    }

    /// Error line for a run that could not start
    pub fn error(&self, message: &str) -> String {
        self.format_with_color(&format!("Error: {}", message), RED)
    }

    fn header(&self, text: &str) -> String {
        self.format_with_color(&format!("═══ {} ═══", text), &format!("{}{}", BOLD, CYAN))
    }

    fn subheader(&self, text: &str) -> String {
        self.format_with_color(&format!("─── {} ───", text), BLUE)
    }

    fn format_with_color(&self, text: &str, color: &str) -> String {
        if self.options.use_colors {
            format!("{}{}{}", color, text, RESET)
        } else {
            text.to_string()
        }
    }
}

#[derive(Serialize)]
struct ErrorOutput<'a> {
    error: &'a str,
}

/// Pretty-printed JSON form of a report
pub fn render_json(report: &SuiteReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize report")
}

/// JSON object printed when the run could not start
pub fn render_json_error(message: &str) -> Result<String> {
    serde_json::to_string(&ErrorOutput { error: message }).context("Failed to serialize error")
}

fn status_icon(status: TestStatus) -> &'static str {
    match status {
        TestStatus::Pass => "✓",
        TestStatus::Fail => "✗",
        TestStatus::Warn => "⚠",
        TestStatus::Skip => "○",
    }
}

fn status_color(status: TestStatus) -> &'static str {
    match status {
        TestStatus::Pass => GREEN,
        TestStatus::Fail => RED,
        TestStatus::Warn => YELLOW,
        TestStatus::Skip => GRAY,
    }
}

fn grade_color(grade: Grade) -> &'static str {
    match grade {
        Grade::APlus | Grade::A => GREEN,
        Grade::BPlus | Grade::B => CYAN,
        Grade::CPlus | Grade::C => YELLOW,
        Grade::D | Grade::F => RED,
    }
}

fn interpretation(grade: Grade) -> &'static str {
    match grade {
        Grade::APlus | Grade::A => "Excellent! This server has strong DLNA compliance.",
        Grade::BPlus | Grade::B => "Good compliance with minor issues.",
        Grade::CPlus | Grade::C => "Acceptable compliance but with notable issues.",
        Grade::D | Grade::F => "Poor compliance. Major issues detected.",
    }
}

fn clip_message(message: &str) -> String {
    if message.chars().count() > MESSAGE_WIDTH {
        let mut clipped: String = message.chars().take(MESSAGE_WIDTH - 3).collect();
        clipped.push_str("...");
        clipped
    } else {
        message.to_string()
    }
}
