//! Output formatting for route and listing rendering.
//!
//! This module provides formatters for rendering route summaries and
//! nearest-pharmacy listings in various output formats.

use std::io::{self, Write};

use clap::ValueEnum;
use serde::Serialize;

use pharmaroute_lib::output::{render_listing, CandidateListing};
use pharmaroute_lib::{format_distance, Maneuver, RenderMode, RouteStep, RouteSummary};

use crate::terminal::{format_with_separators, ColorPalette};

/// Output format selected with `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text.
    #[default]
    Text,
    /// Markdown-flavoured text.
    Rich,
    /// Colored tags and step details.
    Enhanced,
    /// Pretty-printed JSON.
    Json,
}

/// Print the footer with elapsed time.
pub fn print_footer(elapsed: std::time::Duration) {
    let palette = ColorPalette::detect();
    let elapsed_ms = elapsed.as_millis();
    let time_str = if elapsed_ms < 1000 {
        format!("{}ms", elapsed_ms)
    } else {
        format!("{:.2}s", elapsed.as_secs_f64())
    };

    println!("\n{}Completed in {}{}", palette.gray, time_str, palette.reset);
}

/// Render a route summary in the requested format.
///
/// # Errors
///
/// Returns an error if JSON serialization or writing fails.
pub fn render_route(summary: &RouteSummary, format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Text => print!("{}", summary.render(RenderMode::PlainText)),
        OutputFormat::Rich => print!("{}", summary.render(RenderMode::RichText)),
        OutputFormat::Enhanced => EnhancedRenderer::new(ColorPalette::detect()).render(summary),
        OutputFormat::Json => render_json(summary)?,
    }
    Ok(())
}

/// Render the nearest-pharmacy listing in the requested format.
///
/// # Errors
///
/// Returns an error if JSON serialization or writing fails.
pub fn render_nearest(listing: &[CandidateListing], format: OutputFormat) -> io::Result<()> {
    if format == OutputFormat::Json {
        return render_json(listing);
    }
    if listing.is_empty() {
        println!("No pharmacy found nearby.");
        return Ok(());
    }
    print!("{}", render_listing(listing));
    Ok(())
}

/// Render any serializable value as pretty JSON on stdout.
///
/// # Errors
///
/// Returns an error if JSON serialization or writing fails.
pub fn render_json<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer_pretty(&mut stdout, value).map_err(io::Error::other)?;
    stdout.write_all(b"\n")?;
    Ok(())
}

/// Renderer for enhanced output format with colored tags.
pub struct EnhancedRenderer {
    palette: ColorPalette,
}

impl EnhancedRenderer {
    /// Create a new enhanced renderer with the given color palette.
    #[must_use]
    pub const fn new(palette: ColorPalette) -> Self {
        Self { palette }
    }

    /// Render a route summary.
    pub fn render(&self, summary: &RouteSummary) {
        print!("{}", self.format(summary));
    }

    /// Build the enhanced text for a route summary.
    pub fn format(&self, summary: &RouteSummary) -> String {
        let p = &self.palette;
        let mut lines = vec![format!(
            "Route to {}{}{} ({}, algorithm: {}):",
            p.white_bold,
            summary.destination.name,
            p.reset,
            format_distance(summary.total_distance_m),
            summary.algorithm
        )];

        if let Some(warning) = summary.warning() {
            let color = if summary.navigable { p.yellow } else { p.red };
            lines.push(format!("{}! {}{}", color, warning, p.reset));
        }

        for step in &summary.steps {
            lines.push(self.format_step(step));
        }

        lines.push(format!(
            "\n{}Total distance:{} {} m over {} waypoints",
            p.gray,
            p.reset,
            format_with_separators(summary.total_distance_m.round() as u64),
            summary.waypoint_count
        ));
        lines.push(format!(
            "{}Estimated time:{} {} min",
            p.gray,
            p.reset,
            (summary.estimated_duration_s / 60.0).round() as u64
        ));

        let mut text = lines.join("\n");
        text.push('\n');
        text
    }

    fn format_step(&self, step: &RouteStep) -> String {
        let p = &self.palette;
        let (tag_color, tag_text) = self.step_tag(step);
        if step.distance_m > 0.0 {
            format!(
                "{}{}{} {} {}({}){}",
                tag_color,
                tag_text,
                p.reset,
                step.instruction,
                p.green,
                format_distance(step.distance_m),
                p.reset
            )
        } else {
            format!("{}{}{} {}", tag_color, tag_text, p.reset, step.instruction)
        }
    }

    fn step_tag(&self, step: &RouteStep) -> (&str, &str) {
        let p = &self.palette;
        match step.maneuver {
            Maneuver::Depart => (p.tag_depart, " HEAD "),
            Maneuver::Arrive => (p.tag_arrive, " DEST "),
            Maneuver::Continue => (p.gray, " ---- "),
            _ => (p.tag_turn, " TURN "),
        }
    }
}
