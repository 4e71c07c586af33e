//! Report Rendering
//!
//! Plain-text presentation of an [`AnalysisReport`] and of every controller
//! phase, for terminal output.

use std::fmt::Write;

use rand::Rng;

use crate::models::report::AnalysisReport;
use crate::state::{AnalysisPhase, AnalysisState};

/// Features shown on the hero card
const HERO_FEATURES: usize = 3;

const ACCURACY_DISCLAIMER: &str = "This automated report relies on visual analysis of a single \
photograph. Accuracy depends on lighting conditions and optical resolution of the captured image.";

/// Random record number below one million
pub fn new_record_id() -> u32 {
    rand::thread_rng().gen_range(0..1_000_000)
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{}", "-".repeat(title.len()));
}

fn bullets(out: &mut String, items: &[String]) {
    if items.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for item in items {
        let _ = writeln!(out, "  - {}", item);
    }
}

/// Render a resolved report
pub fn render_report(report: &AnalysisReport, record_id: u32) -> String {
    let mut out = String::new();
    let id = &report.identification;

    let origin = if id.origin.trim().is_empty() {
        "Unknown Origin"
    } else {
        id.origin.as_str()
    };

    let _ = writeln!(out, "{}", id.primary);
    let _ = writeln!(
        out,
        "Confidence: {}% ({})",
        id.confidence,
        report.confidence_label()
    );
    let _ = writeln!(out, "{}", origin);
    for feature in report.headline_features(HERO_FEATURES) {
        let _ = writeln!(out, "  * {}", feature);
    }

    let visual = &report.visual_evaluation;
    section(&mut out, "Optical Evaluation");
    let _ = writeln!(out, "  Color Palette:       {}", visual.color);
    let _ = writeln!(out, "  Clarity State:       {}", visual.clarity);
    let _ = writeln!(out, "  Architecture (Cut):  {}", visual.cut);

    section(&mut out, "Market Appraisal");
    let _ = writeln!(out, "  Estimated Value Range: {}", report.valuation.price_range);
    let _ = writeln!(out, "  {}", report.valuation.factors);
    let _ = writeln!(out, "  Confusable Simulants:");
    bullets(&mut out, &id.simulants);

    section(&mut out, "Laboratory Directives");
    bullets(&mut out, &report.recommendations);

    section(&mut out, "Expert Disclaimers");
    bullets(&mut out, &report.warnings);
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", ACCURACY_DISCLAIMER);

    let _ = writeln!(out);
    let _ = writeln!(out, "Official Analysis Record #GE-{}", record_id);
    out
}

/// Render whatever the controller currently shows
pub fn render_state(state: &AnalysisState, record_id: u32) -> String {
    match state.phase() {
        AnalysisPhase::Idle => "Drop specimen image to begin analysis.\n".to_string(),
        AnalysisPhase::Staged => match &state.image {
            Some(image) => format!(
                "Specimen staged ({}, {} bytes). Awaiting verification.\n",
                image.mime_type,
                image.byte_len()
            ),
            None => String::new(),
        },
        AnalysisPhase::Analyzing => {
            "Scanning lattice structure... refracting light and evaluating purity.\n".to_string()
        }
        AnalysisPhase::Resolved => match &state.result {
            Some(report) => render_report(report, record_id),
            None => String::new(),
        },
        AnalysisPhase::Failed => format!(
            "Analysis Failed\n{}\n",
            state.error.as_deref().unwrap_or_default()
        ),
    }
}
