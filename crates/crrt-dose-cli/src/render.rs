//! Plain-text rendering of reports, presets and history.

use crrt_dose_core::{DoseReport, GuidelinePreset, Metric, StoredSnapshot};

/// Metrics, trace, warnings, dilution interpretation and range summary.
pub fn report(report: &DoseReport) -> String {
    let mut out = String::from("Results\n");
    for metric in Metric::ALL {
        let value = metric.format(report.results.get(metric));
        out.push_str(&format!(
            "  {:<24}{:>10} {}\n",
            metric.label(),
            value,
            metric.unit()
        ));
    }

    out.push_str("\nCalculation steps\n");
    for step in &report.steps {
        out.push_str(&format!("  {}\n", step.metric.label()));
        out.push_str(&format!("    {}\n", step.formula));
        out.push_str(&format!(
            "    {} = {} {}\n",
            step.substituted_expression,
            step.display_result(),
            step.unit
        ));
        if let Some(detail) = &step.detail {
            out.push_str(&format!("    {}\n", detail));
        }
        if let Some(note) = &step.note {
            out.push_str(&format!("    ({})\n", note));
        }
    }

    if !report.warnings.is_empty() {
        out.push_str("\nWarnings\n");
        for warning in &report.warnings {
            out.push_str(&format!(
                "  [{}] {}\n",
                warning.severity.heading(),
                warning.message
            ));
            if let Some(remediation) = &warning.remediation {
                out.push_str(&format!("    -> {}\n", remediation));
            }
        }
    }

    let interp = &report.interpretation;
    out.push_str(&format!(
        "\nDilution factor: {} [{}]\n",
        interp.title,
        interp.status.as_str()
    ));
    out.push_str(&format!("  {}\n", interp.description));
    out.push_str(&format!("  {}\n", interp.recommendation));
    if !interp.details.is_empty() {
        out.push_str(&format!("  {}\n", interp.details));
    }

    out.push_str("\nRecommended ranges\n");
    for range in &report.ranges {
        let mark = if range.in_range { "ok" } else { "out" };
        out.push_str(&format!(
            "  {:<24}{}-{} {} (current {:.2}) {}\n",
            range.name, range.min, range.max, range.unit, range.current, mark
        ));
    }

    out
}

pub fn presets(presets: &[GuidelinePreset]) -> String {
    let mut out = format!(
        "{:<8}{:>8}{:>8}{:>8}{:>8}{:>8}\n",
        "Band", "Weight", "BFR", "Pre", "Post", "Dial"
    );
    for p in presets {
        out.push_str(&format!(
            "{:<8}{:>8}{:>8}{:>8}{:>8}{:>8}\n",
            p.weight_band, p.weight, p.blood_flow_rate, p.pre_dilution, p.post_dilution, p.dialysate
        ));
    }
    out
}

pub fn history(snapshots: &[StoredSnapshot]) -> String {
    let mut out = String::new();
    for stored in snapshots {
        let results = &stored.snapshot.results;
        out.push_str(&format!(
            "{}  {}  dose {} mL/kg/hr  FF {}%  DF {}\n",
            stored.snapshot.timestamp,
            stored.snapshot_id,
            Metric::EffluentDose.format(results.effluent_dose),
            Metric::FiltrationFraction.format(results.filtration_fraction),
            Metric::DilutionFactor.format(results.dilution_factor),
        ));
    }
    out
}
