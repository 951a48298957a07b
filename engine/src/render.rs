//! Human and machine renderings of a finished run.

use std::fmt::Write as _;

use eda_types::{
    AnalysisOutput, DatasetProfile, DomainVerdict, EdaStrategy, FeatureRanking, ProblemType,
};

use crate::pipeline::PipelineRun;

const STRONGEST_PAIRS: usize = 10;

/// Pretty JSON of the whole run, partial state included.
pub fn json(run: &PipelineRun) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(run)
}

/// Markdown report. Sections appear only for the stages that produced
/// something.
#[must_use]
pub fn markdown(run: &PipelineRun) -> String {
    let mut out = String::from("# EDA Report\n\n");

    if let Some(problem_type) = run.problem_type {
        let _ = writeln!(out, "- **Problem type:** {problem_type}");
    }
    if let Some(target) = &run.target {
        let _ = writeln!(out, "- **Target:** `{target}`");
    }
    if let Some(verdict) = run.state.domain_expert() {
        confidence_line(&mut out, verdict);
    }
    if let Some(area) = run.focus_area {
        let _ = writeln!(out, "- **Analysis:** {area}");
    }
    let path: Vec<&str> = run.visited.iter().map(|node| node.as_str()).collect();
    let _ = writeln!(out, "- **Path:** {}\n", path.join(" → "));

    if let Some(error) = &run.error {
        let _ = writeln!(out, "> **Run failed:** {error}\n");
    }

    if let Some(report) = run.state.eda_report().filter(|report| !report.is_empty()) {
        if !report.report.trim().is_empty() {
            let _ = writeln!(out, "## Summary\n\n{}\n", report.report.trim());
        }
        bullet_section(&mut out, "Key insights", &report.key_insights);
        bullet_section(&mut out, "Risks", &report.risks);
        bullet_section(&mut out, "Modeling implications", &report.modeling_implications);
        bullet_section(&mut out, "Next steps", &report.next_steps);
    }

    if let Some(profile) = run.state.dataset_profiler() {
        profile_section(&mut out, profile);
    }
    if let Some(narrative) = run.state.profiling_report() {
        let _ = writeln!(out, "## Profiling narrative\n\n{}\n", narrative.trim());
    }
    if let Some(strategy) = run.state.eda_strategy() {
        strategy_section(&mut out, strategy);
    }
    if let Some(output) = run.state.eda_executor() {
        analysis_section(&mut out, output);
    }

    out.truncate(out.trim_end().len());
    out.push('\n');
    out
}

/// Markdown for an offline profile, with no LLM stages behind it.
#[must_use]
pub fn profile_markdown(profile: &DatasetProfile, output: Option<&AnalysisOutput>) -> String {
    let mut out = String::from("# Dataset Profile\n\n");
    profile_section(&mut out, profile);
    if let Some(output) = output {
        analysis_section(&mut out, output);
    }
    out.truncate(out.trim_end().len());
    out.push('\n');
    out
}

fn confidence_line(out: &mut String, verdict: &DomainVerdict) {
    let scores: Vec<String> = [
        ProblemType::Regression,
        ProblemType::Classification,
        ProblemType::Clustering,
    ]
    .into_iter()
    .filter_map(|kind| verdict.confidence(kind).map(|c| format!("{kind} {c:.2}")))
    .collect();
    if !scores.is_empty() {
        let _ = writeln!(out, "- **Confidence:** {}", scores.join(", "));
    }
}

fn bullet_section(out: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "## {title}\n");
    for item in items {
        let _ = writeln!(out, "- {item}");
    }
    out.push('\n');
}

fn profile_section(out: &mut String, profile: &DatasetProfile) {
    let _ = writeln!(out, "## Dataset profile\n");
    let _ = writeln!(
        out,
        "- {} rows × {} columns, {} missing cells",
        profile.rows(),
        profile.columns(),
        profile.total_missing()
    );
    let _ = writeln!(out, "- Duplicate rows: {}", profile.duplicate_rows.len());
    list_line(out, "Duplicate columns", &profile.duplicate_columns);
    list_line(out, "Constant columns", &profile.constant_columns);
    list_line(out, "Numeric features", &profile.numeric_columns);
    list_line(out, "Categorical features", &profile.categorical_columns);
    if let Some(classes) = &profile.class_imbalance {
        let counts: Vec<String> = classes.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        let _ = writeln!(out, "- Class balance: {}", counts.join(", "));
    }
    out.push('\n');
}

fn list_line(out: &mut String, label: &str, items: &[String]) {
    let value = if items.is_empty() {
        "none".to_string()
    } else {
        items.iter().map(|c| format!("`{c}`")).collect::<Vec<_>>().join(", ")
    };
    let _ = writeln!(out, "- {label}: {value}");
}

fn strategy_section(out: &mut String, strategy: &EdaStrategy) {
    let _ = writeln!(out, "## Strategy\n");
    if !strategy.report.trim().is_empty() {
        let _ = writeln!(out, "{}\n", strategy.report.trim());
    }
    if !strategy.focus_areas.is_empty() {
        let _ = writeln!(out, "Focus areas: {}\n", strategy.focus_areas.join(", "));
    }
    bullet_section(out, "Red flags", &strategy.red_flags);
}

fn analysis_section(out: &mut String, output: &AnalysisOutput) {
    let _ = writeln!(out, "## Analysis: {}\n", output.focus_area());
    match output {
        AnalysisOutput::Descriptive(summaries) => {
            out.push_str("| column | count | mean | std | min | 25% | 50% | 75% | max |\n");
            out.push_str("|---|---|---|---|---|---|---|---|---|\n");
            for s in summaries {
                let _ = writeln!(
                    out,
                    "| {} | {} | {} | {} | {} | {} | {} | {} | {} |",
                    s.column,
                    s.count,
                    num(s.mean),
                    num(s.std),
                    num(s.min),
                    num(s.q25),
                    num(s.median),
                    num(s.q75),
                    num(s.max)
                );
            }
        }
        AnalysisOutput::Correlation(matrix) => {
            let pairs = matrix.strongest_pairs(STRONGEST_PAIRS);
            if pairs.is_empty() {
                out.push_str("No defined correlations.\n");
            }
            for (a, b, r) in pairs {
                let _ = writeln!(out, "- `{a}` ~ `{b}`: {r:.3}");
            }
        }
        AnalysisOutput::Outliers(columns) => {
            if columns.is_empty() {
                out.push_str("No numeric features to check.\n");
            }
            for c in columns {
                let _ = writeln!(
                    out,
                    "- `{}`: {} outliers outside [{:.3}, {:.3}]",
                    c.column,
                    c.count(),
                    c.lower_bound,
                    c.upper_bound
                );
            }
        }
        AnalysisOutput::FeatureRanking(FeatureRanking::Ranked { scores }) => {
            for (rank, score) in scores.iter().enumerate() {
                let _ = writeln!(out, "{}. `{}`: {:.4}", rank + 1, score.feature, score.score);
            }
        }
        AnalysisOutput::FeatureRanking(FeatureRanking::NotApplicable { reason }) => {
            let _ = writeln!(out, "{reason}");
        }
    }
    out.push('\n');
}

fn num(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.3}"))
}
