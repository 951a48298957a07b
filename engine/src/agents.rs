//! Prompts for the four LLM stages and the calls that send them.

use eda_providers::structured::parse_structured;
use eda_providers::{CompletionRequest, LanguageModel, ProviderError};
use eda_types::{
    AnalysisOutput, DatasetProfile, DomainVerdict, EdaStrategy, FocusArea, ProblemType,
    truncate_with_ellipsis,
};
use serde::de::DeserializeOwned;

const DOMAIN_EXPERT_SYSTEM: &str = "You are a domain expert who recognizes machine learning \
problems from a sample of a tabular dataset.";
const PROFILER_SYSTEM: &str = "You are a dataset profiler writing for data scientists.";
const STRATEGIST_SYSTEM: &str = "You are an exploratory data analysis specialist.";
const REPORTER_SYSTEM: &str = "You are an EDA report writer. Be concise and concrete.";

/// Serialize `value` for a prompt, capped at `budget` characters.
fn payload<T: serde::Serialize>(value: &T, budget: usize) -> String {
    let text = serde_json::to_string(value).unwrap_or_else(|_| "null".to_string());
    truncate_with_ellipsis(&text, budget)
}

#[must_use]
pub fn domain_expert_request(
    sample: &serde_json::Value,
    columns: &[String],
    budget: usize,
) -> CompletionRequest {
    let prompt = format!(
        r#"Analyze the dataset sample and column names. Identify the type of problem we are trying to solve ("regression", "classification", "clustering" or "unknown"), the target variable if it is not a clustering problem, and a confidence score for each problem type.

dataset_sample: {sample}
dataset_columns: {columns}

Respond with a JSON object with the following fields:
- problem_type: one of "regression", "classification", "clustering", "unknown"
- target_variable: the name of the target column, or null
- confidence_score_regression: float between 0 and 1
- confidence_score_classification: float between 0 and 1
- confidence_score_clustering: float between 0 and 1"#,
        sample = payload(sample, budget),
        columns = payload(&columns, budget),
    );
    CompletionRequest::json(prompt).with_system(DOMAIN_EXPERT_SYSTEM)
}

#[must_use]
pub fn profiling_report_request(profile: &DatasetProfile, budget: usize) -> CompletionRequest {
    let prompt = format!(
        "Write a detailed dataset profiling report based on the following basic EDA analysis. \
Cover size, data types, missing values, duplicates, constant columns, class balance and \
categorical cardinality where present.\n\nbasic_eda_analysis: {}",
        truncate_with_ellipsis(&profile.to_prompt_text(), budget)
    );
    CompletionRequest::text(prompt).with_system(PROFILER_SYSTEM)
}

#[must_use]
pub fn strategy_request(
    verdict: &DomainVerdict,
    profile: &DatasetProfile,
    budget: usize,
) -> CompletionRequest {
    let areas: Vec<&str> = FocusArea::ALL.iter().map(|a| a.as_str()).collect();
    let prompt = format!(
        "Generate an EDA strategy based on the following domain expertise and dataset profile.\n\n\
Respond with a JSON object with the following fields:\n\
- report: a detailed plan outlining the EDA approach\n\
- focus_areas: key areas to focus on, ordered by importance, each one of ({areas})\n\
- red_flags: potential issues or concerns to watch out for\n\
- analysis_to_run: specific analyses to conduct\n\
- analysis_to_skip: analyses that are unnecessary or too expensive\n\
- priority_order: priorities for the analyses\n\n\
domain_expertise: {verdict}\n\
dataset_profile: {profile}",
        areas = areas.join(", "),
        verdict = payload(verdict, budget),
        profile = truncate_with_ellipsis(&profile.to_prompt_text(), budget),
    );
    CompletionRequest::json(prompt).with_system(STRATEGIST_SYSTEM)
}

#[must_use]
pub fn report_request(
    problem_type: ProblemType,
    profile: &DatasetProfile,
    strategy: &EdaStrategy,
    findings: &AnalysisOutput,
    budget: usize,
) -> CompletionRequest {
    let prompt = format!(
        "Create a professional EDA report.\n\n\
problem_type: {problem_type}\n\
dataset_profile: {profile}\n\
eda_strategy: {strategy}\n\
analysis ({area}): {findings}\n\n\
Respond with a JSON object with:\n\
- report: a concise summary of the EDA findings\n\
- key_insights: main insights discovered\n\
- risks: potential risks identified\n\
- modeling_implications: impact on modeling\n\
- next_steps: recommended next steps",
        profile = truncate_with_ellipsis(&profile.to_prompt_text(), budget),
        strategy = payload(strategy, budget),
        area = findings.focus_area(),
        findings = payload(findings, budget),
    );
    CompletionRequest::json(prompt).with_system(REPORTER_SYSTEM)
}

/// Follow-up asking the model to fix a reply that did not parse.
#[must_use]
pub fn repair_request(original: &CompletionRequest, reply: &str, error: &str) -> CompletionRequest {
    let prompt = format!(
        "{}\n\nYour previous reply could not be used: {error}\n\
Previous reply:\n{reply}\n\n\
Return only the corrected JSON object.",
        original.prompt
    );
    CompletionRequest {
        prompt,
        ..original.clone()
    }
}

pub async fn ask_text<M: LanguageModel>(
    model: &M,
    request: CompletionRequest,
) -> Result<String, ProviderError> {
    Ok(model.complete(request).await?.text)
}

/// Send a JSON request, re-asking up to `repair_attempts` times when the
/// reply does not decode as `T`.
pub async fn ask_structured<M, T>(
    model: &M,
    request: CompletionRequest,
    repair_attempts: u32,
) -> Result<T, ProviderError>
where
    M: LanguageModel,
    T: DeserializeOwned,
{
    let mut next = request.clone();
    let mut attempt = 0;
    loop {
        let reply = model.complete(next).await?.text;
        match parse_structured::<T>(&reply) {
            Ok(value) => return Ok(value),
            Err(err) if attempt < repair_attempts => {
                attempt += 1;
                tracing::warn!(attempt, error = %err, "Structured reply did not parse, asking again");
                next = repair_request(&request, &reply, &err.to_string());
            }
            Err(err) => return Err(err),
        }
    }
}
