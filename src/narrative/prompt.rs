//! Prompt assembly for clinical interpretations.

use serde::Serialize;

/// Placeholder in the user query replaced by the plain-text summary table.
pub const SUMMARY_PLACEHOLDER: &str = "---SUMMARY_TEXT---";

/// A system instruction plus user query for one narrative request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NarrativePrompt {
    pub system: String,
    pub user: String,
}

impl NarrativePrompt {
    /// Prompt for a single metric compared across conditions.
    pub fn for_metric(metric: &str) -> Self {
        let system = format!(
            "You are a clinical expert in vestibular and balance disorders who interprets \
posturography results.
- The table summarizes ONE METRIC: {metric}, per test condition and per file.
- Give a short, clinically oriented interpretation.
- With two files, focus on the size and direction of the change.
- With more than two files, focus on the mean and the standard deviation.
- With one file, describe the values against typical expectations (e.g. high or low sway).
- Name the test conditions (e.g. \"NSEO\", \"PSEC Rt\") with the most notable findings.
- Be concise and professional. Do not make a diagnosis.
- Organize the answer as a summary, key findings and possible implications.
- Begin with the heading \"### Interpretation for {metric}\"."
        );

        let user = format!(
            "Below is a summary of posturography data for the metric \"{metric}\". \
Please give a clinical interpretation of this table.\n---\n{SUMMARY_PLACEHOLDER}\n---\n"
        );

        Self { system, user }
    }

    /// Prompt for the comprehensive profile of one test condition.
    pub fn for_condition(condition: &str) -> Self {
        let system = format!(
            "You are a clinical expert in vestibular and balance disorders who interprets \
posturography results.
- The table is a COMPREHENSIVE PROFILE of ONE TEST CONDITION: {condition}.
- It lists the ORIGINAL values of the selected key metrics for each file.
- Interpret the patient's overall performance under {condition}, comparing the files \
using only the metrics in the table.
- With two files, compare how the profile changed.
- With more than two files, comment on the average profile and its variability.
- With one file, comment on that single profile.
- Be concise and professional. Do not make a diagnosis.
- Organize the answer as a summary, key findings and possible implications for this condition.
- Begin with the heading \"### Comprehensive Interpretation for {condition}\"."
        );

        let user = format!(
            "Below is a summary of key posturography metrics for the test condition \
\"{condition}\". Please give a holistic clinical interpretation comparing the files \
using only these metrics.\n---\n{SUMMARY_PLACEHOLDER}\n---\n"
        );

        Self { system, user }
    }

    /// Substitute the summary table into the user query.
    pub fn with_summary(&self, summary: &str) -> Self {
        Self {
            system: self.system.clone(),
            user: self.user.replace(SUMMARY_PLACEHOLDER, summary),
        }
    }

    /// True once the summary has been substituted.
    pub fn is_filled(&self) -> bool {
        !self.user.contains(SUMMARY_PLACEHOLDER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_prompt() {
        let prompt = NarrativePrompt::for_metric("Sway Path Length");
        assert!(prompt.system.contains("### Interpretation for Sway Path Length"));
        assert!(prompt.user.contains("\"Sway Path Length\""));
        assert!(!prompt.is_filled());
    }

    #[test]
    fn test_condition_prompt() {
        let prompt = NarrativePrompt::for_condition("FEC Rt");
        assert!(prompt.system.contains("### Comprehensive Interpretation for FEC Rt"));
        assert!(prompt.user.contains(SUMMARY_PLACEHOLDER));
    }

    #[test]
    fn test_summary_substitution() {
        let prompt = NarrativePrompt::for_metric("Stability Score").with_summary("NSEO  90  95");

        assert!(prompt.is_filled());
        assert!(prompt.user.contains("---\nNSEO  90  95\n---"));
        assert_eq!(prompt.system, NarrativePrompt::for_metric("Stability Score").system);
    }
}
