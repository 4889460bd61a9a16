//! Final report synthesis from a completed [`PipelineState`].
//!
//! Synthesis is a pure function of the state: no external calls, no mutation.
//!
//! ## Extraction contract
//!
//! - **Report**: a title line, then one `## N. <title>` section per stage in
//!   execution order, each holding that stage's cleaned text.
//! - **Summary**: the first paragraph of the Competitor Profiling output and
//!   the first paragraph of the Strategy Recommendations output, each capped
//!   at [`SUMMARY_PART_LIMIT`] characters.
//! - **Key insights**: the list items of the Competitive Advantage Analysis
//!   output; when it has none, its non-heading lines. A candidate longer
//!   than [`MAX_INSIGHT_CHARS`] is cut to its first sentence, and dropped if
//!   that is still too long. Duplicates are dropped and at most
//!   [`MAX_KEY_INSIGHTS`] are returned. No candidates yields an empty list.

use crate::parsing::{clean_emphasis, is_heading};
use crate::{AnalysisResult, PipelineState, StageId, StagePayload, StateError};

/// Maximum number of key insights returned.
pub const MAX_KEY_INSIGHTS: usize = 5;

/// Longest key insight kept, in characters.
pub const MAX_INSIGHT_CHARS: usize = 150;

/// Maximum characters taken from each summary source.
pub const SUMMARY_PART_LIMIT: usize = 400;

/// Builds the caller-facing [`AnalysisResult`] from a fully succeeded run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportSynthesizer;

impl ReportSynthesizer {
    /// Synthesizes the report, summary and key insights.
    ///
    /// Fails with [`StateError::Incomplete`] unless every stage has succeeded.
    pub fn synthesize(&self, state: &PipelineState) -> Result<AnalysisResult, StateError> {
        if let Some(pending) = state.first_unfinished() {
            return Err(StateError::Incomplete { pending });
        }
        let profile = required(state, StageId::CompetitorProfiling)?;
        let strategy = required(state, StageId::StrategyRecommendations)?;
        let advantage = required(state, StageId::CompetitiveAdvantageAnalysis)?;

        let result = AnalysisResult {
            report: render_report(state),
            analysis_summary: summarize(state, profile, strategy),
            key_insights: key_insights(advantage),
        };
        tracing::debug!(
            run_id = %state.run_id(),
            report_len = result.report.len(),
            key_insights = result.key_insights.len(),
            "Report synthesized"
        );
        Ok(result)
    }
}

fn required(state: &PipelineState, stage: StageId) -> Result<&StagePayload, StateError> {
    state
        .output(stage)
        .ok_or(StateError::Incomplete { pending: stage })
}

fn render_report(state: &PipelineState) -> String {
    let inputs = state.inputs();
    let mut report = format!(
        "# Social Media Competitor Analysis: {} for {} ({} industry)\n",
        inputs.competitor, inputs.company, inputs.industry
    );
    for (position, (stage, payload)) in state.outputs().enumerate() {
        report.push_str(&format!(
            "\n## {}. {}\n\n{}\n",
            position + 1,
            stage.title(),
            payload.text
        ));
    }
    report
}

fn summarize(state: &PipelineState, profile: &StagePayload, strategy: &StagePayload) -> String {
    let inputs = state.inputs();
    format!(
        "Competitor profile of {} for {} in the {} industry: {} Recommended strategy: {}",
        inputs.competitor,
        inputs.company,
        inputs.industry,
        condense(first_paragraph(&profile.text)),
        condense(first_paragraph(&strategy.text)),
    )
}

/// First block of consecutive non-heading lines, joined with spaces.
fn first_paragraph(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .skip_while(|line| line.is_empty() || is_heading(line))
        .take_while(|line| !line.is_empty() && !is_heading(line))
        .collect::<Vec<_>>()
        .join(" ")
}

fn condense(paragraph: String) -> String {
    match paragraph.char_indices().nth(SUMMARY_PART_LIMIT) {
        Some((cut, _)) => format!("{}…", paragraph[..cut].trim_end()),
        None => paragraph,
    }
}

fn key_insights(advantage: &StagePayload) -> Vec<String> {
    let candidates: Vec<String> = if advantage.highlights.is_empty() {
        advantage
            .text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !is_heading(line))
            .map(clean_emphasis)
            .collect()
    } else {
        advantage.highlights.clone()
    };

    let mut insights: Vec<String> = Vec::with_capacity(MAX_KEY_INSIGHTS);
    for candidate in candidates.into_iter().filter_map(shorten) {
        if insights.contains(&candidate) {
            continue;
        }
        insights.push(candidate);
        if insights.len() == MAX_KEY_INSIGHTS {
            break;
        }
    }
    insights
}

/// Keeps short candidates; longer ones are reduced to their first sentence.
fn shorten(candidate: String) -> Option<String> {
    let short = |s: &str| !s.is_empty() && s.chars().count() <= MAX_INSIGHT_CHARS;
    if short(&candidate) {
        return Some(candidate);
    }
    let end = candidate
        .match_indices(['.', '!', '?'])
        .map(|(at, _)| at + 1)
        .find(|&at| candidate[at..].starts_with(' ') || at == candidate.len())?;
    let sentence = candidate[..end].trim();
    short(sentence).then(|| sentence.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::parse_findings;
    use crate::{AnalysisInputs, AnalysisRequest, RunId, StageResult};

    fn completed(text_for: impl Fn(StageId) -> String) -> PipelineState {
        let inputs =
            AnalysisInputs::try_from(&AnalysisRequest::new("Acme", "retail", "Globex")).unwrap();
        let mut state = PipelineState::new(RunId::new_random(), inputs);
        for stage in StageId::ALL {
            state.mark_running(stage, stage.predecessors()).unwrap();
            let payload = parse_findings(&text_for(stage)).unwrap();
            state.commit(StageResult { stage, payload }).unwrap();
        }
        state
    }

    #[test]
    fn refuses_incomplete_state() {
        let inputs =
            AnalysisInputs::try_from(&AnalysisRequest::new("Acme", "retail", "Globex")).unwrap();
        let state = PipelineState::new(RunId::new_random(), inputs);
        assert_eq!(
            ReportSynthesizer.synthesize(&state).unwrap_err(),
            StateError::Incomplete {
                pending: StageId::PlatformIdentification
            }
        );
    }

    #[test]
    fn report_has_one_section_per_stage_in_order() {
        let state = completed(|stage| format!("{stage}: ok"));
        let result = ReportSynthesizer.synthesize(&state).unwrap();

        let mut last = 0;
        for (i, stage) in StageId::ALL.iter().enumerate() {
            let heading = format!("## {}. {}", i + 1, stage.title());
            let at = result.report.find(&heading).expect("section heading");
            assert!(at >= last);
            last = at;
        }
        assert_eq!(result.report.matches(": ok").count(), 8);
        assert!(result.report.starts_with("# Social Media Competitor Analysis: Globex for Acme"));
    }

    #[test]
    fn summary_draws_on_profile_and_recommendations() {
        let state = completed(|stage| match stage {
            StageId::CompetitorProfiling => {
                "## Profile\nGlobex dominates short video.\nIt posts daily.\n\n- strength".into()
            }
            StageId::StrategyRecommendations => "Lead with community content.\n\n1. quick win".into(),
            other => format!("{other}: ok"),
        });
        let summary = ReportSynthesizer.synthesize(&state).unwrap().analysis_summary;
        assert!(summary.contains("Globex dominates short video. It posts daily."));
        assert!(summary.contains("Recommended strategy: Lead with community content."));
        assert!(!summary.contains("quick win"));
    }

    #[test]
    fn summary_parts_are_condensed() {
        let long = "x".repeat(SUMMARY_PART_LIMIT * 2);
        let state = completed(|stage| match stage {
            StageId::CompetitorProfiling => long.clone(),
            other => format!("{other}: ok"),
        });
        let summary = ReportSynthesizer.synthesize(&state).unwrap().analysis_summary;
        assert!(summary.contains(&format!("{}…", "x".repeat(SUMMARY_PART_LIMIT))));
        assert!(!summary.contains(&"x".repeat(SUMMARY_PART_LIMIT + 1)));
    }

    #[test]
    fn insights_come_from_advantage_list_items() {
        let state = completed(|stage| match stage {
            StageId::CompetitiveAdvantageAnalysis => "## Openings\n\
                 - Globex ignores LinkedIn\n\
                 - **Slow customer replies**\n\
                 - Globex ignores LinkedIn\n\
                 - No creator partnerships\n\
                 - Weak Pinterest presence\n\
                 - Few product tutorials\n\
                 - Inconsistent posting"
                .into(),
            other => format!("{other}: ok"),
        });
        let insights = ReportSynthesizer.synthesize(&state).unwrap().key_insights;
        assert_eq!(
            insights,
            vec![
                "Globex ignores LinkedIn",
                "Slow customer replies",
                "No creator partnerships",
                "Weak Pinterest presence",
                "Few product tutorials",
            ]
        );
    }

    #[test]
    fn insights_fall_back_to_plain_lines() {
        let state = completed(|stage| format!("{stage}: ok"));
        let insights = ReportSynthesizer.synthesize(&state).unwrap().key_insights;
        assert_eq!(insights, vec!["competitive_advantage_analysis: ok"]);
    }

    #[test]
    fn long_fallback_lines_are_cut_to_first_sentence() {
        let rambling = format!(
            "Globex leaves LinkedIn to its recruiters. {}",
            "They post job ads and little else. ".repeat(60)
        );
        let wall = "w".repeat(2_000);
        let state = completed(|stage| match stage {
            StageId::CompetitiveAdvantageAnalysis => format!("{rambling}\n{wall}"),
            other => format!("{other}: ok"),
        });
        let insights = ReportSynthesizer.synthesize(&state).unwrap().key_insights;
        assert_eq!(insights, vec!["Globex leaves LinkedIn to its recruiters."]);
        assert!(insights
            .iter()
            .all(|insight| insight.chars().count() <= MAX_INSIGHT_CHARS));
    }

    #[test]
    fn headings_only_yield_no_insights() {
        let state = completed(|stage| match stage {
            StageId::CompetitiveAdvantageAnalysis => "## Openings\n---\n### None found".into(),
            other => format!("{other}: ok"),
        });
        assert!(ReportSynthesizer
            .synthesize(&state)
            .unwrap()
            .key_insights
            .is_empty());
    }
}
