//! Prompt builders, one per stage.
//!
//! Each builder reads the run's inputs and returns a [`GenerationRequest`]
//! whose `context` carries every finding committed so far, in execution
//! order. Later stages therefore see the full history, not only their
//! immediate predecessor.

use crate::{GenerationRequest, PipelineState, StageId};

/// Renders all committed stage outputs as a findings document.
///
/// Returns `None` before the first stage has succeeded.
pub fn render_context(state: &PipelineState) -> Option<String> {
    let sections: Vec<String> = state
        .outputs()
        .map(|(stage, payload)| format!("### {}\n{}", stage.title(), payload.text))
        .collect();
    if sections.is_empty() {
        None
    } else {
        Some(sections.join("\n\n"))
    }
}

fn request(stage: StageId, state: &PipelineState, prompt: String) -> GenerationRequest {
    GenerationRequest {
        stage,
        prompt,
        context: render_context(state),
    }
}

pub fn platform_identification(state: &PipelineState) -> GenerationRequest {
    let i = state.inputs();
    request(
        StageId::PlatformIdentification,
        state,
        format!(
            "Identify the social media platforms most relevant to the {industry} industry and \
             assess {competitor}'s presence on each one: follower counts, posting frequency and \
             verification status. Rank the platforms by importance and effectiveness for \
             {competitor}. Answer as a bulleted list, one platform per line.",
            industry = i.industry,
            competitor = i.competitor,
        ),
    )
}

pub fn social_media_presence(state: &PipelineState) -> GenerationRequest {
    let i = state.inputs();
    request(
        StageId::SocialMediaPresenceAnalysis,
        state,
        format!(
            "Using the platforms identified so far, analyse {competitor}'s social media \
             presence: account sizes and growth trends, posting frequency and timing, visual \
             identity and brand consistency, and the content formats in use.",
            competitor = i.competitor,
        ),
    )
}

pub fn content_strategy(state: &PipelineState) -> GenerationRequest {
    let i = state.inputs();
    request(
        StageId::ContentStrategyAnalysis,
        state,
        format!(
            "Analyse {competitor}'s content strategy in the {industry} industry: content \
             pillars and themes, calendar and seasonal patterns, brand voice and storytelling, \
             the balance of promotional and value-based content, and top-performing content \
             types with examples.",
            competitor = i.competitor,
            industry = i.industry,
        ),
    )
}

pub fn engagement_metrics(state: &PipelineState) -> GenerationRequest {
    let i = state.inputs();
    request(
        StageId::EngagementMetricsAnalysis,
        state,
        format!(
            "Estimate {competitor}'s engagement: average engagement rate by platform and \
             content type, audience sentiment, community management and customer service on \
             social platforms, and user-generated content. Include numbers wherever possible.",
            competitor = i.competitor,
        ),
    )
}

pub fn competitor_profiling(state: &PipelineState) -> GenerationRequest {
    let i = state.inputs();
    request(
        StageId::CompetitorProfiling,
        state,
        format!(
            "Write a concise profile of {competitor} as a social media competitor to \
             {company}. Open with a single summary paragraph, then list {competitor}'s \
             strengths and weaknesses on social platforms.",
            competitor = i.competitor,
            company = i.company,
        ),
    )
}

pub fn competitive_advantage(state: &PipelineState) -> GenerationRequest {
    let i = state.inputs();
    request(
        StageId::CompetitiveAdvantageAnalysis,
        state,
        format!(
            "Identify where {company} can gain an advantage over {competitor} in the {industry} \
             industry: differentiation opportunities, content gaps, underserved audience \
             segments and platform-specific openings. State each insight as one short bullet \
             point.",
            company = i.company,
            competitor = i.competitor,
            industry = i.industry,
        ),
    )
}

pub fn strategy_recommendations(state: &PipelineState) -> GenerationRequest {
    let i = state.inputs();
    request(
        StageId::StrategyRecommendations,
        state,
        format!(
            "Recommend a social media strategy for {company} against {competitor}. Open with a \
             single summary paragraph, then organise actions by timeline: quick wins (days), \
             short-term tactics (1-3 months), medium-term initiatives (3-6 months) and \
             long-term positioning (6+ months).",
            company = i.company,
            competitor = i.competitor,
        ),
    )
}

pub fn report_generation(state: &PipelineState) -> GenerationRequest {
    let i = state.inputs();
    request(
        StageId::ReportGeneration,
        state,
        format!(
            "Conclude the competitor analysis of {competitor} for {company}. Summarise the \
             findings above and define a monitoring framework: key metrics to track, social \
             listening priorities and keywords, and how often to review {competitor}'s activity.",
            competitor = i.competitor,
            company = i.company,
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AnalysisInputs, AnalysisRequest, RunId, StagePayload, StageResult};

    fn state() -> PipelineState {
        let inputs =
            AnalysisInputs::try_from(&AnalysisRequest::new("Acme", "retail", "Globex")).unwrap();
        PipelineState::new(RunId::new_random(), inputs)
    }

    #[test]
    fn first_stage_has_no_context() {
        let request = platform_identification(&state());
        assert_eq!(request.stage, StageId::PlatformIdentification);
        assert!(request.prompt.contains("Globex"));
        assert!(request.prompt.contains("retail"));
        assert!(request.context.is_none());
    }

    #[test]
    fn context_includes_all_prior_findings_in_order() {
        let mut state = state();
        for (stage, text) in [
            (StageId::PlatformIdentification, "Instagram, TikTok"),
            (StageId::SocialMediaPresenceAnalysis, "1.2M followers"),
        ] {
            state.mark_running(stage, stage.predecessors()).unwrap();
            state
                .commit(StageResult {
                    stage,
                    payload: StagePayload {
                        text: text.into(),
                        highlights: Vec::new(),
                    },
                })
                .unwrap();
        }

        let context = content_strategy(&state).context.unwrap();
        let first = context.find("Instagram, TikTok").unwrap();
        let second = context.find("1.2M followers").unwrap();
        assert!(first < second);
        assert!(context.starts_with("### Platform Identification"));
    }
}
