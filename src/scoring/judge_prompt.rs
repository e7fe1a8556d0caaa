//! Judge prompt compilation.
//!
//! Compiles a [`ChallengeConfig`] into the system prompt handed to the judge
//! model. Compilation is a pure function of the config: the same challenge
//! always yields byte-identical instructions, so judge behavior is
//! reproducible across runs. A `systemPromptOverride` on the judge config
//! bypasses compilation entirely and is used verbatim.

use std::fmt::Write;

use crate::challenge::{ChallengeConfig, ScoringDimension};

/// Compiles the judge system prompt for a challenge.
pub fn compile_judge_prompt(challenge: &ChallengeConfig) -> String {
    if let Some(override_prompt) = &challenge.scoring.judge.system_prompt_override {
        return override_prompt.clone();
    }

    let content = &challenge.content;
    let scoring = &challenge.scoring;

    let mut prompt = String::with_capacity(4096);

    prompt.push_str(
        "You are an expert prompt engineering evaluator for a training platform \
         called \"Prompt Golf.\"\n\n\
         Your job is to score a user's prompt for a specific challenge. You evaluate \
         the PROMPT QUALITY, not the AI's hypothetical response.\n\n",
    );

    prompt.push_str("## CHALLENGE CONTEXT\n\n");
    let _ = writeln!(prompt, "**Title:** {}", challenge.metadata.title);
    let _ = writeln!(prompt, "**Category:** {}", challenge.metadata.category);
    let _ = writeln!(prompt, "**Difficulty:** {}/5", challenge.metadata.difficulty);
    prompt.push('\n');

    let _ = writeln!(prompt, "**Scenario:**\n{}", content.scenario.headline);
    let _ = writeln!(prompt, "\n{}", content.scenario.context);

    if let Some(constraints) = content.scenario.constraints.as_deref() {
        if !constraints.is_empty() {
            prompt.push_str("\n**Constraints:**\n");
            for constraint in constraints {
                let _ = writeln!(prompt, "- {}", constraint);
            }
        }
    }

    if let Some(persona) = &content.scenario.persona {
        let _ = writeln!(prompt, "\n**User's Role:** {}", persona);
    }

    let _ = writeln!(
        prompt,
        "\n**Success Criteria:**\n{}",
        content.success_criteria.ideal_outcome
    );

    if let Some(must_include) = content.success_criteria.must_include.as_deref() {
        if !must_include.is_empty() {
            prompt.push_str("\n**Must Include:**\n");
            for item in must_include {
                let _ = writeln!(prompt, "- {}", item);
            }
        }
    }

    if let Some(must_avoid) = content.success_criteria.must_avoid.as_deref() {
        if !must_avoid.is_empty() {
            prompt.push_str("\n**Must Avoid:**\n");
            for item in must_avoid {
                let _ = writeln!(prompt, "- {}", item);
            }
        }
    }

    prompt.push_str("\n## SCORING DIMENSIONS\n\n");
    let _ = writeln!(prompt, "Total possible score: {} points", scoring.max_score);
    for dimension in &scoring.dimensions {
        prompt.push('\n');
        prompt.push_str(&format_dimension_rubric(dimension));
        prompt.push('\n');
    }

    prompt.push_str("\n## YOUR TASK\n\n");
    prompt.push_str(
        "Evaluate the user's prompt and return a JSON response with this exact structure:\n\n",
    );
    prompt.push_str("```json\n{\n");
    let _ = writeln!(prompt, "  \"totalScore\": <number 0-{}>,", scoring.max_score);
    prompt.push_str("  \"dimensions\": {\n");
    for (i, dimension) in scoring.dimensions.iter().enumerate() {
        let _ = writeln!(prompt, "    \"{}\": {{", dimension.id);
        let _ = writeln!(
            prompt,
            "      \"score\": <number 0-{}>,",
            dimension.max_points
        );
        prompt.push_str("      \"feedback\": \"<1-2 sentence specific feedback>\"\n");
        if i + 1 < scoring.dimensions.len() {
            prompt.push_str("    },\n");
        } else {
            prompt.push_str("    }\n");
        }
    }
    prompt.push_str("  },\n");
    prompt.push_str("  \"overallFeedback\": {\n");
    prompt.push_str("    \"whatYouDidWell\": \"<1-2 sentences on strengths>\",\n");
    prompt.push_str(
        "    \"primaryImprovement\": \"<The single most impactful change they could make>\",\n",
    );
    prompt.push_str("    \"secondaryImprovement\": \"<Optional second suggestion>\"\n");
    prompt.push_str("  },\n");
    prompt.push_str("  \"promptQualityLevel\": \"<'excellent' | 'good' | 'fair' | 'poor'>\"\n");
    prompt.push_str("}\n```\n");

    prompt.push_str("\n## IMPORTANT GUIDELINES\n\n");
    prompt.push_str("1. Be encouraging but honest. This is a learning tool.\n");
    prompt.push_str("2. Focus feedback on ACTIONABLE improvements.\n");
    prompt.push_str("3. Reference specific parts of their prompt in feedback.\n");
    prompt.push_str(
        "4. Consider the difficulty level - score appropriately for the challenge tier.\n",
    );
    let _ = writeln!(
        prompt,
        "5. A \"passing\" prompt ({}+ points) should be usable but not optimal.",
        scoring.thresholds.passing
    );
    let _ = writeln!(
        prompt,
        "6. An \"excellent\" prompt ({}+ points) should be professional-grade.",
        scoring.thresholds.excellent
    );

    prompt.push_str("\nReturn ONLY the JSON. No markdown formatting around it.");

    prompt
}

/// Renders one dimension's rubric section with derived score bands:
/// excellent 90-100% of maxPoints, good 70-89%, fair 50-69%, poor below.
fn format_dimension_rubric(dimension: &ScoringDimension) -> String {
    let band = |fraction: f64| -> u32 { (f64::from(dimension.max_points) * fraction).round() as u32 };

    format!(
        "### {name} ({max} points, {weight}% weight)\n\
         {description}\n\n\
         **Rubric:**\n\
         - Excellent ({ex_lo}-{max} pts): {excellent}\n\
         - Good ({good_lo}-{good_hi} pts): {good}\n\
         - Fair ({fair_lo}-{fair_hi} pts): {fair}\n\
         - Poor (0-{poor_hi} pts): {poor}",
        name = dimension.name,
        max = dimension.max_points,
        weight = dimension.weight,
        description = dimension.description,
        ex_lo = band(0.9),
        good_lo = band(0.7),
        good_hi = band(0.89),
        fair_lo = band(0.5),
        fair_hi = band(0.69),
        poor_hi = band(0.49),
        excellent = dimension.rubric.excellent,
        good = dimension.rubric.good,
        fair = dimension.rubric.fair,
        poor = dimension.rubric.poor,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::test_fixtures::{sample_challenge, sample_dimension};

    #[test]
    fn compilation_is_deterministic() {
        let challenge = sample_challenge("email-summary");
        assert_eq!(
            compile_judge_prompt(&challenge),
            compile_judge_prompt(&challenge)
        );
    }

    #[test]
    fn override_bypasses_compilation() {
        let mut challenge = sample_challenge("email-summary");
        challenge.scoring.judge.system_prompt_override =
            Some("Score everything 100.".to_string());
        assert_eq!(compile_judge_prompt(&challenge), "Score everything 100.");
    }

    #[test]
    fn prompt_names_every_dimension_id_verbatim() {
        let challenge = sample_challenge("email-summary");
        let prompt = compile_judge_prompt(&challenge);
        for dimension in &challenge.scoring.dimensions {
            assert!(
                prompt.contains(&format!("\"{}\"", dimension.id)),
                "missing dimension id {}",
                dimension.id
            );
        }
    }

    #[test]
    fn prompt_carries_challenge_context_and_thresholds() {
        let challenge = sample_challenge("email-summary");
        let prompt = compile_judge_prompt(&challenge);
        assert!(prompt.contains(&challenge.metadata.title));
        assert!(prompt.contains("**Category:** summarization"));
        assert!(prompt.contains("Total possible score: 100 points"));
        assert!(prompt.contains("A \"passing\" prompt (45+ points)"));
        assert!(prompt.contains("An \"excellent\" prompt (85+ points)"));
    }

    #[test]
    fn rubric_bands_round_from_max_points() {
        let dimension = sample_dimension("clarity", "Clarity", 30, 25);
        let section = format_dimension_rubric(&dimension);
        // 25 points: excellent 23-25, good 18-22, fair 13-17, poor 0-12.
        assert!(section.contains("Excellent (23-25 pts)"));
        assert!(section.contains("Good (18-22 pts)"));
        assert!(section.contains("Fair (13-17 pts)"));
        assert!(section.contains("Poor (0-12 pts)"));
    }

    #[test]
    fn optional_sections_are_omitted_when_absent() {
        let mut challenge = sample_challenge("email-summary");
        challenge.content.scenario.constraints = None;
        challenge.content.scenario.persona = None;
        challenge.content.success_criteria.must_include = None;
        challenge.content.success_criteria.must_avoid = None;

        let prompt = compile_judge_prompt(&challenge);
        assert!(!prompt.contains("**Constraints:**"));
        assert!(!prompt.contains("**User's Role:**"));
        assert!(!prompt.contains("**Must Include:**"));
        assert!(!prompt.contains("**Must Avoid:**"));
    }
}
