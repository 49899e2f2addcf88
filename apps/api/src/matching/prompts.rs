// Prompts for the enhanced scorer's requirement-coverage review.

pub const COVERAGE_SYSTEM: &str = "\
You are a precise technical recruiter comparing a candidate's skills with a job's requirements. \
You MUST respond with valid JSON only — no markdown fences, no explanations outside the JSON. \
Only mark a requirement as covered when a listed candidate skill clearly satisfies it. \
Never invent skills the candidate did not list.";

/// Replace: {skills_json}, {missing_json}
pub const COVERAGE_PROMPT_TEMPLATE: &str = r#"The requirements below were NOT matched by exact skill-name comparison.
Decide which of them are nevertheless covered by the candidate's skills
(for example a more specific tool implying the general requirement).

CANDIDATE SKILLS:
{skills_json}

UNMATCHED REQUIREMENTS (canonical ids):
{missing_json}

Return exactly this JSON object:
{
  "covered": [
    {"requirement": "<one of the unmatched requirement ids, verbatim>", "evidence": "<candidate skill that covers it>"}
  ],
  "analysis": "<one or two sentences on overall fit>"
}

Use an empty "covered" array when none are covered."#;
