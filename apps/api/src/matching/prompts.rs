// Prompt constants for résumé/job match scoring.

/// System prompt for match scoring: asks for a single JSON object.
pub const MATCH_SYSTEM: &str = "You are an assistant evaluating job fit. \
    Compare a resume against a job description and report the result as JSON only. \
    Do NOT include any text outside the JSON object.";

/// Builds the scoring prompt around already-truncated résumé and job text.
pub fn build_match_prompt(resume_text: &str, job_text: &str) -> String {
    format!(
        r#"Compare this RESUME and JOB DESCRIPTION.

Return a JSON object with this EXACT schema (no extra fields):
{{
  "match_score": 0,
  "matched_skills": ["skill present in both the resume and the job description"],
  "missing_skills": ["skill the job asks for that the resume does not show"],
  "summary": "two or three sentences on overall fit and what to strengthen"
}}

Rules:
- match_score is an integer from 0 to 100
- matched_skills and missing_skills are arrays of short skill names
- summary is plain text

RESUME:
{resume_text}

JOB DESCRIPTION:
{job_text}"#
    )
}
