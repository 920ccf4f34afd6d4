// All LLM prompt constants for the Recommendation module.
// Templates are filled with `llm_client::prompts::render`; the system roles
// get the JSON-only rules appended by `llm_client::prompts::system_prompt`.

/// System prompt for CV analysis.
pub const CV_ANALYSIS_SYSTEM: &str = "You are a professional career assistant. \
    You read CVs and extract structured facts about the candidate.";

/// CV analysis prompt. Replace `{cv_text}` and `{untrusted}` before sending.
pub const CV_ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze the following CV text.

Return a JSON object with this EXACT schema:
{
  "name": "Candidate's name or null",
  "email": "Candidate's email or null",
  "total_experience_years": 0,
  "top_skills": ["skill1", "skill2", "skill3"],
  "summary": "Two or three sentences about the candidate"
}

Rules:
- total_experience_years is a number; use null when the CV does not say.
- top_skills lists at most 10 skills, most relevant first.
- Only state facts present in the CV.

{untrusted}

CV TEXT:
{cv_text}
"#;

/// System prompt for interview question generation.
pub const QUESTIONS_SYSTEM: &str = "You are an intelligent career interviewer.";

/// Question prompt. Replace `{count}`, `{candidate}` and `{untrusted}` before sending.
pub const QUESTIONS_PROMPT_TEMPLATE: &str = r#"Based on this candidate's CV, generate {count} relevant and diverse interview questions.
Make them thoughtful and personalised: they should reveal interests, strengths and
preferences that help choose a career direction.

Return a JSON object with this EXACT schema:
{
  "questions": ["Question 1", "Question 2"]
}

{untrusted}

CV DATA:
{candidate}
"#;

/// System prompt for job recommendations.
pub const RECOMMENDATION_SYSTEM: &str = "You are an expert career advisor. \
    You recommend job roles that fit a candidate's experience and interests.";

/// Recommendation prompt. Replace `{count}`, `{candidate}`, `{answers}` and
/// `{untrusted}` before sending.
pub const RECOMMENDATION_PROMPT_TEMPLATE: &str = r#"Based on the following candidate CV data and their interview answers,
recommend the top {count} most suitable jobs, best fit first.

Return a JSON object with this EXACT schema:
{
  "recommendations": [
    {
      "title": "Job Title",
      "description": "Why this job fits the candidate",
      "company": "Example company or type of company hiring for it",
      "match_score": 85,
      "skills_to_learn": ["Skill1", "Skill2"],
      "salary": "Salary range in INR (e.g. 10-15 LPA)"
    }
  ]
}

Rules:
- match_score is an integer from 0 to 100.
- Order the list from best to worst fit.
- Every recommendation must have a non-empty title.

{untrusted}

Candidate CV:
{candidate}

Interview Answers:
{answers}
"#;
