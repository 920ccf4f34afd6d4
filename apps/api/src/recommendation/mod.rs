// Recommendation service: prompts the external provider with a candidate
// profile and shapes the answer into ranked roles.
// All provider calls go through llm_client, reached via the CareerAdvisor trait.

pub mod advisor;
pub mod handlers;
pub mod parse;
pub mod prompts;
