// Résumé/job matching: prompt, model call, and normalization of whatever comes back.

pub mod handlers;
pub mod normalizer;
pub mod prompts;
pub mod scorer;
