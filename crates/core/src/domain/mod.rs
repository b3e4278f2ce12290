pub mod contract;
pub mod profile;
pub mod questionnaire;
pub mod recommendation;
