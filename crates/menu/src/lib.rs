mod candidates;
mod composer;
mod error;

pub use candidates::{CandidatePicker, CandidateQuery};
pub use composer::{
    MealSuggestion, MealSuggestionOptions, MenuComposer, MenuOptions, MenuSuggestion,
};
pub use error::MenuError;
