pub mod common_words;
pub mod config;
pub mod sqlite_pragma;

pub use common_words::{
    CalculateParams, Calculation, CommonWordsEngine, CommonWordsError, CommonWordsReport, DateWindow,
    FilterMetric, SelectorParams,
};
