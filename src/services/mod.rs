pub mod amount_extractor;
pub mod amount_fetcher;
pub mod row_classifier;

pub use amount_extractor::{extract_amount_text, FieldPolicy, FieldProbe, FieldText, RowProbe};
pub use amount_fetcher::{fetch_amount, resolve_amount, AmountFetcher};
pub use row_classifier::RowClassifier;
