pub mod metadata;

pub use metadata::{
    detect_agreement_type, detect_geography, detect_industry, detect_jurisdiction,
    extract_effective_date, extract_expiration_date, extract_governing_law, extract_metadata,
    extract_parties, extract_value,
};
