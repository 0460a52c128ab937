// Descriptive metadata extraction: agreement type, region, parties, dates, value
use lazy_static::lazy_static;
use regex::Regex;
use shared_types::{AgreementType, DocumentMetadata, Geography, Industry, Jurisdiction};

lazy_static! {
    /// Checked in order; the first hit wins
    static ref AGREEMENT_PATTERNS: Vec<(AgreementType, Regex)> = vec![
        (
            AgreementType::Nda,
            Regex::new(r"(?i)\b(?:NDA|non-disclosure|non\s+disclosure|confidentiality)\b").unwrap(),
        ),
        (
            AgreementType::Msa,
            Regex::new(r"(?i)\b(?:MSA|master\s+services?)\b").unwrap(),
        ),
        (
            AgreementType::Franchise,
            Regex::new(r"(?i)\b(?:franchise|franchising)\b").unwrap(),
        ),
        (
            AgreementType::Employment,
            Regex::new(r"(?i)\b(?:employment|work\s+contract)\b").unwrap(),
        ),
        (
            AgreementType::Lease,
            Regex::new(r"(?i)\b(?:lease|leasing|rental)\b").unwrap(),
        ),
        (
            AgreementType::Partnership,
            Regex::new(r"(?i)\b(?:partnership|joint\s+venture|collaboration)\b").unwrap(),
        ),
        (
            AgreementType::Supply,
            Regex::new(r"(?i)\b(?:supply|procurement|purchase)\b").unwrap(),
        ),
        (
            AgreementType::Service,
            Regex::new(r"(?i)\b(?:service|consulting|advisory)\b").unwrap(),
        ),
        (
            AgreementType::Licensing,
            Regex::new(r"(?i)\b(?:license|licensing)\b").unwrap(),
        ),
    ];

    // Short acronyms sit outside the (?i:...) groups so "us" or "it" in prose never match

    static ref JURISDICTION_PATTERNS: Vec<(Jurisdiction, Regex)> = vec![
        (
            Jurisdiction::Uae,
            Regex::new(r"\b(?:UAE|(?i:united\s+arab\s+emirates|dubai|abu\s+dhabi|sharjah))\b").unwrap(),
        ),
        (
            Jurisdiction::Uk,
            Regex::new(r"\b(?:UK|(?i:united\s+kingdom|england|wales|scotland|northern\s+ireland))\b").unwrap(),
        ),
        (
            Jurisdiction::Usa,
            Regex::new(r"\b(?:USA|US|(?i:united\s+states|america))\b").unwrap(),
        ),
        (
            Jurisdiction::Delaware,
            Regex::new(r"\b(?:DE|(?i:delaware))\b").unwrap(),
        ),
        (
            Jurisdiction::Singapore,
            Regex::new(r"\b(?:SG|(?i:singapore))\b").unwrap(),
        ),
        (
            Jurisdiction::HongKong,
            Regex::new(r"\b(?:HK|(?i:hong\s+kong))\b").unwrap(),
        ),
        (
            Jurisdiction::Germany,
            Regex::new(r"\b(?i:germany|deutschland)\b").unwrap(),
        ),
        (
            Jurisdiction::France,
            Regex::new(r"\b(?:FR|(?i:france|république\s+française))\b").unwrap(),
        ),
    ];

    static ref INDUSTRY_PATTERNS: Vec<(Industry, Regex)> = vec![
        (
            Industry::Technology,
            Regex::new(r"\b(?:IT|(?i:technology|tech|software|digital))\b").unwrap(),
        ),
        (
            Industry::Healthcare,
            Regex::new(r"\b(?i:healthcare|health|medical|pharmaceutical|biotech)\b").unwrap(),
        ),
        (
            Industry::Finance,
            Regex::new(r"\b(?i:finance|financial|banking|investment|insurance)\b").unwrap(),
        ),
        (
            Industry::OilGas,
            Regex::new(r"\b(?i:oil|gas|petroleum|energy|hydrocarbon)\b").unwrap(),
        ),
        (
            Industry::RealEstate,
            Regex::new(r"\b(?i:real\s+estate|real\s+property|realty|construction)\b").unwrap(),
        ),
        (
            Industry::Manufacturing,
            Regex::new(r"\b(?i:manufacturing|manufacture|production|factory)\b").unwrap(),
        ),
        (
            Industry::Retail,
            Regex::new(r"\b(?i:retail|commerce|trading|merchandise)\b").unwrap(),
        ),
        (
            Industry::Consulting,
            Regex::new(r"\b(?i:consulting|consultancy|advisory)\b").unwrap(),
        ),
    ];

    static ref GEOGRAPHY_PATTERNS: Vec<(Geography, Regex)> = vec![
        (
            Geography::MiddleEast,
            Regex::new(r"\b(?:GCC|(?i:middle\s+east|gulf|arab|arabian))\b").unwrap(),
        ),
        (
            Geography::Europe,
            Regex::new(r"\b(?:EU|(?i:europe|european|eurozone))\b").unwrap(),
        ),
        (
            Geography::NorthAmerica,
            Regex::new(r"\b(?:NAFTA|(?i:north\s+american?))\b").unwrap(),
        ),
        (
            Geography::AsiaPacific,
            Regex::new(r"\b(?:APAC|(?i:asia|asian|pacific))\b").unwrap(),
        ),
        (
            Geography::Africa,
            Regex::new(r"\b(?i:africa|african|sub-saharan)\b").unwrap(),
        ),
        (
            Geography::SouthAmerica,
            Regex::new(r"\b(?:LATAM|(?i:south\s+america|latin\s+america))\b").unwrap(),
        ),
    ];

    static ref EFFECTIVE_DATE_PATTERN: Regex = Regex::new(
        r"(?i)\b(?:effective|commencement)\s+date\s*[:\-]?\s*(?P<date>\d{1,2}[/-]\d{1,2}[/-]\d{2,4})"
    )
    .unwrap();

    static ref EXPIRATION_DATE_PATTERN: Regex = Regex::new(
        r"(?i)\b(?:expiration|termination|end)\s+date\s*[:\-]?\s*(?P<date>\d{1,2}[/-]\d{1,2}[/-]\d{2,4})"
    )
    .unwrap();

    static ref GOVERNING_LAW_PATTERN: Regex = Regex::new(
        r"(?i)\b(?:governed\s+by|governing\s+law(?:\s+is)?\s*:?)\s*(?:the\s+)?(?:laws?\s+of\s+)?(?:the\s+)?(?P<law>[a-z][a-z ]{1,40}?)(?:\s+laws?)?\s*(?:[.,;\n]|$)"
    )
    .unwrap();

    static ref PARTIES_PATTERN: Regex = Regex::new(
        r"(?i)\bbetween\s+(?P<first>[a-z0-9&.,' ]+?)\s+and\s+(?P<second>[a-z0-9&.' ]+?)\s*(?:[,(;\n]|\.\s|\.$|$)"
    )
    .unwrap();

    static ref VALUE_PATTERN: Regex = Regex::new(
        r"(?i)\b(?:value|amount|consideration|price)\s*(?:of\s+)?[:\-]?\s*(?P<symbol>[$€£¥])?\s*(?P<amount>\d+(?:,\d{3})*(?:\.\d+)?)(?:\s*(?P<code>USD|EUR|GBP|AED|SAR|JPY))?"
    )
    .unwrap();
}

pub fn detect_agreement_type(text: &str) -> AgreementType {
    first_match(AGREEMENT_PATTERNS.as_slice(), text).unwrap_or(AgreementType::Other)
}

fn first_match<T: Copy>(patterns: &[(T, Regex)], text: &str) -> Option<T> {
    patterns
        .iter()
        .find(|(_, re)| re.is_match(text))
        .map(|(kind, _)| *kind)
}

pub fn detect_jurisdiction(text: &str) -> Option<Jurisdiction> {
    first_match(JURISDICTION_PATTERNS.as_slice(), text)
}

pub fn detect_industry(text: &str) -> Option<Industry> {
    first_match(INDUSTRY_PATTERNS.as_slice(), text)
}

pub fn detect_geography(text: &str) -> Option<Geography> {
    first_match(GEOGRAPHY_PATTERNS.as_slice(), text)
}

fn capture_date(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|c| c.name("date"))
        .map(|m| m.as_str().to_string())
}

/// Effective or commencement date, verbatim
pub fn extract_effective_date(text: &str) -> Option<String> {
    capture_date(&EFFECTIVE_DATE_PATTERN, text)
}

/// Expiration, termination or end date, verbatim
pub fn extract_expiration_date(text: &str) -> Option<String> {
    capture_date(&EXPIRATION_DATE_PATTERN, text)
}

pub fn extract_governing_law(text: &str) -> Option<String> {
    GOVERNING_LAW_PATTERN
        .captures(text)
        .and_then(|c| c.name("law"))
        .map(|m| m.as_str().trim().to_string())
        .filter(|law| !law.is_empty())
}

/// Party names from "between X and Y" clauses, first-seen order, no duplicates
pub fn extract_parties(text: &str) -> Vec<String> {
    let mut parties: Vec<String> = Vec::new();

    for cap in PARTIES_PATTERN.captures_iter(text) {
        for name in ["first", "second"] {
            if let Some(m) = cap.name(name) {
                let party = m.as_str().trim().trim_end_matches(',').trim().to_string();
                if !party.is_empty() && !parties.contains(&party) {
                    parties.push(party);
                }
            }
        }
    }

    parties
}

/// First stated contract value with its currency code, if any
pub fn extract_value(text: &str) -> Option<(f64, Option<String>)> {
    let cap = VALUE_PATTERN.captures(text)?;
    let amount: f64 = cap.name("amount")?.as_str().replace(',', "").parse().ok()?;

    let currency = cap
        .name("code")
        .map(|m| m.as_str().to_uppercase())
        .or_else(|| {
            cap.name("symbol").map(|m| {
                match m.as_str() {
                    "$" => "USD",
                    "€" => "EUR",
                    "£" => "GBP",
                    _ => "JPY",
                }
                .to_string()
            })
        });

    Some((amount, currency))
}

pub fn extract_metadata(text: &str) -> DocumentMetadata {
    let (value, currency) = match extract_value(text) {
        Some((amount, currency)) => (Some(amount), currency),
        None => (None, None),
    };

    DocumentMetadata {
        agreement_type: detect_agreement_type(text),
        jurisdiction: detect_jurisdiction(text),
        industry: detect_industry(text),
        geography: detect_geography(text),
        governing_law: extract_governing_law(text),
        parties: extract_parties(text),
        effective_date: extract_effective_date(text),
        expiration_date: extract_expiration_date(text),
        value,
        currency,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_agreement_type() {
        assert_eq!(
            detect_agreement_type("MUTUAL NON-DISCLOSURE AGREEMENT"),
            AgreementType::Nda
        );
        assert_eq!(
            detect_agreement_type("This Employment Agreement is entered into"),
            AgreementType::Employment
        );
        assert_eq!(
            detect_agreement_type("Residential lease for 123 Main St"),
            AgreementType::Lease
        );
        assert_eq!(detect_agreement_type("Meeting minutes"), AgreementType::Other);
    }

    #[test]
    fn test_agreement_type_first_pattern_wins() {
        // Mentions both confidentiality and a lease; NDA is checked first
        assert_eq!(
            detect_agreement_type("Lease with confidentiality obligations"),
            AgreementType::Nda
        );
    }

    #[test]
    fn test_detect_jurisdiction_first_match_wins() {
        assert_eq!(
            detect_jurisdiction("Registered in Dubai, with an office in London, England"),
            Some(Jurisdiction::Uae)
        );
        assert_eq!(
            detect_jurisdiction("a corporation organized under the laws of Delaware"),
            Some(Jurisdiction::Delaware)
        );
        assert_eq!(
            detect_jurisdiction("Operations in the United States"),
            Some(Jurisdiction::Usa)
        );
        assert_eq!(detect_jurisdiction("Parties named in Annex A"), None);
    }

    #[test]
    fn test_short_acronyms_are_case_sensitive() {
        // "us" and "it" are ordinary words in lowercase prose
        assert_eq!(detect_jurisdiction("Send it to us by Friday"), None);
        assert_eq!(detect_industry("Send it to us by Friday"), None);
        assert_eq!(detect_jurisdiction("Filed in the US courts"), Some(Jurisdiction::Usa));
        assert_eq!(detect_industry("Managed IT services"), Some(Industry::Technology));
    }

    #[test]
    fn test_detect_industry() {
        assert_eq!(detect_industry("Offshore petroleum exploration"), Some(Industry::OilGas));
        assert_eq!(detect_industry("A retail store chain"), Some(Industry::Retail));
        // Technology is listed before Healthcare
        assert_eq!(detect_industry("Medical software platform"), Some(Industry::Technology));
        assert_eq!(detect_industry("Protection of intellectual property"), None);
    }

    #[test]
    fn test_detect_geography() {
        assert_eq!(detect_geography("Distribution across the GCC"), Some(Geography::MiddleEast));
        assert_eq!(detect_geography("Sales in the EU"), Some(Geography::Europe));
        assert_eq!(detect_geography("LATAM territory"), Some(Geography::SouthAmerica));
        assert_eq!(detect_geography("the eu of the clause"), None);
    }

    #[test]
    fn test_extract_dates() {
        let text = "Effective Date: 01/02/2024. Termination date - 31-12-2026.";
        assert_eq!(extract_effective_date(text).as_deref(), Some("01/02/2024"));
        assert_eq!(extract_expiration_date(text).as_deref(), Some("31-12-2026"));
        assert_eq!(extract_effective_date("Commencement date 5/6/24").as_deref(), Some("5/6/24"));
        assert_eq!(extract_expiration_date("No dates at all"), None);
    }

    #[test]
    fn test_extract_governing_law() {
        assert_eq!(
            extract_governing_law(
                "This Agreement shall be governed by the laws of the State of Delaware."
            ),
            Some("State of Delaware".to_string())
        );
        assert_eq!(
            extract_governing_law("This contract is governed by English law."),
            Some("English".to_string())
        );
        assert_eq!(extract_governing_law("No choice of law here."), None);
    }

    #[test]
    fn test_extract_parties() {
        let text = "This Agreement is made by and between Acme Corp and Globex LLC, effective today.";
        assert_eq!(extract_parties(text), vec!["Acme Corp", "Globex LLC"]);
        assert!(extract_parties("No parties named.").is_empty());
    }

    #[test]
    fn test_extract_value() {
        assert_eq!(
            extract_value("The total consideration of $1,250,000.00 USD is payable"),
            Some((1_250_000.0, Some("USD".to_string())))
        );
        assert_eq!(
            extract_value("Purchase price: €5000"),
            Some((5000.0, Some("EUR".to_string())))
        );
        assert_eq!(extract_value("Amount: 300"), Some((300.0, None)));
        assert_eq!(extract_value("No money mentioned"), None);
    }

    #[test]
    fn test_extract_metadata_combines_extractors() {
        let text = "SERVICE AGREEMENT between Initech and Umbrella Inc. \
                    Governed by the laws of New York. Fee amount: $12,000.";
        let meta = extract_metadata(text);
        assert_eq!(meta.agreement_type, AgreementType::Service);
        assert_eq!(meta.governing_law.as_deref(), Some("New York"));
        assert_eq!(meta.parties, vec!["Initech", "Umbrella Inc"]);
        assert_eq!(meta.value, Some(12_000.0));
        assert_eq!(meta.currency.as_deref(), Some("USD"));
    }

    #[test]
    fn test_extract_metadata_fills_regional_fields() {
        let text = "Supply agreement for a Singapore manufacturing plant serving APAC. \
                    Effective date: 1/3/2025";
        let meta = extract_metadata(text);
        assert_eq!(meta.agreement_type, AgreementType::Supply);
        assert_eq!(meta.jurisdiction, Some(Jurisdiction::Singapore));
        assert_eq!(meta.industry, Some(Industry::Manufacturing));
        assert_eq!(meta.geography, Some(Geography::AsiaPacific));
        assert_eq!(meta.effective_date.as_deref(), Some("1/3/2025"));
        assert_eq!(meta.expiration_date, None);
    }
}
