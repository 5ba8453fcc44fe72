//! ISO 3166-1 lookups for the nationality report.

/// Short name and alpha-3 code joined onto a nationality row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountryDetails {
    pub name: &'static str,
    pub iso3: &'static str,
}

/// Resolve an alpha-2 group key against the ISO dataset.
///
/// Input is matched case-insensitively; codes the dataset does not carry
/// yield `None` and the caller keeps the row with empty name/ISO3 columns.
pub fn lookup(iso2: &str) -> Option<CountryDetails> {
    let code = iso2.trim().to_ascii_uppercase();
    rust_iso3166::from_alpha2(&code).map(|country| CountryDetails {
        name: country.name,
        iso3: country.alpha3,
    })
}
