//! Resolution of free-text language values to ISO 639 codes and names.
//!
//! Feeds write languages every way imaginable: `English`, `eng`, `en`,
//! `English/French`, `fre; ger`. Each token is looked up against the full
//! ISO 639 tables of [`isolang`] by English name, then 639-3, 639-2/B,
//! 639-2/T and 639-1 code, first match wins.

use std::collections::HashSet;

use isolang::Language as IsoLanguage;

use crate::types::Language;

/// 639-2/B codes that differ from the 639-2/T (and 639-3) code.
const BIBLIOGRAPHIC: &[(&str, &str)] = &[
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("dut", "nld"),
    ("fre", "fra"),
    ("geo", "kat"),
    ("ger", "deu"),
    ("gre", "ell"),
    ("ice", "isl"),
    ("mac", "mkd"),
    ("mao", "mri"),
    ("may", "msa"),
    ("per", "fas"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("tib", "bod"),
    ("wel", "cym"),
];

/// Output code: bibliographic 639-2 where one exists, else 639-3.
///
/// # Examples
/// ```
/// use isolang::Language;
/// use heartland_harvester::language::code;
///
/// assert_eq!(code(Language::Fra), "fre");
/// assert_eq!(code(Language::Eng), "eng");
/// assert_eq!(code(Language::Cmn), "cmn");
/// ```
#[must_use]
pub fn code(language: IsoLanguage) -> &'static str {
    let part3 = language.to_639_3();
    BIBLIOGRAPHIC
        .iter()
        .find(|(_, terminology)| *terminology == part3)
        .map_or(part3, |(bibliographic, _)| bibliographic)
}

fn to_language(language: IsoLanguage) -> Language {
    Language {
        code: code(language).to_string(),
        name: language.to_name().to_string(),
    }
}

/// Look up one token. Names match case-insensitively; codes match lowercased.
///
/// # Examples
/// ```
/// use heartland_harvester::language::lookup;
///
/// assert_eq!(lookup("ENGLISH").map(|l| l.to_639_3()), Some("eng"));
/// assert_eq!(lookup("ger").map(|l| l.to_name()), Some("German"));
/// assert_eq!(lookup("fr").map(|l| l.to_639_3()), Some("fra"));
/// assert!(lookup("Klingonese").is_none());
/// ```
#[must_use]
pub fn lookup(token: &str) -> Option<IsoLanguage> {
    let key = token.trim().to_lowercase();
    if key.is_empty() {
        return None;
    }
    IsoLanguage::from_name_lowercase(&key)
        .or_else(|| IsoLanguage::from_639_3(&key))
        .or_else(|| {
            BIBLIOGRAPHIC
                .iter()
                .find(|(bibliographic, _)| *bibliographic == key)
                .and_then(|(_, terminology)| IsoLanguage::from_639_3(terminology))
        })
        .or_else(|| IsoLanguage::from_639_1(&key))
}

/// Split one raw value into distinct candidate tokens.
fn tokens(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.split(['/', ',', ';'])
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter(|token| seen.insert(token.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Resolve raw language strings to distinct `{code, name}` pairs.
///
/// Unrecognized tokens are dropped. Order follows first appearance.
///
/// # Examples
/// ```
/// use heartland_harvester::language::resolve;
///
/// let languages = resolve(&["English/French".to_string()]);
/// let codes: Vec<_> = languages.iter().map(|l| l.code.as_str()).collect();
/// assert_eq!(codes, ["eng", "fre"]);
/// ```
#[must_use]
pub fn resolve<S: AsRef<str>>(raw: &[S]) -> Vec<Language> {
    let mut seen_tokens = HashSet::new();
    let mut seen_codes = HashSet::new();
    let mut resolved = Vec::new();

    for value in raw {
        for token in tokens(value.as_ref()) {
            if !seen_tokens.insert(token.to_lowercase()) {
                continue;
            }
            match lookup(&token) {
                Some(language) if seen_codes.insert(code(language)) => {
                    resolved.push(to_language(language));
                }
                Some(_) => {}
                None => tracing::debug!(token = %token, "Unrecognized language token"),
            }
        }
    }

    resolved
}
