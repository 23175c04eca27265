//! Cleanup of camera manufacturer and model strings for use in filenames.

/// Vendor spellings mapped to one canonical name, keyed in lower case.
const MAKER_ALIASES: &[(&str, &str)] = &[
    ("hewlett-packard", "HP"),
    ("samsung", "Samsung"),
    ("fujifilm", "Fujifilm"),
    ("fuji", "Fujifilm"),
    ("nikon", "Nikon"),
    ("olympus", "Olympus"),
    ("lge", "LG"),
];

/// Corporate suffixes that carry no information about the device.
/// Make tokens match case-insensitively after trailing `.`/`,` are removed, model
/// tokens only in this exact spelling. `CO.LTD` is the form `CO.,LTD` takes once
/// unsafe characters are stripped.
const CORPORATE_NOISE: &[&str] = &[
    "CORPORATION",
    "CO.LTD",
    "CO",
    "LTD",
    "EASTMAN",
    "COMPANY",
    "ELECTRIC",
    "IMAGING",
    "CORP",
    "ELECTRONICS",
    "COMPUTER",
    "PHOTO",
    "FILM",
    "OPTICAL",
];

const MODEL_SPAM_PREFIXES: &[&str] = &["SAMSUNG-"];

fn is_filename_safe(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, ' ' | '.' | '_' | '-')
}

/// Drops every character that is not alphanumeric, a space, `.`, `_` or `-`.
pub fn filename_friendly(s: &str) -> String {
    let kept: String = s.chars().filter(|&c| is_filename_safe(c)).collect();
    kept.trim_end().to_string()
}

fn clean_base(s: Option<&str>) -> Option<String> {
    let trimmed = s?.trim_matches(|c: char| c.is_whitespace() || c == '\0');
    let cleaned = filename_friendly(&trimmed.replace('_', " "));
    (!cleaned.is_empty()).then_some(cleaned)
}

fn is_corporate_noise(token: &str) -> bool {
    let bare = token.trim_end_matches(['.', ',']);
    CORPORATE_NOISE.iter().any(|noise| noise.eq_ignore_ascii_case(bare))
}

/// Model words such as `Photo` are real product names; only the upper-case
/// suffixes count as noise there.
fn is_model_noise(token: &str) -> bool {
    CORPORATE_NOISE.contains(&token.trim_end_matches(['.', ',']))
}

fn canonical_token(token: &str) -> &str {
    let lower = token.to_lowercase();
    MAKER_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lower)
        .map_or(token, |&(_, canonical)| canonical)
}

fn vendor_tokens(s: &str) -> Vec<&str> {
    s.split_whitespace()
        .filter(|token| !is_corporate_noise(token))
        .map(canonical_token)
        .collect()
}

fn strip_spam_prefix(mut token: &str) -> &str {
    while let Some(rest) = MODEL_SPAM_PREFIXES
        .iter()
        .find_map(move |prefix| token.strip_prefix(*prefix))
    {
        token = rest;
    }
    token
}

fn join_tag_friendly(tokens: &[&str]) -> Option<String> {
    let joined = tokens.join("-").replace([' ', '_'], "-");
    (!joined.is_empty()).then_some(joined)
}

/// Normalizes a camera make and model pair into filename-safe strings.
///
/// The make loses corporate suffixes and is mapped onto a canonical vendor name.
/// The model loses any token already present in the make (`NIKON D750` by
/// `NIKON CORPORATION` becomes `D750`) and known vendor spam prefixes. Both are
/// hyphenated. The function is idempotent.
pub fn fix_make_model(make: Option<&str>, model: Option<&str>) -> (Option<String>, Option<String>) {
    let make = clean_base(make);
    let model = clean_base(model);

    let Some(make) = make else {
        let model = model.and_then(|m| join_tag_friendly(&m.split_whitespace().collect::<Vec<_>>()));
        return (None, model);
    };

    let make_tokens = vendor_tokens(&make);
    let make_lower: Vec<String> = make_tokens.iter().map(|t| t.to_lowercase()).collect();

    let model = model.and_then(|model| {
        // Spam prefixes go first so the token they hide is filtered like any other.
        let tokens: Vec<&str> = model
            .split_whitespace()
            .map(strip_spam_prefix)
            .filter(|token| !token.is_empty() && !is_model_noise(token))
            .map(canonical_token)
            .filter(|token| !make_lower.contains(&token.to_lowercase()))
            .collect();
        join_tag_friendly(&tokens)
    });

    (join_tag_friendly(&make_tokens), model)
}
