// ── Object name variants ──

use std::collections::BTreeSet;

/// Keyword prefixing every per-unit aggregator object (`oams oams1`).
pub const OBJECT_KEYWORD: &str = "oams";

/// Every spelling under which `name` may be registered.
///
/// Underscores count as spaces. Produces the trimmed and space-collapsed
/// forms and, when the name starts with [`OBJECT_KEYWORD`], the bare
/// suffix, the collapsed suffix, and the suffix re-prefixed with and
/// without a space. Each candidate appears in original, lower and upper
/// case. Blank input yields an empty set.
pub fn collect_variants<'a>(name: impl Into<Option<&'a str>>) -> BTreeSet<String> {
    let mut variants = BTreeSet::new();
    let Some(name) = name.into() else {
        return variants;
    };

    let normalized = name.replace('_', " ");
    let trimmed = normalized.trim();
    if trimmed.is_empty() {
        return variants;
    }

    let mut bases = vec![trimmed.to_owned(), collapse(trimmed)];
    let keyword_len = OBJECT_KEYWORD.len();
    let has_keyword = trimmed
        .get(..keyword_len)
        .is_some_and(|head| head.eq_ignore_ascii_case(OBJECT_KEYWORD));
    if has_keyword {
        let suffix = trimmed.get(keyword_len..).unwrap_or_default().trim();
        if !suffix.is_empty() {
            let collapsed = collapse(suffix);
            bases.push(format!("{OBJECT_KEYWORD}{collapsed}"));
            bases.push(format!("{OBJECT_KEYWORD} {suffix}"));
            bases.push(suffix.to_owned());
            bases.push(collapsed);
        }
    }

    for base in bases {
        if base.trim().is_empty() {
            continue;
        }
        variants.insert(base.to_lowercase());
        variants.insert(base.to_uppercase());
        variants.insert(base);
    }
    variants
}

fn collapse(s: &str) -> String {
    s.split_whitespace().collect()
}
