use portal::SearchQuery;

/// Facet fields requested when the query names none.
pub const DEFAULT_FACET_FIELDS: &[&str] = &["organization", "groups", "tags", "res_format", "license_id"];

const DEFAULT_FACET_LIMIT: u64 = 5;

/// Splits on whitespace that is not inside double quotes. Quotes are kept so
/// Solr still sees phrase terms.
fn split_terms(q: &str) -> Vec<String> {
    let mut terms = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for c in q.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                current.push(c);
            }
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    terms.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        terms.push(current);
    }
    terms
}

/// Translates a portal search into `package_search` parameters.
///
/// `field:value` terms of the free text become filter queries; sort
/// specifications use Solr's `field direction` form. Empty and zero-valued
/// parameters are left out.
pub fn to_ckan_search_params(query: &SearchQuery) -> Vec<(String, String)> {
    let mut q = Vec::new();
    let mut fq = Vec::new();
    for term in query.q.as_deref().map(split_terms).unwrap_or_default() {
        if term.contains(':') {
            fq.push(term);
        } else {
            q.push(term);
        }
    }
    if let Some(explicit) = query.fq.as_deref().filter(|f| !f.trim().is_empty()) {
        fq.push(explicit.trim().to_string());
    }

    let mut params = Vec::new();
    let mut push = |key: &str, value: String| {
        if !value.is_empty() {
            params.push((key.to_string(), value));
        }
    };
    push("q", q.join(" "));
    push("fq", fq.join(" "));
    push("rows", query.size.map(|s| s.to_string()).unwrap_or_default());
    push(
        "start",
        query.from.filter(|f| *f > 0).map(|f| f.to_string()).unwrap_or_default(),
    );
    let sort: Vec<String> = query
        .sort
        .iter()
        .map(|s| s.replacen(':', " ", 1))
        .filter(|s| !s.trim().is_empty())
        .collect();
    push("sort", sort.join(","));

    let fields: Vec<&str> = if query.facet_fields.is_empty() {
        DEFAULT_FACET_FIELDS.to_vec()
    } else {
        query.facet_fields.iter().map(String::as_str).collect()
    };
    push(
        "facet.field",
        serde_json::to_string(&fields).unwrap_or_default(),
    );
    push(
        "facet.limit",
        query.facet_limit.unwrap_or(DEFAULT_FACET_LIMIT).to_string(),
    );
    push(
        "facet.mincount",
        query
            .facet_mincount
            .filter(|m| *m > 0)
            .map(|m| m.to_string())
            .unwrap_or_default(),
    );
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn filter_terms_move_to_fq() {
        let query = SearchQuery::from_pairs([
            ("q", r#"air "kota bandung" organization:bps"#),
            ("fq", "res_format:CSV"),
        ]);
        let params = to_ckan_search_params(&query);
        assert_eq!(param(&params, "q"), Some(r#"air "kota bandung""#));
        assert_eq!(param(&params, "fq"), Some("organization:bps res_format:CSV"));
    }

    #[test]
    fn paging_and_sort() {
        let query = SearchQuery::from_pairs([
            ("size", "20"),
            ("from", "40"),
            ("sort", "score:desc"),
            ("sort", "metadata_modified:desc"),
        ]);
        let params = to_ckan_search_params(&query);
        assert_eq!(param(&params, "rows"), Some("20"));
        assert_eq!(param(&params, "start"), Some("40"));
        assert_eq!(param(&params, "sort"), Some("score desc,metadata_modified desc"));
    }

    #[test]
    fn defaults_and_omissions() {
        let params = to_ckan_search_params(&SearchQuery::from_pairs([("from", "0")]));
        assert_eq!(param(&params, "q"), None);
        assert_eq!(param(&params, "fq"), None);
        assert_eq!(param(&params, "start"), None);
        assert_eq!(param(&params, "facet.mincount"), None);
        assert_eq!(param(&params, "facet.limit"), Some("5"));
        assert_eq!(
            param(&params, "facet.field"),
            Some(r#"["organization","groups","tags","res_format","license_id"]"#)
        );
    }

    #[test]
    fn unbalanced_quotes_keep_the_rest_together() {
        assert_eq!(split_terms(r#"a "b c"#), vec!["a", r#""b c"#]);
        assert!(split_terms("   ").is_empty());
    }
}
