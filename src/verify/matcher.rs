use crate::model::ado::AdoWorkItem;
use crate::model::jira::{truncate_title, JiraIssue, MAX_TITLE_LEN};

/// Whether `ado_title` is the migrated form of `mapped`, either verbatim or
/// cut down by ADO's title limit.
pub fn title_matches(ado_title: &str, mapped: &str) -> bool {
    ado_title == mapped
        || (ado_title.chars().count() >= MAX_TITLE_LEN && ado_title == truncate_title(mapped))
}

/// The work item migrated from `issue`. When several titles match, the last
/// one in listing order wins.
pub fn find_counterpart<'a>(
    issue: &JiraIssue,
    items: &[&'a AdoWorkItem],
) -> Option<&'a AdoWorkItem> {
    let mapped = issue.mapped_title();
    let matches: Vec<&'a AdoWorkItem> = items
        .iter()
        .copied()
        .filter(|item| title_matches(item.title(), &mapped))
        .collect();

    if matches.len() > 1 {
        let ids: Vec<u64> = matches.iter().map(|i| i.id).collect();
        tracing::warn!(issue = %issue.key, ?ids, "Several work items carry the same title");
    }
    matches.last().copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn issue(key: &str, summary: &str) -> JiraIssue {
        serde_json::from_value(json!({"key": key, "fields": {"summary": summary}})).unwrap()
    }

    fn item(id: u64, title: &str) -> AdoWorkItem {
        serde_json::from_value(json!({"id": id, "fields": {"System.Title": title}})).unwrap()
    }

    #[test]
    fn short_titles_need_exact_equality() {
        assert!(title_matches("[AB-1] Fix login", "[AB-1] Fix login"));
        assert!(!title_matches("[AB-1] Fix login ", "[AB-1] Fix login"));
        assert!(!title_matches("[AB-1] Fix...", "[AB-1] Fix login"));
    }

    #[test]
    fn truncated_titles_match_prefix_plus_ellipsis() {
        let mapped = format!("[AB-1] {}", "y".repeat(400));
        let truncated = truncate_title(&mapped);
        assert_eq!(truncated.chars().count(), 255);
        assert!(title_matches(&truncated, &mapped));

        // a different tail after the 252-char prefix must not match
        let other = format!("{}xyz", &truncated[..252]);
        assert!(!title_matches(&other, &mapped));
    }

    #[test]
    fn truncation_rule_counts_chars_not_bytes() {
        let mapped = format!("[AB-1] {}", "å".repeat(300));
        let truncated = truncate_title(&mapped);
        assert!(truncated.len() > 255);
        assert!(title_matches(&truncated, &mapped));
    }

    #[test]
    fn last_match_wins() {
        let a = item(1, "[AB-1] Fix login");
        let b = item(2, "[AB-2] Other");
        let c = item(3, "[AB-1] Fix login");
        let found = find_counterpart(&issue("AB-1", "Fix login"), &[&a, &b, &c]).unwrap();
        assert_eq!(found.id, 3);
    }

    #[test]
    fn no_match_yields_none() {
        let a = item(1, "[AB-2] Other");
        assert!(find_counterpart(&issue("AB-1", "Fix login"), &[&a]).is_none());
    }
}
