//! Field checks between a Jira issue and its migrated work item.
//!
//! Every check is a pure function of a [`ComparisonContext`]; a clean field
//! yields nothing, a broken one yields a [`Mismatch`] carrying the issue's
//! mapped title, the field under test and both values.

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::Value;

use super::context::ComparisonContext;
use super::report::Mismatch;
use crate::config::RenderedField;
use crate::model::ado::{REL_ATTACHED_FILE, REL_CHILD, REL_HYPERLINK, REL_PARENT, REL_RELATED};

const JIRA_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// Run every check in its fixed order.
pub fn compare_all(ctx: &ComparisonContext) -> Vec<Mismatch> {
    let config = ctx.config();
    let mut out = Vec::new();

    for field in &config.rendered_fields {
        out.extend(rendered_field(ctx, field));
    }
    out.extend(status(ctx));
    out.extend(attachment_count(ctx));
    out.extend(area_path(ctx));
    out.extend(comment_count(ctx));
    out.extend(user(ctx, "assignee", "System.AssignedTo"));
    out.extend(parent(ctx));
    out.extend(related_issues(ctx));
    out.extend(subtasks(ctx));
    out.extend(fix_version(ctx));
    out.extend(date(ctx, "created", "System.CreatedDate"));
    out.extend(date(ctx, "updated", "System.ChangedDate"));
    if ctx.run.verify_reporter {
        out.extend(user(ctx, "reporter", "Custom.Reporter"));
    }
    for pair in &config.user_fields {
        out.extend(user(ctx, &pair.jira, &pair.ado));
    }
    for pair in &config.named_fields {
        out.extend(field_named(ctx, &pair.jira, &pair.ado));
    }
    out.extend(priority(ctx));
    for pair in &config.simple_fields {
        out.extend(field_simple(ctx, &pair.jira, &pair.ado));
    }
    out.extend(remote_links(ctx));
    out
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// JSON equality where `5` and `5.0` are the same number.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Jira timestamps carry `+0100` offsets, ADO ones are RFC 3339.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_str(s, JIRA_TIME_FORMAT))
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// A non-null Jira value must equal the ADO value verbatim.
pub fn field_simple(ctx: &ComparisonContext, jira_key: &str, ado_key: &str) -> Option<Mismatch> {
    let jira = ctx.issue.fields.custom(jira_key)?;
    let ado = ctx.item.fields.json(ado_key);
    match ado {
        Some(ado) if values_equal(jira, &ado) => None,
        ado => Some(Mismatch::value(
            &ctx.title,
            ado_key,
            display(jira),
            ado.as_ref().map(display).unwrap_or_default(),
        )),
    }
}

/// The first `name` of a non-empty Jira object list must equal the ADO value.
pub fn field_named(ctx: &ComparisonContext, jira_key: &str, ado_key: &str) -> Option<Mismatch> {
    let list = ctx.issue.fields.named_list(jira_key)?;
    let name = &list.first()?.name;
    let ado = ctx.item.fields.json(ado_key);
    match ado {
        Some(ado) if values_equal(&Value::from(name.as_str()), &ado) => None,
        ado => Some(Mismatch::value(
            &ctx.title,
            ado_key,
            name,
            ado.as_ref().map(display).unwrap_or_default(),
        )),
    }
}

/// A mapped Jira user must arrive as the ADO identity the user map names.
pub fn user(ctx: &ComparisonContext, jira_key: &str, ado_key: &str) -> Option<Mismatch> {
    let jira_user = ctx.issue.fields.user(jira_key)?;
    let id = jira_user.identifier(ctx.run.identity)?;
    let expected = ctx.run.users.get(id)?;

    match ctx.item.fields.identity(ado_key).and_then(|i| i.unique_name) {
        None => {
            let shown = jira_user.display_name.as_deref().unwrap_or(id);
            Some(Mismatch::value(&ctx.title, ado_key, shown, ""))
        }
        Some(actual) if actual == expected => None,
        Some(actual) => Some(Mismatch::value(&ctx.title, ado_key, expected, actual)),
    }
}

/// Whether `diff` is further from zero than the tolerance, at nanosecond precision.
fn exceeds_tolerance(diff: TimeDelta, tolerance_secs: f64) -> bool {
    match diff.num_nanoseconds() {
        Some(nanos) => nanos.unsigned_abs() as f64 > tolerance_secs * 1e9,
        None => true,
    }
}

/// Timestamps must agree within the configured tolerance.
pub fn date(ctx: &ComparisonContext, jira_key: &str, ado_key: &str) -> Option<Mismatch> {
    let jira = ctx.issue.fields.timestamp(jira_key);
    let ado = ctx.item.fields.timestamp(ado_key);
    let mismatch = || {
        Mismatch::value(
            &ctx.title,
            ado_key,
            jira.unwrap_or_default(),
            ado.unwrap_or_default(),
        )
    };

    match (jira, ado) {
        (None, None) => None,
        (Some(j), Some(a)) => match (parse_timestamp(j), parse_timestamp(a)) {
            (Some(jt), Some(at)) => {
                exceeds_tolerance(jt - at, ctx.config().date_tolerance_secs).then(mismatch)
            }
            _ => Some(mismatch()),
        },
        _ => Some(mismatch()),
    }
}

/// Wiki-markup fields must have been converted, and converted links must not
/// still point at the raw Jira locations.
pub fn rendered_field(ctx: &ComparisonContext, field: &RenderedField) -> Vec<Mismatch> {
    let Some(text) = ctx
        .issue
        .fields
        .text(&field.jira)
        .filter(|t| !t.trim().is_empty())
    else {
        return Vec::new();
    };
    let ado = ctx.item.fields.text(&field.ado).unwrap_or_default();
    let config = ctx.config();
    let mut out = Vec::new();

    if text.contains(ado) {
        out.push(Mismatch::value(&ctx.title, &field.ado, text, ado));
    }
    let marker = &config.unformatted_attachment_marker;
    if !marker.is_empty() && ado.contains(marker.as_str()) {
        out.push(Mismatch::UnformattedAttachmentLink {
            issue: ctx.title.clone(),
            field: field.ado.clone(),
        });
    }
    let marker = &config.unformatted_issue_link_marker;
    if field.check_issue_links && !marker.is_empty() && ado.contains(marker.as_str()) {
        out.push(Mismatch::UnformattedIssueLink {
            issue: ctx.title.clone(),
            field: field.ado.clone(),
        });
    }
    out
}

pub fn status(ctx: &ComparisonContext) -> Option<Mismatch> {
    let name = &ctx.issue.fields.status.as_ref()?.name;
    let allowed = ctx.config().status.get(name)?;
    let state = ctx.item.fields.state.as_deref().unwrap_or_default();
    if allowed.iter().any(|s| s == state) {
        None
    } else {
        Some(Mismatch::value(&ctx.title, "System.State", name, state))
    }
}

pub fn priority(ctx: &ComparisonContext) -> Option<Mismatch> {
    let name = &ctx.issue.fields.priority.as_ref()?.name;
    let expected = *ctx.config().priority.get(name)?;
    match ctx.item.fields.priority {
        Some(actual) if actual == expected => None,
        actual => Some(Mismatch::value(
            &ctx.title,
            "Microsoft.VSTS.Common.Priority",
            name,
            actual.map(|p| p.to_string()).unwrap_or_default(),
        )),
    }
}

/// Attachments under the size limit must all have been carried over. ADO
/// pages relations, so counts at or over the ceiling cannot be verified.
pub fn attachment_count(ctx: &ComparisonContext) -> Option<Mismatch> {
    let config = ctx.config();
    let jira_count = ctx
        .issue
        .fields
        .attachment
        .as_ref()?
        .iter()
        .filter(|a| a.size < config.attachment_size_limit)
        .count();
    if jira_count == 0 {
        return None;
    }
    let ado_count = ctx.item.relation_count(REL_ATTACHED_FILE);
    (ado_count < config.attachment_count_ceiling && ado_count != jira_count)
        .then(|| Mismatch::value(&ctx.title, "AttachmentCount", jira_count, ado_count))
}

pub fn area_path(ctx: &ComparisonContext) -> Option<Mismatch> {
    let expected = &ctx.config().area_path;
    let actual = ctx.item.fields.area_path.as_deref().unwrap_or_default();
    (actual != expected).then(|| Mismatch::value(&ctx.title, "System.AreaPath", expected, actual))
}

/// Comments the migrator adds to record link changes are not counted.
pub fn comment_count(ctx: &ComparisonContext) -> Option<Mismatch> {
    let jira_count = ctx.issue.fields.comment_count();
    if jira_count == 0 {
        return None;
    }
    let comments = ctx.comments?;
    let marker = ctx.config().link_comment_marker.as_str();
    let ado_count = comments
        .iter()
        .filter(|c| marker.is_empty() || !c.text.contains(marker))
        .count();
    (ado_count != jira_count)
        .then(|| Mismatch::value(&ctx.title, "CommentCount", jira_count, ado_count))
}

pub fn parent(ctx: &ComparisonContext) -> Option<Mismatch> {
    let parent_title = ctx.issue.fields.parent.as_ref()?.mapped_title();

    let Some(links) = ctx.item.relations_of(REL_PARENT) else {
        return Some(Mismatch::value(&ctx.title, "Parent", &parent_title, ""));
    };
    let Some(link) = links.first() else {
        return Some(Mismatch::Missing {
            issue: ctx.title.clone(),
            field: "Parent".into(),
        });
    };

    match ctx.run.cache.resolve_title(link) {
        Some(actual) if actual == parent_title => None,
        Some(actual) => Some(Mismatch::value(&ctx.title, "Parent", &parent_title, actual)),
        None => Some(Mismatch::value(
            &ctx.title,
            "Parent",
            &parent_title,
            format!("unknown work item {}", link.url),
        )),
    }
}

/// Each related Jira issue must be linked the same number of times in ADO.
pub fn related_issues(ctx: &ComparisonContext) -> Vec<Mismatch> {
    let link_type = ctx.config().related_link_type.as_str();
    let related: Vec<String> = ctx
        .issue
        .fields
        .issuelinks
        .iter()
        .filter(|l| l.link_type.name == link_type)
        .filter_map(|l| l.linked_issue().map(|i| i.mapped_title()))
        .collect();
    if related.is_empty() {
        return Vec::new();
    }

    let Some(links) = ctx.item.relations_of(REL_RELATED) else {
        return vec![Mismatch::value(
            &ctx.title,
            "Linked Issue count",
            related.len(),
            0,
        )];
    };

    let mut out = Vec::new();
    let mut seen: Vec<&str> = Vec::new();
    for title in &related {
        if seen.contains(&title.as_str()) {
            continue;
        }
        seen.push(title);
        let jira_count = related.iter().filter(|t| *t == title).count();
        let ado_count = links
            .iter()
            .filter(|l| ctx.run.cache.resolve_title(l) == Some(title.as_str()))
            .count();
        if ado_count != jira_count {
            out.push(Mismatch::value(
                &ctx.title,
                "Related issues count",
                format!("{jira_count} x {title}"),
                ado_count,
            ));
        }
    }
    out
}

/// Each Jira subtask must be exactly one ADO child.
pub fn subtasks(ctx: &ComparisonContext) -> Vec<Mismatch> {
    let subtasks = &ctx.issue.fields.subtasks;
    if subtasks.is_empty() {
        return Vec::new();
    }

    let Some(children) = ctx.item.relations_of(REL_CHILD) else {
        return vec![Mismatch::value(
            &ctx.title,
            "Subtask (child) count",
            subtasks.len(),
            0,
        )];
    };

    subtasks
        .iter()
        .filter_map(|sub| {
            let title = sub.mapped_title();
            let count = children
                .iter()
                .filter(|l| ctx.run.cache.resolve_title(l) == Some(title.as_str()))
                .count();
            (count != 1).then(|| {
                Mismatch::value(
                    &ctx.title,
                    "Subtask (child) count",
                    format!("1 x {title}"),
                    count,
                )
            })
        })
        .collect()
}

pub fn fix_version(ctx: &ComparisonContext) -> Option<Mismatch> {
    let first = ctx.issue.fields.fix_versions.first()?;
    let qualifies = match &ctx.config().fix_version {
        Some(name) => &first.name == name,
        None => ctx.run.releases.iter().any(|r| r.name == first.name),
    };
    if !qualifies {
        return None;
    }
    field_named(ctx, "fixVersions", "Custom.FixVersion")
}

/// Remote links become ADO hyperlinks pointing at the same URLs.
pub fn remote_links(ctx: &ComparisonContext) -> Option<Mismatch> {
    if !ctx.config().check_remote_links {
        return None;
    }
    let links = ctx.remote_links?;
    let hyperlinks = ctx.item.relations_of(REL_HYPERLINK).unwrap_or_default();
    if links.len() != hyperlinks.len() {
        return Some(Mismatch::value(
            &ctx.title,
            "Remote link count",
            links.len(),
            hyperlinks.len(),
        ));
    }
    let missing = links
        .iter()
        .filter_map(|l| l.object.url.as_deref())
        .find(|url| !hyperlinks.iter().any(|h| h.url == *url))?;
    Some(Mismatch::value(&ctx.title, "Hyperlink", missing, ""))
}
