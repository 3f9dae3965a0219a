use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Project-specific expectations the smoke test checks migrated items against.
///
/// Every default reproduces the fixture project the migrator's integration
/// run targets; a TOML file only needs to name what differs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    pub area_path: String,
    /// Only issues whose first fix version has this name get the fix-version check.
    /// When unset, any name listed among the project's releases qualifies.
    pub fix_version: Option<String>,
    /// Jira status name to the ADO states it may land in.
    pub status: BTreeMap<String, Vec<String>>,
    /// Jira priority name to ADO priority number.
    pub priority: BTreeMap<String, i64>,
    pub attachment_size_limit: u64,
    /// ADO pages relations; at or above this many attachments the count is unreliable.
    pub attachment_count_ceiling: usize,
    pub date_tolerance_secs: f64,
    pub link_comment_marker: String,
    pub unformatted_attachment_marker: String,
    pub unformatted_issue_link_marker: String,
    pub cloud_host_marker: String,
    pub related_link_type: String,
    pub report_unmatched: bool,
    pub check_remote_links: bool,
    pub search_page_size: u32,
    pub rendered_fields: Vec<RenderedField>,
    pub simple_fields: Vec<FieldPair>,
    pub named_fields: Vec<FieldPair>,
    pub user_fields: Vec<FieldPair>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldPair {
    pub jira: String,
    pub ado: String,
}

impl FieldPair {
    fn new(jira: &str, ado: &str) -> Self {
        Self {
            jira: jira.into(),
            ado: ado.into(),
        }
    }
}

/// A Jira wiki-markup field the migrator converts to HTML.
#[derive(Debug, Clone, Deserialize)]
pub struct RenderedField {
    pub jira: String,
    pub ado: String,
    #[serde(default)]
    pub check_issue_links: bool,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        let status = [
            ("Klart", vec!["Resolved", "Closed"]),
            ("Pågående", vec!["Active"]),
            ("Att göra", vec!["New"]),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.into_iter().map(String::from).collect()))
        .collect();

        // Medium and Low both land on 3.
        let priority = [
            ("Highest", 1),
            ("High", 2),
            ("Medium", 3),
            ("Low", 3),
            ("Lowest", 4),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            area_path: "AzureDevOps-Jira-Migrator-Smoke-Tests\\Migrated".into(),
            fix_version: Some("2021.2.0.296".into()),
            status,
            priority,
            attachment_size_limit: 60_000_000,
            attachment_count_ceiling: 100,
            date_tolerance_secs: 2.0,
            link_comment_marker: "Added link(s): [Added]".into(),
            unformatted_attachment_marker: "https://dev.azure.com/secure/attachment/".into(),
            unformatted_issue_link_marker:
                "href=\\\"https://solidifydemo.atlassian.net/browse/AGILEDEMO-".into(),
            cloud_host_marker: ".atlassian.net".into(),
            related_link_type: "Relates".into(),
            report_unmatched: true,
            check_remote_links: false,
            search_page_size: 100,
            rendered_fields: vec![
                RenderedField {
                    jira: "description".into(),
                    ado: "System.Description".into(),
                    check_issue_links: true,
                },
                RenderedField {
                    jira: "customfield_10066".into(),
                    ado: "Custom.CustomHtml".into(),
                    check_issue_links: false,
                },
            ],
            simple_fields: vec![
                FieldPair::new("customfield_10067", "Custom.CustomPlainText"),
                FieldPair::new("customfield_10077", "Custom.CustomNumber"),
                FieldPair::new("customfield_10101", "Custom.CustomRating"),
                FieldPair::new("customfield_10103", "Custom.CustomSlider"),
                FieldPair::new("customfield_10082", "Custom.CustomUrlField"),
                FieldPair::new("customfield_10084", "Custom.CustomFormula"),
            ],
            named_fields: vec![FieldPair::new(
                "customfield_10014",
                "Microsoft.VSTS.Scheduling.StoryPoints",
            )],
            user_fields: vec![FieldPair::new(
                "alexander-testar-custom-userpicker",
                "Custom.CustomUserPicker",
            )],
        }
    }
}

impl VerifyConfig {
    /// Jira field ids the search must return on top of the standard ones.
    pub fn custom_field_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .rendered_fields
            .iter()
            .map(|f| f.jira.as_str())
            .chain(self.simple_fields.iter().map(|f| f.jira.as_str()))
            .chain(self.named_fields.iter().map(|f| f.jira.as_str()))
            .chain(self.user_fields.iter().map(|f| f.jira.as_str()))
            .filter(|id| id.starts_with("customfield_"))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("jira-ado-check")
        .join("config.toml")
}

/// Load the config from `path`, or from the user config dir when none is given.
/// A missing default file yields the built-in defaults; a missing explicit one is an error.
pub fn load_config(path: Option<&Path>) -> Result<VerifyConfig> {
    let (path, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (config_path(), false),
    };
    if !explicit && !path.exists() {
        return Ok(VerifyConfig::default());
    }
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: VerifyConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    tracing::debug!(path = %path.display(), "Loaded verification config");
    Ok(config)
}
