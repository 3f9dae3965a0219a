use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};

/// Jira user identifier (account id or e-mail) to ADO unique name.
#[derive(Debug, Default, Clone)]
pub struct UserMap {
    entries: HashMap<String, String>,
}

impl UserMap {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read user mapping file {}", path.display()))?;
        Ok(Self::parse(&contents))
    }

    /// Parse `jira=ado` lines. Keys are kept verbatim; values lose trailing whitespace.
    pub fn parse(contents: &str) -> Self {
        let mut entries = HashMap::new();
        for (lineno, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let mut parts = line.split('=');
            match (parts.next(), parts.next()) {
                (Some(key), Some(value)) => {
                    entries.insert(key.to_string(), value.trim_end().to_string());
                }
                _ => {
                    tracing::warn!(line = lineno + 1, "Skipping user mapping line without '='");
                }
            }
        }
        Self { entries }
    }

    pub fn get(&self, jira_user: &str) -> Option<&str> {
        self.entries.get(jira_user).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
