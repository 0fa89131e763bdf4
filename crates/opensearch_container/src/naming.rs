//! Container naming and labeling conventions.
//!
//! Containers started by [`crate::DockerRuntime`] get a name that records
//! where they were started from and carry labels the orphan sweep looks for.

use chrono::Utc;
use std::env;
use uuid::Uuid;

#[cfg(test)]
#[path = "naming_tests.rs"]
mod tests;

/// Prefix of every generated container name.
pub const CONTAINER_NAME_PREFIX: &str = "opensearch-test-";

/// Label marking a container as started by this crate.
pub const MANAGED_LABEL: &str = "opensearch_container.managed";

/// Label recording the workflow context a container was started from.
pub const CONTEXT_LABEL: &str = "opensearch_container.context";

/// Extract workflow context from the GitHub Actions environment.
///
/// Returns:
/// - `pr{number}` for pull request workflows (e.g., "pr123")
/// - `main` for pushes to main/master branch
/// - the branch name with `/` replaced by `-` for other branches
/// - `local` for local development
pub fn get_workflow_context() -> String {
    if let Ok(github_ref) = env::var("GITHUB_REF") {
        if let Some(rest) = github_ref.strip_prefix("refs/pull/") {
            if let Some(pr_num) = rest.split('/').next() {
                return format!("pr{}", pr_num);
            }
        } else if let Some(branch) = github_ref.strip_prefix("refs/heads/") {
            if branch == "main" || branch == "master" {
                return "main".to_string();
            }
            return branch.replace('/', "-");
        }
    }

    "local".to_string()
}

/// Generate a unique container name.
///
/// Format: `opensearch-test-{context}-{timestamp}-{random}`
///
/// # Examples
///
/// ```
/// use opensearch_container::generate_container_name;
///
/// let name = generate_container_name();
/// // Result: opensearch-test-pr123-20240108-120000-a1b2c3 (in PR)
/// // Result: opensearch-test-local-20240108-120000-a1b2c3 (local)
/// assert!(name.starts_with("opensearch-test-"));
/// ```
pub fn generate_container_name() -> String {
    let context = get_workflow_context();
    let timestamp = Utc::now().format("%Y%m%d-%H%M%S");
    let random_suffix = Uuid::new_v4().simple().to_string()[..6].to_lowercase();
    format!(
        "{}{}-{}-{}",
        CONTAINER_NAME_PREFIX, context, timestamp, random_suffix
    )
}

/// Check if a container name follows the generated naming pattern.
///
/// Docker reports names with a leading `/`, which is ignored.
pub fn is_generated_container_name(name: &str) -> bool {
    name.trim_start_matches('/').starts_with(CONTAINER_NAME_PREFIX)
}
