//! Claims carried by a GitHub Actions OIDC token.
//!
//! Only the claims the authorizer reads or logs are modelled. `aud` is
//! checked by the validator against the raw claim set and is not kept here.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Claims of a verified GitHub Actions identity token.
///
/// `sub` and `actor` identify a principal and are redacted in Debug output.
#[derive(Clone, Serialize, Deserialize)]
pub struct GitHubClaims {
    /// Subject, e.g. `repo:org/name:ref:refs/heads/main`.
    #[serde(default)]
    pub sub: Option<String>,

    /// Issuer.
    pub iss: String,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Issued-at timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Not-before timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// `owner/name` of the repository running the workflow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    /// Git ref the workflow runs on.
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,

    /// Workflow name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow: Option<String>,

    /// User that triggered the run - redacted in Debug output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
}

impl fmt::Debug for GitHubClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubClaims")
            .field("sub", &"[REDACTED]")
            .field("iss", &self.iss)
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .field("nbf", &self.nbf)
            .field("repository", &self.repository)
            .field("git_ref", &self.git_ref)
            .field("workflow", &self.workflow)
            .field("actor", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_debug_redacts_principal() {
        let claims = GitHubClaims {
            sub: Some("repo:org/secret-repo:ref:refs/heads/main".to_string()),
            iss: "https://token.actions.githubusercontent.com".to_string(),
            exp: 1234567890,
            iat: Some(1234567800),
            nbf: None,
            repository: Some("org/secret-repo".to_string()),
            git_ref: Some("refs/heads/main".to_string()),
            workflow: Some("deploy".to_string()),
            actor: Some("octocat".to_string()),
        };

        let debug_str = format!("{:?}", claims);

        assert!(!debug_str.contains("repo:org/secret-repo"));
        assert!(!debug_str.contains("octocat"));
        assert!(debug_str.contains("[REDACTED]"));
        assert!(debug_str.contains("deploy"));
    }

    #[test]
    fn test_claims_deserialize_github_payload() {
        let json = r#"{
            "jti": "example-id",
            "sub": "repo:octo-org/octo-repo:environment:prod",
            "environment": "prod",
            "aud": "consid-germany/gates",
            "ref": "refs/heads/main",
            "sha": "example-sha",
            "repository": "octo-org/octo-repo",
            "repository_owner": "octo-org",
            "actor": "octocat",
            "workflow": "example-workflow",
            "event_name": "workflow_dispatch",
            "ref_type": "branch",
            "job_workflow_ref": "octo-org/octo-automation/.github/workflows/oidc.yml@refs/heads/main",
            "iss": "https://token.actions.githubusercontent.com",
            "nbf": 1632492967,
            "exp": 1632493867,
            "iat": 1632493567
        }"#;

        let claims: GitHubClaims = serde_json::from_str(json).unwrap();

        assert_eq!(
            claims.sub.as_deref(),
            Some("repo:octo-org/octo-repo:environment:prod")
        );
        assert_eq!(claims.git_ref.as_deref(), Some("refs/heads/main"));
        assert_eq!(claims.repository.as_deref(), Some("octo-org/octo-repo"));
        assert_eq!(claims.nbf, Some(1632492967));
        assert_eq!(claims.exp, 1632493867);
    }

    #[test]
    fn test_claims_without_sub() {
        let json = r#"{"iss": "https://token.actions.githubusercontent.com", "exp": 1}"#;
        let claims: GitHubClaims = serde_json::from_str(json).unwrap();
        assert!(claims.sub.is_none());
    }
}
