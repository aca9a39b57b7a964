//! Correlation rules owned by the external rule store.

use serde::{Deserialize, Serialize};

use super::clamp_score;

/// Keyword-pair rule inferring a link between two nodes.
///
/// Read-only to the pipeline; rules are applied in store order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationRule {
    /// Grouping label (e.g. `FINANCE`); informational only.
    pub category: String,
    pub keywords: Vec<String>,
    pub strength: u8,
    pub label: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl CorrelationRule {
    pub fn new(category: &str, keywords: &[&str], strength: i64, label: &str) -> Self {
        Self {
            category: category.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            strength: clamp_score(strength),
            label: label.to_string(),
            is_active: true,
        }
    }

    /// Rules seeded into a fresh rule store.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new(
                "FINANCE",
                &[
                    "payment", "billing", "price", "amount", "settlement", "tax", "money",
                    "cost", "결제", "정산", "금액", "매출",
                ],
                8,
                "Financial Connection",
            ),
            Self::new(
                "IDENTITY",
                &[
                    "user", "account", "login", "member", "id", "auth", "profile", "유저",
                    "계정", "로그인", "회원",
                ],
                7,
                "User Identity Flow",
            ),
            Self::new(
                "INFRA",
                &[
                    "server", "db", "database", "network", "cloud", "aws", "redis", "cache",
                    "storage", "서버", "데이터베이스", "인프라",
                ],
                6,
                "Infrastructure Link",
            ),
            Self::new(
                "DEVOPS",
                &[
                    "ci", "cd", "pipeline", "git", "repo", "docker", "k8s", "jenkins", "배포",
                    "파이프라인",
                ],
                5,
                "DevOps Workflow",
            ),
        ]
    }
}
