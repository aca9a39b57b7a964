//! Category registry used to pick a model tier for text analysis.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Id of the category used when nothing else matches.
pub const DEFAULT_CATEGORY_ID: &str = "GENERAL_DOC";

/// Cost/quality class deciding which model backends are attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    /// Cheapest: the self-hosted backend is skipped.
    Local,
    /// Fast general-purpose analysis.
    Flash,
    /// Expert analysis with search grounding on the cloud backend.
    Pro,
}

impl ModelTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelTier::Local => "local",
            ModelTier::Flash => "flash",
            ModelTier::Pro => "pro",
        }
    }
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A data category with its detection keywords and model tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Stable id (e.g. `FINANCE_TAX`).
    pub id: String,
    pub tier: ModelTier,
    /// Detection keywords, matched case-insensitively as substrings.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Domain description used to frame prompts.
    pub description: String,
}

impl Category {
    fn new(id: &str, tier: ModelTier, keywords: &[&str], description: &str) -> Self {
        Self {
            id: id.to_string(),
            tier,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            description: description.to_string(),
        }
    }
}

/// Ordered, immutable category registry.
///
/// Iteration order is part of the contract: when two categories score the
/// same number of keyword hits, the one registered first wins. The registry
/// always contains [`DEFAULT_CATEGORY_ID`]; one is appended if a custom list
/// omits it.
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    categories: Vec<Category>,
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self::new(vec![
            Category::new(
                "FINANCE_TAX",
                ModelTier::Pro,
                &["세금", "부가세", "vat", "과세", "면세", "세무", "공제", "tax"],
                "tax and tax-compliance data analysis requiring expert knowledge",
            ),
            Category::new(
                "FINANCE_SETTLEMENT",
                ModelTier::Flash,
                &["정산", "입금", "출금", "계좌", "송금", "거래내역", "결제", "settlement"],
                "settlement and financial transaction analysis",
            ),
            Category::new(
                "INFRA_ARCHITECTURE",
                ModelTier::Pro,
                &["kubernetes", "k8s", "docker", "aws", "vpc", "subnet", "msa", "아키텍처"],
                "cloud and infrastructure architecture analysis",
            ),
            Category::new(
                "INFRA_LOG",
                ModelTier::Local,
                &["error", "warn", "info", "debug", "exception", "stacktrace", "로그"],
                "server log pattern analysis and structuring",
            ),
            Category::new(
                "LEGAL_COMPLIANCE",
                ModelTier::Pro,
                &["약관", "준수", "법률", "조항", "규정", "위반", "개인정보", "compliance"],
                "legal and compliance review",
            ),
            Category::new(
                DEFAULT_CATEGORY_ID,
                ModelTier::Flash,
                &[],
                "general document summary and analysis",
            ),
        ])
    }
}

impl CategoryRegistry {
    /// Builds a registry preserving the given order.
    pub fn new(mut categories: Vec<Category>) -> Self {
        if !categories.iter().any(|c| c.id == DEFAULT_CATEGORY_ID) {
            categories.push(Category::new(
                DEFAULT_CATEGORY_ID,
                ModelTier::Flash,
                &[],
                "general document summary and analysis",
            ));
        }
        Self { categories }
    }

    /// Registry from configuration, or the built-in one when none is given.
    pub fn from_config(categories: &[Category]) -> Self {
        if categories.is_empty() {
            Self::default()
        } else {
            Self::new(categories.to_vec())
        }
    }

    /// Categories in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// The category for `id`, or the default category for unknown ids.
    pub fn resolve(&self, id: &str) -> &Category {
        self.get(id).unwrap_or_else(|| self.fallback())
    }

    /// The default category.
    pub fn fallback(&self) -> &Category {
        // `new` guarantees presence.
        self.categories
            .iter()
            .find(|c| c.id == DEFAULT_CATEGORY_ID)
            .unwrap_or(&self.categories[self.categories.len() - 1])
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
