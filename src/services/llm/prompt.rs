//! Instruction block sent to every model backend.

use crate::models::RenderType;
use crate::services::category::ResolvedCategory;

/// Currency and quantity markers that make table extraction worthwhile.
const TABLE_HINT_KEYWORDS: &[&str] = &[
    "amount", "revenue", "cost", "만원", "원", "금액", "매출", "매입", "비용",
];

/// Marker used when no knowledge was retrieved.
pub const NO_KNOWLEDGE: &str = "none";

/// Builds category-specific prompts with a fixed JSON output schema.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    char_limit: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(2000)
    }
}

impl PromptBuilder {
    pub fn new(char_limit: usize) -> Self {
        Self { char_limit }
    }

    /// Whether the model should be asked for a `table_data` array.
    pub fn wants_table_data(text: &str, render_type: RenderType) -> bool {
        if render_type == RenderType::Settlement {
            return true;
        }
        let lowered = text.to_lowercase();
        TABLE_HINT_KEYWORDS.iter().any(|k| lowered.contains(k))
    }

    pub fn build(
        &self,
        text: &str,
        category: &ResolvedCategory,
        knowledge: &str,
        render_type: RenderType,
    ) -> String {
        let wants_table = Self::wants_table_data(text, render_type);
        let suggested_render = if wants_table {
            RenderType::Settlement.as_str()
        } else {
            render_type.as_str()
        };
        let knowledge = if knowledge.trim().is_empty() {
            NO_KNOWLEDGE
        } else {
            knowledge
        };

        let mut prompt = format!(
            "You are a visualization expert in {description}.\n\
             Analyze [DATA] and convert it to JSON.\n",
            description = category.description,
        );

        if wants_table {
            prompt.push_str(
                "When the data contains amounts or ratios, include a \"table_data\" array \
                 of rows such as [{\"item\": \"name\", \"amount\": number}].\n\
                 Example: \"revenue 12500, cost 7200\" -> \"table_data\": \
                 [{\"item\": \"revenue\", \"amount\": 12500}, {\"item\": \"cost\", \"amount\": 7200}]\n",
            );
        }

        prompt.push_str(&format!("\n[KNOWLEDGE]\n{knowledge}\n"));
        prompt.push_str("\n[OUTPUT] Respond with JSON only:\n{\n");
        prompt.push_str("  \"summary\": \"short summary\",\n");
        prompt.push_str(&format!("  \"suggested_render\": \"{suggested_render}\",\n"));
        if wants_table {
            prompt.push_str("  \"table_data\": [{\"item\": \"name\", \"amount\": 0}],\n");
        }
        prompt.push_str(
            "  \"keywords\": [{\"term\": \"keyword\", \"value\": \"value\", \"definition\": \"meaning\", \
             \"importance\": 1-10, \"references\": [{\"title\": \"\", \"url\": \"\", \"snippet\": \"\"}]}],\n",
        );
        prompt.push_str(
            "  \"relations\": [{\"source\": \"A\", \"target\": \"B\", \"label\": \"relation\", \"strength\": 1-10}]\n",
        );
        prompt.push_str("}\n");
        prompt.push_str(&format!("\n[DATA]\n{}\n", truncate_chars(text, self.char_limit)));
        prompt
    }
}

/// First `max` characters of `text`.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
