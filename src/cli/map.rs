//! Map subcommand - run the pipeline on a file.

use std::path::{Path, PathBuf};

use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;

use crate::config::Config;
use crate::context::Context;
use crate::di::FromRef;
use crate::models::{MappingOptions, RawInput, RenderType};
use crate::services::MappingService;

/// Map a file to a graph and print it as JSON.
#[derive(Parser)]
pub struct MapCommand {
    /// Input file. `.json` files are parsed as rows or objects, anything
    /// else is read as text.
    pub input: PathBuf,

    /// Preferred layout.
    #[arg(long, value_enum, default_value_t = RenderType::Auto)]
    pub render_type: RenderType,

    /// Main category hint (also scopes knowledge lookup).
    #[arg(long)]
    pub main_category: Option<String>,

    /// Sub category hint; with `--main-category` bypasses detection.
    #[arg(long)]
    pub sub_category: Option<String>,

    /// Route hint. Defaults to `json` for JSON files and `file_analysis`
    /// otherwise.
    #[arg(long)]
    pub route_hint: Option<String>,

    /// Persist the result and print the stored record.
    #[arg(long)]
    pub store: bool,
}

impl MapCommand {
    /// Run the map command.
    pub async fn run(self) -> Result<()> {
        let config = Config::load()?;
        let ctx = Context::from_config(config).await?;
        let service = MappingService::from_ref(&ctx);

        let (raw, default_hint) = read_input(&self.input)?;
        let route_hint = self.route_hint.as_deref().unwrap_or(default_hint);
        let options = MappingOptions {
            render_type: self.render_type,
            main_category: self.main_category.clone(),
            sub_category: self.sub_category.clone(),
            filename: self
                .input
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
        };

        tracing::info!(input = %self.input.display(), route_hint, "Mapping file");

        let output = if self.store {
            let record = service.process_and_store(route_hint, &raw, &options).await?;
            serde_json::to_string_pretty(&record)?
        } else {
            let graph = service.process_to_graph(route_hint, &raw, &options).await;
            serde_json::to_string_pretty(&graph)?
        };
        println!("{output}");
        Ok(())
    }
}

/// Reads `path` as JSON or text, returning the input and its default hint.
fn read_input(path: &Path) -> Result<(RawInput, &'static str)> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        let value: serde_json::Value = serde_json::from_str(&content)
            .wrap_err_with(|| format!("Failed to parse {} as JSON", path.display()))?;
        return Ok((RawInput::from(value), "json"));
    }

    Ok((RawInput::Text(content), "file_analysis"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_read_json_rows() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"[{{"item": "revenue", "amount": 12500}}]"#).unwrap();

        let (raw, hint) = read_input(file.path()).unwrap();
        assert_eq!(hint, "json");
        assert!(matches!(raw, RawInput::Rows(rows) if rows.len() == 1));
    }

    #[test]
    fn test_read_text() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "a,b\n1,2").unwrap();

        let (raw, hint) = read_input(file.path()).unwrap();
        assert_eq!(hint, "file_analysis");
        assert_eq!(raw, RawInput::Text("a,b\n1,2".into()));
    }

    #[test]
    fn test_invalid_json_is_error() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{{not json").unwrap();
        assert!(read_input(file.path()).is_err());
    }
}
