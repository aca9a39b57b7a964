//! Categories command handler.

use color_eyre::Result;

use crate::config::Config;
use crate::models::CategoryRegistry;

use super::App;

impl App {
    /// Print the active category registry in detection order.
    pub fn run_categories(&self) -> Result<()> {
        let config = Config::load()?;
        let registry = CategoryRegistry::from_config(&config.categories);

        println!("{:<22} {:<6} KEYWORDS", "ID", "TIER");
        for category in registry.iter() {
            println!(
                "{:<22} {:<6} {}",
                category.id,
                category.tier,
                category.keywords.join(", ")
            );
        }
        Ok(())
    }
}
