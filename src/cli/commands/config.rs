//! Configuration command implementations: init, validate, show.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::cli::{ConfigCommands, Output};
use crate::config::TidyboxConfig;
use crate::exclude::{self, ExclusionConfig};
use crate::taxonomy::{self, ExtensionMap};

pub async fn execute(cmd: ConfigCommands, config_path: Option<&Path>, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Init { force } => init(force, output),
        ConfigCommands::Validate => validate(config_path, output),
        ConfigCommands::Show => show(config_path),
    }
}

/// Write starter documents into the working directory.
fn init(force: bool, output: &Output) -> Result<()> {
    let config_yaml =
        serde_yml::to_string(&TidyboxConfig::default()).context("failed to serialize starter config")?;
    write_document(Path::new("tidybox.yml"), &config_yaml, force, output)?;

    let taxonomy_json = serde_json::to_string_pretty(&taxonomy::starter_config())
        .context("failed to serialize starter taxonomy")?;
    write_document(Path::new("extensions.json"), &taxonomy_json, force, output)?;

    write_exclusions(
        Path::new("dir_exclusions.json"),
        &exclude::defaults::directory_defaults(),
        force,
        output,
    )?;
    write_exclusions(
        Path::new("file_exclusions.json"),
        &exclude::defaults::file_defaults(),
        force,
        output,
    )?;

    output.success("starter configuration written");
    Ok(())
}

fn write_exclusions(path: &Path, config: &ExclusionConfig, force: bool, output: &Output) -> Result<()> {
    let json = serde_json::to_string_pretty(config)
        .with_context(|| format!("failed to serialize {}", path.display()))?;
    write_document(path, &json, force, output)
}

fn write_document(path: &Path, content: &str, force: bool, output: &Output) -> Result<()> {
    if path.exists() && !force {
        output.warning(&format!(
            "{} already exists, skipping (use --force to overwrite)",
            path.display()
        ));
        return Ok(());
    }
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
    output.info(&format!("wrote {}", path.display()));
    Ok(())
}

/// Validate the merged configuration and every referenced document.
fn validate(config_path: Option<&Path>, output: &Output) -> Result<()> {
    let config = TidyboxConfig::load(config_path)?;

    let taxonomy = ExtensionMap::load(&config.documents.taxonomy)?;
    output.info(&format!(
        "taxonomy ok ({} extensions)",
        taxonomy.len()
    ));

    // Exclusion documents may be absent (defaults apply), but an existing
    // document that does not parse is an authoring error worth failing on.
    for path in [&config.documents.dir_exclusions, &config.documents.file_exclusions] {
        if path.exists() {
            let parsed = ExclusionConfig::load(path)?;
            output.info(&format!(
                "{} ok ({} common patterns)",
                path.display(),
                parsed.common.len()
            ));
        } else {
            output.info(&format!("{} absent, built-in defaults apply", path.display()));
        }
    }

    let platform = crate::config::Platform::current();
    let roots = config.roots.resolve(&platform);
    roots.ensure_distinct()?;

    output.success("configuration is valid");
    Ok(())
}

/// Print the merged configuration as YAML.
fn show(config_path: Option<&Path>) -> Result<()> {
    let config = TidyboxConfig::load(config_path)?;
    let yaml = serde_yml::to_string(&config).context("failed to serialize configuration")?;
    print!("{yaml}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starter_documents_are_parseable() {
        let taxonomy_json = serde_json::to_string_pretty(&taxonomy::starter_config()).unwrap();
        let parsed: taxonomy::TaxonomyConfig = serde_json::from_str(&taxonomy_json).unwrap();
        assert!(ExtensionMap::from_config(&parsed).len() > 10);

        let dirs = serde_json::to_string_pretty(&exclude::defaults::directory_defaults()).unwrap();
        assert!(serde_json::from_str::<ExclusionConfig>(&dirs).is_ok());
    }

}
