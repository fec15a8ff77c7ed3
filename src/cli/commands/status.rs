//! Show resolved roots, documents, and platform capabilities.

use anyhow::Result;
use std::path::Path;

use crate::cli::Output;
use crate::config::{Platform, TidyboxConfig};
use crate::exclude::ExclusionSet;
use crate::taxonomy::ExtensionMap;

pub async fn execute(config_path: Option<&Path>, output: &Output) -> Result<()> {
    let config = TidyboxConfig::load(config_path)?;
    let platform = Platform::current();
    let roots = config.roots.resolve(&platform);

    output.header("Platform");
    output.stat("OS key", platform.os_key);
    output.stat(
        "Sidecar routing",
        if platform.classify_sidecars { "enabled" } else { "disabled" },
    );

    output.header("Roots");
    output.stat("Inbox", roots.inbox.display());
    output.stat("Sorted", roots.sorted.display());
    output.stat("Quarantine", roots.quarantine.display());
    if let Err(e) = roots.ensure_distinct() {
        output.warning(&format!("{e:#}"));
    }

    output.header("Documents");
    match ExtensionMap::load(&config.documents.taxonomy) {
        Ok(taxonomy) => output.stat(
            &format!("Taxonomy ({})", config.documents.taxonomy.display()),
            format!("{} extensions", taxonomy.len()),
        ),
        Err(e) => output.warning(&format!("taxonomy: {e:#}")),
    }
    let exclusions = ExclusionSet::load(
        &config.documents.dir_exclusions,
        &config.documents.file_exclusions,
        platform.os_key,
    );
    output.stat("Directory exclusions", exclusions.directories.len());
    output.stat("File exclusions", exclusions.files.len());

    output.header("Engine");
    output.stat("Mode", format!("{:?}", config.engine.mode).to_lowercase());
    output.stat("Max threads", config.engine.max_threads);
    output.stat("Thread percentage", config.engine.thread_percentage);
    output.stat("Parallel threshold", config.engine.parallel_threshold);

    Ok(())
}
