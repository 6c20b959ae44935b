//! Prompt retrieval handlers.

use anyhow::bail;
use promptvault_core::Instance;
use promptvault_snapshot::Tier;

/// Print a document (or one field of it) resolved from `keys`.
pub async fn handle_get(
    instance: &Instance,
    keys: &[String],
    tier: Tier,
    field: Option<&str>,
) -> anyhow::Result<()> {
    let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
    let text = instance
        .store()
        .load_document_as_str(&keys, &tier, field)
        .await?;

    println!("{}", text.trim_end());
    Ok(())
}

/// Print a file by relative path, from the local tree or a remote version.
pub async fn handle_show(instance: &Instance, path: &str, tier: Tier) -> anyhow::Result<()> {
    let text = match tier {
        Tier::Local => instance.local_explorer().read_file(path).await?,
        Tier::Latest => {
            let version = instance.store().latest_version().await?;
            show_remote(instance, path, &version).await?
        }
        Tier::Version(version) => show_remote(instance, path, &version).await?,
    };

    print!("{text}");
    if !text.ends_with('\n') {
        println!();
    }
    Ok(())
}

async fn show_remote(
    instance: &Instance,
    path: &str,
    version: &promptvault_snapshot::VersionId,
) -> anyhow::Result<String> {
    match instance
        .remote_explorer()
        .file_content(version, path)
        .await?
    {
        Some(text) => Ok(text),
        None => bail!("{path} not found in version {version}"),
    }
}
