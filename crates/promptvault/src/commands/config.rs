//! Configuration display.

use promptvault_core::Instance;

/// Print configuration sources, the merged configuration and what it resolves to.
pub fn handle_config(instance: &Instance) -> anyhow::Result<()> {
    let config = instance.config();
    let store = instance.store();

    println!("Configuration sources:");
    if instance.config_sources().is_empty() {
        println!("  (none)");
    } else {
        for source in instance.config_sources() {
            println!("  {}", source.display());
        }
    }
    println!();

    println!("Current configuration:");
    println!("{}", serde_json::to_string_pretty(config)?);
    println!();

    println!("Resolved:");
    println!("  project:   {}", instance.directory().display());
    println!("  local:     {}", store.local_root().display());
    match (&config.remote_bucket, config.remote_prefix()) {
        (Some(bucket), Some(prefix)) => println!(
            "  remote:    {} {bucket}/{prefix}",
            config.remote_backend()
        ),
        (Some(bucket), None) => println!("  remote:    {bucket} (no prefix, remote disabled)"),
        (None, _) => println!("  remote:    (none)"),
    }
    println!("  mapper:    {}", config.mapper());
    if !store.ignore().is_empty() {
        let patterns: Vec<&str> = store.ignore().patterns().collect();
        println!("  ignore:    {}", patterns.join(", "));
    }
    Ok(())
}
