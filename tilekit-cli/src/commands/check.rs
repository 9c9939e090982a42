//! `tilekit check`: validate a layer file and show its effective pipeline.

use std::path::Path;

use tilekit::config::{format_size, LayerConfig};
use tilekit::delegate::{DelegateContext, DelegateFactory, DelegateKit, PARAM_LAYER};

use crate::error::CliError;

pub fn run(path: &Path) -> Result<(), CliError> {
    let config = LayerConfig::load_from(path)?;

    let ctx = DelegateContext::default()
        .with_param(PARAM_LAYER, config.layer.name.as_str())
        .with_properties(config.retrieval_properties());
    let kit = DelegateKit::from_definitions(&config.delegates, &DelegateFactory::with_defaults(), &ctx)?;

    println!("Layer: {}", config.layer.name);
    println!("  Dataset:      {}", config.layer.dataset);
    println!("  Service:      {}", display_or_none(&config.layer.service));
    println!("  Format:       {}", config.layer.format);
    println!("  Levels:       {}", config.layer.levels);
    println!("  Cache:        {}", config.cache.directory.display());
    println!("  Memory cache: {}", format_size(config.cache.memory_size));
    println!();
    println!("Delegates:");
    for entry in kit.entries() {
        let marker = if entry.is_default() { " (default)" } else { "" };
        println!("  {}{}  [{}]", entry.definition(), marker, entry.roles().join(", "));
    }
    println!();
    println!("Configuration OK");
    Ok(())
}

fn display_or_none(value: &str) -> &str {
    if value.is_empty() {
        "(none)"
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilekit::delegate::DelegateError;

    fn write_layer(dir: &Path, delegates: &[&str]) -> std::path::PathBuf {
        let mut doc = String::from("[layer]\nname = Test\nlevels = 2\n[delegates]\n");
        for d in delegates {
            doc.push_str(&format!("delegate = {}\n", d));
        }
        let path = dir.join("layer.ini");
        std::fs::write(&path, doc).unwrap();
        path
    }

    #[test]
    fn test_check_valid_layer() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_layer(dir.path(), &["ResizeTransformer(256,256)"]);
        assert!(run(&path).is_ok());
    }

    #[test]
    fn test_check_unknown_delegate_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_layer(dir.path(), &["NoSuchTransformer(1)"]);
        let err = run(&path).unwrap_err();
        assert!(matches!(
            err,
            CliError::Delegates(DelegateError::Unrecognized { .. })
        ));
    }

    #[test]
    fn test_check_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(&dir.path().join("absent.ini")).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }
}
