//! Pipelines built from configuration files.

use docsift::types::ProcessingOptions;
use docsift::{OcrPipeline, PipelineConfig};
use std::fs;

mod helpers;

use helpers::{INVOICE_TEXT, MockEngine, Script};

#[test]
fn test_json_config_drives_pipeline() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("pipeline.json");
    fs::write(&path, r#"{"max_concurrency": 3, "cache": {"enabled": false}}"#)?;

    let config = PipelineConfig::from_file(&path)?;
    assert_eq!(config.max_concurrency, 3);
    assert_eq!(config.cache.ttl_seconds, 3600);

    let engine = MockEngine::new().script("doc", Script::text(INVOICE_TEXT)).shared();
    let pipeline = OcrPipeline::with_config(engine.clone(), config)?;

    for _ in 0..2 {
        let result = pipeline.extract_text_sync(b"doc", "application/pdf", &ProcessingOptions::new())?;
        assert_eq!(result.text, INVOICE_TEXT);
    }
    assert_eq!(engine.calls(), 2);
    assert_eq!(pipeline.cache_stats().writes, 0);
    Ok(())
}

#[test]
fn test_yaml_payload_limit_is_enforced() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("pipeline.yaml");
    fs::write(&path, "max_payload_bytes: 8\n")?;

    let pipeline = OcrPipeline::with_config(MockEngine::new().shared(), PipelineConfig::from_file(&path)?)?;
    let err = pipeline
        .extract_text_sync(b"nine byte", "image/png", &ProcessingOptions::new())
        .unwrap_err();

    assert_eq!(err.kind(), "payload_too_large");
    Ok(())
}

#[test]
fn test_discovered_config_is_validated() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("docsift.toml"), "[cache]\nsweep_threshold = 0\n")?;

    let err = PipelineConfig::discover_from(dir.path()).unwrap_err();
    assert_eq!(err.kind(), "validation");
    assert!(err.to_string().contains("sweep_threshold"));
    Ok(())
}

#[test]
fn test_unknown_extension_is_rejected() {
    let err = PipelineConfig::from_file("settings.ini").unwrap_err();
    assert!(err.to_string().contains("Unsupported config file format"));
}

#[cfg(feature = "disk-cache")]
#[test]
fn test_toml_cache_directory_is_created() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let cache_dir = dir.path().join("nested").join("cache");
    let path = dir.path().join("docsift.toml");
    fs::write(
        &path,
        format!("[cache]\ndirectory = {:?}\nttl_seconds = 60\n", cache_dir.to_string_lossy()),
    )?;

    let pipeline = OcrPipeline::with_config(MockEngine::new().shared(), PipelineConfig::from_file(&path)?)?;
    pipeline.extract_text_sync(b"page", "image/png", &ProcessingOptions::new())?;

    assert!(cache_dir.is_dir());
    assert_eq!(fs::read_dir(&cache_dir)?.count(), 1);
    Ok(())
}
