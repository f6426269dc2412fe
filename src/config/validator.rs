//! Configuration validation
//!
//! Everything here runs before any worker is dispatched; a failure is a
//! fatal configuration error.

use super::*;
use crate::store::backend::MEMORY_ENDPOINT;
use anyhow::Result;

/// Validate complete configuration
pub fn validate(run: &RunConfig, store: &StoreConfig) -> Result<()> {
    validate_run_config(run)?;
    validate_store_config(store)?;
    Ok(())
}

/// Validate workload configuration
pub fn validate_run_config(config: &RunConfig) -> Result<()> {
    if config.bucket.is_empty() {
        anyhow::bail!("must specify bucket");
    }
    if config.files == 0 {
        anyhow::bail!("files must be at least 1");
    }
    if config.concurrency == 0 {
        anyhow::bail!("concurrency must be at least 1");
    }
    if config.chunk_size == 0 {
        anyhow::bail!("chunksize must be greater than 0");
    }

    match config.mode {
        RunMode::Upload => validate_object_size(config.object_size, config.chunk_size)?,
        RunMode::Query => {
            if config.duration.is_zero() {
                anyhow::bail!("query duration must be greater than 0");
            }
        }
        RunMode::Download => {}
    }

    Ok(())
}

/// Upload objects must be non-empty and fit in `MAX_PARTS` parts
fn validate_object_size(object_size: u64, chunk_size: u64) -> Result<()> {
    if object_size == 0 {
        anyhow::bail!("must specify objectsize for upload");
    }

    let limit = chunk_size.saturating_mul(MAX_PARTS);
    if object_size > limit {
        anyhow::bail!(
            "objectsize {} exceeds {} parts of chunksize {} (max {})",
            object_size,
            MAX_PARTS,
            chunk_size,
            limit
        );
    }
    Ok(())
}

/// Validate backend configuration
pub fn validate_store_config(config: &StoreConfig) -> Result<()> {
    if config.bucket.is_empty() {
        anyhow::bail!("must specify bucket");
    }
    if config.endpoint == MEMORY_ENDPOINT {
        return Ok(());
    }
    if config.access_key.as_deref().unwrap_or("").is_empty() {
        anyhow::bail!("must specify access key (--access or AWS_ACCESS_KEY_ID)");
    }
    if config.secret_key.as_deref().unwrap_or("").is_empty() {
        anyhow::bail!("must specify secret key (--secret or AWS_SECRET_ACCESS_KEY)");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn upload_config(object_size: u64, chunk_size: u64) -> RunConfig {
        let mut config = RunConfig::new(RunMode::Upload, "bench");
        config.object_size = object_size;
        config.chunk_size = chunk_size;
        config
    }

    #[test]
    fn test_object_size_limit() {
        let chunk = 5 * 1024 * 1024;
        assert!(validate_run_config(&upload_config(MAX_PARTS * chunk, chunk)).is_ok());

        let err = validate_run_config(&upload_config(MAX_PARTS * chunk + 1, chunk)).unwrap_err();
        assert!(err.to_string().contains("exceeds 10000 parts"));
    }

    #[test]
    fn test_zero_object_size_rejected_for_upload() {
        let err = validate_run_config(&upload_config(0, 1024)).unwrap_err();
        assert_eq!(err.to_string(), "must specify objectsize for upload");

        // download ignores object size
        let config = RunConfig::new(RunMode::Download, "bench");
        assert!(validate_run_config(&config).is_ok());
    }

    #[test]
    fn test_missing_bucket() {
        let config = RunConfig::new(RunMode::Download, "");
        assert_eq!(
            validate_run_config(&config).unwrap_err().to_string(),
            "must specify bucket"
        );
    }

    #[test]
    fn test_zero_counts_rejected() {
        let mut config = RunConfig::new(RunMode::Download, "bench");
        config.files = 0;
        assert!(validate_run_config(&config).is_err());

        let mut config = RunConfig::new(RunMode::Query, "bench");
        config.concurrency = 0;
        assert!(validate_run_config(&config).is_err());

        let mut config = RunConfig::new(RunMode::Download, "bench");
        config.chunk_size = 0;
        assert!(validate_run_config(&config).is_err());
    }

    #[test]
    fn test_query_duration() {
        let mut config = RunConfig::new(RunMode::Query, "bench");
        assert!(validate_run_config(&config).is_ok());
        config.duration = Duration::ZERO;
        assert!(validate_run_config(&config).is_err());
    }

    #[test]
    fn test_store_credentials() {
        let mut store = StoreConfig {
            bucket: "bench".into(),
            ..StoreConfig::default()
        };
        assert!(validate_store_config(&store).is_err());

        store.access_key = Some("AKIA".into());
        store.secret_key = Some(String::new());
        assert!(validate_store_config(&store).is_err());

        store.secret_key = Some("secret".into());
        assert!(validate_store_config(&store).is_ok());
    }

    #[test]
    fn test_memory_store_needs_no_credentials() {
        let store = StoreConfig {
            bucket: "bench".into(),
            endpoint: MEMORY_ENDPOINT.into(),
            ..StoreConfig::default()
        };
        assert!(validate(&RunConfig::new(RunMode::Download, "bench"), &store).is_ok());
    }
}
