use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;
use vaultacl::ingest::{EXACT_PATHS_KEY, GLOB_PATHS_KEY, ROOT_KEY};
use vaultacl::{AclDocument, AclSource, Policy, RESULTANT_ACL_PATH, SourceError};

/// Reads a resolved ACL saved to disk.
///
/// The file holds either the bare payload or the whole API response, in
/// which case the payload is its `data` field. An empty file, or a response
/// whose `data` is missing or null, reads as no data.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl AclSource for FileSource {
    fn read_resultant_acl(&self) -> Result<Option<Value>, SourceError> {
        debug!(path = %self.path.display(), acl_path = RESULTANT_ACL_PATH, "reading saved ACL");
        let text = std::fs::read_to_string(&self.path)?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(unwrap_response(serde_json::from_str(&text)?))
    }
}

fn unwrap_response(value: Value) -> Option<Value> {
    let mut fields = match value {
        Value::Null => return None,
        Value::Object(fields) => fields,
        other => return Some(other),
    };

    let is_payload = [EXACT_PATHS_KEY, GLOB_PATHS_KEY, ROOT_KEY]
        .iter()
        .any(|key| fields.contains_key(*key));
    if is_payload || !fields.contains_key("data") {
        return Some(Value::Object(fields));
    }

    match fields.remove("data") {
        Some(Value::Null) | None => None,
        data => data,
    }
}

/// Loads policy files and compiles them into one document.
///
/// Each policy is named after its file stem; JSON and YAML are both accepted.
pub fn load_policies(paths: &[PathBuf]) -> Result<AclDocument> {
    let policies = paths
        .iter()
        .map(|path| load_policy(path))
        .collect::<Result<Vec<_>>>()?;
    Ok(AclDocument::from_policies(&policies)?)
}

fn load_policy(path: &Path) -> Result<Policy> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read policy `{}`", path.display()))?;
    let mut policy: Policy = serde_yaml::from_str(&text)
        .with_context(|| format!("failed to parse policy `{}`", path.display()))?;
    policy.name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;
    use vaultacl::Capability;

    fn source(dir: &TempDir, contents: &str) -> FileSource {
        let path = dir.path().join("acl.json");
        fs::write(&path, contents).unwrap();
        FileSource::new(path)
    }

    #[test]
    fn test_bare_payload() {
        let dir = TempDir::new().unwrap();
        let payload = json!({ "exact_paths": { "a": { "capabilities": ["read"] } } });
        let read = source(&dir, &payload.to_string()).read_resultant_acl().unwrap();
        assert_eq!(read, Some(payload));
    }

    #[test]
    fn test_api_response() {
        let dir = TempDir::new().unwrap();
        let response = json!({
            "request_id": "b8d1",
            "data": { "root": true },
            "lease_duration": 0,
        });
        let read = source(&dir, &response.to_string()).read_resultant_acl().unwrap();
        assert_eq!(read, Some(json!({ "root": true })));
    }

    #[test]
    fn test_no_data() {
        let dir = TempDir::new().unwrap();
        assert_eq!(source(&dir, "").read_resultant_acl().unwrap(), None);
        assert_eq!(source(&dir, "null").read_resultant_acl().unwrap(), None);
        let response = json!({ "request_id": "b8d1", "data": null });
        assert_eq!(source(&dir, &response.to_string()).read_resultant_acl().unwrap(), None);
    }

    #[test]
    fn test_invalid_json() {
        let dir = TempDir::new().unwrap();
        let err = source(&dir, "{ not json").read_resultant_acl().unwrap_err();
        assert!(matches!(err, SourceError::Json(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = FileSource::new("/nonexistent/acl.json").read_resultant_acl().unwrap_err();
        assert!(matches!(err, SourceError::Io(_)));
    }

    #[test]
    fn test_load_policies() {
        let dir = TempDir::new().unwrap();
        let yaml = dir.path().join("app.yaml");
        fs::write(&yaml, "path:\n  \"kv/app/*\":\n    capabilities: [read, list]\n").unwrap();
        let json = dir.path().join("root.json");
        fs::write(&json, "{}").unwrap();

        let doc = load_policies(&[yaml.clone()]).unwrap();
        assert!(!doc.is_root());
        assert!(doc.resolve("kv/app/x").allows(Capability::List));

        let doc = load_policies(&[yaml, json]).unwrap();
        assert!(doc.is_root());
    }
}
