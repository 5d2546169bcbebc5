//! Viewer configuration: the list of Vault instances to inspect.
//!
//! ```yaml
//! instances:
//!   - name: dev
//!     url: https://vault.dev.example.com:8200
//!     namespace: team-a
//!     auth:
//!       token_env: VAULT_DEV_TOKEN
//!     acl_file: acl/dev.json
//!   - name: offline
//!     url: https://vault.example.com:8200
//!     policy_files: [policies/app.yaml, policies/ops.json]
//! ```

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

/// Token files larger than this are truncated.
const TOKEN_FILE_LIMIT: u64 = 1000;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewerConfig {
    #[serde(default)]
    pub instances: Vec<InstanceConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstanceConfig {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub auth: Option<AuthConfig>,
    /// A saved resolved-ACL response.
    #[serde(default)]
    pub acl_file: Option<PathBuf>,
    /// Offline policy documents, JSON or YAML.
    #[serde(default)]
    pub policy_files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    pub token: Option<String>,
    pub token_env: Option<String>,
    pub token_file: Option<PathBuf>,
}

/// Where an instance's ACL comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AclOrigin {
    File(PathBuf),
    Policies(Vec<PathBuf>),
}

impl ViewerConfig {
    /// Loads and validates a configuration file.
    ///
    /// Relative file paths inside the configuration are resolved against the
    /// directory containing it.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config `{}`", path.display()))?;
        let mut config: ViewerConfig = serde_yaml::from_str(&text)
            .with_context(|| format!("failed to parse config `{}`", path.display()))?;

        let base = path.parent().unwrap_or(Path::new(""));
        for instance in &mut config.instances {
            instance.resolve_paths(base);
            instance
                .origin()
                .with_context(|| format!("invalid instance `{}`", instance.name))?;
        }
        Ok(config)
    }

    pub fn instance(&self, name: &str) -> Option<&InstanceConfig> {
        self.instances.iter().find(|instance| instance.name == name)
    }
}

impl InstanceConfig {
    /// The namespace to display; instances without one show `Default`.
    pub fn display_namespace(&self) -> &str {
        match self.namespace.as_deref() {
            Some(namespace) if !namespace.is_empty() => namespace,
            _ => "Default",
        }
    }

    /// Returns the single configured ACL origin.
    pub fn origin(&self) -> Result<AclOrigin> {
        match (&self.acl_file, self.policy_files.is_empty()) {
            (Some(path), true) => Ok(AclOrigin::File(path.clone())),
            (None, false) => Ok(AclOrigin::Policies(self.policy_files.clone())),
            (Some(_), false) => bail!("set either `acl_file` or `policy_files`, not both"),
            (None, true) => bail!("one of `acl_file` or `policy_files` is required"),
        }
    }

    /// Resolves the session token, if any auth is configured.
    pub fn token(&self) -> Result<Option<String>> {
        let Some(auth) = &self.auth else {
            return Ok(None);
        };

        if let Some(token) = auth.token.as_ref().filter(|token| !token.is_empty()) {
            return Ok(Some(token.clone()));
        }
        if let Some(var) = &auth.token_env {
            let token = std::env::var(var)
                .with_context(|| format!("token variable `{var}` is not set"))?;
            if token.is_empty() {
                bail!("token variable `{var}` is empty");
            }
            return Ok(Some(token));
        }
        if let Some(path) = &auth.token_file {
            return read_token_file(path).map(Some);
        }
        Ok(None)
    }

    fn resolve_paths(&mut self, base: &Path) {
        if let Some(path) = &mut self.acl_file {
            *path = base.join(&*path);
        }
        for path in &mut self.policy_files {
            *path = base.join(&*path);
        }
        if let Some(path) = self.auth.as_mut().and_then(|auth| auth.token_file.as_mut()) {
            *path = base.join(&*path);
        }
    }
}

fn read_token_file(path: &Path) -> Result<String> {
    let file = File::open(path)
        .with_context(|| format!("unable to open token file `{}`", path.display()))?;
    let mut bytes = Vec::new();
    file.take(TOKEN_FILE_LIMIT)
        .read_to_end(&mut bytes)
        .with_context(|| format!("unable to read token file `{}`", path.display()))?;
    let token = String::from_utf8(bytes).with_context(|| {
        format!(
            "token file `{}` is not valid UTF-8 within its first {TOKEN_FILE_LIMIT} bytes",
            path.display()
        )
    })?;
    Ok(token.strip_suffix('\n').unwrap_or(&token).to_string())
}
