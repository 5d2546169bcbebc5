use std::process::{Command, ExitStatus};

use anyhow::{Context, Result};
use tracing::info;

use crate::config::InstanceConfig;

const DEFAULT_SHELL: &str = "zsh";

/// The environment a Vault CLI session needs for `instance`.
pub fn credentials(instance: &InstanceConfig, token: Option<&str>) -> Vec<(&'static str, String)> {
    let mut vars = vec![("VAULT_ADDR", instance.url.clone())];
    if let Some(token) = token {
        vars.push(("VAULT_TOKEN", token.to_string()));
    }
    if let Some(namespace) = instance.namespace.as_deref().filter(|ns| !ns.is_empty()) {
        vars.push(("VAULT_NAMESPACE", namespace.to_string()));
    }
    vars
}

/// Formats the variables as POSIX shell `export` lines.
pub fn exports(vars: &[(&str, String)]) -> String {
    vars.iter()
        .map(|(name, value)| format!("export {name}={}\n", shell_quote(value)))
        .collect()
}

/// Spawns an interactive shell with the variables injected and waits for it.
pub fn launch_shell(vars: &[(&str, String)]) -> Result<ExitStatus> {
    let shell = std::env::var("SHELL")
        .ok()
        .filter(|shell| !shell.is_empty())
        .unwrap_or_else(|| DEFAULT_SHELL.to_string());

    info!(shell = %shell, "launching shell");
    Command::new(&shell)
        .envs(vars.iter().map(|(name, value)| (*name, value.as_str())))
        .status()
        .with_context(|| format!("failed to launch `{shell}`"))
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
