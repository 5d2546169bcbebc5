//! Vaultacl Viewer
//!
//! A terminal viewer for the resolved ACLs of one or more Vault instances.
//! It renders each instance's exact and prefix rules as a tree, answers
//! "what can I do at this path" queries, and hands an instance's
//! credentials to a shell.
//!
//! # Usage
//!
//! ```bash
//! vaultacl-viewer --config config.yml tree
//! vaultacl-viewer query dev secret/data/app --capability read
//! eval "$(vaultacl-viewer env dev)"
//! ```

mod config;
mod instance;
mod session;
mod source;
mod tree;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use vaultacl::{Capability, Outcome};

use crate::config::{InstanceConfig, ViewerConfig};
use crate::instance::Instance;

#[derive(Parser, Debug)]
#[command(name = "vaultacl-viewer")]
#[command(about = "Terminal viewer for resolved Vault ACLs")]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Path to the instances configuration
    #[arg(short, long, default_value = "config.yml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render every instance and its ACL as a tree
    Tree {
        /// Color rules by grant/deny instead of using text markers
        #[arg(long)]
        color: bool,
    },
    /// Show which rule governs a path, and what it allows
    Query {
        instance: String,
        path: String,
        /// Check a single capability; exits non-zero when it is not allowed
        #[arg(long)]
        capability: Option<String>,
    },
    /// Print shell exports for an instance's address, token and namespace
    Env { instance: String },
    /// Open a shell with an instance's credentials in its environment
    Shell { instance: String },
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        "vaultacl_viewer=trace,vaultacl=trace"
    } else {
        "vaultacl_viewer=info,vaultacl=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = ViewerConfig::load(&args.config)?;
    info!(instances = config.instances.len(), "loaded configuration");

    match args.command {
        Command::Tree { color } => {
            let instances: Vec<_> = config.instances.into_iter().map(Instance::open).collect();
            print!("{}", tree::render(&tree::build(&instances), color));
            Ok(ExitCode::SUCCESS)
        }
        Command::Query {
            instance,
            path,
            capability,
        } => query(&config, &instance, &path, capability.as_deref()),
        Command::Env { instance } => {
            let instance = lookup(&config, &instance)?;
            let vars = session::credentials(instance, instance.token()?.as_deref());
            print!("{}", session::exports(&vars));
            Ok(ExitCode::SUCCESS)
        }
        Command::Shell { instance } => {
            let instance = lookup(&config, &instance)?;
            let vars = session::credentials(instance, instance.token()?.as_deref());
            let status = session::launch_shell(&vars)?;
            Ok(if status.success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

fn lookup<'a>(config: &'a ViewerConfig, name: &str) -> Result<&'a InstanceConfig> {
    config
        .instance(name)
        .with_context(|| format!("no instance named `{name}` in configuration"))
}

fn query(config: &ViewerConfig, name: &str, path: &str, capability: Option<&str>) -> Result<ExitCode> {
    let capability = capability
        .map(|name| Capability::from_name(name).with_context(|| format!("unknown capability `{name}`")))
        .transpose()?;

    let instance = Instance::open(lookup(config, name)?.clone());
    if let Some(error) = instance.error() {
        bail!("unable to load ACL for `{name}`: {error}");
    }

    let acl = instance.acl();
    let outcome = acl.resolve(path);
    println!("{}", describe(path, &outcome));

    let Some(capability) = capability else {
        return Ok(ExitCode::SUCCESS);
    };
    if outcome.allows(capability) {
        println!("{capability}: allowed");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("{capability}: denied");
        Ok(ExitCode::FAILURE)
    }
}

fn describe(path: &str, outcome: &Outcome<'_>) -> String {
    match outcome {
        Outcome::Root => format!("{path}: root grant, all capabilities"),
        Outcome::Rule { partition, rule } => match rule.capabilities() {
            Some(capabilities) => format!(
                "{path}: {partition} `{}` grants [{}]",
                rule.path(),
                capabilities.names().join(", ")
            ),
            None => format!("{path}: {partition} `{}` has no populated permissions", rule.path()),
        },
        Outcome::Denied => format!("{path}: no rule applies, denied by default"),
    }
}
