//! Command handlers.

use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use mirrorsync_core::Reference;
use mirrorsync_git::{CacheOptions, SyncOptions, SynchronizerRegistry};
use tracing::{error, info, warn};

use crate::cli::{BranchesArgs, CacheArgs, Cli, Commands, DeployArgs, SyncArgs};
use crate::deploy::{Deployable, GitModule, deploy_all};
use crate::manifest::Manifest;
use crate::settings::AppConfig;

/// Loads configuration, builds the registry and runs the selected command.
pub fn run(cli: Cli) -> Result<ExitCode> {
    let jobs = match &cli.command {
        Commands::Deploy(args) => args.jobs,
        _ => None,
    };
    let config = AppConfig::load(cli.config.as_deref())
        .context("failed to load configuration")?
        .with_overrides(cli.cache_root.clone(), jobs);
    let settings = config.sync_settings()?;
    let registry = SynchronizerRegistry::new(&settings);

    match cli.command {
        Commands::Deploy(args) => deploy(&registry, &config, args),
        Commands::Sync(args) => sync(&registry, args),
        Commands::Cache(args) => cache(&registry, args),
        Commands::Branches(args) => branches(&registry, args),
    }
}

fn sync_options(no_cache_update: bool) -> SyncOptions {
    if no_cache_update {
        SyncOptions::without_cache_update()
    } else {
        SyncOptions::default()
    }
}

fn deploy(registry: &SynchronizerRegistry, config: &AppConfig, args: DeployArgs) -> Result<ExitCode> {
    let modules = Manifest::load(&args.manifest)?;
    if registry.cache_root().is_none() {
        warn!("No cache root configured, cloning every module straight from its remote");
    }

    let deployables: Vec<Box<dyn Deployable>> = modules
        .iter()
        .map(|module| Box::new(GitModule::new(module, registry)) as Box<dyn Deployable>)
        .collect();

    let report = deploy_all(
        &deployables,
        sync_options(args.no_cache_update),
        args.trace,
        config.effective_jobs(),
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    info!(
        "Deployed {} of {} modules from {} remotes",
        report.succeeded(),
        report.modules.len(),
        registry.len()
    );

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        error!("{} modules failed to deploy", report.failed());
        Ok(ExitCode::FAILURE)
    }
}

fn sync(registry: &SynchronizerRegistry, args: SyncArgs) -> Result<ExitCode> {
    let reference = Reference::parse(&args.reference)?;
    let commit = registry
        .get_or_create(args.remote)
        .sync(&args.dir, &reference, sync_options(args.no_cache_update))
        .with_context(|| format!("failed to sync {}", args.dir.display()))?;

    println!("{}", commit);
    Ok(ExitCode::SUCCESS)
}

fn cache(registry: &SynchronizerRegistry, args: CacheArgs) -> Result<ExitCode> {
    if registry.cache_root().is_none() {
        bail!("no cache root configured; pass --cache-root or set MIRRORSYNC_CACHE_ROOT");
    }

    match &args.manifest {
        Some(manifest) => {
            for module in Manifest::load(manifest)? {
                registry.get_or_create(module.remote);
            }
        },
        None => {
            for remote in args.remotes {
                registry.get_or_create(remote);
            }
        },
    }

    let mut failed = 0usize;
    for remote in registry.remotes() {
        let Some(synchronizer) = registry.get(remote.as_str()) else {
            continue;
        };
        match synchronizer.cache(CacheOptions::forced()) {
            Ok(()) => info!("Mirror of {} is up to date", remote),
            Err(err) => {
                error!("Failed to refresh mirror of {}: {}", remote, err);
                failed += 1;
            },
        }
    }

    if failed == 0 {
        Ok(ExitCode::SUCCESS)
    } else {
        error!("{} of {} mirrors failed to refresh", failed, registry.len());
        Ok(ExitCode::FAILURE)
    }
}

fn branches(registry: &SynchronizerRegistry, args: BranchesArgs) -> Result<ExitCode> {
    let options = CacheOptions {
        force: args.refresh,
    };
    let branches = registry
        .get_or_create(args.remote)
        .branches(options)
        .context("failed to list branches")?;

    for branch in branches {
        println!("{}", branch);
    }
    Ok(ExitCode::SUCCESS)
}
