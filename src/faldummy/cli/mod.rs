mod print;

use crate::args::{Cli, Commands};
use directories::ProjectDirs;
use faldummy::config::{DriverConfig, KEYS};
use faldummy::driver::DummyDriver;
use faldummy::error::{DriverError, Result};
use faldummy::fetch::BlockingFetcher;
use faldummy::index::JsonFileIndex;
use faldummy::store::local::LocalDriver;
use faldummy::store::StorageDriver;
use print::{
    print_config, print_exists, print_folder_info, print_items, print_permissions, print_route,
    print_success,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

const CONFIG_DIR_ENV: &str = "FAL_DUMMY_CONFIG_DIR";
const INDEX_PATH: &str = ".fal_dummy/index.json";

type AppDriver = DummyDriver<LocalDriver, JsonFileIndex, BlockingFetcher>;

struct AppContext {
    driver: AppDriver,
}

pub fn run(cli: Cli) -> Result<()> {
    let config_dir = resolve_config_dir(&cli)?;

    if let Commands::Config { key, value } = &cli.command {
        return handle_config(config_dir, key.as_deref(), value.as_deref());
    }

    let ctx = init_context(&cli, config_dir)?;
    match cli.command {
        Commands::Exists { identifier } => handle_exists(&ctx, &identifier),
        Commands::Cat { identifier } => handle_cat(&ctx, &identifier),
        Commands::Url { identifier } => handle_url(&ctx, &identifier),
        Commands::Hash {
            identifier,
            algorithm,
        } => handle_hash(&ctx, &identifier, &algorithm),
        Commands::Local {
            identifier,
            writable,
        } => handle_local(&ctx, &identifier, writable),
        Commands::Perms { identifier } => handle_perms(&ctx, &identifier),
        Commands::Folder { identifier } => handle_folder(&ctx, &identifier),
        Commands::List { identifier } => handle_list(&ctx, &identifier),
        Commands::Route { identifier } => handle_route(&ctx, &identifier),
        Commands::Config { .. } => Ok(()),
    }
}

fn resolve_config_dir(cli: &Cli) -> Result<PathBuf> {
    if let Some(dir) = &cli.config_dir {
        return Ok(dir.clone());
    }
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    ProjectDirs::from("org", "fal-dummy", "fal-dummy")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| DriverError::Config("Could not determine config dir".into()))
}

fn init_context(cli: &Cli, config_dir: PathBuf) -> Result<AppContext> {
    let root = match &cli.root {
        Some(root) => root.clone(),
        None => std::env::current_dir()?,
    };
    let index_path = cli
        .index
        .clone()
        .unwrap_or_else(|| root.join(INDEX_PATH));

    debug!(
        root = %root.display(),
        index = %index_path.display(),
        config_dir = %config_dir.display(),
        "initializing driver"
    );

    let real = LocalDriver::new(cli.storage, root).with_public_base_url(&cli.public_url);
    let index = JsonFileIndex::load(&index_path)?;
    let mut fetcher = BlockingFetcher::new();
    if let Some(secs) = cli.timeout {
        fetcher = fetcher.with_timeout(Duration::from_secs(secs));
    }

    let driver = DummyDriver::initialize(real, index, fetcher, &config_dir)?;
    Ok(AppContext { driver })
}

fn handle_exists(ctx: &AppContext, identifier: &str) -> Result<()> {
    print_exists(identifier, ctx.driver.file_exists(identifier));
    Ok(())
}

fn handle_cat(ctx: &AppContext, identifier: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    ctx.driver.dump_file_contents(identifier, &mut out)?;
    out.flush()?;
    Ok(())
}

fn handle_url(ctx: &AppContext, identifier: &str) -> Result<()> {
    println!("{}", ctx.driver.get_public_url(identifier)?);
    Ok(())
}

fn handle_hash(ctx: &AppContext, identifier: &str, algorithm: &str) -> Result<()> {
    println!("{}", ctx.driver.hash(identifier, algorithm)?);
    Ok(())
}

fn handle_local(ctx: &AppContext, identifier: &str, writable: bool) -> Result<()> {
    let path = ctx
        .driver
        .get_file_for_local_processing(identifier, writable)?;
    println!("{}", path.display());
    Ok(())
}

fn handle_perms(ctx: &AppContext, identifier: &str) -> Result<()> {
    print_permissions(&ctx.driver.get_permissions(identifier)?);
    Ok(())
}

fn handle_folder(ctx: &AppContext, identifier: &str) -> Result<()> {
    print_folder_info(&ctx.driver.get_folder_info_by_identifier(identifier)?);
    Ok(())
}

fn handle_list(ctx: &AppContext, identifier: &str) -> Result<()> {
    print_items(&ctx.driver.get_folder_items(identifier)?);
    Ok(())
}

fn handle_route(ctx: &AppContext, identifier: &str) -> Result<()> {
    print_route(identifier, &ctx.driver.route(identifier));
    Ok(())
}

fn handle_config(config_dir: PathBuf, key: Option<&str>, value: Option<&str>) -> Result<()> {
    let mut config = DriverConfig::load(&config_dir)?;

    match (key, value) {
        (None, _) => print_config(&config, &KEYS),
        (Some(key), None) => println!("{}", config.get(key)?),
        (Some(key), Some(value)) => {
            config.set(key, value)?;
            config.save(&config_dir)?;
            print_success(&format!("{} set to {}", key, config.get(key)?));
        }
    }
    Ok(())
}
