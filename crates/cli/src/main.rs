mod help;

use std::{
    env,
    ffi::OsString,
    io::{self, Write},
    path::Path,
    process::ExitCode,
};

use anyhow::{Context, Result, bail};
use cliapi_engine::{Provider, ProviderCatalog, ResolutionError};
use cliapi_providers::builtin_providers;
use cliapi_registry::CliapiConfig;
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const DEFAULT_PROGRAM: &str = "cliapi";
const USAGE_ERROR: u8 = 2;

fn main() -> ExitCode {
    let args: Vec<OsString> = env::args_os().collect();
    // Arguments that are not valid UTF-8 are left for the grammar to reject.
    let early = EarlyOptions::scan(args.iter().skip(1).filter_map(|arg| arg.to_str()));
    init_tracing(early.verbose);

    match run(&args, &early) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Options that must be known before the provider's grammar exists.
#[derive(Debug, Default, PartialEq, Eq)]
struct EarlyOptions {
    provider: Option<String>,
    list_providers: bool,
    verbose: bool,
}

impl EarlyOptions {
    fn scan<'a>(args: impl IntoIterator<Item = &'a str>) -> Self {
        let mut options = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg {
                "--list-providers" => options.list_providers = true,
                "--verbose" => options.verbose = true,
                "--provider" => options.provider = args.next().map(str::to_string),
                "--" => break,
                _ => {
                    if let Some(name) = arg.strip_prefix("--provider=") {
                        options.provider = Some(name.to_string());
                    }
                }
            }
        }
        options
    }
}

fn run(args: &[OsString], early: &EarlyOptions) -> Result<ExitCode> {
    let program = program_name(args);
    let config = CliapiConfig::load();
    let mut catalog = ProviderCatalog::load(builtin_providers(), &config);

    if early.list_providers {
        for failure in catalog.failures() {
            eprintln!("{failure}");
        }
        print_json(&Value::from(catalog.names().collect::<Vec<_>>()))?;
        return Ok(ExitCode::SUCCESS);
    }

    let name = match select_provider(&catalog, &config, early, &program) {
        Ok(name) => name,
        Err(error) => {
            eprintln!("error: {error:#}");
            print!("{}", help::render_common_help(&program));
            return Ok(ExitCode::FAILURE);
        }
    };
    debug!(provider = %name, "provider selected");
    let mut provider = catalog.take(&name)?;

    // The grammar is derived from the provider's declarations before any
    // real argument is parsed.
    let surface = provider.option_surface();
    let selection = match surface.parse_from(&program, args) {
        Ok(selection) => selection,
        Err(error) => {
            eprintln!("{error}");
            print!("{}", help::render_provider_help(&mut provider, &surface, &program));
            return Ok(ExitCode::from(USAGE_ERROR));
        }
    };
    for option in &selection.supplied {
        if let Some(value) = selection.option_values.get(option) {
            provider.bind_option(option, value.clone());
        }
    }

    if selection.help {
        print!("{}", help::render_provider_help(&mut provider, &surface, &program));
        return Ok(ExitCode::SUCCESS);
    }
    if selection.list_apis {
        print_json(&Value::from(provider.aliases().collect::<Vec<_>>()))?;
        return Ok(ExitCode::SUCCESS);
    }

    let output = if selection.all {
        provider.snapshot()
    } else {
        select_items(&mut provider, &selection.items)
    };
    match output {
        Ok(value) => {
            print_json(&value)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(
            error @ (ResolutionError::MissingRequiredOption { .. }
            | ResolutionError::UnknownAlias { .. }
            | ResolutionError::MalformedQuery(_)),
        ) => {
            eprintln!("error: {error}");
            print!("{}", help::render_provider_help(&mut provider, &surface, &program));
            Ok(ExitCode::from(USAGE_ERROR))
        }
        Err(error) => Err(anyhow::Error::from(error).context(format!("provider '{name}'"))),
    }
}

fn program_name(args: &[OsString]) -> String {
    args.first()
        .and_then(|arg| Path::new(arg).file_stem())
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_PROGRAM.to_string())
}

/// Picks the provider: `--provider`, then the program name, then the
/// configured default, then the first loaded provider.
fn select_provider(catalog: &ProviderCatalog, config: &CliapiConfig, early: &EarlyOptions, program: &str) -> Result<String> {
    if let Some(requested) = &early.provider {
        catalog.get(requested)?;
        return Ok(requested.clone());
    }
    if catalog.contains(program) {
        return Ok(program.to_string());
    }
    if program != DEFAULT_PROGRAM {
        bail!("no plugin provider for {program} was found");
    }
    if let Some(default) = &config.default_provider {
        catalog.get(default).context("default_provider in config")?;
        return Ok(default.clone());
    }
    Ok(catalog.first()?.to_string())
}

/// Looks up every `--item`. One item prints bare; unmatched items are `null`.
fn select_items(provider: &mut Provider, items: &[String]) -> Result<Value, ResolutionError> {
    let mut values = Vec::with_capacity(items.len());
    for item in items {
        let value = provider.find_item(item)?.cloned();
        if value.is_none() {
            debug!(item = %item, "no display item matched");
        }
        values.push(value.unwrap_or(Value::Null));
    }
    if let [single] = values.as_mut_slice() {
        return Ok(single.take());
    }
    Ok(Value::Array(values))
}

fn print_json(value: &Value) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).context("write output")?;
    writeln!(stdout).context("write output")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cliapi_engine::ProviderFactory;
    use serde_json::json;

    #[test]
    fn early_options_find_provider_in_both_forms() {
        let early = EarlyOptions::scan(["--item=mac", "--provider", "azure", "--verbose"]);
        assert_eq!(early.provider.as_deref(), Some("azure"));
        assert!(early.verbose);
        assert!(!early.list_providers);

        let early = EarlyOptions::scan(["--provider=test", "--list-providers"]);
        assert_eq!(early.provider.as_deref(), Some("test"));
        assert!(early.list_providers);

        let early = EarlyOptions::scan(["--", "--provider=test"]);
        assert_eq!(early, EarlyOptions::default());
    }

    #[test]
    fn program_name_is_the_basename() {
        assert_eq!(program_name(&[OsString::from("/usr/local/bin/azure")]), "azure");
        assert_eq!(program_name(&[]), "cliapi");
    }

    fn catalog() -> ProviderCatalog {
        let factories = [ProviderFactory::new("test", cliapi_providers::mock::provider)];
        ProviderCatalog::load(&factories, &CliapiConfig::default())
    }

    #[test]
    fn provider_selection_order() {
        let catalog = catalog();
        let config = CliapiConfig::default();
        let early = EarlyOptions::default();
        assert_eq!(select_provider(&catalog, &config, &early, "cliapi").unwrap(), "test");
        assert_eq!(select_provider(&catalog, &config, &early, "test").unwrap(), "test");
        assert!(select_provider(&catalog, &config, &early, "gce").is_err());

        let early = EarlyOptions {
            provider: Some("azure".to_string()),
            ..EarlyOptions::default()
        };
        assert!(select_provider(&catalog, &config, &early, "cliapi").is_err());

        let config = CliapiConfig {
            default_provider: Some("missing".to_string()),
            ..CliapiConfig::default()
        };
        assert!(select_provider(&catalog, &config, &EarlyOptions::default(), "cliapi").is_err());
    }

    #[test]
    fn items_print_bare_array_or_null() {
        let mut provider = cliapi_providers::mock::provider().unwrap();
        provider.bind_option("smurf", "papa");
        assert_eq!(select_items(&mut provider, &["mac".to_string()]).unwrap(), json!("000D3A3AE8A5"));
        assert_eq!(
            select_items(&mut provider, &["location".to_string(), "nothing".to_string()]).unwrap(),
            json!(["westus", null])
        );
        assert_eq!(select_items(&mut provider, &[]).unwrap(), json!([]));
    }

    #[test]
    fn unrooted_path_items_match_leaf_suffixes() {
        let mut provider = cliapi_providers::mock::provider().unwrap();
        provider.bind_option("smurf", "papa");
        assert_eq!(select_items(&mut provider, &["compute.name".to_string()]).unwrap(), json!("ed-sle12sp3byos"));
        assert_eq!(
            select_items(&mut provider, &["interface[0].macAddress".to_string()]).unwrap(),
            json!("000D3A3AE8A5")
        );
    }
}
