use clap::{Arg, ArgAction, ArgMatches, Command as ClapCommand, parser::ValueSource};
use indexmap::{IndexMap, IndexSet};
use tracing::warn;

use crate::{
    ApiRegistry,
    common::{self, COMMON_OPTIONS},
};

const OPTION_LINE_WIDTH: usize = 15;

/// Where an option on the surface comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionOrigin {
    /// A placeholder declared by the provider's registrations
    Provider,
    /// A framework option shared by every provider
    Common,
}

/// One legal long-form option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceOption {
    pub name: String,
    pub help: Option<String>,
    /// Binding at the time the surface was derived (provider options only)
    pub default: Option<String>,
    pub repeatable: bool,
    pub origin: OptionOrigin,
}

impl SurfaceOption {
    /// A provider option is required when nothing supplies a usable default.
    pub fn is_required(&self) -> bool {
        self.origin == OptionOrigin::Provider && self.default.is_none()
    }
}

/// The command-line grammar derived from a provider's declarations.
///
/// The legal option set depends on which provider is loaded, so it cannot be
/// known statically. The surface is derived from the registry alone, before
/// any real argument is examined; arguments are then parsed against the
/// resulting grammar, and the same surface renders help after an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionSurface {
    /// Provider the surface was derived for (`None` for the common-only surface)
    pub provider: Option<String>,
    /// Options that require a value
    pub value_options: Vec<SurfaceOption>,
    /// Options that are bare flags
    pub flags: Vec<SurfaceOption>,
}

impl OptionSurface {
    /// Derives the option surface for `provider` from its registry.
    ///
    /// Every placeholder referenced by a declared option becomes a
    /// value-taking option; its current binding (captured default or
    /// configuration value) becomes the option's default. The common options
    /// are appended after the provider's own.
    ///
    /// Placeholders that collide with a common option name are left off the
    /// surface with a warning; they can still be bound through configuration.
    ///
    /// # Arguments
    ///
    /// * `provider` - Name of the provider, used in help output
    /// * `registry` - The provider's registration tables
    ///
    /// # Returns
    ///
    /// An `OptionSurface` partitioned into value options and flags.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cliapi_registry::{ApiRegistration, ApiRegistry, OptionSurface, Parameter};
    /// use serde_json::Value;
    ///
    /// let mut registry = ApiRegistry::new();
    /// registry.register(
    ///     ApiRegistration::new("some_stuff", |_: &cliapi_registry::CallArguments| -> anyhow::Result<Value> { Ok(Value::Null) })
    ///         .parameter(Parameter::defaulted("api_version", "2017-08-01"))
    ///         .option("api_version", "$api_version"),
    /// ).expect("register");
    /// let surface = OptionSurface::derive("test", &registry);
    /// assert!(surface.value_options.iter().any(|option| option.name == "api_version"));
    /// ```
    pub fn derive(provider: &str, registry: &ApiRegistry) -> Self {
        let mut surface = Self {
            provider: Some(provider.to_string()),
            ..Self::default()
        };

        for name in registry.placeholder_options() {
            if common::is_common(name) {
                warn!(provider = %provider, option = %name, "provider option shadows a common option and is not exposed");
                continue;
            }
            surface.value_options.push(SurfaceOption {
                name: name.to_string(),
                help: registry.help_for(name).map(str::to_string),
                default: registry.template.get(name).map(str::to_string),
                repeatable: false,
                origin: OptionOrigin::Provider,
            });
        }

        surface.push_common_options();
        surface
    }

    /// The surface used when no provider could be selected.
    pub fn common_only() -> Self {
        let mut surface = Self::default();
        surface.push_common_options();
        surface
    }

    fn push_common_options(&mut self) {
        for option in COMMON_OPTIONS {
            let entry = SurfaceOption {
                name: option.name.to_string(),
                help: Some(option.help.to_string()),
                default: None,
                repeatable: option.repeatable,
                origin: OptionOrigin::Common,
            };
            if option.takes_value {
                self.value_options.push(entry);
            } else {
                self.flags.push(entry);
            }
        }
    }

    /// Options declared by the provider, required ones and defaulted ones alike.
    pub fn provider_options(&self) -> impl Iterator<Item = &SurfaceOption> {
        self.value_options
            .iter()
            .filter(|option| option.origin == OptionOrigin::Provider)
    }

    pub fn required_options(&self) -> impl Iterator<Item = &SurfaceOption> {
        self.provider_options().filter(|option| option.is_required())
    }

    pub fn defaulted_options(&self) -> impl Iterator<Item = &SurfaceOption> {
        self.provider_options().filter(|option| !option.is_required())
    }

    /// Builds the Clap command for this surface. See [`build_clap`].
    pub fn build_clap(&self, program: &str) -> ClapCommand {
        build_clap(self, program)
    }

    /// Parses `args` (program name first) against this surface.
    ///
    /// # Errors
    ///
    /// Returns the Clap error for unknown options, missing values, or
    /// unexpected positional arguments.
    pub fn parse_from<I, T>(&self, program: &str, args: I) -> Result<CliSelection, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = self.build_clap(program).try_get_matches_from(args)?;
        Ok(CliSelection::from_matches(self, &matches))
    }

    /// Renders the usage line.
    pub fn render_usage(&self, program: &str) -> String {
        format!(
            "usage: {program} --item=[API display item #1]... [API config option#1]... [API required options]... [Common CLI options]..."
        )
    }

    /// Renders the provider's API config options, required ones first.
    ///
    /// Required options are marked `-REQUIRED-`; defaulted options show
    /// their current default. Provider help text follows either marker.
    pub fn render_provider_options(&self) -> String {
        let mut lines = Vec::new();
        for option in self.required_options().chain(self.defaulted_options()) {
            let mut parts = Vec::new();
            match &option.default {
                None => parts.push("-REQUIRED-".to_string()),
                Some(default) => parts.push(format!("default='{default}'")),
            }
            if let Some(help) = option.help.as_deref().filter(|help| !help.is_empty()) {
                parts.push(help.to_string());
            }
            lines.push(format_option_line(&format!("{}=", option.name), &parts.join(", ")));
        }
        lines.join("\n")
    }

    /// Renders the framework options shared by every provider.
    pub fn render_common_options(&self) -> String {
        COMMON_OPTIONS
            .iter()
            .map(|option| format_option_line(&option.display_name(), option.help))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn format_option_line(name: &str, description: &str) -> String {
    format!("  --{name:<OPTION_LINE_WIDTH$}  {description}")
}

/// Options and flags actually selected on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliSelection {
    pub provider: Option<String>,
    pub help: bool,
    pub list_providers: bool,
    pub list_apis: bool,
    pub all: bool,
    pub verbose: bool,
    /// Every `--item` value, in command-line order
    pub items: Vec<String>,
    /// Provider option values: the supplied value, or the default when not supplied
    pub option_values: IndexMap<String, String>,
    /// Provider options that were given on the command line
    pub supplied: IndexSet<String>,
}

impl CliSelection {
    /// Collects the selection from parsed matches.
    ///
    /// A provider option not given on the command line falls back to the
    /// default recorded on the surface; an option with neither stays absent.
    pub fn from_matches(surface: &OptionSurface, matches: &ArgMatches) -> Self {
        let mut selection = Self {
            provider: matches.get_one::<String>(common::PROVIDER).cloned(),
            help: matches.get_flag(common::HELP),
            list_providers: matches.get_flag(common::LIST_PROVIDERS),
            list_apis: matches.get_flag(common::LIST_APIS),
            all: matches.get_flag(common::ALL),
            verbose: matches.get_flag(common::VERBOSE),
            items: matches
                .get_many::<String>(common::ITEM)
                .map(|values| values.cloned().collect())
                .unwrap_or_default(),
            ..Self::default()
        };

        for option in surface.provider_options() {
            let Some(value) = matches.get_one::<String>(&option.name) else {
                continue;
            };
            if matches.value_source(&option.name) == Some(ValueSource::CommandLine) {
                selection.supplied.insert(option.name.clone());
            }
            selection.option_values.insert(option.name.clone(), value.clone());
        }
        selection
    }
}

/// Builds the Clap command for an option surface.
///
/// Every value option becomes a `--name=value` argument and every flag a
/// `--name` switch. Clap's built-in help and version flags are disabled
/// because `--help` renders the provider-aware help instead.
///
/// Note: Clap requires `'static` names, so option names, defaults and the
/// program name are leaked. The command is built once per process.
///
/// # Arguments
///
/// * `surface` - The derived option surface
/// * `program` - Program name shown in errors
///
/// # Returns
///
/// A configured ClapCommand ready for parsing.
pub fn build_clap(surface: &OptionSurface, program: &str) -> ClapCommand {
    let mut root = create_root_command(program);
    for option in &surface.value_options {
        root = root.arg(build_value_argument(option));
    }
    for flag in &surface.flags {
        root = root.arg(build_flag_argument(flag));
    }
    root
}

fn create_root_command(program: &str) -> ClapCommand {
    ClapCommand::new(leak(program))
        .disable_help_flag(true)
        .disable_version_flag(true)
        .args_override_self(true)
}

fn build_value_argument(option: &SurfaceOption) -> Arg {
    let name = leak(&option.name);
    let action = if option.repeatable { ArgAction::Append } else { ArgAction::Set };
    let mut arg = Arg::new(name).long(name).value_name("VALUE").action(action);
    if let Some(default) = &option.default {
        arg = arg.default_value(leak(default));
    }
    if let Some(help) = &option.help {
        arg = arg.help(help.clone());
    }
    arg
}

fn build_flag_argument(flag: &SurfaceOption) -> Arg {
    let name = leak(&flag.name);
    let mut arg = Arg::new(name).long(name).action(ArgAction::SetTrue);
    if let Some(help) = &flag.help {
        arg = arg.help(help.clone());
    }
    arg
}

fn leak(value: &str) -> &'static str {
    Box::leak(value.to_string().into_boxed_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ApiRegistration, Parameter};
    use cliapi_types::CallArguments;
    use serde_json::Value;

    fn noop(_: &CallArguments) -> anyhow::Result<Value> {
        Ok(Value::Null)
    }

    fn registry() -> ApiRegistry {
        let mut registry = ApiRegistry::new();
        registry.register(
            ApiRegistration::new("test", noop)
                .parameters([
                    Parameter::required("arg1"),
                    Parameter::defaulted("key1", "bar"),
                    Parameter::defaulted("key2", "baz"),
                ])
                .options([
                    ("arg1", "$smurf"),
                    ("key1", "$dufus"),
                    ("key2", "$dweebville"),
                ])
                .help("smurf", "what is smurf name?"),
        ).expect("register");
        registry
    }

    #[test]
    fn partitions_value_options_and_flags() {
        let surface = OptionSurface::derive("test", &registry());
        let values: Vec<_> = surface.value_options.iter().map(|option| option.name.as_str()).collect();
        let flags: Vec<_> = surface.flags.iter().map(|option| option.name.as_str()).collect();
        assert_eq!(values, vec!["smurf", "dufus", "dweebville", "provider", "item"]);
        assert_eq!(flags, vec!["help", "list-providers", "list-apis", "all", "verbose"]);
        assert_eq!(surface.required_options().map(|option| option.name.as_str()).collect::<Vec<_>>(), vec!["smurf"]);
    }

    #[test]
    fn unsupplied_options_fall_back_to_defaults() {
        let surface = OptionSurface::derive("test", &registry());
        let selection = surface
            .parse_from("cliapi", ["cliapi", "--smurf=papa", "--item", "a", "--item=b"])
            .expect("parse");
        assert_eq!(selection.option_values.get("smurf").map(String::as_str), Some("papa"));
        assert_eq!(selection.option_values.get("dufus").map(String::as_str), Some("bar"));
        assert_eq!(selection.supplied.iter().collect::<Vec<_>>(), vec!["smurf"]);
        assert_eq!(selection.items, vec!["a".to_string(), "b".to_string()]);
        assert!(!selection.all);
    }

    #[test]
    fn required_option_stays_absent_when_not_supplied() {
        let surface = OptionSurface::derive("test", &registry());
        let selection = surface.parse_from("cliapi", ["cliapi", "--all"]).expect("parse");
        assert!(selection.all);
        assert!(!selection.option_values.contains_key("smurf"));
    }

    #[test]
    fn rejects_options_the_provider_never_declared() {
        let surface = OptionSurface::derive("test", &registry());
        assert!(surface.parse_from("cliapi", ["cliapi", "--region=westus"]).is_err());
        assert!(OptionSurface::common_only().parse_from("cliapi", ["cliapi", "--smurf=x"]).is_err());
    }

    #[test]
    fn help_flag_is_ours_not_clap() {
        let surface = OptionSurface::derive("test", &registry());
        let selection = surface.parse_from("cliapi", ["cliapi", "--help"]).expect("parse");
        assert!(selection.help);
    }

    #[test]
    fn renders_required_before_defaulted_with_help() {
        let surface = OptionSurface::derive("test", &registry());
        let rendered = surface.render_provider_options();
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("smurf=") && lines[0].contains("-REQUIRED-, what is smurf name?"));
        assert!(lines[1].contains("dufus=") && lines[1].contains("default='bar'"));
        assert!(surface.render_common_options().contains("--item="));
    }

    #[test]
    fn common_option_names_are_not_shadowed() {
        let mut registry = ApiRegistry::new();
        registry.register(
            ApiRegistration::new("odd", noop)
                .parameter(Parameter::defaulted("x", "1"))
                .option("x", "$item"),
        ).expect("register");
        let surface = OptionSurface::derive("odd", &registry);
        assert_eq!(surface.provider_options().count(), 0);
        assert_eq!(surface.value_options.iter().filter(|option| option.name == "item").count(), 1);
    }
}
