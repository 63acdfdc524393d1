//! Options accepted by every provider, independent of its registrations.

/// A framework-level command-line option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommonOption {
    /// Long option name without the leading `--`
    pub name: &'static str,
    /// Whether the option requires a value (`--name=value`)
    pub takes_value: bool,
    /// Whether the option may be given more than once
    pub repeatable: bool,
    pub help: &'static str,
}

impl CommonOption {
    /// The option as shown in help output, e.g. `item=`.
    pub fn display_name(&self) -> String {
        if self.takes_value {
            format!("{}=", self.name)
        } else {
            self.name.to_string()
        }
    }
}

pub const HELP: &str = "help";
pub const PROVIDER: &str = "provider";
pub const LIST_PROVIDERS: &str = "list-providers";
pub const LIST_APIS: &str = "list-apis";
pub const ALL: &str = "all";
pub const ITEM: &str = "item";
pub const VERBOSE: &str = "verbose";

pub const COMMON_OPTIONS: &[CommonOption] = &[
    CommonOption {
        name: HELP,
        takes_value: false,
        repeatable: false,
        help: "help for this CLI command",
    },
    CommonOption {
        name: PROVIDER,
        takes_value: true,
        repeatable: false,
        help: "specify name of provider module",
    },
    CommonOption {
        name: LIST_PROVIDERS,
        takes_value: false,
        repeatable: false,
        help: "list all available providers",
    },
    CommonOption {
        name: LIST_APIS,
        takes_value: false,
        repeatable: false,
        help: "list all available APIs for specified provider",
    },
    CommonOption {
        name: ALL,
        takes_value: false,
        repeatable: false,
        help: "output all API results for a specific provider",
    },
    CommonOption {
        name: ITEM,
        takes_value: true,
        repeatable: true,
        help: "value to return from an API using right-most path name specifier",
    },
    CommonOption {
        name: VERBOSE,
        takes_value: false,
        repeatable: false,
        help: "log resolution activity to stderr",
    },
];

/// Whether `name` is reserved by the framework.
pub fn is_common(name: &str) -> bool {
    COMMON_OPTIONS.iter().any(|option| option.name == name)
}
