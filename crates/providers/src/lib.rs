//! Provider plugins compiled into the `cliapi` binary.
//!
//! Providers are listed statically in [`builtin_providers`]; nothing is
//! discovered at runtime. A provider that cannot initialize on the current
//! host (for example `azure` outside Azure) fails its init function and is
//! reported by the catalog.

pub mod azure;
pub mod detect;
pub mod mock;

use cliapi_engine::ProviderFactory;
use cliapi_registry::{ApiRegistration, FieldPath};

/// Every compiled-in provider, in listing order.
pub fn builtin_providers() -> &'static [ProviderFactory] {
    const PROVIDERS: &[ProviderFactory] = &[
        ProviderFactory::new(azure::NAME, azure::provider),
        ProviderFactory::new(mock::NAME, mock::provider),
    ];
    PROVIDERS
}

/// Scoops into an Azure-shaped `meta_data` document, shared by `azure` and `test`.
pub(crate) fn with_metadata_scoops(registration: ApiRegistration) -> ApiRegistration {
    let interface = FieldPath::new().key("meta_data").key("network").key("interface").index(0);
    let address = interface.clone().key("ipv4").key("ipAddress").index(0);
    registration
        .scoop("instance-name", FieldPath::new().key("meta_data").key("compute").key("name"))
        .scoop("mac", interface.key("macAddress"))
        .scoop("location", FieldPath::new().key("meta_data").key("compute").key("location"))
        .scoop("external-ip", address.clone().key("publicIpAddress"))
        .scoop("internal-ip", address.key("privateIpAddress"))
        .help("instance-name", "name of instance")
        .help("location", "region location")
        .help("mac", "the MAC address for this interface")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_names_are_unique() {
        let names: Vec<_> = builtin_providers().iter().map(|factory| factory.name).collect();
        assert_eq!(names, vec!["azure", "test"]);
    }
}
