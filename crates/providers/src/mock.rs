//! The `test` provider: canned data that loads on any host.

use cliapi_engine::Provider;
use cliapi_registry::{ApiRegistration, CallArguments, Parameter};
use serde_json::{Value, json};

use crate::with_metadata_scoops;

pub const NAME: &str = "test";

pub fn provider() -> anyhow::Result<Provider> {
    let mut provider = Provider::new(NAME);
    provider.register(
        ApiRegistration::new("test", echo_arguments)
            .target("foo")
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
            .help("smurf", "what is smurf name?")
            .help("dweebville", "where is dweebville?"),
    )?;
    provider.register(with_metadata_scoops(
        ApiRegistration::new("meta_data", mock_meta_data).target("get_meta_data_mock"),
    ))?;
    provider.register(
        ApiRegistration::new("some_stuff", some_stuff)
            .target("get_stuff")
            .parameter(Parameter::defaulted("api_version", "2017-08-01"))
            .option("api_version", "$api_version"),
    )?;
    Ok(provider)
}

fn echo_arguments(arguments: &CallArguments) -> anyhow::Result<Value> {
    Ok(json!([arguments.positional(0), arguments.keyword("key1"), arguments.keyword("key2")]))
}

fn some_stuff(arguments: &CallArguments) -> anyhow::Result<Value> {
    Ok(json!(arguments.keyword("api_version")))
}

fn mock_meta_data(_: &CallArguments) -> anyhow::Result<Value> {
    Ok(json!({
        "compute": {
            "location": "westus",
            "name": "ed-sle12sp3byos",
            "offer": "SLES-BYOS",
            "osType": "Linux",
            "placementGroupId": "",
            "platformFaultDomain": "0",
            "platformUpdateDomain": "0",
            "publisher": "SUSE",
            "resourceGroupName": "ed_lane",
            "sku": "12-SP3",
            "subscriptionId": "ce73a2b0-d2e7-4ff6-b987-b32d6908de4e",
            "tags": "",
            "version": "2018.02.21",
            "vmId": "ce01dc32-6d0a-40bd-9534-a3509f768a53",
            "vmSize": "Standard_B1ms"
        },
        "network": {
            "interface": [{
                "ipv4": {
                    "ipAddress": [{"privateIpAddress": "172.16.3.8", "publicIpAddress": "104.42.34.116"}],
                    "subnet": [{"address": "172.16.3.0", "prefix": "24"}]
                },
                "ipv6": {"ipAddress": []},
                "macAddress": "000D3A3AE8A5"
            }]
        }
    }))
}
