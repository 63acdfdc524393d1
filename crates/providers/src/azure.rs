//! The `azure` provider: instance metadata service, cloud service name and billing tag.

use std::{
    fs::{self, File},
    io::{Read, Seek, SeekFrom},
    path::Path,
    time::Duration,
};

use anyhow::{Context, bail};
use cliapi_engine::Provider;
use cliapi_registry::{ApiRegistration, CallArguments, FieldPath, Parameter};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::{
    detect::{self, Cloud},
    with_metadata_scoops,
};

pub const NAME: &str = "azure";

const METADATA_URL: &str = "http://169.254.169.254/metadata/instance";
const BILLING_TAG_OFFSET: u64 = 65536;
const SHARED_CONFIG_PATH: &str = "/var/lib/waagent/SharedConfig.xml";

/// Loads the provider, failing when this host is not an Azure VM.
pub fn provider() -> anyhow::Result<Provider> {
    let detected = detect::detect_cloud().context("failed to read DMI system vendor")?;
    if detected != Some(Cloud::Azure) {
        bail!(
            "not running on Azure (detected: {})",
            detected.map(|cloud| cloud.as_str()).unwrap_or("unknown")
        );
    }
    register_apis(Provider::new(NAME))
}

fn register_apis(mut provider: Provider) -> anyhow::Result<Provider> {
    provider.register(with_metadata_scoops(
        ApiRegistration::new("meta_data", meta_data)
            .target("get_meta_data_azure")
            .parameter(Parameter::defaulted("api_version", "2017-08-01"))
            .option("api_version", "$api_version")
            .help("api_version", "azure metadata api version"),
    ))?;
    provider.register(
        ApiRegistration::new("tag", billing_tag)
            .target("read_billing_guid")
            .parameter(Parameter::defaulted("device", "/dev/sda")),
    )?;
    provider.register(
        ApiRegistration::new("cloud-service", cloud_service)
            .target("get_cloud_service")
            .parameter(Parameter::defaulted("path", SHARED_CONFIG_PATH))
            .scoop("cloud-service", FieldPath::new().key("cloud-service"))
            .help("cloud-service", "cloud service host name from the guest agent config"),
    )?;
    Ok(provider)
}

fn meta_data(arguments: &CallArguments) -> anyhow::Result<Value> {
    let api_version = arguments.keyword("api_version").context("api_version not supplied")?;
    fetch_instance_metadata(METADATA_URL, api_version)
}

fn billing_tag(arguments: &CallArguments) -> anyhow::Result<Value> {
    let device = arguments.keyword("device").context("device not supplied")?;
    Ok(Value::String(read_billing_tag(Path::new(device))?.to_string()))
}

fn cloud_service(arguments: &CallArguments) -> anyhow::Result<Value> {
    let path = arguments.keyword("path").context("path not supplied")?;
    Ok(Value::String(read_cloud_service(Path::new(path))?))
}

/// GETs the instance metadata document.
///
/// The call blocks on a current-thread runtime; resolution is synchronous.
pub fn fetch_instance_metadata(url: &str, api_version: &str) -> anyhow::Result<Value> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(async {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .build()
            .context("build http client")?;
        debug!(url = %url, api_version = %api_version, "requesting instance metadata");
        let response = client
            .get(url)
            .query(&[("api-version", api_version)])
            .header("Metadata", "true")
            .send()
            .await
            .with_context(|| format!("metadata request to {url} failed"))?;
        let status = response.status();
        if !status.is_success() {
            bail!("metadata service returned {status}");
        }
        response.json::<Value>().await.context("decode metadata response")
    })
}

/// Reads the 16-byte billing GUID stored at offset 65536 of `device`.
pub fn read_billing_tag(device: &Path) -> anyhow::Result<Uuid> {
    let mut file = File::open(device).with_context(|| format!("open {}", device.display()))?;
    file.seek(SeekFrom::Start(BILLING_TAG_OFFSET))
        .with_context(|| format!("seek {}", device.display()))?;
    let mut bytes = [0u8; 16];
    file.read_exact(&mut bytes)
        .with_context(|| format!("read billing tag from {}", device.display()))?;
    Ok(Uuid::from_bytes_le(bytes))
}

/// Reads `Deployment/Service@name` from the guest agent's shared config and
/// returns it as a `cloudapp.net` host name.
pub fn read_cloud_service(path: &Path) -> anyhow::Result<String> {
    let content = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let document = roxmltree::Document::parse(&content).with_context(|| format!("parse {}", path.display()))?;
    let name = child_element(document.root_element(), "Deployment")
        .and_then(|deployment| child_element(deployment, "Service"))
        .and_then(|service| service.attribute("name"))
        .with_context(|| format!("no Deployment/Service name in {}", path.display()))?;
    Ok(format!("{name}.cloudapp.net"))
}

fn child_element<'a, 'input>(node: roxmltree::Node<'a, 'input>, tag: &str) -> Option<roxmltree::Node<'a, 'input>> {
    node.children().find(|child| child.has_tag_name(tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn billing_tag_is_little_endian_guid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("disk.img");
        let mut file = File::create(&path).unwrap();
        file.write_all(&vec![0u8; BILLING_TAG_OFFSET as usize]).unwrap();
        file.write_all(&[
            0x33, 0x22, 0x11, 0x00, 0x55, 0x44, 0x77, 0x66, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff,
        ])
        .unwrap();
        drop(file);

        let tag = read_billing_tag(&path).unwrap();
        assert_eq!(tag.to_string(), "00112233-4455-6677-8899-aabbccddeeff");
    }

    #[test]
    fn short_device_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.img");
        std::fs::write(&path, [0u8; 16]).unwrap();
        assert!(read_billing_tag(&path).is_err());
    }

    #[test]
    fn tag_device_default_bypasses_templates() {
        let provider = register_apis(Provider::new(NAME)).unwrap();
        let descriptor = provider.registry().descriptor("tag").unwrap();
        assert!(descriptor.keyword["device"].is_literal());
        assert!(descriptor.captured_defaults.is_empty());
        assert_eq!(provider.registry().template.get("api_version"), Some("2017-08-01"));
        assert_eq!(provider.option_surface().provider_options().count(), 1);
        assert_eq!(provider.aliases().collect::<Vec<_>>(), vec!["meta_data", "tag", "cloud-service"]);
    }

    const SHARED_CONFIG: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<SharedConfig version="1.0.0.0" goalStateIncarnation="1">
  <Deployment name="a1b2c3" guid="{a1b2c3}" incarnation="0" isNonCancellableTopologyChangeEnabled="false">
    <Service name="ed-sle12" guid="{00000000-0000-0000-0000-000000000000}" />
    <ServiceInstance name="a1b2c3.0" guid="{d4e5f6}" />
  </Deployment>
  <Incarnation number="1" instance="ed-sle12" guid="{f7e8d9}" />
</SharedConfig>
"#;

    #[test]
    fn cloud_service_reads_service_name_from_shared_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("SharedConfig.xml");
        std::fs::write(&path, SHARED_CONFIG).unwrap();
        assert_eq!(read_cloud_service(&path).unwrap(), "ed-sle12.cloudapp.net");
    }

    #[test]
    fn cloud_service_reads_the_path_parameter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("SharedConfig.xml");
        std::fs::write(&path, SHARED_CONFIG).unwrap();

        let provider = register_apis(Provider::new(NAME)).unwrap();
        let mut arguments = CallArguments::new();
        arguments.keyword.insert("path".into(), path.display().to_string());
        let descriptor = provider.registry().descriptor("cloud-service").unwrap();
        assert_eq!(descriptor.invoke_direct(&arguments).unwrap(), Value::String("ed-sle12.cloudapp.net".into()));
        assert!(descriptor.keyword["path"].is_literal());
        assert_eq!(provider.registry().help_for("cloud-service"), Some("cloud service host name from the guest agent config"));
        assert_eq!(provider.registry().scoop("cloud-service"), Some(&FieldPath::new().key("cloud-service")));
    }

    #[test]
    fn cloud_service_without_service_element_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("SharedConfig.xml");
        std::fs::write(&path, "<SharedConfig><Deployment name=\"x\" /></SharedConfig>").unwrap();
        let error = read_cloud_service(&path).unwrap_err();
        assert!(error.to_string().contains("no Deployment/Service name"));
    }
}
