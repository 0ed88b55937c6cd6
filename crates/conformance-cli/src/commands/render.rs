use anyhow::Result;
use conformance_core::command;
use conformance_core::{AdminEndpoint, ConnectorSpec};
use tracing::warn;

fn load_spec(path: &str) -> Result<ConnectorSpec> {
    let spec = ConnectorSpec::from_yaml_file(path)?;
    spec.validate()?;
    if spec.input_topic.is_some() && !spec.serde_inputs.is_empty() {
        // the generator does not enforce exclusivity; make the overlap visible
        warn!("spec sets both input_topic and serde_inputs; both flags will be emitted");
    }
    Ok(spec)
}

fn endpoint(admin_host: Option<String>, admin_port: Option<u16>) -> AdminEndpoint {
    AdminEndpoint {
        host: admin_host,
        port: admin_port,
    }
}

pub fn create(
    spec_path: &str,
    code_file: Option<&str>,
    admin_host: Option<String>,
    admin_port: Option<u16>,
) -> Result<()> {
    let spec = load_spec(spec_path)?;
    let cmd = command::render_create(&spec, &endpoint(admin_host, admin_port), code_file)?;
    println!("{}", cmd);
    Ok(())
}

pub fn update(
    spec_path: &str,
    code_file: Option<&str>,
    admin_host: Option<String>,
    admin_port: Option<u16>,
) -> Result<()> {
    let spec = load_spec(spec_path)?;
    let cmd = command::render_update(&spec, &endpoint(admin_host, admin_port), code_file)?;
    println!("{}", cmd);
    Ok(())
}

pub fn delete(spec_path: &str) -> Result<()> {
    let spec = load_spec(spec_path)?;
    println!("{}", command::render_delete(&spec));
    Ok(())
}

pub fn trigger(spec_path: &str, value: &str) -> Result<()> {
    let spec = load_spec(spec_path)?;
    println!("{}", command::render_trigger(&spec, value));
    Ok(())
}
