//! Admin command rendering.
//!
//! Translates a `ConnectorSpec` into the exact command line the platform's
//! admin tool accepts for create, update, delete and trigger. Rendering is a
//! pure function of its inputs: equal specs always yield byte-identical
//! strings, and absent optional fields never emit a flag.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::config::AdminEndpoint;
use crate::error::Result;
use crate::spec::{ConnectorSpec, RuntimeKind};

/// Admin tool invocation every generated command starts with.
pub const ADMIN_SCRIPT: &str = "/pulsar/bin/pulsar-admin";

/// Fixed archive path appended for the compiled runtime.
pub const COMPILED_ARCHIVE: &str = "/pulsar/examples/api-examples.jar";

/// Base directory appended for the interpreted runtime.
pub const INTERPRETED_BASE: &str = "/pulsar/examples/python-examples/";

/// Heap cap prefixed onto update invocations.
const UPDATE_ENV_PREFIX: &str = "PULSAR_MEM=-Xmx1024m ";

/// Render the `functions create` command for a spec.
pub fn render_create(
    spec: &ConnectorSpec,
    endpoint: &AdminEndpoint,
    code_file: Option<&str>,
) -> Result<String> {
    let mut cmd = String::from(ADMIN_SCRIPT);
    push_admin_url(&mut cmd, endpoint);
    cmd.push_str(" functions create");
    push_function_flags(&mut cmd, spec)?;
    push_packaging_flag(&mut cmd, spec, code_file);
    Ok(cmd)
}

/// Render the `functions update` command for a spec.
///
/// Applies the same flag-composition rule as create; the invocation is
/// additionally prefixed with the heap cap used for update runs.
pub fn render_update(
    spec: &ConnectorSpec,
    endpoint: &AdminEndpoint,
    code_file: Option<&str>,
) -> Result<String> {
    let mut cmd = String::from(UPDATE_ENV_PREFIX);
    cmd.push_str(ADMIN_SCRIPT);
    push_admin_url(&mut cmd, endpoint);
    cmd.push_str(" functions update");
    push_function_flags(&mut cmd, spec)?;
    push_packaging_flag(&mut cmd, spec, code_file);
    Ok(cmd)
}

/// Render the `functions delete` command: identifying flags only.
pub fn render_delete(spec: &ConnectorSpec) -> String {
    let mut cmd = String::from(ADMIN_SCRIPT);
    cmd.push_str(" functions delete");
    push_identity_flags(&mut cmd, spec);
    cmd
}

/// Render the `functions trigger` command with a literal payload value.
pub fn render_trigger(spec: &ConnectorSpec, trigger_value: &str) -> String {
    let mut cmd = String::from(ADMIN_SCRIPT);
    cmd.push_str(" functions trigger");
    push_identity_flags(&mut cmd, spec);
    push_flag(&mut cmd, "triggerValue", trigger_value);
    cmd
}

fn push_admin_url(cmd: &mut String, endpoint: &AdminEndpoint) {
    if let Some(url) = endpoint.url() {
        push_flag(cmd, "admin-url", &url);
    }
}

fn push_identity_flags(cmd: &mut String, spec: &ConnectorSpec) {
    push_flag(cmd, "tenant", &spec.tenant);
    push_flag(cmd, "namespace", &spec.namespace);
    if let Some(name) = &spec.name {
        push_flag(cmd, "name", name);
    }
}

// Field order is fixed and load-bearing: tests assert on exact command text.
fn push_function_flags(cmd: &mut String, spec: &ConnectorSpec) -> Result<()> {
    push_identity_flags(cmd, spec);

    if let Some(class_name) = &spec.class_name {
        push_flag(cmd, "className", class_name);
    }
    if let Some(topic) = &spec.input_topic {
        push_flag(cmd, "inputs", topic);
    }
    if let Some(topic) = &spec.log_topic {
        push_flag(cmd, "logTopic", topic);
    }
    // both input flags are emitted when both bindings are set; the generator
    // deliberately does not enforce their mutual exclusivity
    if !spec.serde_inputs.is_empty() {
        push_map_flag(cmd, "customSerdeInputs", &spec.serde_inputs)?;
    }
    if let Some(topic) = &spec.output_topic {
        push_flag(cmd, "output", topic);
    }
    if let Some(class) = &spec.output_serde_class {
        push_flag(cmd, "outputSerdeClassName", class);
    }
    if let Some(guarantee) = spec.processing_guarantee {
        push_flag(cmd, "processingGuarantees", guarantee.as_flag_value());
    }
    if !spec.user_config.is_empty() {
        push_map_flag(cmd, "userConfig", &spec.user_config)?;
    }
    if let Some(parallelism) = spec.parallelism {
        push_flag(cmd, "parallelism", &parallelism.to_string());
    }
    if let Some(count) = spec.window.length_count {
        push_flag(cmd, "windowLengthCount", &count.to_string());
    }
    if let Some(duration) = spec.window.length_duration_ms {
        push_flag(cmd, "windowLengthDurationMs", &duration.to_string());
    }
    if let Some(count) = spec.window.sliding_interval_count {
        push_flag(cmd, "slidingIntervalCount", &count.to_string());
    }
    if let Some(duration) = spec.window.sliding_interval_duration_ms {
        push_flag(cmd, "slidingIntervalDurationMs", &duration.to_string());
    }

    Ok(())
}

fn push_packaging_flag(cmd: &mut String, spec: &ConnectorSpec, code_file: Option<&str>) {
    match spec.runtime {
        RuntimeKind::Compiled => push_flag(cmd, "jar", COMPILED_ARCHIVE),
        RuntimeKind::Interpreted => {
            let path = match code_file {
                Some(file) => format!("{}{}", INTERPRETED_BASE, file),
                None => INTERPRETED_BASE.to_string(),
            };
            push_flag(cmd, "py", &path);
        }
    }
}

fn push_flag(cmd: &mut String, name: &str, value: &str) {
    // writing to a String cannot fail
    let _ = write!(cmd, " --{} {}", name, value);
}

fn push_map_flag(cmd: &mut String, name: &str, map: &BTreeMap<String, String>) -> Result<()> {
    let encoded = serde_json::to_string(map)?;
    let _ = write!(cmd, " --{} '{}'", name, encoded);
    Ok(())
}
