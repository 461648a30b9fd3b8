//! KDL configuration parser

use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::model::*;

/// Longest device name the kernel accepts (`UINPUT_MAX_NAME_SIZE` minus NUL)
const MAX_DEVICE_NAME_LEN: usize = 79;

/// Parse a configuration file from the given path
pub fn parse_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config_str(&content)
}

/// Parse configuration from a string
pub fn parse_config_str(content: &str) -> Result<Config, ConfigError> {
    let doc: kdl::KdlDocument = content.parse().map_err(|e: kdl::KdlError| {
        // kdl uses an older miette version, so we need to extract offset/len manually
        let offset = e.span.offset();
        let len = e.span.len();
        let span = miette::SourceSpan::from((offset, len));
        ConfigError::ParseError {
            src: content.to_string(),
            span,
            source: e,
        }
    })?;

    let mut config = Config::default();

    for node in doc.nodes() {
        match node.name().value() {
            "global" => {
                config.global = parse_global(node)?;
            }
            "input" => {
                config.input = Some(parse_input(node)?);
            }
            "output" => {
                config.output = parse_output(node)?;
            }
            name => {
                tracing::warn!("Unknown top-level node: {}", name);
            }
        }
    }

    Ok(config)
}

fn first_string<'a>(node: &'a kdl::KdlNode) -> Option<&'a str> {
    node.entries().first().and_then(|e| e.value().as_string())
}

fn expand_path(value: &str) -> PathBuf {
    shellexpand::tilde(value).into_owned().into()
}

/// First argument of `node` as a string, or an `Invalid` error naming `field`.
fn require_string<'a>(node: &'a kdl::KdlNode, field: &str) -> Result<&'a str, ConfigError> {
    first_string(node).ok_or_else(|| ConfigError::Invalid {
        message: format!("'{}' expects a string value", field),
    })
}

/// First argument of `node` as an integer that fits in a u16.
fn require_u16(node: &kdl::KdlNode, field: &str) -> Result<u16, ConfigError> {
    let value = node
        .entries()
        .first()
        .and_then(|e| e.value().as_i64())
        .ok_or_else(|| ConfigError::Invalid {
            message: format!("'{}' expects an integer value", field),
        })?;

    u16::try_from(value).map_err(|_| ConfigError::Invalid {
        message: format!(
            "'{}' must be between 0 and 0xffff, got {}",
            field, value
        ),
    })
}

fn parse_global(node: &kdl::KdlNode) -> Result<GlobalConfig, ConfigError> {
    let mut global = GlobalConfig::default();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "log-level" => {
                    let val = require_string(child, "log-level")?;
                    global.log_level = val
                        .parse()
                        .map_err(|e| ConfigError::Invalid { message: e })?;
                }
                "tick-interval-ms" => {
                    let ms = child
                        .entries()
                        .first()
                        .and_then(|e| e.value().as_i64())
                        .filter(|ms| *ms > 0)
                        .ok_or_else(|| ConfigError::Invalid {
                            message: "'tick-interval-ms' expects a positive integer".to_string(),
                        })?;
                    global.tick_interval_ms = ms as u64;
                }
                name => {
                    tracing::warn!("Unknown global config option: {}", name);
                }
            }
        }
    }

    Ok(global)
}

fn parse_input(node: &kdl::KdlNode) -> Result<InputConfig, ConfigError> {
    let mut device = None;
    let mut grab = true;

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "device" => {
                    device = Some(expand_path(require_string(child, "device")?));
                }
                "grab" => {
                    grab = child
                        .entries()
                        .first()
                        .and_then(|e| e.value().as_bool())
                        .ok_or_else(|| ConfigError::Invalid {
                            message: "'grab' expects true or false".to_string(),
                        })?;
                }
                name => {
                    tracing::warn!("Unknown input config option: {}", name);
                }
            }
        }
    }

    let device = device.ok_or_else(|| ConfigError::MissingField {
        field: "input device (e.g., `input { device \"/dev/input/event3\" }`)".to_string(),
    })?;

    Ok(InputConfig { device, grab })
}

fn parse_output(node: &kdl::KdlNode) -> Result<UinputConfig, ConfigError> {
    let mut output = UinputConfig::default();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "name" => output.name = require_string(child, "name")?.to_string(),
                "vendor" => output.vendor = require_u16(child, "vendor")?,
                "product" => output.product = require_u16(child, "product")?,
                "version" => output.version = require_u16(child, "version")?,
                "path" => output.path = expand_path(require_string(child, "path")?),
                "post-init" => {
                    output.post_init = Some(require_string(child, "post-init")?.to_string());
                }
                name => {
                    tracing::warn!("Unknown output config option: {}", name);
                }
            }
        }
    }

    validate_device_name(&output.name)?;

    Ok(output)
}

fn validate_device_name(name: &str) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::Invalid {
            message: "Output device name must not be empty".to_string(),
        });
    }
    if name.len() > MAX_DEVICE_NAME_LEN {
        return Err(ConfigError::Invalid {
            message: format!(
                "Output device name '{}' is {} bytes long; the kernel accepts at most {}",
                name,
                name.len(),
                MAX_DEVICE_NAME_LEN
            ),
        });
    }
    if name.contains('\0') {
        return Err(ConfigError::Invalid {
            message: "Output device name must not contain NUL bytes".to_string(),
        });
    }
    Ok(())
}
