//! Value parsers for CLI arguments that clap cannot check on its own.

use std::fs;
use std::net::Ipv4Addr;
use std::path::PathBuf;

/// Port in 1..=65535
pub fn validate_port(value: &str) -> Result<u16, String> {
    let port: u16 = value
        .parse()
        .map_err(|_| format!("Port must be a number between 1 and 65535, got: '{value}'"))?;

    if port == 0 {
        return Err("Port must be between 1 and 65535. Port 0 is not allowed.".to_string());
    }

    Ok(port)
}

/// Existing, readable regular file
pub fn validate_config_file_path(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);

    if !path.exists() {
        return Err(format!("Configuration file does not exist: '{value}'"));
    }
    if !path.is_file() {
        return Err(format!("Configuration path is not a file: '{value}'"));
    }

    fs::File::open(&path)
        .map(|_| path)
        .map_err(|e| format!("Cannot read configuration file '{value}': {e}"))
}

/// Rollback step count, capped at 100
pub fn validate_rollback_steps(value: &str) -> Result<u32, String> {
    let steps: u32 = value
        .parse()
        .map_err(|_| format!("Rollback steps must be a positive number, got: '{value}'"))?;

    match steps {
        0 => Err("Rollback steps must be greater than 0".to_string()),
        101.. => Err("Rollback steps cannot exceed 100".to_string()),
        _ => Ok(steps),
    }
}

/// Hostname or dotted IPv4 address
pub fn validate_host_address(value: &str) -> Result<String, String> {
    let host = value.trim();

    if host.is_empty() {
        return Err("Host address cannot be empty".to_string());
    }
    if host.contains(char::is_whitespace) {
        return Err("Host address cannot contain spaces".to_string());
    }
    if host.len() > 253 {
        return Err("Host address is too long (maximum 253 characters)".to_string());
    }

    // all digits and dots must be a real IPv4 address
    if host.chars().all(|c| c.is_ascii_digit() || c == '.') && host.parse::<Ipv4Addr>().is_err() {
        return Err(format!("Invalid IPv4 address format: '{value}'"));
    }

    Ok(host.to_string())
}

/// Absolute http(s) URL of a running crewmatch server, without trailing slash
pub fn validate_base_url(value: &str) -> Result<String, String> {
    let url = value.trim().trim_end_matches('/');

    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
        .ok_or_else(|| format!("Base URL must start with http:// or https://, got: '{value}'"))?;

    if rest.is_empty() || rest.contains(char::is_whitespace) {
        return Err(format!("Base URL has no valid host: '{value}'"));
    }

    Ok(url.to_string())
}
