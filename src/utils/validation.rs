use crate::utils::error::{ProbeError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| ProbeError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ProbeError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(ProbeError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// Checks that `text` could be a host name or an IP literal before it is
/// handed to the platform resolver.
pub fn validate_host_text(text: &str) -> std::result::Result<(), String> {
    if text.is_empty() {
        return Err("address is empty".to_string());
    }

    let inner = text
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(text);

    if inner.len() > 253 {
        return Err("address is longer than 253 characters".to_string());
    }

    let host = match inner.split_once('%') {
        Some((host, zone)) => {
            if !host.contains(':') {
                return Err("zone index is only valid on IPv6 addresses".to_string());
            }
            if zone.is_empty()
                || !zone
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            {
                return Err(format!("invalid zone index {:?}", zone));
            }
            host
        }
        None => inner,
    };

    if let Some(bad) = host
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ':')))
    {
        return Err(format!("unexpected character {:?}", bad));
    }

    if host.starts_with('.') || host.contains("..") {
        return Err("empty label".to_string());
    }

    Ok(())
}
