use crate::utils::error::{OrganizerError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(OrganizerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(OrganizerError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(OrganizerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| OrganizerError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(OrganizerError::InvalidConfigValueError {
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
        return Err(OrganizerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// 表單輸入檢查（名稱、標題、網址），錯誤統一回報為 ValidationError
pub fn validate_user_text(field_name: &str, value: &str) -> Result<()> {
    validate_non_empty_string(field_name, value)
        .map_err(|_| OrganizerError::validation(format!("{} cannot be blank", field_name)))
}

pub fn validate_site_url(value: &str) -> Result<()> {
    validate_url("url", value.trim())
        .map_err(|e| match e {
            OrganizerError::InvalidConfigValueError { reason, .. } => {
                OrganizerError::validation(format!("url is not valid: {}", reason))
            }
            other => other,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("base_url", "https://example.com").is_ok());
        assert!(validate_url("base_url", "http://127.0.0.1:8000").is_ok());
        assert!(validate_url("base_url", "").is_err());
        assert!(validate_url("base_url", "invalid-url").is_err());
        assert!(validate_url("base_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("timeout_seconds", 30u64, 1, 600).is_ok());
        assert!(validate_range("timeout_seconds", 0u64, 1, 600).is_err());
    }

    #[test]
    fn test_validate_user_text() {
        assert!(validate_user_text("name", "Work").is_ok());
        let err = validate_user_text("name", "   ").unwrap_err();
        assert!(matches!(err, OrganizerError::ValidationError { .. }));
    }

    #[test]
    fn test_validate_site_url() {
        assert!(validate_site_url("https://docs.rs").is_ok());
        let err = validate_site_url("docs.rs").unwrap_err();
        assert!(matches!(err, OrganizerError::ValidationError { .. }));
    }

    #[test]
    fn test_validate_required_field() {
        let present = Some(3u64);
        let missing: Option<u64> = None;
        assert_eq!(*validate_required_field("timeout", &present).unwrap(), 3);
        assert!(validate_required_field("timeout", &missing).is_err());
    }
}
