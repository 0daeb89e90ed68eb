use crate::utils::error::{DashboardError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(DashboardError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(DashboardError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_directory(field_name: &str, path: &str) -> Result<()> {
    validate_path(field_name, path)?;
    if !std::path::Path::new(path).is_dir() {
        return Err(DashboardError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Directory does not exist".to_string(),
        });
    }
    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(DashboardError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

/// Extract prefixes become part of file names, so no separators.
pub fn validate_file_stem(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DashboardError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    if value.contains(['/', '\\']) {
        return Err(DashboardError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot contain path separators".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("data_dir", "data/output").is_ok());
        assert!(validate_path("data_dir", "").is_err());
        assert!(validate_path("data_dir", "bad\0path").is_err());
    }

    #[test]
    fn test_validate_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(validate_directory("data_dir", dir.path().to_str().unwrap()).is_ok());
        assert!(validate_directory("data_dir", "/definitely/not/here").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("rows", 10, 1).is_ok());
        assert!(validate_positive_number("rows", 0, 1).is_err());
    }

    #[test]
    fn test_validate_file_stem() {
        assert!(validate_file_stem("prefix", "snip_2025Q4").is_ok());
        assert!(validate_file_stem("prefix", "  ").is_err());
        assert!(validate_file_stem("prefix", "../snip").is_err());
    }
}
