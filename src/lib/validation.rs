//! Input validation utilities
//!
//! Common checks for command-line parameters and file paths, reported through the structured
//! error types in [`crate::errors`].

use crate::errors::{FgvarError, Result};
use std::fmt::Display;
use std::path::Path;

/// Validate that a file exists
///
/// # Arguments
/// * `path` - Path to validate
/// * `description` - Human-readable description of the file (e.g., "Candidate TSV", "Reference")
///
/// # Errors
/// Returns an error if the file does not exist
///
/// # Example
/// ```
/// use fgvar_lib::validation::validate_file_exists;
///
/// let result = validate_file_exists("/nonexistent/candidates.tsv", "Candidate TSV");
/// assert!(result.is_err());
/// ```
pub fn validate_file_exists<P: AsRef<Path>>(path: P, description: &str) -> Result<()> {
    let path_ref = path.as_ref();
    if !path_ref.exists() {
        return Err(FgvarError::InvalidFileFormat {
            file_type: description.to_string(),
            path: path_ref.display().to_string(),
            reason: "File does not exist".to_string(),
        });
    }
    Ok(())
}

/// Validate that multiple files exist
///
/// # Errors
/// Returns an error for the first file that doesn't exist
pub fn validate_files_exist<P: AsRef<Path>>(files: &[(P, &str)]) -> Result<()> {
    for (path, desc) in files {
        validate_file_exists(path, desc)?;
    }
    Ok(())
}

/// Validate that the directory an output file will be written into exists
///
/// # Errors
/// Returns an error if the parent directory is missing
pub fn validate_output_dir<P: AsRef<Path>>(path: P, description: &str) -> Result<()> {
    let path_ref = path.as_ref();
    match path_ref.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
            Err(FgvarError::InvalidFileFormat {
                file_type: description.to_string(),
                path: path_ref.display().to_string(),
                reason: format!("Directory {} does not exist", parent.display()),
            })
        }
        _ => Ok(()),
    }
}

/// Validate that a value is positive (> 0)
///
/// # Errors
/// Returns an error if the value is zero or negative
///
/// # Example
/// ```
/// use fgvar_lib::validation::validate_positive;
///
/// assert!(validate_positive(100_000u32, "region-size").is_ok());
/// assert!(validate_positive(0u32, "region-size").is_err());
/// ```
pub fn validate_positive<T: Ord + Display + Default>(value: T, name: &str) -> Result<()> {
    if value <= T::default() {
        return Err(FgvarError::InvalidParameter {
            parameter: name.to_string(),
            reason: format!("Must be positive (> 0), got: {value}"),
        });
    }
    Ok(())
}
