//! Naming rules for types, type parameters and functions.

use crate::error::{TypeError, TypeSystemErrorCode};

/// Prefix of the pseudo-types the compiler registers for function
/// declarations, keyed `Decl__name/arity`. The function name after the
/// prefix may be lowercase or an operator, so only whitespace is rejected.
pub const DECLARATION_PREFIX: &str = "Decl__";

fn validate_rest(name: &str) -> Result<(), TypeError> {
    if name
        .chars()
        .skip(1)
        .all(|c| c.is_alphanumeric() || c == '_')
    {
        Ok(())
    } else {
        Err(TypeSystemErrorCode::InvalidName.new().with("name", name))
    }
}

/// Type names start with an uppercase letter followed by letters, digits or
/// underscores.
pub fn validate_type_name(name: &str) -> Result<(), TypeError> {
    if let Some(declared) = name.strip_prefix(DECLARATION_PREFIX) {
        if declared.is_empty() || declared.chars().any(char::is_whitespace) {
            return Err(TypeSystemErrorCode::InvalidName.new().with("name", name));
        }
        return Ok(());
    }
    let Some(first) = name.chars().next() else {
        return Err(TypeSystemErrorCode::InvalidName.new().with("name", name));
    };
    if !first.is_uppercase() {
        return Err(TypeSystemErrorCode::TypeNameShouldStartWithUpperCase
            .new()
            .with("name", name));
    }
    validate_rest(name)
}

/// Type parameter names start with a lowercase letter.
pub fn validate_type_param_name(name: &str) -> Result<(), TypeError> {
    let Some(first) = name.chars().next() else {
        return Err(TypeSystemErrorCode::InvalidName.new().with("name", name));
    };
    if !first.is_lowercase() {
        return Err(TypeSystemErrorCode::TypeParamNameShouldStartWithLowerCase
            .new()
            .with("name", name));
    }
    validate_rest(name)
}

/// Function names may use operator characters but never whitespace.
pub fn validate_function_name(name: &str) -> Result<(), TypeError> {
    if name.chars().any(char::is_whitespace) {
        return Err(TypeSystemErrorCode::FunctionNameShouldntHaveSpaces
            .new()
            .with("name", name));
    }
    Ok(())
}
