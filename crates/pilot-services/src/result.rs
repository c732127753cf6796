//! Service result type

use std::fmt;

use pilot_core::error::ValidationErrors;

/// Outcome of a service call: a value, or the accumulated errors
#[derive(Debug, Clone)]
pub struct ServiceResult<T> {
    result: Option<T>,
    errors: ValidationErrors,
    message: Option<String>,
}

impl<T> ServiceResult<T> {
    pub fn success(result: T) -> Self {
        Self {
            result: Some(result),
            errors: ValidationErrors::new(),
            message: None,
        }
    }

    pub fn failure(errors: ValidationErrors) -> Self {
        Self {
            result: None,
            errors,
            message: None,
        }
    }

    pub fn failure_with_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, message);
        Self::failure(errors)
    }

    pub fn failure_with_base_error(message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add_base(message);
        Self::failure(errors)
    }

    pub fn is_success(&self) -> bool {
        self.result.is_some()
    }

    pub fn is_failure(&self) -> bool {
        self.result.is_none()
    }

    pub fn result(&self) -> Option<&T> {
        self.result.as_ref()
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn full_messages(&self) -> Vec<String> {
        self.errors.full_messages()
    }

    pub fn map<U, F>(self, f: F) -> ServiceResult<U>
    where
        F: FnOnce(T) -> U,
    {
        ServiceResult {
            result: self.result.map(f),
            errors: self.errors,
            message: self.message,
        }
    }

    pub fn and_then<U, F>(self, f: F) -> ServiceResult<U>
    where
        F: FnOnce(T) -> ServiceResult<U>,
    {
        match self.result {
            Some(result) => f(result),
            None => ServiceResult::failure(self.errors),
        }
    }

    pub fn into_result(self) -> Result<T, ValidationErrors> {
        self.result.ok_or(self.errors)
    }
}

impl<T> From<Result<T, ValidationErrors>> for ServiceResult<T> {
    fn from(result: Result<T, ValidationErrors>) -> Self {
        match result {
            Ok(value) => ServiceResult::success(value),
            Err(errors) => ServiceResult::failure(errors),
        }
    }
}

impl<T> From<ServiceResult<T>> for Result<T, ValidationErrors> {
    fn from(result: ServiceResult<T>) -> Self {
        result.into_result()
    }
}

impl<T: fmt::Display> fmt::Display for ServiceResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.result {
            Some(ref result) => write!(f, "Success: {}", result),
            None => write!(f, "Failure: {}", self.errors.full_messages().join(", ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_result() {
        let result = ServiceResult::success(42);
        assert!(result.is_success());
        assert_eq!(result.result(), Some(&42));
        assert_eq!(result.to_string(), "Success: 42");
    }

    #[test]
    fn test_failure_result() {
        let result: ServiceResult<i32> = ServiceResult::failure_with_error("name", "can't be blank");
        assert!(result.is_failure());
        assert!(result.errors().has_error("name"));
        assert_eq!(result.to_string(), "Failure: name can't be blank");
    }

    #[test]
    fn test_map_and_then() {
        let mapped = ServiceResult::success(21).map(|n| n * 2);
        assert_eq!(mapped.result(), Some(&42));

        let chained: ServiceResult<String> = ServiceResult::<i32>::failure_with_base_error("nope")
            .and_then(|n| ServiceResult::success(n.to_string()));
        assert_eq!(chained.full_messages(), vec!["nope".to_string()]);
    }

    #[test]
    fn test_into_result() {
        assert_eq!(ServiceResult::success(1).into_result(), Ok(1));
        assert!(ServiceResult::<i32>::failure_with_base_error("nope")
            .into_result()
            .is_err());
    }
}
