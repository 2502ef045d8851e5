/// A best-effort value together with every error collected while building
/// it.
///
/// Builders that report all problems at once return this instead of a
/// `Result`; callers decide whether any error is fatal.
#[derive(Debug, Clone)]
pub struct PartialResult<T, E> {
    pub value: T,
    pub errors: Vec<E>,
}

impl<T, E> PartialResult<T, E> {
    pub fn new(value: T, errors: Vec<E>) -> Self {
        Self { value, errors }
    }

    pub fn complete(value: T) -> Self {
        Self {
            value,
            errors: Vec::new(),
        }
    }

    /// True when at least one error was collected.
    pub fn is_partial(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> PartialResult<U, E> {
        PartialResult {
            value: f(self.value),
            errors: self.errors,
        }
    }

    /// Convert into a `Result`, failing with all collected errors if any.
    pub fn into_result(self) -> Result<T, Vec<E>> {
        if self.errors.is_empty() {
            Ok(self.value)
        } else {
            Err(self.errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_is_not_partial() {
        let result: PartialResult<u32, String> = PartialResult::complete(3);
        assert!(!result.is_partial());
        assert_eq!(result.into_result(), Ok(3));
    }

    #[test]
    fn errors_make_result_partial() {
        let result = PartialResult::new(3, vec!["boom".to_string()]);
        assert!(result.is_partial());
        let mapped = result.map(|v| v * 2);
        assert_eq!(mapped.value, 6);
        assert_eq!(mapped.into_result(), Err(vec!["boom".to_string()]));
    }
}
