use std::collections::HashMap;

use crate::error::RuntimeError;

/// Nested variable scopes; the last entry is the innermost open scope.
#[derive(Debug, Default)]
pub struct ScopeStack {
    scopes: Vec<HashMap<String, String>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            scopes: Vec::with_capacity(8),
        }
    }

    pub fn enter(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Closes the innermost scope. An exit without a matching enter means
    /// the generated program is broken and is reported as `ScopeUnderflow`.
    pub fn exit(&mut self) -> Result<(), RuntimeError> {
        self.scopes
            .pop()
            .map(|_| ())
            .ok_or(RuntimeError::ScopeUnderflow)
    }

    /// Writes into the innermost scope only.
    pub fn set_variable(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), RuntimeError> {
        let top = self.scopes.last_mut().ok_or(RuntimeError::NoScope)?;
        top.insert(name.into(), value.into());
        Ok(())
    }

    pub fn top(&self) -> Option<&HashMap<String, String>> {
        self.scopes.last()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.top()?.get(name).map(String::as_str)
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scopes_are_isolated() {
        let mut scopes = ScopeStack::new();
        scopes.enter();
        scopes.set_variable("outer", "1").unwrap();
        scopes.enter();
        assert_eq!(scopes.get("outer"), None);
        scopes.set_variable("inner", "2").unwrap();
        scopes.exit().unwrap();
        assert_eq!(scopes.get("outer"), Some("1"));
        assert_eq!(scopes.get("inner"), None);
        assert_eq!(scopes.depth(), 1);
    }

    #[test]
    fn unbalanced_exit_is_an_error() {
        let mut scopes = ScopeStack::new();
        assert!(matches!(scopes.exit(), Err(RuntimeError::ScopeUnderflow)));
        assert!(matches!(
            scopes.set_variable("k", "v"),
            Err(RuntimeError::NoScope)
        ));
    }
}
