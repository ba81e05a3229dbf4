//! Backend resolution by name.
//!
//! Back-ends are constructed through registered factories rather than
//! reflection: the registry is populated at startup with the built-in
//! back-ends and extended by explicit registration. Unknown selectors are a
//! configuration error.

use crate::report::Reporter;
use crate::verify::VerifyError;
use std::collections::HashMap;
use std::sync::Arc;
use vero_backend::{Backend, BackendError};

/// Builds a back-end for one job. The factory receives the job's argument
/// list and reporter handle and may reject bad arguments.
pub type BackendFactory =
    Box<dyn Fn(&[String], Arc<dyn Reporter>) -> Result<Box<dyn Backend>, BackendError> + Send + Sync>;

#[derive(Default)]
pub struct BackendRegistry {
    factories: HashMap<String, BackendFactory>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, factory: BackendFactory) {
        self.factories.insert(name.into(), factory);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn resolve(
        &self,
        name: &str,
        args: &[String],
        reporter: Arc<dyn Reporter>,
    ) -> Result<Box<dyn Backend>, VerifyError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| VerifyError::UnknownBackend(name.to_string()))?;
        Ok(factory(args, reporter)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::CollectingReporter;
    use vero_ast::Program;
    use vero_backend::VerificationResult;

    struct NopBackend;

    impl Backend for NopBackend {
        fn id(&self) -> &str {
            "nop"
        }

        fn verify(&mut self, _program: &Program) -> Result<VerificationResult, BackendError> {
            Ok(VerificationResult::Success)
        }
    }

    #[test]
    fn resolves_registered_backends() {
        let mut registry = BackendRegistry::new();
        registry.register("nop", Box::new(|_args, _reporter| Ok(Box::new(NopBackend))));

        let reporter = CollectingReporter::new();
        let backend = registry
            .resolve("nop", &[], reporter.clone())
            .expect("registered");
        assert_eq!(backend.id(), "nop");

        let missing = registry.resolve("missing", &[], reporter);
        assert!(matches!(missing, Err(VerifyError::UnknownBackend(name)) if name == "missing"));
    }

    #[test]
    fn factories_may_reject_arguments() {
        let mut registry = BackendRegistry::new();
        registry.register(
            "picky",
            Box::new(|args, _reporter| {
                if args.is_empty() {
                    Err(BackendError::InvalidArguments("expected a flag".into()))
                } else {
                    Ok(Box::new(NopBackend) as Box<dyn Backend>)
                }
            }),
        );

        let reporter = CollectingReporter::new();
        let rejected = registry.resolve("picky", &[], reporter);
        assert!(matches!(rejected, Err(VerifyError::Backend(_))));
    }
}
