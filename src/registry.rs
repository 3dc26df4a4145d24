use crate::command::{CommandFactory, ExecutableCommand};

/// Ordered collection of [`CommandFactory`] objects.
///
/// The registry is built once before the read-eval loop starts and is never
/// mutated afterwards. Factories are probed in registration order, so a
/// built-in always shadows an external program of the same name as long as it
/// is registered ahead of the launcher factory. Built-in names are unique;
/// lookup is a case-sensitive exact match.
pub struct Registry {
    factories: Vec<Box<dyn CommandFactory>>,
}

impl Registry {
    /// Create a registry from an ordered list of factories.
    pub fn new(factories: Vec<Box<dyn CommandFactory>>) -> Self {
        Self { factories }
    }

    /// Resolve a command name to an executable command.
    ///
    /// The first factory that recognizes `name` wins. Returns `None` when no
    /// factory does, i.e. the name is neither a built-in nor a program
    /// reachable through `PATH`.
    pub fn resolve(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        self.factories
            .iter()
            .find_map(|factory| factory.try_create(name, args))
    }

    /// Names of the registered built-ins, in registration order.
    pub fn builtin_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories
            .iter()
            .filter_map(|factory| factory.builtin_name())
    }
}
