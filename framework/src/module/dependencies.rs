use super::Module;

/// The modules another module depends on, keyed by id in insertion order.
pub struct ModuleSet<T: Clone + Send + Sync> {
    modules: Vec<Module<T>>,
}

impl<T: Clone + Send + Sync + 'static> ModuleSet<T> {
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Returns false (and drops `module`) when one with the same id is present.
    pub fn add(&mut self, module: Module<T>) -> bool {
        if self.get(module.id()).is_some() {
            return false;
        }

        self.modules.push(module);
        true
    }

    pub fn get(&self, id: &str) -> Option<&Module<T>> {
        self.modules.iter().find(|module| module.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Module<T>> {
        self.modules.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Module<T>> {
        self.modules.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl<T: Clone + Send + Sync + 'static> Default for ModuleSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{module::builder::ModuleBuilder, test_utils::Services};

    #[test]
    fn ids_are_unique() {
        let mut set = ModuleSet::<Services>::new();

        assert!(set.add(ModuleBuilder::new("core").build()));
        assert!(set.add(ModuleBuilder::new("stats").build()));
        assert!(!set.add(ModuleBuilder::new("core").name("Other").build()));

        let ids: Vec<&str> = set.iter().map(Module::id).collect();
        assert_eq!(ids, vec!["core", "stats"]);
        assert_eq!(set.get("core").map(Module::name), Some("core"));
    }
}
