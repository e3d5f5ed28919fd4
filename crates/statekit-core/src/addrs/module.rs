//! Module instance paths

use std::fmt;
use std::str::FromStr;

use super::InstanceKey;
use crate::{Error, Result};

/// One `module.<name>[key]` step of a module instance path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleInstanceStep {
    pub name: String,
    pub key: InstanceKey,
}

/// Path of a module instance; the root module is the empty path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleInstance {
    steps: Vec<ModuleInstanceStep>,
}

impl ModuleInstance {
    /// The root module instance.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[ModuleInstanceStep] {
        &self.steps
    }

    /// Path of the child module instance `name[key]` beneath this one.
    pub fn child(&self, name: impl Into<String>, key: InstanceKey) -> Self {
        let mut steps = self.steps.clone();
        steps.push(ModuleInstanceStep {
            name: name.into(),
            key,
        });
        Self { steps }
    }

    /// Whether `prefix` is this path or one of its ancestors.
    pub fn has_prefix(&self, prefix: &Self) -> bool {
        self.steps.starts_with(&prefix.steps)
    }

    /// Replace the leading `from` portion of this path with `to`.
    ///
    /// Returns `None` when this path does not start with `from`.
    pub fn rebase(&self, from: &Self, to: &Self) -> Option<Self> {
        let rest = self.steps.strip_prefix(from.steps.as_slice())?;
        let mut steps = to.steps.clone();
        steps.extend_from_slice(rest);
        Some(Self { steps })
    }
}

impl FromIterator<ModuleInstanceStep> for ModuleInstance {
    fn from_iter<I: IntoIterator<Item = ModuleInstanceStep>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for ModuleInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "module.{}{}", step.name, step.key)?;
        }
        Ok(())
    }
}

/// Parses a module address such as `module.foo.module.bar[0]`.
///
/// The empty string is accepted as the root module.
impl FromStr for ModuleInstance {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(Self::root());
        }
        match super::Target::parse(s)? {
            super::Target::Module(module) => Ok(module),
            _ => Err(Error::malformed(s, s, "expected a module address")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(names: &[&str]) -> ModuleInstance {
        names
            .iter()
            .map(|name| ModuleInstanceStep {
                name: name.to_string(),
                key: InstanceKey::NoKey,
            })
            .collect()
    }

    #[test]
    fn root_renders_empty() {
        assert_eq!(ModuleInstance::root().to_string(), "");
        assert!(ModuleInstance::root().is_root());
    }

    #[test]
    fn nested_path_renders_each_step() {
        let module = ModuleInstance::root()
            .child("foo", InstanceKey::Int(1))
            .child("child1", InstanceKey::NoKey);
        assert_eq!(module.to_string(), "module.foo[1].module.child1");
    }

    #[test]
    fn has_prefix_matches_whole_steps() {
        let child = path(&["foo", "child1"]);
        assert!(child.has_prefix(&path(&["foo"])));
        assert!(child.has_prefix(&ModuleInstance::root()));
        assert!(!child.has_prefix(&path(&["fo"])));
        assert!(!path(&["foo"]).has_prefix(&child));
    }

    #[test]
    fn rebase_keeps_remainder() {
        let child = path(&["foo", "child1"]);
        let moved = child.rebase(&path(&["foo"]), &path(&["bar"])).unwrap();
        assert_eq!(moved, path(&["bar", "child1"]));
        assert!(child.rebase(&path(&["baz"]), &path(&["bar"])).is_none());
    }

    #[test]
    fn root_sorts_before_children() {
        let mut modules = vec![path(&["b"]), path(&["a", "z"]), ModuleInstance::root(), path(&["a"])];
        modules.sort();
        assert_eq!(
            modules,
            vec![ModuleInstance::root(), path(&["a"]), path(&["a", "z"]), path(&["b"])]
        );
    }
}
