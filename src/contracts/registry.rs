//! Contract Registry - ordered, immutable mapping from dotted path to descriptor.

use std::sync::Arc;
use tracing::warn;

use super::descriptor::{OperationDescriptor, OperationKey};
use crate::core::error::{Error, Result};

/// Operations of one top-level group, in declaration order.
#[derive(Debug, Clone)]
pub struct ContractGroup {
    name: &'static str,
    operations: Vec<(&'static str, Arc<OperationDescriptor>)>,
}

impl ContractGroup {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            operations: Vec::new(),
        }
    }

    pub fn operation(mut self, name: &'static str, descriptor: OperationDescriptor) -> Self {
        self.operations.push((name, Arc::new(descriptor)));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// The single contract description driving both invocation surfaces.
#[derive(Debug, Clone, Default)]
pub struct ContractRegistry {
    groups: Vec<ContractGroup>,
}

impl ContractRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(mut self, group: ContractGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// Every operation, groups then operations in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (OperationKey, &Arc<OperationDescriptor>)> {
        self.groups.iter().flat_map(|group| {
            group
                .operations
                .iter()
                .map(move |(op, descriptor)| (OperationKey::new(group.name, *op), descriptor))
        })
    }

    pub fn get(&self, key: &OperationKey) -> Option<&Arc<OperationDescriptor>> {
        self.groups
            .iter()
            .filter(|g| g.name == key.group)
            .flat_map(|g| g.operations.iter())
            .find(|(op, _)| *op == key.operation)
            .map(|(_, descriptor)| descriptor)
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.operations.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Startup check. Duplicate keys are fatal; parameter collisions only warn.
    pub fn validate(&self) -> Result<()> {
        let mut seen: Vec<OperationKey> = Vec::new();
        for (key, descriptor) in self.iter() {
            if seen.contains(&key) {
                return Err(Error::config(format!("Duplicate operation in contract: {key}")));
            }
            seen.push(key);

            let collisions = descriptor.parameter_collisions();
            if !collisions.is_empty() {
                warn!(
                    "Operation {} declares {:?} in more than one parameter location; \
                     flat tool arguments will route to the first match",
                    key, collisions
                );
            }
        }
        Ok(())
    }
}
