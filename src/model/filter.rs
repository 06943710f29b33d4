//! Declarative resource filtering.
//!
//! The type filter and the pool filter treat an empty set differently on
//! purpose: no selected type shows nothing, while no selected pool means
//! pools do not restrict the list.

use std::collections::BTreeSet;

use uuid::Uuid;

use super::lane::ResourceLane;
use super::resource::ResourceType;

/// Filter over resource lanes. Every update returns a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub search_term: String,
    pub resource_types: BTreeSet<ResourceType>,
    pub show_only_overallocated: bool,
    pub show_only_with_assignments: bool,
    pub pool_ids: BTreeSet<Uuid>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            resource_types: ResourceType::all().iter().copied().collect(),
            show_only_overallocated: false,
            show_only_with_assignments: false,
            pool_ids: BTreeSet::new(),
        }
    }
}

impl FilterState {
    pub fn has_active_filters(&self) -> bool {
        *self != Self::default()
    }

    /// The default state; never a partial reset.
    pub fn cleared(&self) -> Self {
        Self::default()
    }

    pub fn with_search(&self, term: impl Into<String>) -> Self {
        Self {
            search_term: term.into(),
            ..self.clone()
        }
    }

    pub fn with_type_toggled(&self, resource_type: ResourceType) -> Self {
        let mut resource_types = self.resource_types.clone();
        if !resource_types.remove(&resource_type) {
            resource_types.insert(resource_type);
        }
        Self {
            resource_types,
            ..self.clone()
        }
    }

    pub fn with_types(&self, types: impl IntoIterator<Item = ResourceType>) -> Self {
        Self {
            resource_types: types.into_iter().collect(),
            ..self.clone()
        }
    }

    pub fn with_pool_toggled(&self, pool_id: Uuid) -> Self {
        let mut pool_ids = self.pool_ids.clone();
        if !pool_ids.remove(&pool_id) {
            pool_ids.insert(pool_id);
        }
        Self {
            pool_ids,
            ..self.clone()
        }
    }

    pub fn with_only_overallocated(&self, on: bool) -> Self {
        Self {
            show_only_overallocated: on,
            ..self.clone()
        }
    }

    pub fn with_only_assigned(&self, on: bool) -> Self {
        Self {
            show_only_with_assignments: on,
            ..self.clone()
        }
    }

    /// Whether a single lane passes every predicate.
    pub fn matches(&self, lane: &ResourceLane) -> bool {
        self.matches_search(lane)
            && self.resource_types.contains(&lane.resource_type)
            && (!self.show_only_overallocated || lane.has_overallocation())
            && (!self.show_only_with_assignments || lane.has_assignments())
            && (self.pool_ids.is_empty() || !self.pool_ids.is_disjoint(&lane.pool_ids))
    }

    fn matches_search(&self, lane: &ResourceLane) -> bool {
        let term = self.search_term.to_lowercase();
        term.is_empty()
            || lane.resource_code.to_lowercase().contains(&term)
            || lane.resource_name.to_lowercase().contains(&term)
    }
}

/// Counts over the unfiltered lanes, used to annotate filter toggles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub total: usize,
    pub labor: usize,
    pub equipment: usize,
    pub material: usize,
    pub overallocated: usize,
    pub with_assignments: usize,
}

impl FilterStats {
    pub fn count_for(&self, resource_type: ResourceType) -> usize {
        match resource_type {
            ResourceType::Labor => self.labor,
            ResourceType::Equipment => self.equipment,
            ResourceType::Material => self.material,
        }
    }
}

/// Lanes passing `filter`, in input order.
pub fn apply(lanes: &[ResourceLane], filter: &FilterState) -> Vec<ResourceLane> {
    lanes.iter().filter(|lane| filter.matches(lane)).cloned().collect()
}

pub fn stats(lanes: &[ResourceLane]) -> FilterStats {
    lanes.iter().fold(FilterStats::default(), |mut acc, lane| {
        acc.total += 1;
        match lane.resource_type {
            ResourceType::Labor => acc.labor += 1,
            ResourceType::Equipment => acc.equipment += 1,
            ResourceType::Material => acc.material += 1,
        }
        if lane.has_overallocation() {
            acc.overallocated += 1;
        }
        if lane.has_assignments() {
            acc.with_assignments += 1;
        }
        acc
    })
}

/// Every pool id referenced by at least one lane, sorted.
pub fn known_pools(lanes: &[ResourceLane]) -> BTreeSet<Uuid> {
    lanes.iter().flat_map(|l| l.pool_ids.iter().copied()).collect()
}
