//! Per-entity search configuration.
//!
//! An [`EntitySearchConfiguration`] accumulates which members of an entity type are
//! searchable and how each one is matched. It is created by the registry and
//! mutated by host code during startup.

use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use search_config_shared::{MatchMode, Member, SearchField, Searchable, DEFAULT_FIELD_WEIGHT};
use tracing::{debug, trace};

use crate::errors::SearchConfigError;
use crate::registry::RegistrySettings;
use crate::types::EntitySnapshot;

/// Options for a single field declaration.
///
/// Unset options resolve to registry defaults when the effective fields are read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldOptions {
    pub match_mode: Option<MatchMode>,
    pub weight: Option<u16>,
}

impl FieldOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the match mode.
    pub fn match_mode(mut self, match_mode: MatchMode) -> Self {
        self.match_mode = Some(match_mode);
        self
    }

    /// Set the weight. Must be at least 1.
    pub fn weight(mut self, weight: u16) -> Self {
        self.weight = Some(weight);
        self
    }
}

impl From<MatchMode> for FieldOptions {
    fn from(match_mode: MatchMode) -> Self {
        Self::new().match_mode(match_mode)
    }
}

#[derive(Debug, Clone, Copy)]
struct Declaration {
    member: &'static Member,
    options: FieldOptions,
}

/// Searchable field configuration for entity type `T`.
///
/// Declarations are validated against `T`'s member table when they are made, so an
/// unknown or unmatchable member fails at startup rather than at query time.
/// Declaring the same member again replaces its options and keeps its position.
///
/// If no member is ever declared, [`searchable_fields`](Self::searchable_fields)
/// falls back to the registry's default field names that exist on `T` and are
/// matchable.
///
/// The registry's defaults and sealed state keep applying to a configuration that
/// outlives every handle to its registry.
pub struct EntitySearchConfiguration<T: Searchable> {
    settings: Arc<RegistrySettings>,
    declarations: RwLock<Vec<Declaration>>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Searchable> EntitySearchConfiguration<T> {
    pub(crate) fn new(settings: Arc<RegistrySettings>) -> Self {
        Self {
            settings,
            declarations: RwLock::new(Vec::new()),
            _entity: PhantomData,
        }
    }

    /// Declare a searchable member using the default match mode and weight.
    pub fn declare(&self, member: &str) -> Result<&Self, SearchConfigError> {
        self.declare_options(member, FieldOptions::new())
    }

    /// Declare a searchable member with an explicit match mode.
    pub fn declare_with(
        &self,
        member: &str,
        match_mode: MatchMode,
    ) -> Result<&Self, SearchConfigError> {
        self.declare_options(member, FieldOptions::from(match_mode))
    }

    /// Declare several members with the default match mode, in order.
    ///
    /// Stops at the first invalid member; members before it stay declared.
    pub fn declare_all<I, S>(&self, members: I) -> Result<&Self, SearchConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for member in members {
            self.declare(member.as_ref())?;
        }
        Ok(self)
    }

    /// Declare a searchable member with full options.
    ///
    /// # Returns
    ///
    /// * `Ok(&Self)` - For chaining further declarations
    /// * `Err(SearchConfigError::UnknownMember)` - If `T` has no such member
    /// * `Err(SearchConfigError::UnmatchableMember)` - If the member's kind cannot be searched
    /// * `Err(SearchConfigError::InvalidWeight)` - If the weight is zero
    /// * `Err(SearchConfigError::Sealed)` - If the registry has been sealed
    pub fn declare_options(
        &self,
        member: &str,
        options: FieldOptions,
    ) -> Result<&Self, SearchConfigError> {
        let entity = T::entity_name();
        let member = T::member(member)
            .ok_or_else(|| SearchConfigError::unknown_member(entity, member.trim()))?;

        if !member.kind.is_matchable() {
            return Err(SearchConfigError::unmatchable_member(
                entity,
                member.name,
                member.kind,
            ));
        }
        if options.weight == Some(0) {
            return Err(SearchConfigError::invalid_weight(entity, member.name));
        }

        let sealed = self.settings.read_sealed();
        if *sealed {
            return Err(SearchConfigError::sealed(entity));
        }
        let mut declarations = self.write_declarations();

        match declarations.iter_mut().find(|d| d.member.name == member.name) {
            Some(existing) => existing.options = options,
            None => declarations.push(Declaration { member, options }),
        }

        debug!(
            entity,
            member = member.name,
            match_mode = ?options.match_mode,
            weight = ?options.weight,
            "Declared searchable field"
        );

        Ok(self)
    }

    /// The effective ordered list of searchable fields.
    ///
    /// Returns the explicit declarations if there are any. Otherwise returns the
    /// registry's default field names that exist on `T` and are matchable, in
    /// default order.
    pub fn searchable_fields(&self) -> Vec<SearchField> {
        let defaults = &self.settings.defaults;
        let default_mode = defaults.match_mode;

        let declarations = self.read_declarations();
        if !declarations.is_empty() {
            return declarations
                .iter()
                .map(|d| SearchField {
                    name: d.member.name,
                    kind: d.member.kind,
                    match_mode: d.options.match_mode.unwrap_or(default_mode),
                    weight: d.options.weight.unwrap_or(DEFAULT_FIELD_WEIGHT),
                    explicit: true,
                })
                .collect();
        }
        drop(declarations);

        let fields = default_fields::<T>(&defaults.field_names, default_mode);

        trace!(
            entity = T::entity_name(),
            fields = fields.len(),
            "Using default search fields"
        );

        fields
    }

    /// Returns true if at least one member has been declared.
    pub fn is_explicit(&self) -> bool {
        !self.read_declarations().is_empty()
    }

    /// Number of explicitly declared members.
    pub fn declared_len(&self) -> usize {
        self.read_declarations().len()
    }

    pub fn entity_name(&self) -> &'static str {
        T::entity_name()
    }

    /// Serializable view of the effective configuration.
    pub fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot {
            entity: T::entity_name(),
            explicit: self.is_explicit(),
            fields: self.searchable_fields(),
        }
    }

    fn read_declarations(&self) -> RwLockReadGuard<'_, Vec<Declaration>> {
        self.declarations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_declarations(&self) -> RwLockWriteGuard<'_, Vec<Declaration>> {
        self.declarations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Resolve fallback names against `T`'s members, skipping absent, unmatchable and
/// repeated ones.
fn default_fields<T: Searchable>(names: &[String], match_mode: MatchMode) -> Vec<SearchField> {
    let mut fields: Vec<SearchField> = Vec::with_capacity(names.len());
    let members = names
        .iter()
        .filter_map(|name| T::member(name))
        .filter(|member| member.kind.is_matchable());
    for member in members {
        if fields.iter().any(|f| f.name == member.name) {
            continue;
        }
        fields.push(SearchField {
            name: member.name,
            kind: member.kind,
            match_mode,
            weight: DEFAULT_FIELD_WEIGHT,
            explicit: false,
        });
    }
    fields
}

impl<T: Searchable> fmt::Debug for EntitySearchConfiguration<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let declarations: Vec<_> = self
            .read_declarations()
            .iter()
            .map(|d| (d.member.name, d.options))
            .collect();

        f.debug_struct("EntitySearchConfiguration")
            .field("entity", &T::entity_name())
            .field("declarations", &declarations)
            .finish()
    }
}

impl<T: Searchable> From<&Arc<EntitySearchConfiguration<T>>> for EntitySnapshot {
    fn from(configuration: &Arc<EntitySearchConfiguration<T>>) -> Self {
        configuration.snapshot()
    }
}
