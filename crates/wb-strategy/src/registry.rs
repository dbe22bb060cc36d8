//! Bidder Registry: catalogue of named bidding strategies.
//!
//! Each entry is registered once from a [`BidderDescriptor`] (plain data plus
//! a function reference). At most one entry is the default; lookups for an
//! absent name, the reserved alias `"default"`, or a name that is not
//! registered all land on it.
//!
//! The registry is built with `&mut` access during startup and then shared
//! read-only (typically behind an `Arc`). There is no deregistration.
//!
//! ```ignore
//! let mut reg = BidderRegistry::new();
//! reg.register(net_power::descriptor())?;
//! let found = reg.lookup(Some("unknown"))?; // falls back to the default
//! assert!(found.fallback);
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use wb_db::DatasetRequest;
use wb_schemas::{ArgValue, OrderFrame};

use crate::{Bidder, BidInput, StrategyError};

/// Name that always means "the default bidder". Cannot be registered.
pub const DEFAULT_ALIAS: &str = "default";

/// The strategy function a bidder wraps.
pub type StrategyFn = Arc<dyn Fn(&BidInput) -> Result<OrderFrame, StrategyError> + Send + Sync>;

/// Registration record for one bidder.
#[derive(Clone)]
pub struct BidderDescriptor {
    pub name: String,
    pub description: String,
    pub static_args: BTreeMap<String, ArgValue>,
    /// Declared datasets in declaration order.
    pub data_requirements: Vec<DatasetRequest>,
    pub is_default: bool,
    pub strategy: StrategyFn,
}

impl BidderDescriptor {
    pub fn new<F>(name: impl Into<String>, strategy: F) -> Self
    where
        F: Fn(&BidInput) -> Result<OrderFrame, StrategyError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: String::new(),
            static_args: BTreeMap::new(),
            data_requirements: Vec::new(),
            is_default: false,
            strategy: Arc::new(strategy),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn arg(mut self, name: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.static_args.insert(name.into(), value.into());
        self
    }

    /// Declare a dataset. Re-declaring a name replaces its template in place.
    pub fn data(mut self, name: impl Into<String>, template: impl Into<String>) -> Self {
        let req = DatasetRequest::new(name, template);
        match self.data_requirements.iter_mut().find(|r| r.name == req.name) {
            Some(existing) => *existing = req,
            None => self.data_requirements.push(req),
        }
        self
    }

    pub fn default_bidder(mut self) -> Self {
        self.is_default = true;
        self
    }
}

impl std::fmt::Debug for BidderDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BidderDescriptor")
            .field("name", &self.name)
            .field("static_args", &self.static_args)
            .field("data_requirements", &self.data_requirements)
            .field("is_default", &self.is_default)
            .finish_non_exhaustive()
    }
}

/// Errors returned by [`BidderRegistry`] operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// A second registration asked to be the default.
    DuplicateDefault { existing: String, attempted: String },
    /// Nothing matched and no default is registered.
    NoDefaultBidder { requested: Option<String> },
    DuplicateName { name: String },
    EmptyName,
    /// The name collides with [`DEFAULT_ALIAS`].
    ReservedName { name: String },
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateDefault { existing, attempted } => write!(
                f,
                "bidder '{attempted}' cannot be the default: '{existing}' already is"
            ),
            Self::NoDefaultBidder { requested: Some(name) } => {
                write!(f, "no bidder named '{name}' and no default bidder registered")
            }
            Self::NoDefaultBidder { requested: None } => {
                write!(f, "no default bidder registered")
            }
            Self::DuplicateName { name } => write!(f, "bidder '{name}' is already registered"),
            Self::EmptyName => write!(f, "bidder name must not be empty"),
            Self::ReservedName { name } => write!(f, "bidder name '{name}' is reserved"),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Result of a lookup: the bidder that will run, and whether it was reached by
/// falling back from a name that is not registered.
#[derive(Clone, Copy, Debug)]
pub struct Lookup<'a> {
    pub bidder: &'a Bidder,
    pub fallback: bool,
}

/// Maintains insertion order for deterministic `list()` output.
/// Names are compared case-sensitively.
#[derive(Default)]
pub struct BidderRegistry {
    entries: Vec<Bidder>,
    default_idx: Option<usize>,
}

impl BidderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// - [`RegistryError::EmptyName`] if the name is empty/whitespace.
    /// - [`RegistryError::ReservedName`] for `"default"`.
    /// - [`RegistryError::DuplicateName`] if the name is taken.
    /// - [`RegistryError::DuplicateDefault`] if a default already exists and
    ///   this descriptor also claims it.
    ///
    /// A failed registration leaves the registry unchanged.
    pub fn register(&mut self, mut descriptor: BidderDescriptor) -> Result<(), RegistryError> {
        descriptor.name = descriptor.name.trim().to_string();
        let name = descriptor.name.as_str();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if name == DEFAULT_ALIAS {
            return Err(RegistryError::ReservedName {
                name: name.to_string(),
            });
        }
        if self.contains(name) {
            return Err(RegistryError::DuplicateName {
                name: name.to_string(),
            });
        }
        if descriptor.is_default {
            if let Some(existing) = self.default_name() {
                return Err(RegistryError::DuplicateDefault {
                    existing: existing.to_string(),
                    attempted: name.to_string(),
                });
            }
            self.default_idx = Some(self.entries.len());
        }

        tracing::debug!(
            bidder = name,
            default = descriptor.is_default,
            datasets = descriptor.data_requirements.len(),
            "bidder registered"
        );
        self.entries.push(Bidder::from_descriptor(descriptor));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|b| b.name() == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names in registration order.
    pub fn list(&self) -> Vec<&str> {
        self.entries.iter().map(|b| b.name()).collect()
    }

    pub fn bidders(&self) -> &[Bidder] {
        &self.entries
    }

    pub fn default_name(&self) -> Option<&str> {
        self.default_idx.map(|i| self.entries[i].name())
    }

    /// Resolve `name` (or its absence) to the bidder that should run.
    pub fn lookup(&self, name: Option<&str>) -> Result<Lookup<'_>, RegistryError> {
        let requested = name.map(str::trim).filter(|n| !n.is_empty());

        if let Some(n) = requested.filter(|n| *n != DEFAULT_ALIAS) {
            if let Some(b) = self.entries.iter().find(|b| b.name() == n) {
                return Ok(Lookup {
                    bidder: b,
                    fallback: false,
                });
            }
        }

        let fallback = requested.is_some_and(|n| n != DEFAULT_ALIAS);
        match self.default_idx {
            Some(i) => {
                let bidder = &self.entries[i];
                if fallback {
                    tracing::warn!(
                        requested = requested.unwrap_or_default(),
                        default = bidder.name(),
                        "unknown bidder requested; using default"
                    );
                }
                Ok(Lookup { bidder, fallback })
            }
            None => Err(RegistryError::NoDefaultBidder {
                requested: requested.map(str::to_string),
            }),
        }
    }

    /// [`lookup`](Self::lookup) without the fallback flag.
    pub fn get(&self, name: Option<&str>) -> Result<&Bidder, RegistryError> {
        self.lookup(name).map(|l| l.bidder)
    }
}
