// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use rtx_cap::{CapDenied, CapabilityPolicy};
use rtx_core::{CapabilityKind, ResourceTable};
use serde_json::Value;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The argument a capability check is made against, extracted cheaply from
/// the raw JSON value before the handler's typed deserialization runs.
#[derive(Debug, Clone)]
pub enum CapArg {
    /// A filesystem path, normalized against the policy's app root before
    /// matching.
    Path(String),
    /// A URL, matched against the granted glob list as-is.
    Url(String),
    /// A feature-flag capability with an optional named argument (a binary
    /// name for `process.spawn`, a channel name for `channels`).
    Flag(Option<String>),
}

/// A capability an op needs to check before running, paired with the
/// argument to check it against.
#[derive(Debug, Clone)]
pub struct CapCheck {
    kind: CapabilityKind,
    arg: CapArg,
}

impl CapCheck {
    pub fn new(kind: CapabilityKind, arg: CapArg) -> Self {
        Self { kind, arg }
    }

    /// The capability kind being checked, so the dispatcher can pick the
    /// right error family for a denial without every handler overriding
    /// anything.
    pub fn kind(&self) -> CapabilityKind {
        self.kind
    }
}

/// Shared state every handler gets access to: the capability policy and
/// the process-wide resource table. Services add their own state (a
/// `reqwest::Client`, a `wasmtime::Engine`, ...) behind their own `Arc` held
/// inside the handler closures, not here — this stays generic across every
/// service crate.
pub struct OpContext {
    policy: Arc<CapabilityPolicy>,
    resources: Arc<ResourceTable>,
}

impl OpContext {
    pub fn new(policy: Arc<CapabilityPolicy>, resources: Arc<ResourceTable>) -> Self {
        Self { policy, resources }
    }

    pub fn policy(&self) -> &CapabilityPolicy {
        &self.policy
    }

    pub fn resources(&self) -> &ResourceTable {
        &self.resources
    }

    pub(crate) fn check(&self, check: CapCheck) -> Result<(), CapDenied> {
        match check.arg {
            CapArg::Path(path) => self.policy.check_path(check.kind, &path),
            CapArg::Url(url) => self.policy.check_url(check.kind, &url),
            CapArg::Flag(arg) => self.policy.check_flag(check.kind, arg.as_deref()),
        }
    }
}

/// Implemented once per op by each service crate. Kept object-safe so the
/// registry can hold a closed, heterogeneous set of handlers behind one
/// map.
pub trait OpHandler: Send + Sync + 'static {
    /// Inspect the raw argument value and decide whether a capability gates
    /// this call, and against what argument. Returning `None` means the op
    /// is ungated (e.g. `ping`, `random_uuid`).
    fn required_capability(&self, args: &Value) -> Option<CapCheck>;

    /// Run the op. By the time this is called the capability check (if
    /// any) has already passed.
    fn call(&self, args: Value, ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, rtx_core::OpError>>;
}

/// The closed name -> handler map, built once at startup. Mirrors the
/// dispatch-by-request-variant shape the daemon listener used, but as data
/// instead of a match expression so registering a new op doesn't require
/// editing this crate.
#[derive(Default)]
pub struct OpRegistry {
    handlers: HashMap<&'static str, Box<dyn OpHandler>>,
}

impl OpRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register(&mut self, name: &'static str, handler: impl OpHandler) -> &mut Self {
        self.handlers.insert(name, Box::new(handler));
        self
    }

    pub fn lookup(&self, name: &str) -> Option<&dyn OpHandler> {
        self.handlers.get(name).map(|boxed| boxed.as_ref())
    }

    pub fn op_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.keys().copied()
    }
}
