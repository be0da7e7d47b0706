//! The spec registry: a trie over flattened spec keys.
//!
//! Lookup is longest-prefix: the deepest registered path that prefixes
//! the flattened input wins, and the unconsumed suffix is handed to the
//! matched builder as trailing arguments — regrouped back into the
//! bracket structure of the original spec, so `[Array, [Map, String]]`
//! against a registry that only knows `Array` recovers the single
//! argument `[Map, String]`, not two flat tokens.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::SpecError;
use crate::schema::JsonSchema;
use crate::spec::{FlatTok, SpecAtom, TySpec};

// ------------------------------- Arity ------------------------------------- //

/// Declared argument-count contract for a registered builder. Stated
/// explicitly at registration; nothing is inferred from signatures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    pub max: Option<usize>,
}

impl Arity {
    pub fn exact(n: usize) -> Self {
        Arity { min: n, max: Some(n) }
    }

    pub fn at_least(n: usize) -> Self {
        Arity { min: n, max: None }
    }

    pub fn between(min: usize, max: usize) -> Self {
        Arity { min, max: Some(max) }
    }

    fn check(&self, got: usize, describe: impl FnOnce() -> String) -> Result<(), SpecError> {
        let over = self.max.is_some_and(|max| got > max);
        if got < self.min || over {
            return Err(SpecError::WrongNumberOfArguments {
                description: describe(),
                got,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

impl Default for Arity {
    fn default() -> Self {
        Arity::exact(0)
    }
}

// ----------------------------- Registration -------------------------------- //

type DescribeFn = Arc<dyn Fn(&Schemas, &[TySpec]) -> String + Send + Sync>;
type LoadFn = Arc<dyn Fn(&Schemas, &[TySpec]) -> Result<JsonSchema, SpecError> + Send + Sync>;

#[derive(Clone)]
enum Describe {
    Text(String),
    Build(DescribeFn),
}

#[derive(Clone)]
enum Loader {
    Ready(JsonSchema),
    Build(LoadFn),
}

/// What `add_spec` records: an arity contract plus optional description
/// and loader builders.
#[derive(Clone, Default)]
pub struct SpecOptions {
    arity: Arity,
    describe: Option<Describe>,
    load: Option<Loader>,
}

impl SpecOptions {
    pub fn new() -> Self {
        SpecOptions::default()
    }

    pub fn args(mut self, arity: Arity) -> Self {
        self.arity = arity;
        self
    }

    /// A literal description; trailing arguments do not change it.
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.describe = Some(Describe::Text(text.into()));
        self
    }

    /// A description builder. The `&Schemas` parameter is the lookup
    /// callback for describing nested argument specs.
    pub fn describe_with(
        mut self,
        f: impl Fn(&Schemas, &[TySpec]) -> String + Send + Sync + 'static,
    ) -> Self {
        self.describe = Some(Describe::Build(Arc::new(f)));
        self
    }

    /// A ready-made schema; pair with `Arity::exact(0)` (the default).
    pub fn load(mut self, schema: JsonSchema) -> Self {
        self.load = Some(Loader::Ready(schema));
        self
    }

    /// A loader builder invoked with the regrouped trailing arguments.
    pub fn load_with(
        mut self,
        f: impl Fn(&Schemas, &[TySpec]) -> Result<JsonSchema, SpecError> + Send + Sync + 'static,
    ) -> Self {
        self.load = Some(Loader::Build(Arc::new(f)));
        self
    }
}

struct SpecEntry {
    arity: Arity,
    describe: Option<Describe>,
    load: Option<Loader>,
}

// -------------------------------- Trie ------------------------------------- //

#[derive(Clone, Default)]
struct TrieNode {
    children: HashMap<SpecAtom, TrieNode>,
    entry: Option<Arc<SpecEntry>>,
}

/// The registry. Cheap to clone (entries are shared), immutable by
/// convention once setup is done, and safe to share across threads.
#[derive(Clone, Default)]
pub struct Schemas {
    root: TrieNode,
    aliases: HashMap<Vec<SpecAtom>, TySpec>,
}

impl Schemas {
    pub fn empty() -> Self {
        Schemas::default()
    }

    /// Register (or overwrite) the entry at `spec`'s flattened key.
    /// Registration keys are atom runs; literals belong in arguments.
    pub fn add_spec(&mut self, spec: impl Into<TySpec>, options: SpecOptions) -> &mut Self {
        let spec = spec.into();
        let mut node = &mut self.root;
        for tok in spec.flatten() {
            let FlatTok::Atom(atom) = tok else {
                panic!("registration keys cannot contain literal tokens");
            };
            node = node.children.entry(atom).or_default();
        }
        node.entry = Some(Arc::new(SpecEntry {
            arity: options.arity,
            describe: options.describe,
            load: options.load,
        }));
        self
    }

    /// Record that `spec`'s flattened key rewrites to `alias` before
    /// lookup. Chains are followed; a cycle fails resolution loudly.
    pub fn add_alias(&mut self, spec: impl Into<TySpec>, alias: impl Into<TySpec>) -> &mut Self {
        let spec = spec.into();
        let key: Vec<SpecAtom> = spec
            .flatten()
            .into_iter()
            .map(|tok| match tok {
                FlatTok::Atom(atom) => atom,
                FlatTok::Lit(_) => panic!("alias keys cannot contain literal tokens"),
            })
            .collect();
        self.aliases.insert(key, alias.into());
        self
    }

    /// Right-biased union: later registries win on key collision.
    pub fn merge(registries: impl IntoIterator<Item = Schemas>) -> Schemas {
        let mut out = Schemas::empty();
        for r in registries {
            merge_node(&mut out.root, r.root);
            out.aliases.extend(r.aliases);
        }
        out
    }

    /// Resolve `spec` to a concrete schema: aliases, then the longest
    /// registered prefix holding a loader, then the arity-checked builder
    /// call with the regrouped leftover arguments.
    pub fn get_schema_for_spec(&self, spec: &TySpec) -> Result<Option<JsonSchema>, SpecError> {
        let resolved = self.resolve_aliases(spec)?;
        let flat = resolved.flatten();
        let Some((entry, consumed)) = self.longest_match(&flat, |e| e.load.is_some()) else {
            debug!(spec = %resolved.fallback_description(), "no registered loader");
            return Ok(None);
        };
        let args = regroup(&resolved, consumed);
        trace!(consumed, args = args.len(), "matched spec prefix");
        // Describe the matched entry, not the full spec: describing the
        // full spec would re-run this same arity check and degrade to
        // the bracketed fallback every time.
        entry
            .arity
            .check(args.len(), || describe_entry_prefix(&entry, &flat[..consumed]))?;
        match entry.load.as_ref() {
            Some(Loader::Ready(schema)) => Ok(Some(schema.clone())),
            Some(Loader::Build(build)) => build(self, &args).map(Some),
            None => Ok(None),
        }
    }

    /// Human description for `spec`; falls back to a bracketed join of
    /// token names when nothing more specific is registered.
    pub fn get_description(&self, spec: &TySpec) -> Result<String, SpecError> {
        let resolved = self.resolve_aliases(spec)?;
        let flat = resolved.flatten();
        let Some((entry, consumed)) = self.longest_match(&flat, |e| e.describe.is_some()) else {
            return Ok(resolved.fallback_description());
        };
        let args = regroup(&resolved, consumed);
        entry
            .arity
            .check(args.len(), || resolved.fallback_description())?;
        match entry.describe.as_ref() {
            Some(Describe::Text(text)) => Ok(text.clone()),
            Some(Describe::Build(build)) => Ok(build(self, &args)),
            None => Ok(resolved.fallback_description()),
        }
    }

    /// Infallible description for breadcrumb frames.
    pub(crate) fn describe_for_trail(&self, spec: &TySpec) -> String {
        self.get_description(spec)
            .unwrap_or_else(|_| spec.fallback_description())
    }

    fn longest_match(
        &self,
        flat: &[FlatTok],
        want: impl Fn(&SpecEntry) -> bool,
    ) -> Option<(Arc<SpecEntry>, usize)> {
        let mut node = &self.root;
        let mut best = None;
        for (i, tok) in flat.iter().enumerate() {
            let FlatTok::Atom(atom) = tok else { break };
            let Some(child) = node.children.get(atom) else { break };
            node = child;
            if let Some(entry) = &node.entry {
                if want(entry) {
                    best = Some((Arc::clone(entry), i + 1));
                }
            }
        }
        best
    }

    /// Follow alias rewrites until none applies. The longest alias key
    /// prefixing the flattened spec is rewritten to its target, keeping
    /// the leftover arguments; a revisited key means a cycle.
    fn resolve_aliases(&self, spec: &TySpec) -> Result<TySpec, SpecError> {
        if self.aliases.is_empty() {
            return Ok(spec.clone());
        }
        let mut current = spec.clone();
        let mut seen: Vec<Vec<SpecAtom>> = Vec::new();
        loop {
            let flat = current.flatten();
            let hit = self
                .aliases
                .iter()
                .filter(|(key, _)| is_atom_prefix(key, &flat))
                .max_by_key(|(key, _)| key.len());
            let Some((key, target)) = hit else {
                return Ok(current);
            };
            if seen.contains(key) {
                return Err(SpecError::AliasCycle {
                    description: spec.fallback_description(),
                });
            }
            seen.push(key.clone());
            let rest = regroup(&current, key.len());
            current = if rest.is_empty() {
                target.clone()
            } else {
                let mut parts = vec![target.clone()];
                parts.extend(rest);
                TySpec::seq(parts)
            };
        }
    }
}

fn merge_node(dst: &mut TrieNode, src: TrieNode) {
    if src.entry.is_some() {
        dst.entry = src.entry;
    }
    for (atom, child) in src.children {
        merge_node(dst.children.entry(atom).or_default(), child);
    }
}

/// Arity-failure description for a matched entry: its registered text
/// if it has one, otherwise the names of the matched prefix tokens.
/// Description builders are not consulted here; they are entitled to
/// assume the arity contract this very error reports as broken.
fn describe_entry_prefix(entry: &SpecEntry, prefix: &[FlatTok]) -> String {
    if let Some(Describe::Text(text)) = &entry.describe {
        return text.clone();
    }
    let names: Vec<String> = prefix
        .iter()
        .map(|tok| match tok {
            FlatTok::Atom(a) => a.name().to_string(),
            FlatTok::Lit(l) => l.to_string(),
        })
        .collect();
    match names.as_slice() {
        [one] => one.clone(),
        many => format!("[{}]", many.join(", ")),
    }
}

fn is_atom_prefix(key: &[SpecAtom], flat: &[FlatTok]) -> bool {
    key.len() <= flat.len()
        && key
            .iter()
            .zip(flat)
            .all(|(a, tok)| matches!(tok, FlatTok::Atom(b) if a == b))
}

// ------------------------------ Regrouping --------------------------------- //

/// Turn the flat leftover of a prefix match back into nested specs that
/// follow the original bracket shape. Walk the spec's elements left to
/// right: elements wholly inside the consumed budget are skipped, the
/// element the boundary splits (necessarily a sequence) contributes its
/// own remainder, and everything after is emitted unchanged.
pub(crate) fn regroup(spec: &TySpec, consumed: usize) -> Vec<TySpec> {
    regroup_elements(spec.elements(), consumed)
}

fn regroup_elements(elems: &[TySpec], mut budget: usize) -> Vec<TySpec> {
    let mut out = Vec::new();
    for e in elems {
        if budget == 0 {
            out.push(e.clone());
            continue;
        }
        let len = e.flat_len();
        if budget >= len {
            budget -= len;
            continue;
        }
        match e {
            TySpec::Seq(inner) => {
                out.extend(regroup_elements(inner, budget));
                budget = 0;
            }
            // Atoms and literals occupy one token, so a smaller non-zero
            // budget cannot land inside them.
            TySpec::Atom(_) | TySpec::Lit(_) => unreachable!("boundary inside a single token"),
        }
    }
    out
}

// ------------------------------- Tests ------------------------------------ //
