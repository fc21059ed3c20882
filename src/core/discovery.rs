use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::DiscoveryConfig;
use super::graph::{CodeContextGraph, DiagnosticKind, ImportClass, ImportReference, SymbolKind};

/// Outcome of one discovery run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryOutcome {
    /// True iff classification converged naturally: a pass produced
    /// zero new classifications with nothing left unresolved
    pub complete: bool,

    /// Number of passes executed
    pub passes: usize,

    /// References classified across all passes
    pub newly_resolved: usize,

    /// References force-classified external after the run
    pub forced_external: usize,
}

/// Iteratively classifies import references as internal, stdlib or
/// external until a fixpoint or the pass cap is reached
///
/// Each pass evaluates every unresolved reference against the
/// pass-start state and commits all updates at pass end, so the final
/// classification never depends on file processing order.
pub struct DiscoveryEngine {
    stdlib_modules: HashMap<String, HashSet<String>>,
    max_passes: usize,
}

impl DiscoveryEngine {
    pub fn new(config: &DiscoveryConfig) -> Self {
        let stdlib_modules = config
            .stdlib_modules
            .keys()
            .map(|language| (language.clone(), config.stdlib_set(language)))
            .collect();

        Self {
            stdlib_modules,
            max_passes: config.max_passes,
        }
    }

    /// Run classification passes over the graph's unresolved references
    pub fn run(&self, graph: &mut CodeContextGraph) -> DiscoveryOutcome {
        let module_identities = Self::module_identities(graph);

        let mut passes = 0;
        let mut newly_resolved = 0;
        let mut reached_fixpoint = false;

        while passes < self.max_passes {
            passes += 1;

            // Evaluate against the pass-start state, commit afterwards
            let updates: Vec<(usize, ImportClass)> = graph
                .import_refs
                .iter()
                .enumerate()
                .filter(|(_, reference)| reference.classification == ImportClass::Unresolved)
                .filter_map(|(index, reference)| {
                    self.classify(reference, graph, &module_identities)
                        .map(|class| (index, class))
                })
                .collect();

            let newly = updates.len();
            for (index, class) in updates {
                graph.import_refs[index].classification = class;
            }
            newly_resolved += newly;

            let unresolved = Self::unresolved_count(graph);
            debug!(
                "Discovery pass {}: {} newly classified, {} still unresolved",
                passes, newly, unresolved
            );

            if newly == 0 && unresolved == 0 {
                reached_fixpoint = true;
                break;
            }
        }

        let forced_external = self.force_classify_remaining(graph, passes);
        let complete = reached_fixpoint && forced_external == 0;
        graph.discovery_complete = complete;

        info!(
            "Dependency discovery finished: {} passes, {} classified, {} forced external, complete={}",
            passes, newly_resolved, forced_external, complete
        );

        DiscoveryOutcome {
            complete,
            passes,
            newly_resolved,
            forced_external,
        }
    }

    /// Apply the ordered rule sets to one reference; `None` means the
    /// reference stays unresolved this pass
    fn classify(
        &self,
        reference: &ImportReference,
        graph: &CodeContextGraph,
        module_identities: &[String],
    ) -> Option<ImportClass> {
        let token = reference.token.as_str();
        let local_prefix = Self::is_local_fragment(token);

        if let Some(normalized) = Self::normalize(token, &reference.declaring_module) {
            if Self::matches_internal(&normalized, graph, module_identities) {
                return Some(ImportClass::Internal);
            }
        }

        // Relative and crate-local fragments never classify as stdlib
        // or external; they wait for more of the graph or the cap
        if local_prefix {
            return None;
        }

        if let Some(top_level) = token.split('.').next() {
            if self
                .stdlib_modules
                .get(&reference.language)
                .map(|set| set.contains(top_level))
                .unwrap_or(false)
            {
                return Some(ImportClass::Stdlib);
            }
        }

        if Self::is_well_formed(token) {
            return Some(ImportClass::External);
        }

        None
    }

    /// Resolve relative ("." / "..") and crate-local ("crate." /
    /// "self." / "super.") tokens against the declaring module
    fn normalize(token: &str, declaring_module: &str) -> Option<String> {
        if let Some(relative) = token.strip_prefix('.') {
            let mut base: Vec<&str> = declaring_module.split('.').collect();
            base.pop(); // leave the declaring package
            let mut remainder = relative;
            while let Some(stripped) = remainder.strip_prefix('.') {
                base.pop()?;
                remainder = stripped;
            }
            if !remainder.is_empty() {
                base.push(remainder);
            }
            if base.is_empty() {
                return None;
            }
            return Some(base.join("."));
        }

        // `crate` anchors at the declaring module's root package,
        // `self` at the module itself, `super` at its parent
        if token == "self" || token.starts_with("self.") {
            let rest = token.trim_start_matches("self").trim_start_matches('.');
            return Some(Self::join_dotted(declaring_module, rest));
        }
        if token == "crate" || token.starts_with("crate.") {
            let root = declaring_module.split('.').next().filter(|s| !s.is_empty())?;
            let rest = token.trim_start_matches("crate").trim_start_matches('.');
            return Some(Self::join_dotted(root, rest));
        }
        if token == "super" || token.starts_with("super.") {
            let mut base: Vec<&str> = declaring_module.split('.').collect();
            let mut remainder = token;
            while remainder == "super" || remainder.starts_with("super.") {
                base.pop()?;
                remainder = remainder.trim_start_matches("super").trim_start_matches('.');
            }
            if base.is_empty() {
                if remainder.is_empty() {
                    return None;
                }
                return Some(remainder.to_string());
            }
            return Some(Self::join_dotted(&base.join("."), remainder));
        }

        Some(token.to_string())
    }

    fn join_dotted(base: &str, rest: &str) -> String {
        if rest.is_empty() {
            base.to_string()
        } else {
            format!("{}.{}", base, rest)
        }
    }

    fn is_local_fragment(token: &str) -> bool {
        token.starts_with('.')
            || token.starts_with("crate.")
            || token.starts_with("self.")
            || token.starts_with("super.")
            || matches!(token, "crate" | "self" | "super")
    }

    /// Internal iff the token matches a node identity exactly or is
    /// prefix-related to a module identity
    fn matches_internal(
        token: &str,
        graph: &CodeContextGraph,
        module_identities: &[String],
    ) -> bool {
        if graph.contains_node(token) {
            return true;
        }
        module_identities.iter().any(|module| {
            Self::dotted_prefix(token, module) || Self::dotted_prefix(module, token)
        })
    }

    fn dotted_prefix(longer: &str, shorter: &str) -> bool {
        longer.len() > shorter.len()
            && longer.starts_with(shorter)
            && longer.as_bytes()[shorter.len()] == b'.'
    }

    /// A well-formed dotted identifier: non-empty segments of
    /// identifier characters
    fn is_well_formed(token: &str) -> bool {
        !token.is_empty()
            && token.split('.').all(|segment| {
                !segment.is_empty()
                    && segment
                        .chars()
                        .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
            })
    }

    /// Force-classify whatever is still unresolved as external
    fn force_classify_remaining(&self, graph: &mut CodeContextGraph, passes: usize) -> usize {
        let mut forced = 0;
        for reference in &mut graph.import_refs {
            if reference.classification == ImportClass::Unresolved {
                reference.classification = ImportClass::External;
                forced += 1;
            }
        }
        if forced > 0 {
            graph.push_diagnostic(
                DiagnosticKind::NonConvergence,
                format!(
                    "discovery did not converge after {} passes; {} references force-classified as external",
                    passes, forced
                ),
            );
        }
        forced
    }

    fn unresolved_count(graph: &CodeContextGraph) -> usize {
        graph
            .import_refs
            .iter()
            .filter(|r| r.classification == ImportClass::Unresolved)
            .count()
    }

    fn module_identities(graph: &CodeContextGraph) -> Vec<String> {
        graph
            .nodes
            .values()
            .filter(|node| node.kind == SymbolKind::Module)
            .map(|node| node.qualified_name.clone())
            .collect()
    }
}
