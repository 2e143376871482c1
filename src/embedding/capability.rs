//! Per-region feature capabilities.
//!
//! Every source mapping carries the set of features allowed to travel through
//! it. A template interpolation may only permit hover and diagnostics while a
//! script block permits everything.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A language feature that can be enabled or disabled per mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    Completion,
    Hover,
    Definition,
    TypeDefinition,
    References,
    Rename,
    Diagnostic,
    CodeAction,
    Formatting,
    DocumentSymbol,
    DocumentHighlight,
    SignatureHelp,
    SelectionRange,
    FoldingRange,
    SemanticTokens,
    CallHierarchy,
}

impl Capability {
    pub const ALL: [Capability; 16] = [
        Capability::Completion,
        Capability::Hover,
        Capability::Definition,
        Capability::TypeDefinition,
        Capability::References,
        Capability::Rename,
        Capability::Diagnostic,
        Capability::CodeAction,
        Capability::Formatting,
        Capability::DocumentSymbol,
        Capability::DocumentHighlight,
        Capability::SignatureHelp,
        Capability::SelectionRange,
        Capability::FoldingRange,
        Capability::SemanticTokens,
        Capability::CallHierarchy,
    ];

    /// Configuration key, identical to the serialized form.
    pub fn key(self) -> &'static str {
        match self {
            Capability::Completion => "completion",
            Capability::Hover => "hover",
            Capability::Definition => "definition",
            Capability::TypeDefinition => "typeDefinition",
            Capability::References => "references",
            Capability::Rename => "rename",
            Capability::Diagnostic => "diagnostic",
            Capability::CodeAction => "codeAction",
            Capability::Formatting => "formatting",
            Capability::DocumentSymbol => "documentSymbol",
            Capability::DocumentHighlight => "documentHighlight",
            Capability::SignatureHelp => "signatureHelp",
            Capability::SelectionRange => "selectionRange",
            Capability::FoldingRange => "foldingRange",
            Capability::SemanticTokens => "semanticTokens",
            Capability::CallHierarchy => "callHierarchy",
        }
    }

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Copyable set of [`Capability`] flags.
///
/// Serializes as a list of capability keys.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Capability>", into = "Vec<Capability>")]
pub struct CapabilitySet(u16);

impl CapabilitySet {
    pub const fn empty() -> Self {
        CapabilitySet(0)
    }

    pub fn all() -> Self {
        Capability::ALL.into_iter().collect()
    }

    pub fn contains(self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    pub fn insert(&mut self, capability: Capability) {
        self.0 |= capability.bit();
    }

    pub fn remove(&mut self, capability: Capability) {
        self.0 &= !capability.bit();
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, capability: Capability) -> Self {
        self.insert(capability);
        self
    }

    pub fn union(self, other: CapabilitySet) -> Self {
        CapabilitySet(self.0 | other.0)
    }

    pub fn intersection(self, other: CapabilitySet) -> Self {
        CapabilitySet(self.0 & other.0)
    }

    pub fn difference(self, other: CapabilitySet) -> Self {
        CapabilitySet(self.0 & !other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL
            .into_iter()
            .filter(move |capability| self.contains(*capability))
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        let mut set = CapabilitySet::empty();
        for capability in iter {
            set.insert(capability);
        }
        set
    }
}

impl From<Vec<Capability>> for CapabilitySet {
    fn from(capabilities: Vec<Capability>) -> Self {
        capabilities.into_iter().collect()
    }
}

impl From<CapabilitySet> for Vec<Capability> {
    fn from(set: CapabilitySet) -> Self {
        set.iter().collect()
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
