//! One file per feature family, each adding methods to `FeatureDispatcher`.

mod call_hierarchy;
mod code_action;
mod completion;
mod diagnostics;
mod folding;
mod formatting;
mod hover;
mod navigation;
mod rename;
mod selection_range;
mod semantic_tokens;
mod signature_help;
mod symbols;

use tower_lsp_server::ls_types::{Position, Range};

fn point(position: Position) -> Range {
    Range::new(position, position)
}
