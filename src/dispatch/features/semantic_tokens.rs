use tokio_util::sync::CancellationToken;
use tower_lsp_server::ls_types::{Position, Range, SemanticToken, SemanticTokens};
use url::Url;

use crate::dispatch::{DispatchSource, FeatureDispatcher, ResultTranslator};
use crate::embedding::Capability;
use crate::engine::LanguageEngine;
use crate::error::FeatureResult;
use crate::mapping::MappingSource;

/// A semantic token with absolute coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Token {
    line: u32,
    start: u32,
    length: u32,
    token_type: u32,
    modifiers: u32,
}

impl Token {
    fn end(&self) -> u32 {
        self.start.saturating_add(self.length)
    }
}

impl<S, E> FeatureDispatcher<'_, S, E>
where
    S: DispatchSource + ?Sized,
    E: LanguageEngine + ?Sized,
{
    /// Semantic tokens of the whole host document.
    ///
    /// Each region's tokens are decoded, moved to host coordinates one by one
    /// and re-encoded in host order. Tokens that do not map, that would span
    /// lines in the host, or that overlap an earlier token are dropped.
    pub fn semantic_tokens(
        &self,
        host_uri: &Url,
        cancel: &CancellationToken,
    ) -> FeatureResult<SemanticTokens> {
        let translator = ResultTranslator::new(self.source());
        let contributions = self.dispatch_documents(
            host_uri,
            Capability::SemanticTokens,
            cancel,
            |engine, document, virtual_doc| {
                let encoded = engine.semantic_tokens(document)?;
                Ok(decode(&encoded)
                    .into_iter()
                    .filter_map(|token| translate_token(&translator, virtual_doc.uri(), token))
                    .collect::<Vec<_>>())
            },
        )?;

        let mut tokens: Vec<Token> = contributions.into_iter().flat_map(|c| c.value).collect();
        tokens.sort_by_key(|token| (token.line, token.start));
        let mut kept: Vec<Token> = Vec::with_capacity(tokens.len());
        for token in tokens {
            let overlaps = kept
                .last()
                .is_some_and(|last| last.line == token.line && token.start < last.end());
            if !overlaps {
                kept.push(token);
            }
        }
        Ok(SemanticTokens {
            result_id: None,
            data: encode(&kept),
        })
    }
}

fn translate_token<S: MappingSource + ?Sized>(
    translator: &ResultTranslator<'_, S>,
    virtual_uri: &Url,
    token: Token,
) -> Option<Token> {
    let range = Range::new(
        Position::new(token.line, token.start),
        Position::new(token.line, token.end()),
    );
    let host = translator.range(virtual_uri, range, Some(Capability::SemanticTokens))?;
    if host.start.line != host.end.line {
        return None;
    }
    Some(Token {
        line: host.start.line,
        start: host.start.character,
        length: host.end.character - host.start.character,
        ..token
    })
}

fn decode(encoded: &[SemanticToken]) -> Vec<Token> {
    let mut line: u32 = 0;
    let mut start: u32 = 0;
    encoded
        .iter()
        .map(|token| {
            if token.delta_line == 0 {
                start = start.saturating_add(token.delta_start);
            } else {
                line = line.saturating_add(token.delta_line);
                start = token.delta_start;
            }
            Token {
                line,
                start,
                length: token.length,
                token_type: token.token_type,
                modifiers: token.token_modifiers_bitset,
            }
        })
        .collect()
}

/// Relative encoding of tokens already sorted by position.
fn encode(tokens: &[Token]) -> Vec<SemanticToken> {
    let mut previous = (0, 0);
    tokens
        .iter()
        .map(|token| {
            let (line, start) = previous;
            previous = (token.line, token.start);
            SemanticToken {
                delta_line: token.line - line,
                delta_start: if token.line == line {
                    token.start - start
                } else {
                    token.start
                },
                length: token.length,
                token_type: token.token_type,
                token_modifiers_bitset: token.modifiers,
            }
        })
        .collect()
}
