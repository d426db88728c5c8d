//! Prefix and suffix classification.
//!
//! Both classifiers are pure functions of the token text and the injected
//! tables. They read the prefix and suffix of the grammar cut
//! ([`grammar::split`]), so an operator tag or a state vector is reported
//! exactly when the grammar recognized the matching part.

use std::sync::Arc;

use serde::Serialize;

use crate::grammar::{self, GrammarValidator, Verdict};
use crate::state::{OperatorTag, StateVector};
use crate::tables::Tables;
use crate::token::Token;

/// Maps a token's leading substring to an operator tag.
#[derive(Debug, Clone)]
pub struct PrefixClassifier {
    tables: Arc<Tables>,
}

impl PrefixClassifier {
    pub fn new(tables: Arc<Tables>) -> Self {
        Self { tables }
    }

    pub fn classify(&self, token: &Token) -> OperatorTag {
        grammar::split(&self.tables, token.text())
            .map_or(OperatorTag::Unclassified, |cut| self.tag(cut.prefix(token.text())))
    }

    fn tag(&self, prefix: &str) -> OperatorTag {
        self.tables
            .operators()
            .get(prefix)
            .copied()
            .unwrap_or(OperatorTag::Unclassified)
    }
}

/// Maps a token's trailing substring to a state vector.
#[derive(Debug, Clone)]
pub struct SuffixClassifier {
    tables: Arc<Tables>,
}

impl SuffixClassifier {
    pub fn new(tables: Arc<Tables>) -> Self {
        Self { tables }
    }

    pub fn classify(&self, token: &Token) -> StateVector {
        grammar::split(&self.tables, token.text())
            .map_or(StateVector::UNDEFINED, |cut| self.vector(cut.suffix(token.text())))
    }

    fn vector(&self, suffix: &str) -> StateVector {
        self.tables
            .suffixes()
            .get(suffix)
            .copied()
            .unwrap_or(StateVector::UNDEFINED)
    }
}

/// A token with its classification: the unit the VM executes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instruction {
    pub token: Token,
    pub verdict: Verdict,
    pub op: OperatorTag,
    pub vector: StateVector,
}

impl Instruction {
    pub fn new(token: Token, verdict: Verdict, op: OperatorTag, vector: StateVector) -> Self {
        Self {
            token,
            verdict,
            op,
            vector,
        }
    }
}

/// Validates and classifies tokens into instructions.
///
/// The token is cut once. Whatever part the cut lacks falls back to
/// `Unclassified` / `Undefined`, so only `Valid` tokens carry both an
/// operator and a vector.
#[derive(Debug, Clone)]
pub struct Classifier {
    validator: GrammarValidator,
    prefix: PrefixClassifier,
    suffix: SuffixClassifier,
}

impl Classifier {
    pub fn new(tables: Arc<Tables>) -> Self {
        Self {
            validator: GrammarValidator::new(Arc::clone(&tables)),
            prefix: PrefixClassifier::new(Arc::clone(&tables)),
            suffix: SuffixClassifier::new(tables),
        }
    }

    pub fn validator(&self) -> &GrammarValidator {
        &self.validator
    }

    /// Total: every token yields exactly one instruction.
    pub fn instruction(&self, token: Token) -> Instruction {
        let Some(cut) = self.validator.cut(&token) else {
            return Instruction::new(
                token,
                Verdict::Invalid,
                OperatorTag::Unclassified,
                StateVector::UNDEFINED,
            );
        };
        let verdict = self.validator.validate(&token);
        let op = self.prefix.tag(cut.prefix(token.text()));
        let vector = self.suffix.vector(cut.suffix(token.text()));
        Instruction::new(token, verdict, op, vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Depth, Flow, Phase};
    use crate::token::Tokenizer;

    fn tables() -> Arc<Tables> {
        Arc::new(Tables::default())
    }

    fn tokens(line: &str) -> Vec<Token> {
        Tokenizer::new(tables()).tokenize_all(line)
    }

    #[test]
    fn test_prefix_longest_match() {
        let prefix = PrefixClassifier::new(tables());
        let toks = tokens("qokeedy qkar olor shey daiin");
        let tags: Vec<OperatorTag> = toks.iter().map(|t| prefix.classify(t)).collect();
        assert_eq!(
            tags,
            vec![
                OperatorTag::Qo,
                OperatorTag::Q,
                OperatorTag::Ol,
                OperatorTag::Sh,
                OperatorTag::Unclassified,
            ]
        );
    }

    #[test]
    fn test_suffix_full_vector() {
        let suffix = SuffixClassifier::new(tables());
        let vector = suffix.classify(&tokens("qokeedy")[0]);
        assert_eq!(
            vector,
            StateVector::new(Depth::Level(1), Phase::Final, Flow::Forward)
        );
    }

    #[test]
    fn test_suffix_longest_match() {
        let suffix = SuffixClassifier::new(tables());
        let aiin = suffix.classify(&tokens("daiin")[0]);
        assert_eq!(aiin.depth, Depth::Level(2));
        let chedy = suffix.classify(&tokens("kchedy")[0]);
        assert_eq!(chedy.phase, Phase::Medial);
        // "chedy" on its own would leave no root, so the cut keeps "dy".
        let bare = suffix.classify(&tokens("chedy")[0]);
        assert_eq!(bare.phase, Phase::Final);
    }

    #[test]
    fn test_suffix_partial_axes_stay_unknown() {
        let suffix = SuffixClassifier::new(tables());
        let vector = suffix.classify(&tokens("okal")[0]);
        assert_eq!(vector.depth, Depth::Level(1));
        assert_eq!(vector.phase, Phase::Medial);
        assert_eq!(vector.flow, Flow::Unknown);
    }

    #[test]
    fn test_suffix_undefined_without_match() {
        let suffix = SuffixClassifier::new(tables());
        assert!(suffix.classify(&tokens("qokch")[0]).is_undefined());
    }

    #[test]
    fn test_classification_is_deterministic() {
        let classifier = Classifier::new(tables());
        for token in tokens("qokeedy ol dy shedy ! okaiin") {
            let a = classifier.instruction(token.clone());
            let b = classifier.instruction(token);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_invalid_tokens_fall_back() {
        let classifier = Classifier::new(tables());
        let instr = classifier.instruction(tokens("*")[0].clone());
        assert_eq!(instr.verdict, Verdict::Invalid);
        assert_eq!(instr.op, OperatorTag::Unclassified);
        assert!(instr.vector.is_undefined());
    }

    #[test]
    fn test_short_token_invalid_under_strict_length() {
        let mut spec = Tables::eva_spec();
        spec.min_token_len = 2;
        let strict = Arc::new(Tables::from_spec(spec).unwrap());
        let token = Tokenizer::new(Arc::clone(&strict)).tokenize_all("y").remove(0);
        let instr = Classifier::new(strict).instruction(token);
        assert_eq!(instr.verdict, Verdict::Invalid);
        assert!(instr.vector.is_undefined());
    }

    #[test]
    fn test_partially_valid_tokens_fall_back_per_part() {
        let classifier = Classifier::new(tables());

        // "ol" is all root: no operator, no state.
        let ol = classifier.instruction(tokens("ol")[0].clone());
        assert_eq!(ol.verdict, Verdict::PartiallyValid);
        assert_eq!(ol.token.prefix(), "");
        assert_eq!(ol.op, OperatorTag::Unclassified);
        assert!(ol.vector.is_undefined());

        // "dy" keeps "d" as root, so the state comes from "y".
        let dy = classifier.instruction(tokens("dy")[0].clone());
        assert_eq!(dy.verdict, Verdict::PartiallyValid);
        assert_eq!(dy.token.suffix(), "y");
        assert_eq!(dy.op, OperatorTag::Unclassified);
        assert_eq!(
            dy.vector,
            StateVector::new(Depth::Unknown, Phase::Unknown, Flow::Neutral)
        );

        let olkee = classifier.instruction(tokens("olkee")[0].clone());
        assert_eq!(olkee.verdict, Verdict::PartiallyValid);
        assert_eq!(olkee.op, OperatorTag::Ol);
        assert!(olkee.vector.is_undefined());
    }

    #[test]
    fn test_verdict_agrees_with_classification() {
        let classifier = Classifier::new(tables());
        for token in tokens("qokeedy ol dy olkain shey kor qokch daiin ! y al") {
            let instr = classifier.instruction(token);
            let fully_classified = instr.op.is_classified() && !instr.vector.is_undefined();
            assert_eq!(
                instr.verdict == Verdict::Valid,
                fully_classified,
                "token {:?}",
                instr.token.text()
            );
            assert_eq!(instr.op, classifier.prefix.classify(&instr.token));
            assert_eq!(instr.vector, classifier.suffix.classify(&instr.token));
        }
    }
}
