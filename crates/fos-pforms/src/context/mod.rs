//! Formatting context
//!
//! A [`Context`] owns everything a rule set defines: the character
//! classification tree, the "pre" and "after" ligature trees and the ordered
//! list of compiled rules. Contexts are independent of each other; mutating
//! one while formatting with it must be serialized by the caller.

mod compiler;
mod check;

use std::fs;

use crate::class::CharClass;
use crate::config::RulesConfig;
use crate::rule::CompiledRule;
use crate::tree::IntervalTree;
use crate::{ligature_key, PformsError, Result, RuleError};

pub use check::CheckFailure;

/// Which ligature table an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LigatureVariant {
    /// `L` lines: applied while a word is collected
    Pre,
    /// `A` lines: applied to a word's formatted output
    After,
}

/// A ligature table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ligature {
    /// Replacement for the pair
    pub result: u32,
    pub variant: LigatureVariant,
}

/// Rule set and lookup tables for formatting
#[derive(Debug, Clone, Default)]
pub struct Context {
    config: RulesConfig,
    chars: IntervalTree<CharClass>,
    pre_ligatures: IntervalTree<Ligature>,
    after_ligatures: IntervalTree<Ligature>,
    rules: Vec<CompiledRule>,
    /// Set when the last check found no inconsistency
    checked: bool,
    check_failure: Option<CheckFailure>,
}

impl Context {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty context that searches for rule files per `config`
    pub fn with_config(config: RulesConfig) -> Self {
        Self { config, ..Self::default() }
    }

    /// Create a context and load a rules file into it
    pub fn from_file(name: &str, config: RulesConfig) -> Result<Self> {
        let mut context = Self::with_config(config);
        context.add_file(name)?;
        Ok(context)
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    /// Compile one rules line into this context
    pub fn add_line(&mut self, line: &str) -> std::result::Result<(), RuleError> {
        compiler::compile_line(self, line)
    }

    /// Compile a newline-separated rule set, stopping at the first bad line
    pub fn add_rules(&mut self, text: &str) -> Result<()> {
        for (index, line) in text.lines().enumerate() {
            self.add_line(line)
                .map_err(|source| PformsError::Rules { line: index + 1, source })?;
        }
        Ok(())
    }

    /// Load a rules file found in the configured directories
    ///
    /// An empty name does nothing. Each search directory is tried in turn,
    /// then the default directory.
    pub fn add_file(&mut self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Ok(());
        }

        let mut last_error = None;
        let mut found = None;
        for dir in self.config.candidate_dirs() {
            let path = dir.join(name);
            match fs::read_to_string(&path) {
                Ok(text) => {
                    found = Some((path, text));
                    break;
                }
                Err(err) => last_error = Some(err),
            }
        }

        let Some((path, text)) = found else {
            return Err(PformsError::File {
                name: name.to_string(),
                reason: last_error
                    .map(|err| err.to_string())
                    .unwrap_or_else(|| "no rules directories configured".to_string()),
            });
        };

        self.add_rules(&text)?;
        tracing::debug!("Loaded rules file {} ({} lines)", path.display(), text.lines().count());
        Ok(())
    }

    /// Check the ligature tables against the classification tree
    ///
    /// Returns `true` when consistent. On failure the offending pair is kept
    /// for [`Context::check_message`].
    pub fn check(&mut self) -> bool {
        match check::check_ligatures(self) {
            Ok(()) => {
                self.checked = true;
                self.check_failure = None;
            }
            Err(failure) => {
                tracing::warn!("Context check failed: {}", failure);
                self.checked = false;
                self.check_failure = Some(failure);
            }
        }
        self.checked
    }

    /// Run the check if anything changed since the last successful one
    pub(crate) fn ensure_checked(&mut self) -> bool {
        self.checked || self.check()
    }

    /// Whether the tables are consistent, without recording the outcome
    pub(crate) fn is_consistent(&self) -> bool {
        self.checked || check::check_ligatures(self).is_ok()
    }

    pub fn is_checked(&self) -> bool {
        self.checked
    }

    /// Details of the last check failure
    pub fn check_failure(&self) -> Option<&CheckFailure> {
        self.check_failure.as_ref()
    }

    /// Human-readable description of the last check failure
    pub fn check_message(&self) -> String {
        match &self.check_failure {
            Some(failure) => failure.to_string(),
            None => "No context check error found".to_string(),
        }
    }

    /// Classification of a code point
    pub fn classify(&self, c: u32) -> Option<&CharClass> {
        self.chars.search(u64::from(c))
    }

    pub(crate) fn is_combining(&self, c: u32) -> bool {
        self.classify(c).is_some_and(CharClass::is_combining)
    }

    /// Look up a ligature of the given variant
    pub fn ligature(&self, variant: LigatureVariant, first: u32, second: u32) -> Option<u32> {
        self.ligature_tree(variant)
            .search(ligature_key(first, second))
            .map(|lig| lig.result)
    }

    pub(crate) fn ligature_tree(&self, variant: LigatureVariant) -> &IntervalTree<Ligature> {
        match variant {
            LigatureVariant::Pre => &self.pre_ligatures,
            LigatureVariant::After => &self.after_ligatures,
        }
    }

    pub(crate) fn has_after_ligatures(&self) -> bool {
        !self.after_ligatures.is_empty()
    }

    /// Compiled rules in priority order
    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    #[cfg(test)]
    pub(crate) fn rules_mut(&mut self) -> &mut Vec<CompiledRule> {
        &mut self.rules
    }

    fn insert_class(
        &mut self,
        first: u32,
        last: u32,
        class: CharClass,
    ) -> std::result::Result<(), RuleError> {
        self.chars
            .insert(u64::from(first), u64::from(last), class)
            .map_err(|_| RuleError::DuplicateChar)?;
        self.checked = false;
        Ok(())
    }

    fn insert_ligature(
        &mut self,
        variant: LigatureVariant,
        first: u32,
        second: u32,
        result: u32,
    ) -> std::result::Result<(), RuleError> {
        let key = ligature_key(first, second);
        let tree = match variant {
            LigatureVariant::Pre => &mut self.pre_ligatures,
            LigatureVariant::After => &mut self.after_ligatures,
        };
        tree.insert(key, key, Ligature { result, variant })
            .map_err(|_| RuleError::DuplicateLigature)?;
        self.checked = false;
        Ok(())
    }

    fn push_rule(&mut self, rule: CompiledRule) {
        tracing::debug!("Compiled rule {} ({}/{})", rule, rule.pre_len, rule.repl_len);
        self.rules.push(rule);
        self.checked = false;
    }
}
