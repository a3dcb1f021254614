//! Diagnostic engine: every stage of the pipeline reports failures as a
//! [`MeowError`] carrying a catalog code, a source position and message
//! details. Rendering (banner, context excerpt, mood, suggestion) happens
//! here; the catalog itself lives in [`catalog`].

use std::fmt;

use owo_colors::OwoColorize;
use thiserror::Error;

use crate::token::Position;

pub mod catalog;

pub use catalog::{lookup, ErrorDef};

/// Severity tier shown in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Griffure {
    Faible,
    Moyenne,
    Forte,
}

impl Griffure {
    pub fn emoji(self) -> &'static str {
        match self {
            Griffure::Faible => "😺",
            Griffure::Moyenne => "😾",
            Griffure::Forte => "🙀",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Griffure::Faible => "FAIBLE",
            Griffure::Moyenne => "MOYENNE",
            Griffure::Forte => "FORTE",
        }
    }
}

/// A reported error: catalog entry plus everything needed to render it
/// against the offending source.
#[derive(Debug, Clone, Error)]
pub struct MeowError {
    pub def: &'static ErrorDef,
    pub pos: Position,
    pub instruction: String,
    details: Vec<(&'static str, String)>,
    fatal: bool,
}

impl MeowError {
    pub fn new(code: &str) -> Self {
        Self {
            def: lookup(code),
            pos: Position::synthetic(),
            instruction: String::new(),
            details: Vec::new(),
            fatal: false,
        }
    }

    pub fn at(mut self, pos: Position) -> Self {
        self.pos = pos;
        self
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    pub fn with_detail(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        self.details.push((key, value.to_string()));
        self
    }

    /// Fills in the position if the error does not carry one yet. Lets
    /// builtins report errors without knowing their call site.
    pub fn or_at(mut self, pos: Position) -> Self {
        if self.pos.line == 0 {
            self.pos = pos;
        }
        self
    }

    /// Marks the error as uncatchable regardless of its code. Module loading
    /// uses this so a lex or parse failure inside an imported file bypasses
    /// `essayer/sauf` in the importing script.
    pub fn into_fatal(mut self) -> Self {
        self.fatal = true;
        self
    }

    pub fn code(&self) -> &'static str {
        self.def.code
    }

    /// Critical codes (E9xx) and fatalized errors bypass user handlers.
    pub fn is_catchable(&self) -> bool {
        !self.fatal && !self.def.code.starts_with("E9")
    }

    pub fn message_tech(&self) -> String {
        self.interpolate(self.def.message_tech)
    }

    pub fn message_meow(&self) -> String {
        self.interpolate(self.def.message_meow)
    }

    fn interpolate(&self, template: &str) -> String {
        let mut message = template.to_string();
        for (key, value) in &self.details {
            message = message.replace(&format!("{{{key}}}"), value);
        }
        message
    }

    /// Renders the full diagnostic block for `source` (the file the error
    /// occurred in). The output format is stable; see the catalog for the
    /// wording of each entry.
    pub fn render(&self, filename: &str, source: &str) -> String {
        let mut out = String::new();
        let severity = self.def.severity;

        out.push('\n');
        out.push_str(&format!(
            "{} ERREUR MEOWLANG [{}] — GRIFFURE {}\n\n",
            severity.emoji(),
            self.def.code.yellow().bold(),
            severity.label().red().bold(),
        ));
        out.push_str(&format!("Fichier      : {}\n", filename.cyan()));
        out.push_str(&format!("Ligne        : {}\n", self.pos.line.cyan()));
        out.push_str(&format!("Colonne      : {}\n", self.pos.column.cyan()));
        if !self.instruction.is_empty() {
            out.push_str(&format!("Instruction  : {}\n", self.instruction.yellow()));
        }
        out.push('\n');
        out.push_str(&format!("Type         : {}\n\n", self.def.name.red().bold()));
        out.push_str("Message technique :\n");
        out.push_str(&self.message_tech());
        out.push_str("\n\n");
        out.push_str("Message MeowLang 🐱 :\n");
        out.push_str(&self.message_meow());
        out.push('\n');

        if let Some(context) = self.context_excerpt(source) {
            out.push_str("\nContexte :\n");
            out.push_str(&context);
        }

        out.push_str("\nÉtat du chat :\n");
        out.push_str(self.def.mood);
        out.push('\n');

        if !self.def.suggestion.is_empty() {
            out.push_str("\nSuggestion du chat 💡 :\n");
            out.push_str(&format!("{}\n", self.interpolate(self.def.suggestion).green()));
        }

        if !self.def.example.is_empty() {
            out.push_str("\nExemple recommandé :\n");
            out.push_str(&format!("{}\n", self.interpolate(self.def.example).blue()));
        }

        out.push_str("\nFin du jugement.\nLe chat te surveille.\n");
        out
    }

    /// The offending line with up to two preceding lines and a caret under
    /// the offending column. Synthetic positions produce no excerpt.
    fn context_excerpt(&self, source: &str) -> Option<String> {
        if self.pos.line == 0 {
            return None;
        }
        let lines: Vec<&str> = source.lines().collect();
        if self.pos.line > lines.len() {
            return None;
        }

        let first = self.pos.line.saturating_sub(2).max(1);
        let mut excerpt = String::new();
        for line_no in first..=self.pos.line {
            let marker = if line_no == self.pos.line { "> " } else { "  " };
            excerpt.push_str(&format!("{marker}{line_no:3} | {}\n", lines[line_no - 1]));
        }
        if self.pos.column > 0 {
            // "> 123 | " is 8 columns wide.
            let width = self.instruction.chars().count().max(1);
            excerpt.push_str(&format!(
                "{}{}\n",
                " ".repeat(8 + self.pos.column - 1),
                "^".repeat(width)
            ));
        }
        Some(excerpt)
    }
}

/// One-line summary; the full block comes from [`MeowError::render`].
impl fmt::Display for MeowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} (ligne {}, colonne {})",
            self.def.code,
            self.message_tech(),
            self.pos.line,
            self.pos.column
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolates_details_into_messages() {
        let err = MeowError::new("E200")
            .at(Position::new(3, 1))
            .with_detail("var_name", "chaton");
        assert_eq!(err.message_tech(), "Variable 'chaton' non définie.");
        assert!(err.message_meow().contains("chaton"));
    }

    #[test]
    fn unknown_code_falls_back_to_internal_error() {
        let err = MeowError::new("E424242");
        assert_eq!(err.code(), "E902");
    }

    #[test]
    fn critical_codes_are_not_catchable() {
        assert!(MeowError::new("E501").is_catchable());
        assert!(!MeowError::new("E901").is_catchable());
        assert!(!MeowError::new("E501").into_fatal().is_catchable());
    }

    #[test]
    fn renders_context_with_caret_under_column() {
        let source = "miaou\nx = 1\necrire x /\nmeow";
        let err = MeowError::new("E100")
            .at(Position::new(3, 10))
            .with_instruction("/");
        let rendered = err.render("script.miaou", source);
        assert!(rendered.contains(">   3 | ecrire x /"));
        assert!(rendered.contains("    1 | miaou"));
        let caret_line = rendered
            .lines()
            .find(|line| line.trim_start().starts_with('^') && line.trim_end().ends_with('^'))
            .expect("caret line");
        assert_eq!(caret_line.find('^'), Some(8 + 10 - 1));
        assert!(rendered.contains("Fin du jugement."));
    }

    #[test]
    fn synthetic_position_omits_context() {
        let err = MeowError::new("E002");
        let rendered = err.render("script.miaou", "miaou\n");
        assert!(!rendered.contains("Contexte :"));
    }
}
