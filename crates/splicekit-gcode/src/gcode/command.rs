//! G-Code instruction model
//!
//! One [`GcodeCommand`] is created per input line. It keeps the raw text so
//! an instruction that is never touched serializes back byte for byte, and
//! rebuilds its text from the mnemonic and parameter list once modified.

use std::fmt;

use super::BlockClass;

/// Mnemonics that move the tool head
const MOVEMENT_COMMANDS: [&str; 4] = ["G0", "G1", "G2", "G3"];

/// Firmware retract / unretract mnemonics
const FIRMWARE_RETRACT: &str = "G10";
const FIRMWARE_UNRETRACT: &str = "G11";

/// A single letter-prefixed parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Upper-case parameter letter
    pub letter: char,
    /// Numeric value, `None` when the text is not a number
    pub value: Option<f64>,
    text: String,
}

impl Parameter {
    fn parse(field: &str) -> Option<Self> {
        let mut chars = field.chars();
        let letter = chars.next()?.to_ascii_uppercase();
        if !letter.is_ascii_alphabetic() {
            return None;
        }
        let text = chars.as_str().to_string();
        Some(Self {
            letter,
            value: text.parse::<f64>().ok(),
            text,
        })
    }

    fn numeric(letter: char, value: f64) -> Self {
        Self {
            letter,
            value: Some(value),
            text: format_number(value),
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.letter, self.text)
    }
}

/// Format a number the way rewritten parameters are written
///
/// Up to 5 decimals, trailing zeros trimmed.
pub fn format_number(value: f64) -> String {
    let text = format!("{:.5}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    match text {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

/// Normalize a mnemonic such as `g01` into `G1`
fn normalize_mnemonic(token: &str) -> Option<String> {
    let mut chars = token.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    if !letter.is_ascii_alphabetic() {
        return None;
    }
    let number = chars.as_str();
    if let Ok(n) = number.parse::<u32>() {
        return Some(format!("{}{}", letter, n));
    }
    if !number.is_empty() && number.parse::<f64>().is_ok() {
        return Some(format!("{}{}", letter, number));
    }
    None
}

/// A parsed line of the instruction stream
#[derive(Debug, Clone)]
pub struct GcodeCommand {
    /// Raw line as read (trimmed)
    line: String,
    /// Normalized mnemonic, `None` for comments, blank and opaque lines
    command: Option<String>,
    parameters: Vec<Parameter>,
    /// Comment text following `;`, without the marker
    comment: Option<String>,
    /// Line was a pure comment in the input
    comment_line: bool,
    /// Text must be rebuilt from the parsed fields
    modified: bool,
    /// Semantic block the instruction belongs to
    pub class: BlockClass,
}

impl GcodeCommand {
    /// Parse one line of the stream
    ///
    /// Lines whose first token is not a letter followed by a number are kept
    /// as opaque passthrough text with no mnemonic.
    pub fn parse(line: impl Into<String>) -> Self {
        let line = line.into().trim().to_string();
        let (code, comment) = match line.find(';') {
            Some(pos) => (line[..pos].trim(), Some(line[pos + 1..].to_string())),
            None => (line.as_str(), None),
        };

        let mut command = None;
        let mut parameters: Vec<Parameter> = Vec::new();

        let mut fields = code.split_whitespace();
        if let Some(first) = fields.next() {
            if let Some(mnemonic) = normalize_mnemonic(first) {
                command = Some(mnemonic);
                for field in fields {
                    match Parameter::parse(field) {
                        Some(param) => {
                            let existing = parameters.iter_mut().find(|p| p.letter == param.letter);
                            match existing {
                                Some(existing) => *existing = param,
                                None => parameters.push(param),
                            }
                        }
                        None => {
                            command = None;
                            parameters.clear();
                            break;
                        }
                    }
                }
            }
        }

        Self {
            comment_line: code.is_empty() && comment.is_some(),
            command,
            parameters,
            comment,
            modified: false,
            class: BlockClass::Normal,
            line,
        }
    }

    /// Build a command from a mnemonic, used for generated code
    pub fn new(command: &str) -> Self {
        Self::parse(command)
    }

    /// The raw input text
    pub fn raw(&self) -> &str {
        &self.line
    }

    /// The normalized mnemonic
    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    /// Replace the mnemonic, keeping the parameters
    pub fn set_command(&mut self, command: &str) {
        if self.command.is_some() {
            self.command = normalize_mnemonic(command);
            self.modified = true;
        }
    }

    /// Comment text, if any
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Whether the line is a comment (in the input or after suppression)
    pub fn is_comment(&self) -> bool {
        self.command.is_none() && self.comment.is_some()
    }

    /// Whether the input line was a pure comment
    pub fn is_comment_line(&self) -> bool {
        self.comment_line
    }

    /// Parameters in their written order
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Numeric value of a parameter
    pub fn parameter(&self, letter: char) -> Option<f64> {
        self.parameters
            .iter()
            .find(|p| p.letter == letter)
            .and_then(|p| p.value)
    }

    /// Numeric value of a parameter, or `default` when absent
    pub fn get_parameter(&self, letter: char, default: f64) -> f64 {
        self.parameter(letter).unwrap_or(default)
    }

    /// Whether the parameter letter is present
    pub fn has_parameter(&self, letter: char) -> bool {
        self.parameters.iter().any(|p| p.letter == letter)
    }

    /// Insert or replace a parameter
    pub fn update_parameter(&mut self, letter: char, value: f64) {
        if self.command.is_none() {
            return;
        }
        let param = Parameter::numeric(letter, value);
        match self.parameters.iter_mut().find(|p| p.letter == letter) {
            Some(existing) => *existing = param,
            None => self.parameters.push(param),
        }
        self.modified = true;
    }

    /// Remove a parameter if present
    pub fn remove_parameter(&mut self, letter: char) {
        let before = self.parameters.len();
        self.parameters.retain(|p| p.letter != letter);
        if self.parameters.len() != before {
            self.modified = true;
        }
    }

    pub fn x(&self) -> Option<f64> {
        self.parameter('X')
    }

    pub fn y(&self) -> Option<f64> {
        self.parameter('Y')
    }

    pub fn z(&self) -> Option<f64> {
        self.parameter('Z')
    }

    pub fn e(&self) -> Option<f64> {
        self.parameter('E')
    }

    pub fn f(&self) -> Option<f64> {
        self.parameter('F')
    }

    /// Append text to the trailing comment
    pub fn add_comment(&mut self, text: &str) {
        match &mut self.comment {
            Some(comment) => comment.push_str(text),
            None => self.comment = Some(text.to_string()),
        }
        self.modified = true;
    }

    /// Move the whole instruction into a comment
    ///
    /// Idempotent: comments, blank and opaque lines are left untouched.
    pub fn suppress(&mut self, reason: &str) {
        if self.command.is_none() {
            return;
        }
        let original = self.to_string();
        self.comment = Some(format!("-- removed [{}] - {}", reason, original));
        self.command = None;
        self.parameters.clear();
        self.modified = true;
    }

    /// Linear or arc move
    pub fn is_movement(&self) -> bool {
        self.command
            .as_deref()
            .is_some_and(|c| MOVEMENT_COMMANDS.contains(&c))
    }

    fn is_extruder_only(&self) -> bool {
        self.is_movement() && self.x().is_none() && self.y().is_none() && self.z().is_none()
    }

    /// Filament retract: negative extruder-only move or firmware retract
    pub fn is_retract(&self) -> bool {
        if self.command() == Some(FIRMWARE_RETRACT) {
            return true;
        }
        self.is_extruder_only() && self.e().is_some_and(|e| e < 0.0)
    }

    /// Filament unretract: positive extruder-only move or firmware unretract
    pub fn is_unretract(&self) -> bool {
        if self.command() == Some(FIRMWARE_UNRETRACT) {
            return true;
        }
        self.is_extruder_only() && self.e().is_some_and(|e| e > 0.0)
    }

    /// Tool number selected by a `Tn` instruction
    pub fn tool_selection(&self) -> Option<usize> {
        self.command
            .as_deref()
            .and_then(|c| c.strip_prefix('T'))
            .and_then(|n| n.parse::<usize>().ok())
    }
}

impl fmt::Display for GcodeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.modified {
            return write!(f, "{}", self.line);
        }
        let mut text = String::new();
        if let Some(command) = &self.command {
            text.push_str(command);
            for param in &self.parameters {
                text.push(' ');
                text.push_str(&param.to_string());
            }
        }
        if let Some(comment) = &self.comment {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push(';');
            text.push_str(comment);
        }
        write!(f, "{}", text)
    }
}
