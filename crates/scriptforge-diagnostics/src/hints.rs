//! Hint engine: remediation hints for known Lua error families.
//!
//! Every rule is tested against the raw message on its own, so one message
//! can collect several hint blocks. A rule with `fallback_for` only fires
//! when the named rule did not.

use serde::Serialize;
use tracing::debug;

/// Qualifiers Lua puts in front of the name it failed on, e.g. `(global 'x')`.
const IDENTIFIER_MARKERS: &[(&str, &str)] = &[
    ("(global '", "global"),
    ("(field '", "field"),
    ("(local '", "local"),
    ("(upvalue '", "upvalue"),
    ("(method '", "method"),
    ("(constant '", "constant"),
];

/// Marker in front of the function name in `bad argument #1 to 'insert'`.
const FUNCTION_MARKER: &str = "to '";

/// How a rule pulls a name out of the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extract {
    None,
    Identifier,
    Function,
}

/// One known error family.
#[derive(Debug, Clone, Copy)]
pub struct HintRule {
    /// Stable rule name, shown in the report.
    pub name: &'static str,

    /// Substring the raw message must contain.
    pub pattern: &'static str,

    /// Fixed remediation lines.
    pub hints: &'static [&'static str],

    pub extract: Extract,

    /// Skip this rule when the named rule matched.
    pub fallback_for: Option<&'static str>,
}

/// Known error families, in report order.
pub const RULES: &[HintRule] = &[
    HintRule {
        name: "nil_call",
        pattern: "attempt to call a nil value",
        hints: &[
            "A function you called does not exist at this point.",
            "Check the spelling, and that the module providing it is registered and initialized.",
            "A function defined further down the file is only visible after its definition has run.",
        ],
        extract: Extract::Identifier,
        fallback_for: None,
    },
    HintRule {
        name: "nil_index",
        pattern: "attempt to index a nil value",
        hints: &[
            "A value you indexed with '.', ':' or '[]' is nil.",
            "Assign it before use, or guard the access with 'if value then ... end'.",
        ],
        extract: Extract::Identifier,
        fallback_for: None,
    },
    HintRule {
        name: "arithmetic",
        pattern: "attempt to perform arithmetic on",
        hints: &[
            "An operand of +, -, *, /, //, % or ^ is not a number.",
            "Convert strings with tonumber() and check for nil before doing arithmetic.",
        ],
        extract: Extract::Identifier,
        fallback_for: None,
    },
    HintRule {
        name: "concatenate",
        pattern: "attempt to concatenate",
        hints: &[
            "Only strings and numbers can be joined with '..'.",
            "Wrap other values in tostring() before concatenating.",
        ],
        extract: Extract::Identifier,
        fallback_for: None,
    },
    HintRule {
        name: "bad_argument",
        pattern: "bad argument",
        hints: &[
            "A function received an argument of the wrong type or value.",
            "Compare the call with the parameters the function expects.",
        ],
        extract: Extract::Function,
        fallback_for: None,
    },
    HintRule {
        name: "compare",
        pattern: "attempt to compare",
        hints: &[
            "Values of different types cannot be ordered with <, >, <= or >=.",
            "Make sure both sides are numbers or both are strings.",
        ],
        extract: Extract::None,
        fallback_for: None,
    },
    HintRule {
        name: "stack_overflow",
        pattern: "stack overflow",
        hints: &["A function keeps calling itself without reaching a base case."],
        extract: Extract::None,
        fallback_for: None,
    },
    HintRule {
        name: "index_value",
        pattern: "attempt to index a",
        hints: &["Only tables, strings and values with an __index metamethod can be indexed."],
        extract: Extract::Identifier,
        fallback_for: Some("nil_index"),
    },
    HintRule {
        name: "call_value",
        pattern: "attempt to call a",
        hints: &[
            "The value you called is not a function.",
            "Only functions and values with a __call metamethod can be called.",
        ],
        extract: Extract::Identifier,
        fallback_for: Some("nil_call"),
    },
];

/// A name pulled out of the message, e.g. global `doThing`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identifier {
    /// `global`, `field`, `local`, `upvalue`, `method`, `constant` or `function`.
    pub kind: String,
    pub name: String,
}

/// Hints contributed by one matching rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HintBlock {
    pub rule: &'static str,
    pub hints: Vec<String>,
    pub identifier: Option<Identifier>,
}

/// Test `message` against every rule and collect the matching blocks.
pub fn match_hints(message: &str) -> Vec<HintBlock> {
    let matched: Vec<&HintRule> = RULES
        .iter()
        .filter(|rule| message.contains(rule.pattern))
        .collect();

    matched
        .iter()
        .filter(|rule| {
            rule.fallback_for
                .map_or(true, |primary| !matched.iter().any(|m| m.name == primary))
        })
        .map(|rule| build_block(rule, message))
        .collect()
}

fn build_block(rule: &HintRule, message: &str) -> HintBlock {
    let identifier = match rule.extract {
        Extract::None => None,
        Extract::Identifier => extract_identifier(message),
        Extract::Function => extract_function(message),
    };

    let mut hints: Vec<String> = rule.hints.iter().map(|h| h.to_string()).collect();
    if let Some(identifier) = &identifier {
        debug!(
            rule = rule.name,
            kind = %identifier.kind,
            identifier = %identifier.name,
            "Extracted identifier from error message"
        );
        hints.push(format!("Offending name: {} '{}'.", identifier.kind, identifier.name));
    }

    HintBlock {
        rule: rule.name,
        hints,
        identifier,
    }
}

/// Find the first `(<kind> '<name>')` qualifier in the message.
pub fn extract_identifier(message: &str) -> Option<Identifier> {
    IDENTIFIER_MARKERS.iter().find_map(|(marker, kind)| {
        quoted_after(message, marker).map(|name| Identifier {
            kind: kind.to_string(),
            name,
        })
    })
}

/// Find the function named in `bad argument #n to '<name>'`.
pub fn extract_function(message: &str) -> Option<Identifier> {
    quoted_after(message, FUNCTION_MARKER).map(|name| Identifier {
        kind: "function".to_string(),
        name,
    })
}

fn quoted_after(message: &str, marker: &str) -> Option<String> {
    let start = message.find(marker)? + marker.len();
    let len = message[start..].find('\'')?;
    (len > 0).then(|| message[start..start + len].to_string())
}
