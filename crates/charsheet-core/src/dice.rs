//! Dice expressions like `2d6 + 3 - d4`.

use crate::error::{Result, SheetError};
use rand::Rng;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

/// Upper bound on dice per term, keeps output printable.
pub const MAX_DICE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sign {
    Plus,
    Minus,
}

impl Sign {
    pub fn parse(token: &str) -> Option<Sign> {
        match token {
            "+" => Some(Sign::Plus),
            "-" => Some(Sign::Minus),
            _ => None,
        }
    }

    pub fn apply(self, value: i64) -> i64 {
        match self {
            Sign::Plus => value,
            Sign::Minus => -value,
        }
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sign::Plus => f.write_str("+"),
            Sign::Minus => f.write_str("-"),
        }
    }
}

/// Split command arguments into terms and `+`/`-` separators, so that
/// `["2d6+3", "-", "d4"]` and `["2d6", "+", "3", "-", "d4"]` read the same.
pub fn tokenize<S: AsRef<str>>(args: &[S]) -> Vec<String> {
    let mut tokens = Vec::new();
    for arg in args {
        let mut current = String::new();
        for c in arg.as_ref().chars() {
            if c == '+' || c == '-' || c.is_whitespace() {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                if !c.is_whitespace() {
                    tokens.push(c.to_string());
                }
            } else {
                current.push(c);
            }
        }
        if !current.is_empty() {
            tokens.push(current);
        }
    }
    tokens
}

/// Read `TERM (SEP TERM)*`; the first term is implicitly positive.
pub fn split_signed<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<(Sign, String)>> {
    if tokens.is_empty() {
        return Err(SheetError::EmptyExpression);
    }
    let mut out = Vec::with_capacity(tokens.len() / 2 + 1);
    let mut sign = Sign::Plus;
    for (idx, token) in tokens.iter().enumerate() {
        let token = token.as_ref();
        if idx % 2 == 0 {
            out.push((sign, token.to_string()));
            continue;
        }
        sign = Sign::parse(token).ok_or_else(|| SheetError::InvalidSeparator(token.to_string()))?;
        if idx == tokens.len() - 1 {
            return Err(SheetError::TrailingSeparator(token.to_string()));
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Terms
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Term {
    Dice { count: u32, sides: u32 },
    Constant(u32),
}

static DICE_RE: OnceLock<Regex> = OnceLock::new();

fn dice_re() -> &'static Regex {
    DICE_RE.get_or_init(|| Regex::new(r"^(?i)(\d*)d(\d+)$|^(\d+)$").unwrap())
}

impl std::str::FromStr for Term {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || SheetError::InvalidDiceTerm(s.to_string());
        let caps = dice_re().captures(s).ok_or_else(invalid)?;
        if let Some(constant) = caps.get(3) {
            return constant.as_str().parse().map(Term::Constant).map_err(|_| invalid());
        }
        let count = match caps.get(1).map(|m| m.as_str()) {
            Some("") | None => 1,
            Some(n) => n.parse().map_err(|_| invalid())?,
        };
        let sides: u32 = caps[2].parse().map_err(|_| invalid())?;
        if sides == 0 || count > MAX_DICE {
            return Err(invalid());
        }
        Ok(Term::Dice { count, sides })
    }
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiceExpr {
    pub terms: Vec<(Sign, Term)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollOutcome {
    /// Rendered expression with every individual die, e.g. `2d6(3,5) + 4`.
    pub expression: String,
    pub total: i64,
}

impl DiceExpr {
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Self> {
        let tokens = tokenize(args);
        let terms = split_signed(&tokens)?
            .into_iter()
            .map(|(sign, t)| t.parse().map(|term| (sign, term)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { terms })
    }

    pub fn roll<R: Rng>(&self, rng: &mut R) -> RollOutcome {
        let mut expression = String::new();
        let mut total: i64 = 0;
        for (i, (sign, term)) in self.terms.iter().enumerate() {
            if i > 0 {
                expression.push_str(&format!(" {sign} "));
            }
            match *term {
                Term::Constant(n) => {
                    total += sign.apply(n as i64);
                    expression.push_str(&n.to_string());
                }
                Term::Dice { count, sides } => {
                    let rolls: Vec<u32> = (0..count).map(|_| rng.gen_range(1..=sides)).collect();
                    let sum: i64 = rolls.iter().map(|r| *r as i64).sum();
                    total += sign.apply(sum);
                    let listed: Vec<String> = rolls.iter().map(u32::to_string).collect();
                    expression.push_str(&format!("{count}d{sides}({})", listed.join(",")));
                }
            }
        }
        RollOutcome { expression, total }
    }
}

/// One `d4` roll, used by ability checks.
pub fn d4<R: Rng>(rng: &mut R) -> i64 {
    rng.gen_range(1..=4)
}
