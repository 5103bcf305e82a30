//! Unit conversion into the artifact's unit system.
//!
//! Artifacts use nm, ps, kJ/mol, rad, elementary charge and dalton. Unit
//! expressions combine names with `*`, `/`, `**` and parentheses, e.g.
//! `kilocalorie / mole / angstrom ** 2`.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use crate::error::{PerturbError, PerturbResult};
use crate::parameters::ParameterValue;

#[derive(Clone, Debug, PartialEq)]
pub struct UnitTable {
    factors: BTreeMap<String, f64>,
}

impl UnitTable {
    /// Factors converting each unit into MD units.
    pub fn md() -> Self {
        Self {
            factors: BTreeMap::new(),
        }
        .with_aliases(&["nanometer", "nanometers", "nm"], 1.0)
        .with_aliases(&["angstrom", "angstroms"], 0.1)
        .with_aliases(&["picometer", "picometers"], 1.0e-3)
        .with_aliases(&["picosecond", "picoseconds", "ps"], 1.0)
        .with_aliases(&["femtosecond", "femtoseconds", "fs"], 1.0e-3)
        .with_aliases(&["kilojoule", "kilojoules"], 1.0)
        .with_aliases(&["joule", "joules"], 1.0e-3)
        .with_aliases(&["kilocalorie", "kilocalories"], 4.184)
        .with_aliases(&["calorie", "calories"], 4.184e-3)
        .with_aliases(&["kilojoule_per_mole", "kilojoules_per_mole"], 1.0)
        .with_aliases(&["kilocalorie_per_mole", "kilocalories_per_mole"], 4.184)
        .with_aliases(&["mole", "moles", "mol"], 1.0)
        .with_aliases(&["radian", "radians"], 1.0)
        .with_aliases(&["degree", "degrees"], PI / 180.0)
        .with_aliases(&["elementary_charge", "e"], 1.0)
        .with_aliases(&["dalton", "daltons", "amu"], 1.0)
        .with_aliases(&["dimensionless"], 1.0)
    }

    pub fn with_aliases(self, names: &[&str], factor: f64) -> Self {
        names.iter().fold(self, |table, name| table.with_unit(name, factor))
    }

    pub fn with_unit(mut self, name: &str, factor: f64) -> Self {
        self.factors.insert(name.to_string(), factor);
        self
    }

    /// Factor converting one `expression` into MD units.
    pub fn factor(&self, expression: &str) -> PerturbResult<f64> {
        let tokens = tokenize(expression)?;
        let mut parser = Parser {
            table: self,
            expression,
            tokens,
            pos: 0,
        };
        let factor = parser.product()?;
        if parser.pos != parser.tokens.len() {
            return Err(unit_error(expression, "unexpected trailing input"));
        }
        Ok(factor)
    }

    pub fn to_md(&self, value: f64, unit: &str) -> PerturbResult<f64> {
        Ok(value * self.factor(unit)?)
    }

    /// Numeric magnitude of a parameter value in MD units; `None` for text.
    pub fn value_in_md(&self, value: &ParameterValue) -> PerturbResult<Option<f64>> {
        match value {
            ParameterValue::Quantity { value, unit } => self.to_md(*value, unit).map(Some),
            ParameterValue::Scalar(scalar) => Ok(scalar.as_f64()),
        }
    }
}

impl Default for UnitTable {
    fn default() -> Self {
        Self::md()
    }
}

fn unit_error(unit: &str, reason: impl Into<String>) -> PerturbError {
    PerturbError::Unit {
        unit: unit.to_string(),
        reason: reason.into(),
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Name(String),
    Number(f64),
    Times,
    Divide,
    Power,
    Open,
    Close,
}

fn tokenize(expression: &str) -> PerturbResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = expression.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '*' => {
                chars.next();
                if chars.peek() == Some(&'*') {
                    chars.next();
                    tokens.push(Token::Power);
                } else {
                    tokens.push(Token::Times);
                }
            }
            '/' => {
                chars.next();
                tokens.push(Token::Divide);
            }
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if !(c.is_ascii_alphanumeric() || c == '_') {
                        break;
                    }
                    name.push(c);
                    chars.next();
                }
                tokens.push(Token::Name(name));
            }
            c if c.is_ascii_digit() || c == '-' || c == '.' => {
                let mut text = String::new();
                text.push(c);
                chars.next();
                while let Some(&c) = chars.peek() {
                    if !(c.is_ascii_digit() || c == '.') {
                        break;
                    }
                    text.push(c);
                    chars.next();
                }
                let number = text
                    .parse::<f64>()
                    .map_err(|_| unit_error(expression, format!("bad number '{}'", text)))?;
                tokens.push(Token::Number(number));
            }
            other => return Err(unit_error(expression, format!("unexpected character '{}'", other))),
        }
    }
    Ok(tokens)
}

/// product := power (('*' | '/') power)*
/// power   := atom ('**' number)?
/// atom    := name | number | '(' product ')'
struct Parser<'a> {
    table: &'a UnitTable,
    expression: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn product(&mut self) -> PerturbResult<f64> {
        let mut value = self.power()?;
        loop {
            match self.peek() {
                Some(Token::Times) => {
                    self.pos += 1;
                    value *= self.power()?;
                }
                Some(Token::Divide) => {
                    self.pos += 1;
                    value /= self.power()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn power(&mut self) -> PerturbResult<f64> {
        let base = self.atom()?;
        if self.peek() != Some(&Token::Power) {
            return Ok(base);
        }
        self.pos += 1;
        match self.next() {
            Some(Token::Number(exponent)) => Ok(base.powf(exponent)),
            _ => Err(unit_error(self.expression, "expected a number after '**'")),
        }
    }

    fn atom(&mut self) -> PerturbResult<f64> {
        match self.next() {
            Some(Token::Name(name)) => self
                .table
                .factors
                .get(&name)
                .copied()
                .ok_or_else(|| unit_error(self.expression, format!("unknown unit '{}'", name))),
            Some(Token::Number(n)) => Ok(n),
            Some(Token::Open) => {
                let value = self.product()?;
                match self.next() {
                    Some(Token::Close) => Ok(value),
                    _ => Err(unit_error(self.expression, "unbalanced parenthesis")),
                }
            }
            _ => Err(unit_error(self.expression, "expected a unit")),
        }
    }
}
