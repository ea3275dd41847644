//! Calculator tool — restricted arithmetic expression evaluation
//!
//! The token stream of the ORIGINAL input is validated against a closed
//! allow-list before anything is evaluated; identifiers outside the set are
//! rejected up front, so inputs like `require('fs')` never reach the
//! evaluator.

use crate::registry::{Tool, ToolResult};
use serde_json::{json, Value};

const ALLOWED_FUNCTIONS: [&str; 10] = [
    "sqrt", "sin", "cos", "tan", "log", "abs", "round", "ceil", "floor", "pow",
];
const ALLOWED_CONSTANTS: [&str; 2] = ["PI", "E"];

pub struct CalculatorTool;

#[async_trait::async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Evaluate an arithmetic expression. Supports + - * / % ** parentheses, \
         the constants PI and E, and sqrt/sin/cos/tan/log/abs/round/ceil/floor/pow."
    }

    fn is_read_only(&self) -> bool {
        true
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "Arithmetic expression, e.g. \"sqrt(144) + 3\""
                }
            },
            "required": ["expression"]
        })
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let expression = match args.get("expression").and_then(|v| v.as_str()) {
            Some(e) => e,
            None => return ToolResult::error("Missing required parameter: expression"),
        };
        match evaluate(expression) {
            Ok(value) => ToolResult::text(format_number(value)),
            Err(e) => ToolResult::error(e),
        }
    }
}

fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Power,
    LParen,
    RParen,
    Comma,
}

/// Tokenize and validate. Everything outside the closed set is an error
/// here, before evaluation.
fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                if chars.get(i + 1) == Some(&'*') {
                    tokens.push(Token::Power);
                    i += 2;
                } else {
                    tokens.push(Token::Star);
                    i += 1;
                }
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '%' => {
                tokens.push(Token::Percent);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let number = literal
                    .parse::<f64>()
                    .map_err(|_| format!("invalid number: {literal}"))?;
                tokens.push(Token::Number(number));
            }
            c if c.is_ascii_alphabetic() => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_alphanumeric() {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().collect();
                if !ALLOWED_FUNCTIONS.contains(&ident.as_str())
                    && !ALLOWED_CONSTANTS.contains(&ident.as_str())
                {
                    return Err(format!("identifier not allowed: {ident}"));
                }
                tokens.push(Token::Ident(ident));
            }
            other => return Err(format!("character not allowed: {other}")),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, token: Token) -> Result<(), String> {
        match self.next() {
            Some(t) if t == token => Ok(()),
            _ => Err(format!("expected {token:?}")),
        }
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<f64, String> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.next();
                    value += self.term()?;
                }
                Some(Token::Minus) => {
                    self.next();
                    value -= self.term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    // term := power (('*' | '/' | '%') power)*
    fn term(&mut self) -> Result<f64, String> {
        let mut value = self.power()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.next();
                    value *= self.power()?;
                }
                Some(Token::Slash) => {
                    self.next();
                    value /= self.power()?;
                }
                Some(Token::Percent) => {
                    self.next();
                    value %= self.power()?;
                }
                _ => return Ok(value),
            }
        }
    }

    // power := unary ('**' power)?   (right-associative)
    fn power(&mut self) -> Result<f64, String> {
        let base = self.unary()?;
        if matches!(self.peek(), Some(Token::Power)) {
            self.next();
            let exponent = self.power()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    // unary := '-' unary | primary
    fn unary(&mut self) -> Result<f64, String> {
        if matches!(self.peek(), Some(Token::Minus)) {
            self.next();
            return Ok(-self.unary()?);
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<f64, String> {
        match self.next() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::LParen) => {
                let value = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(value)
            }
            Some(Token::Ident(name)) => match name.as_str() {
                "PI" => Ok(std::f64::consts::PI),
                "E" => Ok(std::f64::consts::E),
                _ => {
                    self.expect(Token::LParen)?;
                    let first = self.expr()?;
                    let value = if name == "pow" {
                        self.expect(Token::Comma)?;
                        let second = self.expr()?;
                        first.powf(second)
                    } else {
                        apply_unary(&name, first)?
                    };
                    self.expect(Token::RParen)?;
                    Ok(value)
                }
            },
            other => Err(format!("unexpected token: {other:?}")),
        }
    }
}

fn apply_unary(name: &str, x: f64) -> Result<f64, String> {
    Ok(match name {
        "sqrt" => x.sqrt(),
        "sin" => x.sin(),
        "cos" => x.cos(),
        "tan" => x.tan(),
        "log" => x.ln(),
        "abs" => x.abs(),
        "round" => x.round(),
        "ceil" => x.ceil(),
        "floor" => x.floor(),
        _ => return Err(format!("unknown function: {name}")),
    })
}

pub fn evaluate(expression: &str) -> Result<f64, String> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err("empty expression".into());
    }
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        return Err("trailing input after expression".into());
    }
    if value.is_nan() {
        return Err("expression is not a number".into());
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic() {
        assert_eq!(evaluate("1 + 2 * 3").unwrap(), 7.0);
        assert_eq!(evaluate("(1 + 2) * 3").unwrap(), 9.0);
        assert_eq!(evaluate("10 % 4").unwrap(), 2.0);
        assert_eq!(evaluate("2 ** 10").unwrap(), 1024.0);
        assert_eq!(evaluate("2 ** 3 ** 2").unwrap(), 512.0);
        assert_eq!(evaluate("-4 + 6").unwrap(), 2.0);
    }

    #[test]
    fn functions_and_constants() {
        assert_eq!(evaluate("sqrt(144) + 3").unwrap(), 15.0);
        assert_eq!(evaluate("pow(2, 8)").unwrap(), 256.0);
        assert_eq!(evaluate("abs(-3.5)").unwrap(), 3.5);
        assert_eq!(evaluate("floor(2.9) + ceil(0.1)").unwrap(), 3.0);
        assert!((evaluate("cos(0) + sin(0)").unwrap() - 1.0).abs() < 1e-12);
        assert!((evaluate("PI").unwrap() - std::f64::consts::PI).abs() < 1e-12);
        assert!((evaluate("log(E)").unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_foreign_identifiers_before_evaluation() {
        assert!(evaluate("require('fs')").is_err());
        assert!(evaluate("process").is_err());
        assert!(evaluate("sqrtx(4)").is_err());
        assert!(evaluate("1; 2").is_err());
        assert!(evaluate("a + 1").is_err());
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(evaluate("").is_err());
        assert!(evaluate("1 +").is_err());
        assert!(evaluate("(1 + 2").is_err());
        assert!(evaluate("pow(2)").is_err());
        assert!(evaluate("1 2").is_err());
    }

    #[test]
    fn integer_like_results_format_without_fraction() {
        assert_eq!(format_number(15.0), "15");
        assert_eq!(format_number(2.5), "2.5");
    }
}
