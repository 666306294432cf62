// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Basic math calculator tool.
//!
//! Evaluates numeric expressions over `+ - * / ^ %`, parentheses, unary
//! minus, and the functions `sin cos tan sqrt log` (natural log, radians).
//! Requests that look like loan or financial calculations are refused with
//! guidance pointing at the specialised tools; the keyword set is
//! configuration data.

use async_trait::async_trait;
use tracing::{info, warn};

use minerva_core::MinervaError;

use crate::tool::{Tool, ToolContext, ToolOutput};

/// Evaluates basic math expressions; refuses financial calculations.
pub struct CalculateTool {
    financial_keywords: Vec<String>,
}

impl CalculateTool {
    pub fn new(financial_keywords: Vec<String>) -> Self {
        Self { financial_keywords }
    }

    fn looks_financial(&self, expression: &str) -> bool {
        self.financial_keywords
            .iter()
            .any(|k| expression.contains(k.as_str()))
    }
}

const GUIDANCE: &str = "这是贷款/金融计算，不是基础数学计算。\n\n\
请使用专门的金融计算工具：\n\
- calculateAmortization：贷款每月还款额、还款总额、总利息与完整还款计划\n\
- calculateIRR：投资内部收益率\n\
- calculateBondPrice / calculateBondDuration：债券价格与久期\n\
- calculateOptionPrice：期权价格\n\n\
使用示例：本金100000元，年利率5%，10年期";

const USAGE_HINT: &str = "无法识别的数学表达式。\n\n\
提示：此工具仅支持基础数学计算。\n\
支持的运算：+、-、*、/、^、%、括号，以及 sin()、cos()、tan()、sqrt()、log()";

#[async_trait]
impl Tool for CalculateTool {
    fn name(&self) -> &str {
        "calculate"
    }

    fn description(&self) -> &str {
        "【数学计算器】计算基础数学表达式，仅支持纯数学运算：加减乘除、幂、取余、\
         三角函数(sin/cos/tan)、根号(sqrt)、对数(log)。不处理贷款、本金、利率、\
         还款、月供、摊销等金融计算；这类问题请使用 calculateAmortization 等金融工具。"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "数学表达式，例如 1+1、2*(3+4)、sin(0.5)"
                }
            },
            "required": ["expression"]
        })
    }

    async fn invoke(
        &self,
        _ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<ToolOutput, MinervaError> {
        let expression = input["expression"].as_str().unwrap_or("").trim();
        info!(expression, "calculate");

        if expression.is_empty() {
            return Ok(ToolOutput::error(USAGE_HINT));
        }

        if self.looks_financial(expression) {
            warn!(expression, "financial request routed away from calculator");
            return Ok(ToolOutput::ok(GUIDANCE));
        }

        match evaluate(expression) {
            Ok(value) => Ok(ToolOutput::ok(format_number(value))),
            Err(reason) => {
                warn!(expression, reason = reason.as_str(), "calculation failed");
                Ok(ToolOutput::error(format!("计算失败: {reason}\n\n{USAGE_HINT}")))
            }
        }
    }
}

/// Evaluates an expression string. Errors carry a short reason.
pub fn evaluate(expression: &str) -> Result<f64, String> {
    let mut parser = Parser::new(expression);
    let value = parser.expr()?;
    parser.skip_whitespace();
    if parser.pos < parser.chars.len() {
        return Err(format!("意外的字符 '{}'", parser.chars[parser.pos]));
    }
    if !value.is_finite() {
        return Err("计算结果无效".to_string());
    }
    Ok(value)
}

/// Formats a result the way users expect: integers without decimals,
/// moderate values with up to four decimals, extremes in scientific form.
pub fn format_number(value: f64) -> String {
    if value == value.trunc() && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    if value.abs() < 1e-4 || value.abs() > 1e6 {
        return format!("{value:.4e}");
    }
    let formatted = format!("{value:.4}");
    formatted.trim_end_matches('0').trim_end_matches('.').to_string()
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.chars.len() && self.chars[self.pos].is_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> Result<f64, String> {
        let mut value = self.term()?;
        loop {
            if self.eat('+') {
                value += self.term()?;
            } else if self.eat('-') {
                value -= self.term()?;
            } else {
                return Ok(value);
            }
        }
    }

    fn term(&mut self) -> Result<f64, String> {
        let mut value = self.factor()?;
        loop {
            if self.eat('*') {
                value *= self.factor()?;
            } else if self.eat('/') {
                let divisor = self.factor()?;
                if divisor == 0.0 {
                    return Err("除数不能为零".to_string());
                }
                value /= divisor;
            } else if self.eat('%') {
                let divisor = self.factor()?;
                if divisor == 0.0 {
                    return Err("除数不能为零".to_string());
                }
                value %= divisor;
            } else {
                return Ok(value);
            }
        }
    }

    // Unary minus binds looser than '^': -2^2 == -(2^2).
    fn factor(&mut self) -> Result<f64, String> {
        if self.eat('-') {
            return Ok(-self.factor()?);
        }
        self.power()
    }

    fn power(&mut self) -> Result<f64, String> {
        let base = self.primary()?;
        if self.eat('^') {
            let exponent = self.factor()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<f64, String> {
        match self.peek() {
            Some('(') => {
                self.pos += 1;
                let value = self.expr()?;
                if !self.eat(')') {
                    return Err("缺少右括号".to_string());
                }
                Ok(value)
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) if c.is_ascii_alphabetic() => self.function(),
            Some(c) => Err(format!("意外的字符 '{c}'")),
            None => Err("表达式不完整".to_string()),
        }
    }

    fn number(&mut self) -> Result<f64, String> {
        self.skip_whitespace();
        let start = self.pos;
        while self.pos < self.chars.len()
            && (self.chars[self.pos].is_ascii_digit() || self.chars[self.pos] == '.')
        {
            self.pos += 1;
        }
        let literal: String = self.chars[start..self.pos].iter().collect();
        literal
            .parse::<f64>()
            .map_err(|_| format!("无效的数字 '{literal}'"))
    }

    fn function(&mut self) -> Result<f64, String> {
        self.skip_whitespace();
        let start = self.pos;
        while self.pos < self.chars.len() && self.chars[self.pos].is_ascii_alphabetic() {
            self.pos += 1;
        }
        let name: String = self.chars[start..self.pos].iter().collect();
        if !self.eat('(') {
            return Err(format!("函数 {name} 缺少参数"));
        }
        let arg = self.expr()?;
        if !self.eat(')') {
            return Err("缺少右括号".to_string());
        }
        match name.as_str() {
            "sin" => Ok(arg.sin()),
            "cos" => Ok(arg.cos()),
            "tan" => Ok(arg.tan()),
            "sqrt" => {
                if arg < 0.0 {
                    Err("负数不能开平方".to_string())
                } else {
                    Ok(arg.sqrt())
                }
            }
            "log" => {
                if arg <= 0.0 {
                    Err("对数的参数必须为正数".to_string())
                } else {
                    Ok(arg.ln())
                }
            }
            other => Err(format!("未知函数 '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::context as ctx;

    fn tool() -> CalculateTool {
        CalculateTool::new(vec![
            "本金".into(),
            "利率".into(),
            "贷款".into(),
            "月供".into(),
            "IRR".into(),
        ])
    }

    #[tokio::test]
    async fn one_plus_one_is_two() {
        let output = tool()
            .invoke(&ctx(), serde_json::json!({"expression": "1+1"}))
            .await
            .unwrap();
        assert!(!output.is_error);
        assert_eq!(output.content, "2");
    }

    #[tokio::test]
    async fn financial_request_gets_guidance() {
        let output = tool()
            .invoke(
                &ctx(),
                serde_json::json!({"expression": "本金100000元 利率3% 30年"}),
            )
            .await
            .unwrap();
        assert!(output.content.contains("calculateAmortization"));
    }

    #[tokio::test]
    async fn blank_expression_is_error() {
        let output = tool()
            .invoke(&ctx(), serde_json::json!({"expression": "  "}))
            .await
            .unwrap();
        assert!(output.is_error);
    }

    #[test]
    fn precedence_and_parens() {
        assert_eq!(evaluate("2+3*4").unwrap(), 14.0);
        assert_eq!(evaluate("(2+3)*4").unwrap(), 20.0);
        assert_eq!(evaluate("10%3").unwrap(), 1.0);
        assert_eq!(evaluate("2^10").unwrap(), 1024.0);
        // Right-associative exponent, unary minus binds looser.
        assert_eq!(evaluate("2^3^2").unwrap(), 512.0);
        assert_eq!(evaluate("-2^2").unwrap(), -4.0);
    }

    #[test]
    fn functions_evaluate() {
        assert!((evaluate("sin(0)").unwrap()).abs() < 1e-12);
        assert!((evaluate("cos(0)").unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(evaluate("sqrt(16)").unwrap(), 4.0);
        assert!((evaluate("log(2.718281828459045)").unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn parse_errors_are_reported() {
        assert!(evaluate("1+").is_err());
        assert!(evaluate("(1+2").is_err());
        assert!(evaluate("foo(1)").is_err());
        assert!(evaluate("1/0").is_err());
        assert!(evaluate("sqrt(-1)").is_err());
        assert!(evaluate("1+1 extra").is_err());
    }

    #[test]
    fn formatting_rules() {
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(1.0 / 3.0), "0.3333");
        assert!(format_number(1e-7).contains('e'));
        assert!(format_number(1.23e9).contains('e'));
    }
}
