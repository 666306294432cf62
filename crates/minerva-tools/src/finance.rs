// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Financial calculation tools.
//!
//! The model extracts parameters; these tools parse them (tolerating
//! Chinese units and percent signs), validate ranges, and run the standard
//! formulas: equal-instalment amortization, IRR/NPV by Newton iteration,
//! bond pricing and duration, and Black-Scholes option pricing with an
//! Abramowitz-Stegun normal CDF.

use async_trait::async_trait;
use tracing::info;

use minerva_core::MinervaError;

use crate::tool::{Tool, ToolContext, ToolOutput};

/// Newton iteration tolerance shared by IRR and YTM solvers.
const NEWTON_TOLERANCE: f64 = 1e-10;
/// Newton iteration cap.
const NEWTON_MAX_ITERATIONS: u32 = 1000;
/// Rate bounds keeping the iteration away from the pole at -1.
const RATE_MIN: f64 = -0.99;
const RATE_MAX: f64 = 10.0;

// --- Parameter parsing -------------------------------------------------

/// Parses an amount from a JSON number or a string with Chinese units.
///
/// Accepts `100000`, `"100000"`, `"10万"`, `"十万"`, `"¥100,000"`, `"1000元"`.
pub fn parse_amount(value: &serde_json::Value) -> Result<f64, String> {
    if let Some(n) = value.as_f64() {
        return Ok(n);
    }
    let raw = value.as_str().ok_or("金额不能为空")?;
    let cleaned: String = raw
        .replace(['¥', '￥'], "")
        .replace([',', '，'], "")
        .replace('元', "")
        .trim()
        .to_string();
    if cleaned.is_empty() {
        return Err("金额不能为空".to_string());
    }

    match cleaned.as_str() {
        "十万" => return Ok(100_000.0),
        "百万" => return Ok(1_000_000.0),
        "千万" => return Ok(10_000_000.0),
        _ => {}
    }

    if let Some(number_part) = cleaned.strip_suffix('万') {
        let n: f64 = number_part.trim().parse().map_err(|_| format!("无法解析金额 '{raw}'"))?;
        return Ok(n * 10_000.0);
    }
    if let Some(number_part) = cleaned.strip_suffix('千') {
        let n: f64 = number_part.trim().parse().map_err(|_| format!("无法解析金额 '{raw}'"))?;
        return Ok(n * 1_000.0);
    }

    cleaned.parse().map_err(|_| format!("无法解析金额 '{raw}'"))
}

/// Parses a rate from a JSON number or string.
///
/// Values above 1 are treated as percentages: `5`, `"5%"`, and `0.05` all
/// mean five percent.
pub fn parse_rate(value: &serde_json::Value) -> Result<f64, String> {
    let n = if let Some(n) = value.as_f64() {
        n
    } else {
        let raw = value.as_str().ok_or("利率不能为空")?;
        let cleaned = raw.replace(['%', '％'], "").replace("百分之", "");
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            return Err("利率不能为空".to_string());
        }
        cleaned.parse().map_err(|_| format!("无法解析利率 '{raw}'"))?
    };
    Ok(if n > 1.0 { n / 100.0 } else { n })
}

/// Parses a term in years from a JSON number or string like `"10年"`.
pub fn parse_years(value: &serde_json::Value) -> Result<f64, String> {
    if let Some(n) = value.as_f64() {
        return Ok(n);
    }
    let raw = value.as_str().ok_or("期限不能为空")?;
    let cleaned = raw.replace('年', "").replace("期限", "").replace('期', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Err("期限不能为空".to_string());
    }
    cleaned.parse().map_err(|_| format!("无法解析期限 '{raw}'"))
}

fn param_error(error: &str, hint: &str) -> ToolOutput {
    ToolOutput::error(format!("{error}\n\n{hint}"))
}

// --- Core math ---------------------------------------------------------

/// Net present value of `cash_flows` at `rate`; flow 0 is undiscounted.
pub fn npv(cash_flows: &[f64], rate: f64) -> f64 {
    cash_flows
        .iter()
        .enumerate()
        .map(|(t, cf)| cf / (1.0 + rate).powi(t as i32))
        .sum()
}

fn npv_derivative(cash_flows: &[f64], rate: f64) -> f64 {
    cash_flows
        .iter()
        .enumerate()
        .skip(1)
        .map(|(t, cf)| {
            let df = 1.0 / (1.0 + rate).powi(t as i32);
            -(t as f64) * cf * df / (1.0 + rate)
        })
        .sum()
}

/// Internal rate of return by Newton iteration, clamped to [-0.99, 10].
pub fn irr(cash_flows: &[f64]) -> Result<f64, String> {
    if cash_flows.len() < 2 {
        return Err("现金流至少需要2个数据点".to_string());
    }

    let mut guess = 0.1;
    for _ in 0..NEWTON_MAX_ITERATIONS {
        let value = npv(cash_flows, guess);
        let derivative = npv_derivative(cash_flows, guess);
        if derivative.abs() < NEWTON_TOLERANCE {
            break;
        }
        let next = guess - value / derivative;
        if (next - guess).abs() < NEWTON_TOLERANCE {
            return Ok(next.clamp(RATE_MIN, RATE_MAX));
        }
        guess = next.clamp(RATE_MIN, RATE_MAX);
    }
    // Not fully converged; the last iterate is still a usable approximation.
    Ok(guess)
}

/// One row of an equal-instalment schedule.
#[derive(Debug, Clone)]
pub struct ScheduleRow {
    pub period: u32,
    pub payment: f64,
    pub principal: f64,
    pub interest: f64,
    pub balance: f64,
}

/// Equal-instalment amortization schedule.
pub fn amortization_schedule(
    principal: f64,
    annual_rate: f64,
    years: u32,
    frequency: u32,
) -> Vec<ScheduleRow> {
    let period_rate = annual_rate / frequency as f64;
    let total_periods = years * frequency;
    let factor = (1.0 + period_rate).powi(total_periods as i32);
    let payment = principal * period_rate * factor / (factor - 1.0);

    let mut schedule = Vec::with_capacity(total_periods as usize);
    let mut balance = principal;
    for period in 1..=total_periods {
        let interest = balance * period_rate;
        let principal_part = payment - interest;
        balance = (balance - principal_part).max(0.0);
        schedule.push(ScheduleRow {
            period,
            payment,
            principal: principal_part,
            interest,
            balance,
        });
    }
    schedule
}

/// Fixed-rate bond price: present value of coupons plus face value.
pub fn bond_price(
    face_value: f64,
    coupon_rate: f64,
    yield_rate: f64,
    years: f64,
    frequency: u32,
) -> f64 {
    let periodic_coupon = face_value * coupon_rate / frequency as f64;
    let periodic_yield = yield_rate / frequency as f64;
    let total_periods = (years * frequency as f64) as i32;

    let mut price = 0.0;
    for t in 1..=total_periods {
        price += periodic_coupon / (1.0 + periodic_yield).powi(t);
    }
    price + face_value / (1.0 + periodic_yield).powi(total_periods)
}

/// Macaulay duration: present-value-weighted average time to cash flows.
pub fn macaulay_duration(
    price: f64,
    face_value: f64,
    coupon_rate: f64,
    yield_rate: f64,
    years: f64,
    frequency: u32,
) -> f64 {
    let periodic_yield = yield_rate / frequency as f64;
    let periodic_coupon = face_value * coupon_rate / frequency as f64;
    let total_periods = (years * frequency as f64) as i32;

    let mut weighted_time = 0.0;
    for t in 1..=total_periods {
        let time_years = t as f64 / frequency as f64;
        let mut cash_flow = periodic_coupon;
        if t == total_periods {
            cash_flow += face_value;
        }
        weighted_time += time_years * cash_flow / (1.0 + periodic_yield).powi(t);
    }
    weighted_time / price
}

/// Modified duration from Macaulay duration.
pub fn modified_duration(macaulay: f64, yield_rate: f64, frequency: u32) -> f64 {
    macaulay / (1.0 + yield_rate / frequency as f64)
}

/// Bond convexity.
pub fn convexity(
    price: f64,
    face_value: f64,
    coupon_rate: f64,
    yield_rate: f64,
    years: f64,
    frequency: u32,
) -> f64 {
    let periodic_yield = yield_rate / frequency as f64;
    let periodic_coupon = face_value * coupon_rate / frequency as f64;
    let total_periods = (years * frequency as f64) as i32;

    let mut sum = 0.0;
    for t in 1..=total_periods {
        let mut cash_flow = periodic_coupon;
        if t == total_periods {
            cash_flow += face_value;
        }
        let pv = cash_flow / (1.0 + periodic_yield).powi(t);
        sum += t as f64 * (t + 1) as f64 * pv;
    }
    sum / (price * (1.0 + periodic_yield).powi(2) * (frequency * frequency) as f64)
}

/// Standard normal CDF, Abramowitz-Stegun approximation (formula 7.1.26).
pub fn norm_cdf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs() / std::f64::consts::SQRT_2;

    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();

    0.5 * (1.0 + sign * y)
}

fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * std::f64::consts::PI).sqrt()
}

fn d1(spot: f64, strike: f64, t: f64, rate: f64, vol: f64) -> f64 {
    ((spot / strike).ln() + (rate + 0.5 * vol * vol) * t) / (vol * t.sqrt())
}

/// Black-Scholes call price.
pub fn black_scholes_call(spot: f64, strike: f64, t: f64, rate: f64, vol: f64) -> f64 {
    let d1 = d1(spot, strike, t, rate, vol);
    let d2 = d1 - vol * t.sqrt();
    spot * norm_cdf(d1) - strike * (-rate * t).exp() * norm_cdf(d2)
}

/// Option Greeks for a call.
pub struct Greeks {
    pub delta: f64,
    pub gamma: f64,
    pub vega: f64,
    pub theta: f64,
    pub rho: f64,
}

pub fn call_greeks(spot: f64, strike: f64, t: f64, rate: f64, vol: f64) -> Greeks {
    let d1 = d1(spot, strike, t, rate, vol);
    let d2 = d1 - vol * t.sqrt();
    Greeks {
        delta: norm_cdf(d1),
        gamma: norm_pdf(d1) / (spot * vol * t.sqrt()),
        vega: spot * norm_pdf(d1) * t.sqrt(),
        theta: (-spot * norm_pdf(d1) * vol / (2.0 * t.sqrt())
            - rate * strike * (-rate * t).exp() * norm_cdf(d2))
            / 365.0,
        rho: strike * t * (-rate * t).exp() * norm_cdf(d2) / 100.0,
    }
}

// --- Tools -------------------------------------------------------------

/// Equal-instalment loan calculator.
pub struct CalculateAmortizationTool;

#[async_trait]
impl Tool for CalculateAmortizationTool {
    fn name(&self) -> &str {
        "calculateAmortization"
    }

    fn description(&self) -> &str {
        "【贷款计算器】计算房贷、车贷、个人贷款的每月还款额（等额本息）。\
         适用场景：用户提到贷款、本金、利率、期限、还款、月供、摊销、房贷、车贷等，\
         询问每月还款多少。参数：1)贷款本金（如100000或10万）2)年利率（如0.05或5%）\
         3)贷款期限年数（如10或10年）。返回每月还款额、还款总额、总利息和还款计划表。"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "principal": {"type": "number", "description": "贷款本金，如 100000 或 '10万'"},
                "annualRate": {"type": "number", "description": "年利率，如 0.05 或 '5%'"},
                "termYears": {"type": "integer", "description": "贷款期限（年），如 10 或 '10年'"}
            },
            "required": ["principal", "annualRate", "termYears"]
        })
    }

    async fn invoke(
        &self,
        _ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<ToolOutput, MinervaError> {
        let principal = match parse_amount(&input["principal"]) {
            Ok(v) => v,
            Err(e) => return Ok(param_error(&e, "请提供有效的贷款本金，例如：100000 或 10万")),
        };
        let rate = match parse_rate(&input["annualRate"]) {
            Ok(v) => v,
            Err(e) => return Ok(param_error(&e, "请提供有效的年利率，例如：0.05 或 5%")),
        };
        let years = match parse_years(&input["termYears"]) {
            Ok(v) => v as u32,
            Err(e) => return Ok(param_error(&e, "请提供有效的贷款期限，例如：10 或 10年")),
        };

        info!(principal, rate, years, "calculateAmortization");

        if principal <= 0.0 {
            return Ok(param_error("本金必须大于0", "请提供有效的贷款本金，例如：100000 或 10万"));
        }
        if rate <= 0.0 || rate > 1.0 {
            return Ok(param_error("利率必须在 0%-100% 之间", "请提供有效的年利率，例如：0.05 或 5%"));
        }
        if years == 0 || years > 50 {
            return Ok(param_error("期限必须在 1-50 年之间", "请提供有效的贷款期限，例如：10 或 10年"));
        }

        let frequency = 12;
        let schedule = amortization_schedule(principal, rate, years, frequency);
        let total_payments = years * frequency;
        let monthly_payment = schedule[0].payment;
        let total_paid = monthly_payment * total_payments as f64;
        let total_interest = total_paid - principal;

        let mut result = String::new();
        result.push_str("等额本息还款计算\n\n");
        result.push_str(&format!("- 贷款本金: {principal:.2} 元\n"));
        result.push_str(&format!("- 年利率: {:.2}%\n", rate * 100.0));
        result.push_str(&format!("- 期限: {years} 年（{total_payments} 期，每月还款）\n\n"));
        result.push_str(&format!("每月还款额: {monthly_payment:.2} 元\n"));
        result.push_str(&format!("还款总额: {total_paid:.2} 元\n"));
        result.push_str(&format!(
            "总利息: {total_interest:.2} 元（占总还款的 {:.1}%）\n\n",
            total_interest / total_paid * 100.0
        ));

        result.push_str("还款明细（前12期与最后6期）:\n");
        result.push_str("| 期数 | 还款额 | 本金 | 利息 | 剩余本金 |\n");
        result.push_str("|:----:|:------:|:----:|:----:|:--------:|\n");
        let last_start = total_payments.saturating_sub(6);
        for row in &schedule {
            if row.period <= 12 || row.period > last_start {
                if row.period > 12 && row.period == last_start + 1 && last_start > 12 {
                    result.push_str("| ... | ... | ... | ... | ... |\n");
                }
                result.push_str(&format!(
                    "| {} | {:.2} | {:.2} | {:.2} | {:.2} |\n",
                    row.period, row.payment, row.principal, row.interest, row.balance
                ));
            }
        }
        result.push_str("\n等额本息：每期还款金额固定，初期利息占比大，后期本金占比大。");

        Ok(ToolOutput::ok(result))
    }
}

/// Internal-rate-of-return calculator over a CSV of cash flows.
pub struct CalculateIrrTool;

#[async_trait]
impl Tool for CalculateIrrTool {
    fn name(&self) -> &str {
        "calculateIRR"
    }

    fn description(&self) -> &str {
        "计算投资内部收益率IRR。参数：现金流数组（逗号分隔），第一个是初始投资（负数），\
         后面是各期回报。例如：-10000,2500,2500,2500,2500,2500"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "cashflows": {
                    "type": "string",
                    "description": "逗号分隔的现金流，如 -1000,200,200,200,200"
                }
            },
            "required": ["cashflows"]
        })
    }

    async fn invoke(
        &self,
        _ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<ToolOutput, MinervaError> {
        let raw = input["cashflows"].as_str().unwrap_or("");
        info!(cashflows = raw, "calculateIRR");

        let mut cash_flows = Vec::new();
        for part in raw.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }
            match trimmed.parse::<f64>() {
                Ok(v) => cash_flows.push(v),
                Err(_) => {
                    return Ok(param_error(
                        "现金流格式错误",
                        "请提供逗号分隔的数字，例如：-1000,200,200,200,200",
                    ))
                }
            }
        }

        if cash_flows.len() < 2 {
            return Ok(param_error("现金流至少需要2个数据点", "格式示例：-1000,200,200,200,200"));
        }

        let rate = match irr(&cash_flows) {
            Ok(r) => r,
            Err(e) => return Ok(param_error(&e, "请确保现金流格式正确，第一个应该是负数（初始投资）")),
        };

        let mut result = String::new();
        result.push_str("内部收益率 (IRR) 计算\n\n现金流:\n");
        for (i, cf) in cash_flows.iter().enumerate() {
            let label = if i == 0 {
                "初始投资".to_string()
            } else {
                format!("第{i}期")
            };
            result.push_str(&format!("- {label}: {cf:.2} 元\n"));
        }
        result.push_str(&format!("\nIRR (内部收益率): {:.2}%\n\n", rate * 100.0));

        if rate > 0.10 {
            result.push_str(&format!("优秀的投资机会，IRR 为 {:.2}%，高于一般投资回报率。", rate * 100.0));
        } else if rate > 0.05 {
            result.push_str(&format!("良好的投资机会，IRR 为 {:.2}%。", rate * 100.0));
        } else if rate > 0.0 {
            result.push_str(&format!("IRR 为 {:.2}%，请与您的资金成本比较后再决策。", rate * 100.0));
        } else {
            result.push_str("IRR 为负，该项目不可行。");
        }
        result.push_str("\n决策标准：IRR > 资金成本 → 接受项目；IRR < 资金成本 → 拒绝项目");

        Ok(ToolOutput::ok(result))
    }
}

fn parse_bond_args(
    input: &serde_json::Value,
) -> Result<(f64, f64, f64, f64), ToolOutput> {
    let face_value = parse_amount(&input["faceValue"])
        .map_err(|e| param_error(&e, "请提供有效的债券面值，例如：1000"))?;
    let coupon_rate = parse_rate(&input["couponRate"])
        .map_err(|e| param_error(&e, "请提供有效的票面利率，例如：0.05 或 5%"))?;
    let yield_rate = parse_rate(&input["yield"])
        .map_err(|e| param_error(&e, "请提供有效的到期收益率，例如：0.04 或 4%"))?;
    let years = parse_years(&input["years"])
        .map_err(|e| param_error(&e, "请提供有效的期限，例如：5 或 5年"))?;

    if face_value <= 0.0 {
        return Err(param_error("面值必须大于0", "请提供有效的债券面值，例如：1000"));
    }
    if !(0.0..=1.0).contains(&coupon_rate) {
        return Err(param_error("票面利率必须在 0%-100% 之间", "例如：0.05 或 5%"));
    }
    if !(0.0..=1.0).contains(&yield_rate) {
        return Err(param_error("到期收益率必须在 0%-100% 之间", "例如：0.04 或 4%"));
    }
    if years <= 0.0 || years > 100.0 {
        return Err(param_error("期限必须在 1-100 年之间", "例如：5 或 5年"));
    }
    Ok((face_value, coupon_rate, yield_rate, years))
}

/// Fixed-rate bond pricer (semi-annual coupons).
pub struct CalculateBondPriceTool;

#[async_trait]
impl Tool for CalculateBondPriceTool {
    fn name(&self) -> &str {
        "calculateBondPrice"
    }

    fn description(&self) -> &str {
        "计算债券价格。参数：1)面值（如1000）2)票面利率（如0.05或5%）\
         3)到期收益率YTM（如0.04或4%）4)期限年数（如5或5年）。默认半年付息。"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "faceValue": {"type": "number", "description": "债券面值，如 1000"},
                "couponRate": {"type": "number", "description": "票面利率，如 0.05 或 '5%'"},
                "yield": {"type": "number", "description": "到期收益率，如 0.04 或 '4%'"},
                "years": {"type": "number", "description": "期限年数，如 5"}
            },
            "required": ["faceValue", "couponRate", "yield", "years"]
        })
    }

    async fn invoke(
        &self,
        _ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<ToolOutput, MinervaError> {
        let (face_value, coupon_rate, yield_rate, years) = match parse_bond_args(&input) {
            Ok(args) => args,
            Err(output) => return Ok(output),
        };
        info!(face_value, coupon_rate, yield_rate, years, "calculateBondPrice");

        let frequency = 2;
        let price = bond_price(face_value, coupon_rate, yield_rate, years, frequency);
        let price_percent = price / face_value * 100.0;
        let status = if price > face_value {
            "溢价交易（票面利率 > 到期收益率）"
        } else if price < face_value {
            "折价交易（票面利率 < 到期收益率）"
        } else {
            "平价交易（票面利率 = 到期收益率）"
        };

        let mut result = String::new();
        result.push_str("债券价格计算\n\n");
        result.push_str(&format!("- 面值: {face_value:.2} 元\n"));
        result.push_str(&format!("- 票面利率: {:.2}%\n", coupon_rate * 100.0));
        result.push_str(&format!("- 到期收益率 (YTM): {:.2}%\n", yield_rate * 100.0));
        result.push_str(&format!("- 期限: {years:.1} 年，每年付息 {frequency} 次\n\n"));
        result.push_str(&format!("债券价格: {price:.2} 元（面值的 {price_percent:.2}%）\n"));
        result.push_str(&format!("状态: {status}"));

        Ok(ToolOutput::ok(result))
    }
}

/// Bond duration and convexity calculator.
pub struct CalculateBondDurationTool;

#[async_trait]
impl Tool for CalculateBondDurationTool {
    fn name(&self) -> &str {
        "calculateBondDuration"
    }

    fn description(&self) -> &str {
        "计算债券久期和凸度。参数：1)面值（如1000）2)票面利率（如0.05或5%）\
         3)到期收益率YTM（如0.04或4%）4)期限年数（如5或5年）。"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "faceValue": {"type": "number", "description": "债券面值，如 1000"},
                "couponRate": {"type": "number", "description": "票面利率，如 0.05 或 '5%'"},
                "yield": {"type": "number", "description": "到期收益率，如 0.04 或 '4%'"},
                "years": {"type": "number", "description": "期限年数，如 5"}
            },
            "required": ["faceValue", "couponRate", "yield", "years"]
        })
    }

    async fn invoke(
        &self,
        _ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<ToolOutput, MinervaError> {
        let (face_value, coupon_rate, yield_rate, years) = match parse_bond_args(&input) {
            Ok(args) => args,
            Err(output) => return Ok(output),
        };
        info!(face_value, coupon_rate, yield_rate, years, "calculateBondDuration");

        let frequency = 2;
        let price = bond_price(face_value, coupon_rate, yield_rate, years, frequency);
        let macaulay = macaulay_duration(price, face_value, coupon_rate, yield_rate, years, frequency);
        let modified = modified_duration(macaulay, yield_rate, frequency);
        let convexity = convexity(price, face_value, coupon_rate, yield_rate, years, frequency);

        let mut result = String::new();
        result.push_str("债券久期分析\n\n");
        result.push_str(&format!("- 面值: {face_value:.2} 元\n"));
        result.push_str(&format!("- 票面利率: {:.2}%\n", coupon_rate * 100.0));
        result.push_str(&format!("- 到期收益率 (YTM): {:.2}%\n", yield_rate * 100.0));
        result.push_str(&format!("- 期限: {years:.1} 年，每年付息 {frequency} 次\n\n"));
        result.push_str(&format!("- 债券价格: {price:.2} 元\n"));
        result.push_str(&format!("- Macaulay 久期: {macaulay:.2} 年\n"));
        result.push_str(&format!("- 修正久期: {modified:.4}\n"));
        result.push_str(&format!("- 凸度: {convexity:.4}\n\n"));
        result.push_str(&format!(
            "修正久期 {modified:.4} 表示利率每变动 1%，债券价格约反向变动 {:.2}%。",
            modified
        ));

        Ok(ToolOutput::ok(result))
    }
}

/// Black-Scholes call option pricer with Greeks.
pub struct CalculateOptionPriceTool;

#[async_trait]
impl Tool for CalculateOptionPriceTool {
    fn name(&self) -> &str {
        "calculateOptionPrice"
    }

    fn description(&self) -> &str {
        "计算期权价格（Black-Scholes模型，看涨期权）。参数：1)标的价格（如100）\
         2)行权价（如105）3)期限年数（如1）4)无风险利率（如0.03或3%）\
         5)波动率（如0.25或25%）。"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "spot": {"type": "number", "description": "标的资产价格，如 100"},
                "strike": {"type": "number", "description": "行权价格，如 105"},
                "years": {"type": "number", "description": "到期时间（年），如 1"},
                "rate": {"type": "number", "description": "无风险利率，如 0.03 或 '3%'"},
                "volatility": {"type": "number", "description": "波动率，如 0.25 或 '25%'"}
            },
            "required": ["spot", "strike", "years", "rate", "volatility"]
        })
    }

    async fn invoke(
        &self,
        _ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<ToolOutput, MinervaError> {
        let spot = match parse_amount(&input["spot"]) {
            Ok(v) => v,
            Err(e) => return Ok(param_error(&e, "请提供有效的标的价格，例如：100")),
        };
        let strike = match parse_amount(&input["strike"]) {
            Ok(v) => v,
            Err(e) => return Ok(param_error(&e, "请提供有效的行权价，例如：105")),
        };
        let years = match parse_years(&input["years"]) {
            Ok(v) => v,
            Err(e) => return Ok(param_error(&e, "请提供有效的期限，例如：1 或 1年")),
        };
        let rate = match parse_rate(&input["rate"]) {
            Ok(v) => v,
            Err(e) => return Ok(param_error(&e, "请提供有效的无风险利率，例如：0.03 或 3%")),
        };
        let volatility = match parse_rate(&input["volatility"]) {
            Ok(v) => v,
            Err(e) => return Ok(param_error(&e, "请提供有效的波动率，例如：0.25 或 25%")),
        };

        info!(spot, strike, years, rate, volatility, "calculateOptionPrice");

        if spot <= 0.0 || strike <= 0.0 {
            return Ok(param_error("标的价格和行权价必须大于0", "请提供有效的价格，例如：100、105"));
        }
        if years <= 0.0 || years > 50.0 {
            return Ok(param_error("期限必须在 0-50 年之间", "例如：1 或 1年"));
        }
        if !(0.0..=1.0).contains(&rate) {
            return Ok(param_error("无风险利率必须在 0%-100% 之间", "例如：0.03 或 3%"));
        }
        if volatility <= 0.0 || volatility > 5.0 {
            return Ok(param_error("波动率必须在 0%-500% 之间", "例如：0.25 或 25%"));
        }

        let price = black_scholes_call(spot, strike, years, rate, volatility);
        let greeks = call_greeks(spot, strike, years, rate, volatility);

        let mut result = String::new();
        result.push_str("Black-Scholes 期权定价（看涨期权）\n\n");
        result.push_str(&format!("- 标的资产价格 (S): {spot:.2} 元\n"));
        result.push_str(&format!("- 行权价格 (K): {strike:.2} 元\n"));
        result.push_str(&format!("- 到期时间 (T): {years:.2} 年\n"));
        result.push_str(&format!("- 无风险利率 (r): {:.2}%\n", rate * 100.0));
        result.push_str(&format!("- 波动率 (sigma): {:.2}%\n\n", volatility * 100.0));
        result.push_str(&format!("期权价格: {price:.4} 元\n\n"));
        result.push_str("Greeks 风险指标:\n");
        result.push_str(&format!(
            "- Delta: {:.4}（标的价格变动1元，期权价格变动 {:.4} 元）\n",
            greeks.delta, greeks.delta
        ));
        result.push_str(&format!("- Gamma: {:.4}（Delta 对标的价格的敏感度）\n", greeks.gamma));
        result.push_str(&format!(
            "- Vega: {:.4}（波动率变动1%，期权价格变动 {:.4} 元）\n",
            greeks.vega,
            greeks.vega / 100.0
        ));
        result.push_str(&format!("- Theta: {:.6}（时间流逝1天的价格变动）\n", greeks.theta));
        result.push_str(&format!("- Rho: {:.4}（利率变动1%的价格变动）\n", greeks.rho));

        Ok(ToolOutput::ok(result))
    }
}
