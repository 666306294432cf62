// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Time and weather stub tools, kept for contract stability.

use async_trait::async_trait;
use chrono::Local;
use tracing::info;

use minerva_core::MinervaError;

use crate::tool::{Tool, ToolContext, ToolOutput};

/// Reports the current date and time.
pub struct GetCurrentTimeTool;

#[async_trait]
impl Tool for GetCurrentTimeTool {
    fn name(&self) -> &str {
        "getCurrentTime"
    }

    fn description(&self) -> &str {
        "获取当前的日期和时间"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn invoke(
        &self,
        _ctx: &ToolContext,
        _input: serde_json::Value,
    ) -> Result<ToolOutput, MinervaError> {
        info!("getCurrentTime");
        let now = Local::now().format("%Y-%m-%d %H:%M:%S %A");
        Ok(ToolOutput::ok(format!("当前时间: {now}")))
    }
}

/// Canned weather answer; a real provider slots in behind the same name.
pub struct GetWeatherTool;

#[async_trait]
impl Tool for GetWeatherTool {
    fn name(&self) -> &str {
        "getWeather"
    }

    fn description(&self) -> &str {
        "查询指定城市的天气情况，需要提供城市名称"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "city": {"type": "string", "description": "城市名称，例如：北京"}
            },
            "required": ["city"]
        })
    }

    async fn invoke(
        &self,
        _ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<ToolOutput, MinervaError> {
        let city = input["city"].as_str().unwrap_or("").trim();
        info!(city, "getWeather");

        if city.is_empty() {
            return Ok(ToolOutput::error("请提供城市名称，例如：北京、上海、广州等。"));
        }

        Ok(ToolOutput::ok(format!(
            "{city} 的天气: 晴转多云，气温 15-25°C，微风"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::context as ctx;

    #[tokio::test]
    async fn time_tool_reports_timestamp() {
        let output = GetCurrentTimeTool
            .invoke(&ctx(), serde_json::json!({}))
            .await
            .unwrap();
        assert!(output.content.starts_with("当前时间: "));
    }

    #[tokio::test]
    async fn weather_tool_echoes_city() {
        let output = GetWeatherTool
            .invoke(&ctx(), serde_json::json!({"city": "北京"}))
            .await
            .unwrap();
        assert!(output.content.contains("北京 的天气"));
    }

    #[tokio::test]
    async fn weather_tool_requires_city() {
        let output = GetWeatherTool
            .invoke(&ctx(), serde_json::json!({"city": ""}))
            .await
            .unwrap();
        assert!(output.is_error);
        assert!(output.content.contains("请提供城市名称"));
    }
}
