// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Strategy-driven chat-model selection.
//!
//! The router is a pure function of configuration plus the message under
//! consideration (and a per-process seeded RNG for the percentage draw).
//! It holds no reference back to the services that call it and never fails
//! a request: when the mapped model is unavailable it substitutes the local
//! model and says so in the decision.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use minerva_config::model::{RouterConfig, STRATEGY_BUSINESS_TYPE, STRATEGY_PERCENTAGE};
use minerva_core::{BusinessType, MinervaError, ProviderKind, RoutingDecision};

use crate::classifier::BusinessTypeDetector;

/// Routing strategy, parsed from configuration once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterStrategy {
    /// Random split: a share of requests goes to the remote model.
    Percentage,
    /// Deterministic: the detected business type picks the model.
    BusinessType,
}

impl FromStr for RouterStrategy {
    type Err = MinervaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            STRATEGY_PERCENTAGE => Ok(RouterStrategy::Percentage),
            STRATEGY_BUSINESS_TYPE => Ok(RouterStrategy::BusinessType),
            other => Err(MinervaError::Config(format!(
                "unknown router strategy '{other}', expected '{STRATEGY_PERCENTAGE}' or '{STRATEGY_BUSINESS_TYPE}'"
            ))),
        }
    }
}

/// Selects one chat model per request from policy and request features.
#[derive(Debug)]
pub struct ModelRouter {
    strategy: RouterStrategy,
    percentage_remote: u8,
    remote_types: HashSet<BusinessType>,
    detector: BusinessTypeDetector,
    local_model_id: String,
    /// `None` when no remote model is registered; every route then lands local.
    remote_model_id: Option<String>,
    rng: Mutex<StdRng>,
}

impl ModelRouter {
    /// Builds a router from configuration and the registered model ids.
    ///
    /// `remote_model_id` is `None` when the remote provider is not
    /// configured; the router then always substitutes the local model.
    pub fn new(
        config: &RouterConfig,
        local_model_id: String,
        remote_model_id: Option<String>,
    ) -> Result<Self, MinervaError> {
        let strategy = config.strategy.parse::<RouterStrategy>()?;

        if config.percentage_remote > 100 {
            return Err(MinervaError::Config(format!(
                "percentage_remote must be in [0, 100], got {}",
                config.percentage_remote
            )));
        }

        let mut remote_types = HashSet::new();
        for name in &config.remote_types {
            let ty = BusinessType::from_str(name).map_err(|_| {
                MinervaError::Config(format!("unknown business type '{name}' in remote_types"))
            })?;
            remote_types.insert(ty);
        }

        Ok(Self {
            strategy,
            percentage_remote: config.percentage_remote,
            remote_types,
            detector: BusinessTypeDetector::new(config),
            local_model_id,
            remote_model_id,
            rng: Mutex::new(StdRng::from_entropy()),
        })
    }

    /// Pins the RNG seed, for deterministic percentage-strategy tests.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Choose a model for the given message.
    ///
    /// Never fails: an unavailable remote model falls back to local and the
    /// substitution is reported in the decision's reason.
    pub fn route(&self, message: &str) -> RoutingDecision {
        let decision = match self.strategy {
            RouterStrategy::Percentage => self.route_by_percentage(),
            RouterStrategy::BusinessType => self.route_by_business_type(message),
        };

        debug!(
            model = decision.model_id.as_str(),
            provider = %decision.provider,
            reason = decision.reason.as_str(),
            "routed request"
        );

        decision
    }

    fn route_by_percentage(&self) -> RoutingDecision {
        let draw: u8 = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            rng.gen_range(0..100)
        };

        if draw < self.percentage_remote {
            match &self.remote_model_id {
                Some(remote) => RoutingDecision {
                    model_id: remote.clone(),
                    provider: ProviderKind::Remote,
                    business_type: None,
                    reason: format!("percentage draw {draw} < {}", self.percentage_remote),
                },
                None => self.local_fallback(
                    None,
                    format!(
                        "percentage draw {draw} < {} but remote model unavailable",
                        self.percentage_remote
                    ),
                ),
            }
        } else {
            RoutingDecision {
                model_id: self.local_model_id.clone(),
                provider: ProviderKind::Local,
                business_type: None,
                reason: format!("percentage draw {draw} >= {}", self.percentage_remote),
            }
        }
    }

    fn route_by_business_type(&self, message: &str) -> RoutingDecision {
        let business_type = self.detector.detect(message);

        if self.remote_types.contains(&business_type) {
            match &self.remote_model_id {
                Some(remote) => RoutingDecision {
                    model_id: remote.clone(),
                    provider: ProviderKind::Remote,
                    business_type: Some(business_type),
                    reason: format!("business type {business_type} maps to remote"),
                },
                None => self.local_fallback(
                    Some(business_type),
                    format!("business type {business_type} maps to remote but remote model unavailable"),
                ),
            }
        } else {
            RoutingDecision {
                model_id: self.local_model_id.clone(),
                provider: ProviderKind::Local,
                business_type: Some(business_type),
                reason: format!("business type {business_type} maps to local"),
            }
        }
    }

    fn local_fallback(
        &self,
        business_type: Option<BusinessType>,
        reason: String,
    ) -> RoutingDecision {
        warn!(reason = reason.as_str(), "substituting local model");
        RoutingDecision {
            model_id: self.local_model_id.clone(),
            provider: ProviderKind::Local,
            business_type,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router_with(strategy: &str, pct: u8, remote: bool) -> ModelRouter {
        let config = RouterConfig {
            strategy: strategy.to_string(),
            percentage_remote: pct,
            ..RouterConfig::default()
        };
        ModelRouter::new(
            &config,
            "qwen2.5:7b".into(),
            remote.then(|| "qwen-plus".to_string()),
        )
        .unwrap()
        .with_rng_seed(7)
    }

    #[test]
    fn percentage_zero_routes_everything_local() {
        let router = router_with("percentage", 0, true);
        for _ in 0..200 {
            let d = router.route("anything");
            assert_eq!(d.provider, ProviderKind::Local);
            assert_eq!(d.model_id, "qwen2.5:7b");
        }
    }

    #[test]
    fn percentage_hundred_routes_everything_remote() {
        let router = router_with("percentage", 100, true);
        for _ in 0..200 {
            let d = router.route("anything");
            assert_eq!(d.provider, ProviderKind::Remote);
            assert_eq!(d.model_id, "qwen-plus");
        }
    }

    #[test]
    fn percentage_split_hits_both_sides() {
        let router = router_with("percentage", 50, true);
        let mut local = 0;
        let mut remote = 0;
        for _ in 0..500 {
            match router.route("x").provider {
                ProviderKind::Local => local += 1,
                ProviderKind::Remote => remote += 1,
            }
        }
        assert!(local > 0, "expected some local routes");
        assert!(remote > 0, "expected some remote routes");
    }

    #[test]
    fn percentage_without_remote_substitutes_local() {
        let router = router_with("percentage", 100, false);
        let d = router.route("anything");
        assert_eq!(d.provider, ProviderKind::Local);
        assert!(d.reason.contains("unavailable"), "got: {}", d.reason);
    }

    #[test]
    fn business_type_complex_goes_remote() {
        let router = router_with("business_type", 0, true);
        let d = router.route("请分析这份年报的风险点");
        assert_eq!(d.provider, ProviderKind::Remote);
        assert_eq!(d.business_type, Some(BusinessType::ComplexQuery));
    }

    #[test]
    fn business_type_tool_calling_stays_local() {
        let router = router_with("business_type", 0, true);
        let d = router.route("帮我计算 2*3");
        assert_eq!(d.provider, ProviderKind::Local);
        assert_eq!(d.business_type, Some(BusinessType::ToolCalling));
    }

    #[test]
    fn business_type_long_context_goes_remote() {
        let router = router_with("business_type", 0, true);
        let msg = "字".repeat(300);
        let d = router.route(&msg);
        assert_eq!(d.provider, ProviderKind::Remote);
        assert_eq!(d.business_type, Some(BusinessType::LongContext));
    }

    #[test]
    fn business_type_without_remote_substitutes_local() {
        let router = router_with("business_type", 0, false);
        let d = router.route("请分析这份年报");
        assert_eq!(d.provider, ProviderKind::Local);
        assert!(d.reason.contains("unavailable"));
        assert_eq!(d.business_type, Some(BusinessType::ComplexQuery));
    }

    #[test]
    fn unmapped_type_resolves_local() {
        let router = router_with("business_type", 0, true);
        let d = router.route("你好");
        assert_eq!(d.provider, ProviderKind::Local);
        assert_eq!(d.business_type, Some(BusinessType::SimpleQa));
    }

    #[test]
    fn unknown_strategy_is_config_error() {
        let config = RouterConfig {
            strategy: "round_robin".into(),
            ..RouterConfig::default()
        };
        let err = ModelRouter::new(&config, "local".into(), None).unwrap_err();
        assert!(err.to_string().contains("round_robin"));
    }

    #[test]
    fn bad_remote_type_name_is_config_error() {
        let config = RouterConfig {
            strategy: "business_type".into(),
            remote_types: vec!["galaxy_brain".into()],
            ..RouterConfig::default()
        };
        let err = ModelRouter::new(&config, "local".into(), None).unwrap_err();
        assert!(err.to_string().contains("galaxy_brain"));
    }
}
