// src/transport/static_resolver.rs

//! Template-based endpoint resolver.
//!
//! Stands in for a managed lookup service when the broker address is known
//! up front. The template may contain a `{region}` placeholder, which is
//! substituted on every lookup:
//!
//! ```text
//! mqtts://iot.{region}.example.com:8883  +  ap-northeast-2
//!   → mqtts://iot.ap-northeast-2.example.com:8883
//! ```

use crate::{Endpoint, EndpointResolver, Result, SimError};

const REGION_PLACEHOLDER: &str = "{region}";

/// Resolver that renders a fixed endpoint template.
#[derive(Debug, Clone)]
pub struct StaticResolver {
    template: String,
}

impl StaticResolver {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    fn render(&self, region: &str) -> Result<Endpoint> {
        // ---
        if self.template.contains(REGION_PLACEHOLDER) && region.trim().is_empty() {
            return Err(SimError::EndpointResolution(
                "template needs a region but none was given".into(),
            ));
        }

        let rendered = self.template.replace(REGION_PLACEHOLDER, region);
        if rendered.trim().is_empty() {
            return Err(SimError::EndpointResolution("empty endpoint template".into()));
        }

        Ok(Endpoint::from(rendered))
    }
}

#[async_trait::async_trait]
impl EndpointResolver for StaticResolver {
    async fn resolve_data_endpoint(&self, region: &str) -> Result<Endpoint> {
        self.render(region)
    }
}
