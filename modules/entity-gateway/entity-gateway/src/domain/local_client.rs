//! Local (in-process) client for the entity gateway.

use std::sync::Arc;

use async_trait::async_trait;
use entity_gateway_sdk::{
    EntityGatewayClient, GatewayError, GraphQLRequest, QueryPlan, RestRequest,
};
use tablegate_security::SecurityContext;

use super::RequestPipeline;
use super::error::log_and_convert;

/// Local client wrapping the request pipeline.
pub struct EntityGatewayLocalClient {
    pipeline: Arc<RequestPipeline>,
}

impl EntityGatewayLocalClient {
    #[must_use]
    pub fn new(pipeline: Arc<RequestPipeline>) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl EntityGatewayClient for EntityGatewayLocalClient {
    async fn plan_rest(
        &self,
        ctx: &SecurityContext,
        request: RestRequest,
    ) -> Result<QueryPlan, GatewayError> {
        self.pipeline
            .plan_rest(ctx, &request)
            .map_err(|e| log_and_convert("plan_rest", e))
    }

    async fn plan_graphql(
        &self,
        ctx: &SecurityContext,
        request: GraphQLRequest,
    ) -> Result<QueryPlan, GatewayError> {
        self.pipeline
            .plan_graphql(ctx, &request)
            .map_err(|e| log_and_convert("plan_graphql", e))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::PipelineConfig;
    use crate::test_support::fixture_metadata;
    use entity_gateway_sdk::SubStatusCode;
    use http::StatusCode;

    fn client() -> Arc<dyn EntityGatewayClient> {
        let pipeline = RequestPipeline::new(fixture_metadata(), PipelineConfig::default());
        Arc::new(EntityGatewayLocalClient::new(Arc::new(pipeline)))
    }

    #[tokio::test]
    async fn plans_through_trait_object() {
        let plan = client()
            .plan_rest(&SecurityContext::anonymous(), RestRequest::get("/Book/id/1"))
            .await
            .unwrap();
        assert_eq!(plan.entity, "Book");
    }

    #[tokio::test]
    async fn errors_use_external_surface() {
        let err = client()
            .plan_rest(&SecurityContext::anonymous(), RestRequest::get("/Nope"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.sub_status(), SubStatusCode::EntityNotFound);
        assert_eq!(err.to_payload()["error"]["code"], "EntityNotFound");
    }
}
