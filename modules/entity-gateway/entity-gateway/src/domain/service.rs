//! Request pipeline orchestration.

use std::sync::Arc;

use entity_gateway_sdk::{
    ColumnRef, EntityMetadata, GraphQLRequest, MetadataProvider, Operation, QueryPlan, RestRequest,
};
use serde_json::Value;
use tablegate_security::SecurityContext;
use tracing::instrument;

use super::authorization::{self, Permit};
use super::context::RequestContext;
use super::error::{PipelineError, RequestError};
use super::parser;
use super::plan_builder::{self, KeySelection, PlanInputs};
use super::relationships::{RelationshipResolver, ResolvedJoin};
use super::validator;
use crate::config::PipelineConfig;

/// Runs parser, validator, relationship resolver, authorization and plan
/// builder, in that order, stopping at the first failure.
///
/// Holds only shared read-only state; one instance serves concurrent
/// requests.
pub struct RequestPipeline {
    metadata: Arc<dyn MetadataProvider>,
    config: PipelineConfig,
}

impl RequestPipeline {
    #[must_use]
    pub fn new(metadata: Arc<dyn MetadataProvider>, config: PipelineConfig) -> Self {
        Self { metadata, config }
    }

    /// Plan a REST request: `/{entity}/{key route}?{query}` plus body.
    ///
    /// # Errors
    ///
    /// [`PipelineError`] from the first failing stage.
    #[instrument(skip_all, fields(method = %request.method, path = %request.path))]
    pub fn plan_rest(
        &self,
        ctx: &SecurityContext,
        request: &RestRequest,
    ) -> Result<QueryPlan, PipelineError> {
        let operation = parser::operation_for_method(&request.method)
            .ok_or_else(|| RequestError::UnsupportedMethod(request.method.to_string()))?;
        let (entity_path, route) = parser::parse_resource_path(&request.path)?;

        let entity = self.metadata.entity_for_rest_path(entity_path)?;
        if !entity.rest.enabled {
            return Err(RequestError::NotExposed {
                entity: entity.name.clone(),
                transport: "REST",
            }
            .into());
        }

        let mut context = RequestContext::new(entity.name.as_str(), operation);
        context.append_primary_key_route(route)?;
        context.is_list = context.primary_key_predicates.is_empty();

        if let Some(query) = request.query.as_deref() {
            let options = parser::parse_query_string(query)?;
            if !options.is_empty() && operation != Operation::Read {
                return Err(RequestError::QueryOptionsNotAllowed.into());
            }
            context.apply_query_options(options);
        }

        if operation.has_body() {
            context.mutation_values = body_object(operation, request.body.as_ref())?;
        }

        self.run(ctx, &entity, context)
    }

    /// Plan one GraphQL query or mutation field.
    ///
    /// # Errors
    ///
    /// [`PipelineError`] from the first failing stage.
    #[instrument(skip_all, fields(entity = %request.entity, operation = %request.operation))]
    pub fn plan_graphql(
        &self,
        ctx: &SecurityContext,
        request: &GraphQLRequest,
    ) -> Result<QueryPlan, PipelineError> {
        let entity = self.metadata.entity(&request.entity)?;
        if !entity.graphql_enabled {
            return Err(RequestError::NotExposed {
                entity: entity.name.clone(),
                transport: "GraphQL",
            }
            .into());
        }

        let mut context = RequestContext::new(entity.name.as_str(), request.operation);
        context.is_list = request.is_list;
        context.primary_key_predicates = parser::parse_arguments(&request.key_arguments)?;
        if !request.selection.is_empty() {
            context.requested_fields = Some(request.selection.clone());
        }
        context.related.clone_from(&request.related);
        context.first = request.first;

        if request.operation.has_body() {
            context.mutation_values = body_object(request.operation, request.input.as_ref())?;
        }

        self.run(ctx, &entity, context)
    }

    /// Plan an already populated request context.
    ///
    /// # Errors
    ///
    /// [`PipelineError`] from the first failing stage.
    #[instrument(skip_all, fields(entity = %context.entity_name, operation = %context.operation))]
    pub fn plan(
        &self,
        ctx: &SecurityContext,
        context: RequestContext,
    ) -> Result<QueryPlan, PipelineError> {
        let entity = self.metadata.entity(&context.entity_name)?;
        self.run(ctx, &entity, context)
    }

    fn run(
        &self,
        ctx: &SecurityContext,
        entity: &EntityMetadata,
        mut context: RequestContext,
    ) -> Result<QueryPlan, PipelineError> {
        let operation = context.operation;
        check_addressing(&mut context)?;

        let key = if context.is_list || operation == Operation::Create {
            KeySelection::Collection
        } else {
            KeySelection::Item(validator::validate(&context, &entity.table)?)
        };

        let alias = context.aliases.next_alias();
        let resolver = RelationshipResolver::new(self.metadata.as_ref());
        let resolved = context
            .related
            .iter()
            .map(|name| resolver.resolve(name, entity, &alias, &mut context.aliases))
            .collect::<Result<Vec<_>, _>>()?;

        let role = ctx.effective_role()?;
        let claims = ctx.claims();
        let permit = authorization::authorize(entity, &role, operation, claims)?;

        if operation.has_body() {
            authorization::check_mutation_fields(&permit, &entity.table, &context.mutation_values)?;
        }
        authorization::check_order_fields(
            &permit,
            &entity.table,
            context.order_by.iter().map(|o| o.column.as_str()),
        )?;
        context.fields_to_return = authorization::project_fields(
            &permit,
            &entity.table,
            context.requested_fields.as_deref(),
        )?;
        context.policy_predicate = permit.policy;

        let joins = resolved
            .into_iter()
            .map(|join| authorize_join(join, &role, ctx))
            .collect::<Result<Vec<_>, _>>()?;

        let limit = if context.is_list && operation == Operation::Read {
            Some(self.config.page_size(context.first)?)
        } else {
            None
        };

        tracing::debug!(
            entity = %entity.name,
            role = %role,
            joins = joins.len(),
            "request authorized"
        );

        Ok(plan_builder::build_query_plan(
            &context,
            entity,
            PlanInputs {
                key,
                alias,
                joins,
                limit,
            },
        ))
    }
}

/// Creates never carry a key; every other operation needs one unless it
/// is a list read. Paging and ordering need a list.
fn check_addressing(context: &mut RequestContext) -> Result<(), RequestError> {
    let operation = context.operation;
    let has_key = !context.primary_key_predicates.is_empty();

    if operation == Operation::Create {
        if has_key {
            return Err(RequestError::KeyNotAllowed(operation));
        }
        context.is_list = false;
    } else if context.is_list {
        if operation != Operation::Read {
            return Err(RequestError::KeyRequired(operation));
        }
        if has_key {
            return Err(RequestError::KeyNotAllowed(operation));
        }
    }
    if !context.is_list && (context.first.is_some() || !context.order_by.is_empty()) {
        return Err(RequestError::PagingOnItem);
    }
    Ok(())
}

fn body_object(
    operation: Operation,
    body: Option<&Value>,
) -> Result<serde_json::Map<String, Value>, RequestError> {
    match body {
        None => Err(RequestError::MissingBody(operation)),
        Some(Value::Object(values)) => Ok(values.clone()),
        Some(_) => Err(RequestError::BodyNotObject),
    }
}

/// Related rows are read, so the target needs a `read` grant of its own.
fn authorize_join(
    join: ResolvedJoin,
    role: &str,
    ctx: &SecurityContext,
) -> Result<entity_gateway_sdk::JoinSpec, PipelineError> {
    let ResolvedJoin { mut spec, target } = join;
    let Permit { fields, policy, .. } =
        authorization::authorize(&target, role, Operation::Read, ctx.claims())?;

    let alias = spec.target_alias().unwrap_or_default().to_owned();
    spec.projection = fields
        .iter()
        .map(|f| ColumnRef::qualified(alias.as_str(), f.as_str()))
        .collect();
    spec.predicates = policy.map(|p| p.qualified(&alias)).into_iter().collect();
    Ok(spec)
}
