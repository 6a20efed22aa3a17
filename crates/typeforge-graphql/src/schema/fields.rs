//! Field and argument assembly.
//!
//! One schema field per accepted host member, assembled in a fixed order:
//! name (override else derived, normalized once), description, deprecation
//! reason, output type, arguments, directives, and finally the data fetcher,
//! which is bound to the field's coordinate in the session.

use std::sync::Arc;

use tracing::trace;

use crate::error::DeriveError;
use crate::fetch::{
    AsyncFetcher, BatchedFetcher, ConnectionFetcher, DataFetcher, ListPageValidator, MethodFetcher,
    OffsetConnectionStrategy, PageShapeValidator, PropertyFetcher, RelayMutationFetcher,
};
use crate::graph::{AppliedDirective, ArgumentDef, FieldDef, ObjectDef, SchemaTypeRef, TypeDef};
use crate::host::{DirectiveUse, FieldSpec, HostTypeSpec, MethodSpec, TypeShape};
use crate::naming::{derive_field_name, to_graphql_name};
use crate::schema::retriever::TypeRetriever;
use crate::session::BuildSession;
use crate::typefn::{member_type, TypeKind};

/// The schema name a method will be exposed under: the explicit override,
/// else the accessor-stripped, normalized member name.
pub(crate) fn method_field_name(method: &MethodSpec) -> String {
    method
        .name_override
        .clone()
        .unwrap_or_else(|| to_graphql_name(&derive_field_name(&method.name)))
}

/// The schema name a field will be exposed under.
pub(crate) fn property_field_name(field: &FieldSpec) -> String {
    field
        .name_override
        .clone()
        .unwrap_or_else(|| to_graphql_name(&derive_field_name(&field.name)))
}

/// Builds the field definition for a host method and binds its fetcher.
pub(crate) fn method_field(
    session: &mut BuildSession,
    retriever: &TypeRetriever,
    declaring: &Arc<HostTypeSpec>,
    parent_type: &str,
    method: &MethodSpec,
) -> Result<FieldDef, DeriveError> {
    let base = derive_field_name(&method.name);
    let name = method_field_name(method);
    let member = format!("{}.{}", declaring.name, method.name);
    trace!(member = %member, field = %name, "Building field from method");

    let ty = if method.connection {
        ListPageValidator.validate(&member, &method.return_shape)?;
        let list_ty = member_type(
            TypeKind::Output,
            &method.return_shape,
            false,
            &member,
            session,
            retriever,
        )?;
        connection_type(session, &list_ty)
    } else if method.batched {
        // The declared return is a per-key list; the schema type is the
        // element type.
        let element = match &method.return_shape {
            TypeShape::List(inner) | TypeShape::Stream(inner) => inner.as_ref().clone(),
            other => other.clone(),
        };
        member_type(
            TypeKind::Output,
            &element,
            method.required,
            &member,
            session,
            retriever,
        )?
    } else {
        member_type(
            TypeKind::Output,
            &method.return_shape,
            method.required,
            &member,
            session,
            retriever,
        )?
    };

    let mut args = Vec::new();
    for param in method.params.iter().filter(|p| !p.is_context) {
        let arg_name = param
            .name_override
            .clone()
            .unwrap_or_else(|| to_graphql_name(&param.name));
        let arg_ty = member_type(
            TypeKind::Input,
            &param.shape,
            param.required,
            &format!("{member}({})", param.name),
            session,
            retriever,
        )?;
        args.push(ArgumentDef {
            name: arg_name,
            description: param.description.clone(),
            ty: arg_ty,
            default_value: param.default_value.clone(),
        });
    }
    if method.connection {
        args.push(ArgumentDef {
            name: "first".into(),
            description: Some("Maximum number of items to return".into()),
            ty: SchemaTypeRef::named("Int"),
            default_value: None,
        });
        args.push(ArgumentDef {
            name: "after".into(),
            description: Some("Cursor to resume after".into()),
            ty: SchemaTypeRef::named("String"),
            default_value: None,
        });
    }

    let directives = resolve_directives(session, &member, &method.directives)?;

    let mut fetcher: Arc<dyn DataFetcher> = Arc::new(MethodFetcher::new(
        Arc::clone(declaring),
        method.clone(),
        base,
    ));
    if method.batched {
        fetcher = Arc::new(BatchedFetcher::new(fetcher));
    }
    if method.relay_mutation {
        fetcher = Arc::new(RelayMutationFetcher::new(fetcher));
    }
    if method.connection {
        fetcher = Arc::new(ConnectionFetcher::new(
            fetcher,
            Arc::new(OffsetConnectionStrategy),
        ));
    }
    if method.async_fetch {
        fetcher = Arc::new(AsyncFetcher::new(fetcher));
    }
    session.bind_fetcher(parent_type, name.clone(), fetcher);

    Ok(FieldDef {
        name,
        description: method.description.clone(),
        deprecation: method.deprecation.as_ref().map(|d| d.reason().to_string()),
        ty,
        args,
        directives,
    })
}

/// Builds the field definition for a host field and binds a property fetcher.
pub(crate) fn property_field(
    session: &mut BuildSession,
    retriever: &TypeRetriever,
    declaring: &Arc<HostTypeSpec>,
    parent_type: &str,
    field: &FieldSpec,
) -> Result<FieldDef, DeriveError> {
    let name = property_field_name(field);
    let member = format!("{}.{}", declaring.name, field.name);
    trace!(member = %member, field = %name, "Building field from host field");

    let ty = member_type(
        TypeKind::Output,
        &field.shape,
        field.required,
        &member,
        session,
        retriever,
    )?;
    let directives = resolve_directives(session, &member, &field.directives)?;

    session.bind_fetcher(
        parent_type,
        name.clone(),
        Arc::new(PropertyFetcher::new(field.name.clone())),
    );

    Ok(FieldDef {
        name,
        description: field.description.clone(),
        deprecation: field.deprecation.as_ref().map(|d| d.reason().to_string()),
        ty,
        args: Vec::new(),
        directives,
    })
}

/// Resolves a member's directive references against the session registry and
/// applies the supplied positional values.
fn resolve_directives(
    session: &BuildSession,
    member: &str,
    uses: &[DirectiveUse],
) -> Result<Vec<AppliedDirective>, DeriveError> {
    uses.iter()
        .map(|d| {
            let def = session
                .directive(&d.name)
                .ok_or_else(|| DeriveError::UnknownDirective {
                    name: d.name.clone(),
                    member: member.to_string(),
                })?;
            def.apply(&d.values)
        })
        .collect()
}

/// Registers the connection wrapper types for an item type and returns a
/// reference to the `{Item}Connection` object.
///
/// `PageInfo` is shared across all connections; `{Item}Edge` and
/// `{Item}Connection` are synthesized per item type, once each.
fn connection_type(session: &mut BuildSession, list_ty: &SchemaTypeRef) -> SchemaTypeRef {
    let item = list_ty.base_name().to_string();
    let edge_name = format!("{item}Edge");
    let connection_name = format!("{item}Connection");

    if !session.contains_type("PageInfo") {
        session.start_processing("PageInfo");
        session.finish_processing(TypeDef::Object(ObjectDef {
            name: "PageInfo".into(),
            description: Some("Pagination metadata for a connection".into()),
            interfaces: vec![],
            fields: vec![
                plain_field("hasPreviousPage", SchemaTypeRef::non_null(SchemaTypeRef::named("Boolean"))),
                plain_field("hasNextPage", SchemaTypeRef::non_null(SchemaTypeRef::named("Boolean"))),
                plain_field("startCursor", SchemaTypeRef::named("String")),
                plain_field("endCursor", SchemaTypeRef::named("String")),
            ],
        }));
    }

    if !session.contains_type(&edge_name) {
        session.start_processing(&edge_name);
        session.finish_processing(TypeDef::Object(ObjectDef {
            name: edge_name.clone(),
            description: None,
            interfaces: vec![],
            fields: vec![
                plain_field("node", SchemaTypeRef::named(item.clone())),
                plain_field("cursor", SchemaTypeRef::non_null(SchemaTypeRef::named("String"))),
            ],
        }));
    }

    if !session.contains_type(&connection_name) {
        session.start_processing(&connection_name);
        session.finish_processing(TypeDef::Object(ObjectDef {
            name: connection_name.clone(),
            description: None,
            interfaces: vec![],
            fields: vec![
                plain_field("totalCount", SchemaTypeRef::non_null(SchemaTypeRef::named("Int"))),
                plain_field("edges", SchemaTypeRef::list(SchemaTypeRef::named(edge_name))),
                plain_field("pageInfo", SchemaTypeRef::non_null(SchemaTypeRef::named("PageInfo"))),
            ],
        }));
    }

    SchemaTypeRef::named(connection_name)
}

fn plain_field(name: &str, ty: SchemaTypeRef) -> FieldDef {
    FieldDef {
        name: name.into(),
        description: None,
        deprecation: None,
        ty,
        args: Vec::new(),
        directives: Vec::new(),
    }
}

/// The placeholder field added to object and interface types with no
/// exposed members, since the schema language requires at least one field.
pub(crate) fn placeholder_field() -> FieldDef {
    FieldDef {
        name: "_placeholder".into(),
        description: Some("This type exposes no members".into()),
        deprecation: None,
        ty: SchemaTypeRef::named("String"),
        args: Vec::new(),
        directives: Vec::new(),
    }
}
