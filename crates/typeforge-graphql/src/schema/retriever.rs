//! The type retriever: orchestrates type derivation.
//!
//! Each type name moves through three states: unseen, in progress (on the
//! session's processing stack) and built (registered in the session). A
//! request for a built name returns immediately; a request for an
//! in-progress name returns a forward name reference instead of re-entering
//! construction, which is what terminates cycles. Any failure while
//! building a type resets the whole session before the error propagates.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::DeriveError;
use crate::graph::{InputFieldDef, InputObjectDef, SchemaTypeRef, TypeDef};
use crate::host::{HostRegistry, HostTypeSpec};
use crate::naming::to_graphql_name;
use crate::schema::enum_type::build_enum;
use crate::schema::object::{build_interface, build_object};
use crate::schema::union_type::build_union;
use crate::session::BuildSession;
use crate::typefn::{member_type, TypeKind};

/// Derives schema types from host descriptors on demand.
pub struct TypeRetriever {
    host: Arc<HostRegistry>,
}

impl TypeRetriever {
    /// Creates a retriever over the given descriptor registry.
    pub fn new(host: Arc<HostRegistry>) -> Self {
        Self { host }
    }

    /// The underlying descriptor registry.
    pub fn host(&self) -> &Arc<HostRegistry> {
        &self.host
    }

    /// Resolves the output type for a host type name, building it and its
    /// dependencies into the session as needed.
    pub fn output_type(
        &self,
        session: &mut BuildSession,
        name: &str,
    ) -> Result<SchemaTypeRef, DeriveError> {
        match self.try_output_type(session, name) {
            Ok(ty) => Ok(ty),
            Err(err) => {
                // Full reset: a half-built graph must never leak into a
                // subsequent build attempt.
                session.reset();
                Err(err)
            }
        }
    }

    fn try_output_type(
        &self,
        session: &mut BuildSession,
        name: &str,
    ) -> Result<SchemaTypeRef, DeriveError> {
        let spec = self.host.expect(name)?;
        let gname = to_graphql_name(&spec.name);

        if session.contains_type(&gname) {
            trace!(type_name = %gname, "Returning registered type");
            return Ok(SchemaTypeRef::named(gname));
        }
        if session.is_processing(&gname) {
            trace!(type_name = %gname, "Returning forward reference");
            return Ok(SchemaTypeRef::named(gname));
        }

        debug!(type_name = %gname, "Deriving type");
        session.start_processing(&gname);
        let def = self.dispatch(session, &spec, &gname)?;
        session.finish_processing(def);
        Ok(SchemaTypeRef::named(gname))
    }

    /// Picks the builder for a descriptor, in fixed precedence: union
    /// annotation, type resolver, enum constants, plain object.
    fn dispatch(
        &self,
        session: &mut BuildSession,
        spec: &Arc<HostTypeSpec>,
        gname: &str,
    ) -> Result<TypeDef, DeriveError> {
        if spec.union.is_some() {
            return Ok(TypeDef::Union(build_union(session, self, spec, gname)?));
        }
        if spec.type_resolver {
            return Ok(TypeDef::Interface(build_interface(
                session, self, &self.host, spec, gname,
            )?));
        }
        if spec.enum_values.is_some() {
            return Ok(TypeDef::Enum(build_enum(spec, gname)));
        }
        Ok(TypeDef::Object(build_object(
            session, self, &self.host, spec, gname,
        )?))
    }

    /// Resolves the input type for a host type name.
    ///
    /// Enums reuse their output definition. Everything else derives an
    /// input object named `{Type}Input` from the designated constructor,
    /// one input field per constructor parameter.
    pub fn input_type(
        &self,
        session: &mut BuildSession,
        name: &str,
    ) -> Result<SchemaTypeRef, DeriveError> {
        match self.try_input_type(session, name) {
            Ok(ty) => Ok(ty),
            Err(err) => {
                session.reset();
                Err(err)
            }
        }
    }

    fn try_input_type(
        &self,
        session: &mut BuildSession,
        name: &str,
    ) -> Result<SchemaTypeRef, DeriveError> {
        let spec = self.host.expect(name)?;
        if spec.enum_values.is_some() {
            return self.try_output_type(session, name);
        }

        let gname = format!("{}Input", to_graphql_name(&spec.name));
        if session.contains_type(&gname) || session.is_processing(&gname) {
            return Ok(SchemaTypeRef::named(gname));
        }

        let ctor = spec
            .designated_constructor()
            .ok_or_else(|| DeriveError::MissingConstructor {
                name: spec.name.clone(),
            })?
            .clone();

        debug!(type_name = %gname, "Deriving input type");
        session.start_processing(&gname);
        let mut fields = Vec::with_capacity(ctor.params.len());
        for param in &ctor.params {
            let member = format!("{}::new({})", spec.name, param.name);
            let ty = member_type(
                TypeKind::Input,
                &param.shape,
                param.required,
                &member,
                session,
                self,
            )?;
            fields.push(InputFieldDef {
                name: to_graphql_name(param.lookup_key()),
                description: None,
                ty,
                default_value: None,
            });
        }
        session.finish_processing(TypeDef::InputObject(InputObjectDef {
            name: gname.clone(),
            description: spec.description.clone(),
            fields,
        }));
        Ok(SchemaTypeRef::named(gname))
    }
}
