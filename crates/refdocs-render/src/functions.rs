//! Registration of the documentation operations as template functions.

use std::sync::Arc;

use minijinja::value::Value;
use minijinja::{Environment, ErrorKind as TemplateErrorKind};

use refdocs_core::{ApiPackage, Member, TypeId};

use crate::objects::{MemberObject, PackageObject, SharedDocs, TypeObject, type_list};

type TemplateResult<T> = Result<T, minijinja::Error>;

fn invalid(message: String) -> minijinja::Error {
    minijinja::Error::new(TemplateErrorKind::InvalidOperation, message)
}

/// Carry a model error through the template engine; recovered in `render`.
fn wrap(err: refdocs_error::Error) -> minijinja::Error {
    minijinja::Error::new(TemplateErrorKind::InvalidOperation, err.message().to_string())
        .with_source(err)
}

fn type_id(value: &Value) -> TemplateResult<TypeId> {
    value
        .downcast_object_ref::<TypeObject>()
        .map(TypeObject::id)
        .ok_or_else(|| invalid(format!("expected a type, got {}", value.kind())))
}

fn type_ids(value: &Value) -> TemplateResult<Vec<TypeId>> {
    if value.is_undefined() || value.is_none() {
        return Ok(Vec::new());
    }
    value.try_iter()?.map(|item| type_id(&item)).collect()
}

fn with_member<R>(value: &Value, f: impl FnOnce(&Member) -> R) -> TemplateResult<R> {
    value
        .downcast_object_ref::<MemberObject>()
        .map(|m| f(m.member()))
        .ok_or_else(|| invalid(format!("expected a member, got {}", value.kind())))
}

fn with_package<R>(value: &Value, f: impl FnOnce(&ApiPackage) -> R) -> TemplateResult<R> {
    value
        .downcast_object_ref::<PackageObject>()
        .map(|p| f(p.package()))
        .ok_or_else(|| invalid(format!("expected a package, got {}", value.kind())))
}

/// Register every operation of the model under its template name.
pub fn register(env: &mut Environment<'_>, docs: &SharedDocs) {
    let d = Arc::clone(docs);
    env.add_function("isExportedType", move |t: Value| -> TemplateResult<bool> {
        Ok(d.is_exported_type(type_id(&t)?))
    });

    let d = Arc::clone(docs);
    env.add_function("fieldName", move |m: Value| with_member(&m, |m| d.field_name(m)));

    let d = Arc::clone(docs);
    env.add_function("fieldEmbedded", move |m: Value| {
        with_member(&m, |m| d.field_embedded(m))
    });

    let d = Arc::clone(docs);
    env.add_function("typeIdentifier", move |t: Value| -> TemplateResult<String> {
        Ok(d.type_identifier(type_id(&t)?))
    });

    let d = Arc::clone(docs);
    env.add_function("typeDisplayName", move |t: Value| -> TemplateResult<String> {
        d.type_display_name(type_id(&t)?).map_err(wrap)
    });

    let d = Arc::clone(docs);
    env.add_function("visibleTypes", move |types: Value| -> TemplateResult<Value> {
        Ok(type_list(&d, &d.visible_types(&type_ids(&types)?)))
    });

    let d = Arc::clone(docs);
    env.add_function("renderComments", move |lines: Option<Vec<String>>| {
        d.render_comments(&lines.unwrap_or_default())
    });

    let d = Arc::clone(docs);
    env.add_function("packageDisplayName", move |p: Value| {
        with_package(&p, |p| d.package_display_name(p))
    });

    let d = Arc::clone(docs);
    env.add_function("apiGroup", move |t: Value| -> TemplateResult<String> {
        Ok(d.api_group(type_id(&t)?))
    });

    let d = Arc::clone(docs);
    env.add_function("packageAnchorID", move |p: Value| {
        with_package(&p, |p| d.package_anchor_id(p))
    });

    let d = Arc::clone(docs);
    env.add_function("linkForType", move |t: Value| -> TemplateResult<String> {
        d.link_for_type(type_id(&t)?).map_err(wrap)
    });

    let d = Arc::clone(docs);
    env.add_function("asciidocLinkForType", move |t: Value| -> TemplateResult<String> {
        d.asciidoc_link_for_type(type_id(&t)?).map_err(wrap)
    });

    let d = Arc::clone(docs);
    env.add_function("anchorIDForType", move |t: Value| -> TemplateResult<String> {
        Ok(d.anchor_id_for_type(type_id(&t)?))
    });

    let d = Arc::clone(docs);
    env.add_function("safe", move |markup: String| {
        Value::from_safe_string(d.safe(&markup).0)
    });

    let d = Arc::clone(docs);
    env.add_function("sortedTypes", move |types: Value| -> TemplateResult<Value> {
        Ok(type_list(&d, &d.sorted_types(&type_ids(&types)?)))
    });

    let d = Arc::clone(docs);
    env.add_function("typeReferences", move |t: Value| -> TemplateResult<Value> {
        Ok(type_list(&d, &d.type_references(type_id(&t)?)))
    });

    let d = Arc::clone(docs);
    env.add_function("hiddenMember", move |m: Value| with_member(&m, |m| d.hidden_member(m)));

    let d = Arc::clone(docs);
    env.add_function("isLocalType", move |t: Value| -> TemplateResult<bool> {
        Ok(d.is_local_type(type_id(&t)?))
    });

    let d = Arc::clone(docs);
    env.add_function("isOptionalMember", move |m: Value| {
        with_member(&m, |m| d.is_optional_member(m))
    });

    let d = Arc::clone(docs);
    env.add_function("safeIdentifier", move |id: String| d.safe_identifier(&id));

    let d = Arc::clone(docs);
    env.add_function("constantsOfType", move |t: Value| -> TemplateResult<Value> {
        Ok(type_list(&d, &d.constants_of_type(type_id(&t)?)))
    });
}
