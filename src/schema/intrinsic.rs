//! Intrinsic types of the reserved namespace.

use super::{MemberBuilder, RawCapture, TypeDescriptor, TypeName, XAML_NAMESPACE};
use crate::value::PrimitiveKind;

/// `x:Object`: the type every value is assignable to.
pub const OBJECT: &str = "Object";
/// `x:Null`: the null value.
pub const NULL: &str = "Null";
/// `x:Reference`: a back-reference to a named object.
pub const REFERENCE: &str = "Reference";
/// `x:XData`: wrapper for raw XML content.
pub const XDATA: &str = "XData";

/// Name of the intrinsic type for a primitive kind.
pub fn primitive_name(kind: PrimitiveKind) -> TypeName {
    TypeName::xaml(kind.type_name())
}

/// Every intrinsic descriptor.
pub(super) fn descriptors() -> Vec<TypeDescriptor> {
    let mut out: Vec<TypeDescriptor> = PrimitiveKind::ALL
        .into_iter()
        .map(|kind| TypeDescriptor::intrinsic(TypeName::xaml(kind.type_name()), Some(kind), None))
        .collect();
    out.push(TypeDescriptor::intrinsic(TypeName::xaml(OBJECT), None, None));
    out.push(TypeDescriptor::intrinsic(TypeName::xaml(NULL), None, None));
    out.push(TypeDescriptor::intrinsic(
        TypeName::xaml(REFERENCE),
        None,
        Some(MemberBuilder::new("Name", TypeName::xaml("String")).ctor_arg(0)),
    ));
    out.push(TypeDescriptor::intrinsic(
        TypeName::xaml(XDATA),
        None,
        Some(MemberBuilder::new("Text", TypeName::xaml("String")).raw(RawCapture::Xml)),
    ));
    out
}
