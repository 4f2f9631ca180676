//! Human-readable type rendering for diagnostics.

use crate::types::{IntrinsicKind, TypeData, TypeId};
use crate::universe::TypeUniverse;

/// Render a type the way diagnostics spell it: `int`, `Counter`,
/// `Iterable<int>`, `int[]`.
pub fn format_type(db: &dyn TypeUniverse, ty: TypeId) -> String {
    match db.lookup(ty) {
        Some(TypeData::Intrinsic(kind)) => match kind {
            IntrinsicKind::Bool => "bool".to_string(),
            IntrinsicKind::Int => "int".to_string(),
            IntrinsicKind::Unit => "unit".to_string(),
        },
        Some(TypeData::Array(elem)) => format!("{}[]", format_type(db, elem)),
        Some(TypeData::Param { name, .. }) => db.name(name).to_string(),
        Some(TypeData::Application { base, args }) => {
            let mut out = format_type(db, base);
            out.push('<');
            for (i, &arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&format_type(db, arg));
            }
            out.push('>');
            out
        }
        Some(TypeData::Declared(decl)) => db.name(db.decl(decl).name).to_string(),
        None => format!("<unknown type {}>", ty.0),
    }
}
