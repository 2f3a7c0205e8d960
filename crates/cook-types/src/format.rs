use std::fmt::Write;

use crate::{ClassType, Type, TypeEnv, WildcardBound};

/// Render a type in Java-like syntax for diagnostics and logs.
///
/// Classes are printed by their simple name, unification variables as `'N`, `Bottom` as `⊥`.
/// Unknown class ids render as `<unknown#N>` instead of failing.
pub fn format_type(env: &dyn TypeEnv, ty: &Type) -> String {
    let mut out = String::new();
    write_type(env, ty, &mut out);
    out
}

fn write_type(env: &dyn TypeEnv, ty: &Type, out: &mut String) {
    match ty {
        Type::Bottom => out.push('⊥'),
        Type::Primitive(p) => out.push_str(p.name()),
        Type::Array(component) => {
            write_type(env, component, out);
            out.push_str("[]");
        }
        Type::Class(ClassType { def, args }) => {
            match env.class(*def) {
                Some(class_def) => {
                    let simple = class_def
                        .name
                        .rsplit('.')
                        .next()
                        .unwrap_or(&class_def.name);
                    out.push_str(simple);
                }
                None => {
                    let _ = write!(out, "<unknown#{}>", def.to_raw());
                }
            }
            if !args.is_empty() {
                out.push('<');
                for (idx, arg) in args.iter().enumerate() {
                    if idx > 0 {
                        out.push_str(", ");
                    }
                    write_type(env, arg, out);
                }
                out.push('>');
            }
        }
        Type::Wildcard(WildcardBound::Unbounded) => out.push('?'),
        Type::Wildcard(WildcardBound::Extends(bound)) => {
            out.push_str("? extends ");
            write_type(env, bound, out);
        }
        Type::Wildcard(WildcardBound::Super(bound)) => {
            out.push_str("? super ");
            write_type(env, bound, out);
        }
        Type::Var(v) => {
            let _ = write!(out, "'{}", v.0);
        }
        Type::TypeParam(id) => match env.type_param(*id) {
            Some(tp) => out.push_str(&tp.name),
            None => {
                let _ = write!(out, "<param#{}>", id.to_raw());
            }
        },
    }
}
