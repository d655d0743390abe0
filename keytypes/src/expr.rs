//! Resolution of field values and subscripts to masks, levels and names

use keytypes_core::{Atom, Context, ExprError, LevelIndex, ModKinds, ModMask, ModSet, MAX_LEVEL};

use crate::ast::{BinaryOp, Expr, UnaryOp};

pub fn resolve_mod_mask(
    ctx: &Context,
    expr: &Expr,
    kinds: ModKinds,
    mods: &ModSet,
) -> Result<ModMask, ExprError> {
    match expr {
        Expr::Ident(name) => lookup_mod_mask(ctx, name, kinds, mods),
        Expr::Integer(value) => u32::try_from(*value)
            .map(ModMask::from_bits_retain)
            .map_err(|_| ExprError::WrongType {
                wanted: "modifier mask",
                found: "out of range integer",
            }),
        Expr::String(_) => Err(ExprError::WrongType {
            wanted: "modifier mask",
            found: "string",
        }),
        Expr::Binary { op, lhs, rhs } => {
            let left = resolve_mod_mask(ctx, lhs, kinds, mods)?;
            let right = resolve_mod_mask(ctx, rhs, kinds, mods)?;
            match op {
                BinaryOp::Add => Ok(left | right),
                BinaryOp::Subtract => Ok(left & !right),
                BinaryOp::Multiply | BinaryOp::Divide => {
                    Err(ExprError::IllegalOperator(op.as_str(), "modifier masks"))
                }
            }
        }
        Expr::Unary { op, operand } => match op {
            UnaryOp::Invert => {
                let value = resolve_mod_mask(ctx, operand, kinds, mods)?;
                Ok(!value & mods.mask_of_kinds(kinds))
            }
            UnaryOp::Plus => resolve_mod_mask(ctx, operand, kinds, mods),
            UnaryOp::Negate | UnaryOp::Not => {
                Err(ExprError::IllegalOperator(op.as_str(), "modifier masks"))
            }
        },
    }
}

fn lookup_mod_mask(
    ctx: &Context,
    name: &str,
    kinds: ModKinds,
    mods: &ModSet,
) -> Result<ModMask, ExprError> {
    if name.eq_ignore_ascii_case("none") {
        return Ok(ModMask::empty());
    }
    if name.eq_ignore_ascii_case("all") {
        return Ok(mods.mask_of_kinds(kinds));
    }

    match mods.find_by_name(ctx.atoms(), name, ModKinds::BOTH) {
        Some(index) => {
            let kind = mods.get(index).map(|m| m.kind);
            match kind {
                Some(kind) if kinds.allows(kind) => Ok(ModMask::from_index(index)),
                _ => Err(ExprError::ModifierKindNotAllowed(name.to_string())),
            }
        }
        None => Err(ExprError::UnknownModifier(name.to_string())),
    }
}

/// Resolves a 1-based level (`2`, `Level2`, `level1 + 1`) to a 0-based index
pub fn resolve_level(expr: &Expr) -> Result<LevelIndex, ExprError> {
    let value = resolve_integer_lookup(expr, &level_lookup)?;
    if value < 1 || value > i64::from(MAX_LEVEL) {
        return Err(ExprError::LevelOutOfRange(value));
    }
    Ok((value - 1) as LevelIndex)
}

fn level_lookup(name: &str) -> Option<i64> {
    let lower = name.to_ascii_lowercase();
    let digits = lower.strip_prefix("level")?;
    digits.parse::<i64>().ok()
}

pub fn resolve_integer(expr: &Expr) -> Result<i64, ExprError> {
    resolve_integer_lookup(expr, &|_| None)
}

fn resolve_integer_lookup(
    expr: &Expr,
    lookup: &dyn Fn(&str) -> Option<i64>,
) -> Result<i64, ExprError> {
    match expr {
        Expr::Integer(value) => Ok(*value),
        Expr::Ident(name) => lookup(name).ok_or_else(|| ExprError::UnknownLevel(name.clone())),
        Expr::String(_) => Err(ExprError::WrongType {
            wanted: "integer",
            found: "string",
        }),
        Expr::Binary { op, lhs, rhs } => {
            let left = resolve_integer_lookup(lhs, lookup)?;
            let right = resolve_integer_lookup(rhs, lookup)?;
            match op {
                BinaryOp::Add => Ok(left.saturating_add(right)),
                BinaryOp::Subtract => Ok(left.saturating_sub(right)),
                BinaryOp::Multiply => Ok(left.saturating_mul(right)),
                BinaryOp::Divide => {
                    if right == 0 {
                        return Err(ExprError::DivideByZero(left));
                    }
                    left
                        .checked_div(right)
                        .ok_or(ExprError::IntegerOverflow(op.as_str()))
                }
            }
        }
        Expr::Unary { op, operand } => {
            let value = resolve_integer_lookup(operand, lookup)?;
            match op {
                UnaryOp::Negate => value
                    .checked_neg()
                    .ok_or(ExprError::IntegerOverflow(op.as_str())),
                UnaryOp::Invert => Ok(!value),
                UnaryOp::Plus => Ok(value),
                UnaryOp::Not => Err(ExprError::IllegalOperator(op.as_str(), "integers")),
            }
        }
    }
}

pub fn resolve_text(ctx: &mut Context, expr: &Expr) -> Result<Atom, ExprError> {
    match expr {
        Expr::String(text) => Ok(ctx.intern(text)),
        other => Err(ExprError::WrongType {
            wanted: "string",
            found: other.kind_name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keytypes_core::ModMask;

    fn ctx_with_mods() -> (Context, ModSet) {
        let mut ctx = Context::new();
        let mut mods = ModSet::new(ctx.atoms_mut());
        let level3 = ctx.intern("LevelThree");
        mods.add_virtual(level3, ModMask::MOD5).unwrap();
        (ctx, mods)
    }

    #[test]
    fn test_mask_names_and_sums() {
        let (ctx, mods) = ctx_with_mods();

        let mask = resolve_mod_mask(&ctx, &Expr::mods(&["Shift", "LevelThree"]), ModKinds::BOTH, &mods).unwrap();
        assert_eq!(mask, ModMask::SHIFT | ModMask::from_index(8));

        let none = resolve_mod_mask(&ctx, &Expr::ident("None"), ModKinds::BOTH, &mods).unwrap();
        assert!(none.is_empty());

        let real = resolve_mod_mask(&ctx, &Expr::ident("all"), ModKinds::REAL, &mods).unwrap();
        assert_eq!(real, ModMask::REAL);
    }

    #[test]
    fn test_mask_subtract_and_invert() {
        let (ctx, mods) = ctx_with_mods();

        let expr = Expr::subtract(Expr::ident("all"), Expr::ident("Lock"));
        let mask = resolve_mod_mask(&ctx, &expr, ModKinds::REAL, &mods).unwrap();
        assert_eq!(mask, ModMask::REAL - ModMask::LOCK);

        let inverted = Expr::Unary {
            op: UnaryOp::Invert,
            operand: Box::new(Expr::ident("Shift")),
        };
        let mask = resolve_mod_mask(&ctx, &inverted, ModKinds::REAL, &mods).unwrap();
        assert_eq!(mask, ModMask::REAL - ModMask::SHIFT);
    }

    #[test]
    fn test_mask_errors() {
        let (ctx, mods) = ctx_with_mods();

        assert_eq!(
            resolve_mod_mask(&ctx, &Expr::ident("Hyper"), ModKinds::BOTH, &mods),
            Err(ExprError::UnknownModifier("Hyper".to_string()))
        );
        assert_eq!(
            resolve_mod_mask(&ctx, &Expr::ident("LevelThree"), ModKinds::REAL, &mods),
            Err(ExprError::ModifierKindNotAllowed("LevelThree".to_string()))
        );
        assert!(matches!(
            resolve_mod_mask(&ctx, &Expr::string("Shift"), ModKinds::BOTH, &mods),
            Err(ExprError::WrongType { wanted: "modifier mask", .. })
        ));
    }

    #[test]
    fn test_level_translation() {
        assert_eq!(resolve_level(&Expr::int(1)), Ok(0));
        assert_eq!(resolve_level(&Expr::ident("Level3")), Ok(2));
        assert_eq!(resolve_level(&Expr::ident("level2")), Ok(1));
        assert_eq!(resolve_level(&Expr::add(Expr::ident("Level1"), Expr::int(1))), Ok(1));
        assert_eq!(resolve_level(&Expr::int(0)), Err(ExprError::LevelOutOfRange(0)));
        assert_eq!(
            resolve_level(&Expr::int(i64::from(MAX_LEVEL) + 1)),
            Err(ExprError::LevelOutOfRange(i64::from(MAX_LEVEL) + 1))
        );
        assert_eq!(
            resolve_level(&Expr::ident("Base")),
            Err(ExprError::UnknownLevel("Base".to_string()))
        );
    }

    #[test]
    fn test_integer_division() {
        let expr = Expr::Binary {
            op: BinaryOp::Divide,
            lhs: Box::new(Expr::int(7)),
            rhs: Box::new(Expr::int(0)),
        };
        assert_eq!(resolve_integer(&expr), Err(ExprError::DivideByZero(7)));
    }

    #[test]
    fn test_integer_overflow_is_an_error() {
        let negated = Expr::Unary {
            op: UnaryOp::Negate,
            operand: Box::new(Expr::subtract(Expr::int(-i64::MAX), Expr::int(1))),
        };
        assert_eq!(resolve_integer(&negated), Err(ExprError::IntegerOverflow("negation")));
        assert_eq!(resolve_level(&negated), Err(ExprError::IntegerOverflow("negation")));

        let divided = Expr::Binary {
            op: BinaryOp::Divide,
            lhs: Box::new(Expr::int(i64::MIN)),
            rhs: Box::new(Expr::int(-1)),
        };
        assert_eq!(resolve_integer(&divided), Err(ExprError::IntegerOverflow("division")));
        assert_eq!(resolve_level(&divided), Err(ExprError::IntegerOverflow("division")));
    }

    #[test]
    fn test_text() {
        let mut ctx = Context::new();
        let atom = resolve_text(&mut ctx, &Expr::string("Base")).unwrap();
        assert_eq!(ctx.atom_text(atom), "Base");
        assert!(resolve_text(&mut ctx, &Expr::int(1)).is_err());
    }
}
