//! Field-projection tables that translate a `Modifier` into which fields
//! of the source and destination instructions an opcode touches.

use crate::instruction::Modifier;
use crate::point::Point;

/// Which operand field of an instruction a projection selects.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Field {
    A,
    B,
}

/// One `(read-from-IRA, read-from-IRB, write-to-T)` triple, or a pair of
/// them for the field-wise modifiers (F, X) that project both fields at
/// once.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Projection {
    pub from_a: Field,
    pub from_b: Field,
    pub to: Field,
}

/// Returns the field projections implied by `modifier`, per §4.3's
/// modifier table. `A`, `B`, `AB`, `BA` yield exactly one projection; `F`
/// projects both fields pairwise; `X` projects both fields cross-written.
/// `I` has no field projection — callers handle it as whole-instruction
/// copy/compare and must not call this function for it.
#[must_use]
pub fn projections(modifier: Modifier) -> &'static [Projection] {
    use Field::{A, B};

    const A_ONLY: [Projection; 1] = [Projection {
        from_a: A,
        from_b: A,
        to: A,
    }];
    const B_ONLY: [Projection; 1] = [Projection {
        from_a: B,
        from_b: B,
        to: B,
    }];
    const AB: [Projection; 1] = [Projection {
        from_a: A,
        from_b: B,
        to: B,
    }];
    const BA: [Projection; 1] = [Projection {
        from_a: B,
        from_b: A,
        to: A,
    }];
    const F: [Projection; 2] = [
        Projection {
            from_a: A,
            from_b: A,
            to: A,
        },
        Projection {
            from_a: B,
            from_b: B,
            to: B,
        },
    ];
    const X: [Projection; 2] = [
        Projection {
            from_a: A,
            from_b: A,
            to: B,
        },
        Projection {
            from_a: B,
            from_b: B,
            to: A,
        },
    ];

    match modifier {
        Modifier::A => &A_ONLY,
        Modifier::B => &B_ONLY,
        Modifier::AB => &AB,
        Modifier::BA => &BA,
        Modifier::F => &F,
        Modifier::X => &X,
        Modifier::I => &[],
    }
}

/// Selects a field's value out of a pair of instruction operand Points.
#[must_use]
pub fn select(field: Field, a_value: Point, b_value: Point) -> Point {
    match field {
        Field::A => a_value,
        Field::B => b_value,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn ab_reads_a_from_source_and_writes_b() {
        let [p] = projections(Modifier::AB) else {
            panic!("expected one projection")
        };
        assert_eq!(p.from_a, Field::A);
        assert_eq!(p.from_b, Field::B);
        assert_eq!(p.to, Field::B);
    }

    #[test]
    fn f_projects_both_fields_straight() {
        let ps = projections(Modifier::F);
        assert_eq!(ps.len(), 2);
        assert_eq!(ps[0].to, Field::A);
        assert_eq!(ps[1].to, Field::B);
    }

    #[test]
    fn x_projects_both_fields_crossed() {
        let ps = projections(Modifier::X);
        assert_eq!(ps.len(), 2);
        assert_eq!(ps[0].to, Field::B);
        assert_eq!(ps[1].to, Field::A);
    }

    #[test]
    fn i_has_no_field_projections() {
        assert!(projections(Modifier::I).is_empty());
    }
}
